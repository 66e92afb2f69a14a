pub mod addresses;
pub mod auth;
pub mod maintenance;
pub mod orders;
pub mod products;
