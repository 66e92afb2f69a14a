pub mod assets;
pub mod customer_service;
pub mod maintenance_service;
pub mod order_service;
pub mod product_service;
