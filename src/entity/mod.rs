pub mod addresses;
pub mod audit_logs;
pub mod completed_maintenances;
pub mod customers;
pub mod maintenance_documents;
pub mod maintenance_parts;
pub mod order_items;
pub mod order_statuses;
pub mod orders;
pub mod product_images;
pub mod product_variants;
pub mod products;
pub mod users;
pub mod vehicles;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use completed_maintenances::Entity as CompletedMaintenances;
pub use customers::Entity as Customers;
pub use maintenance_documents::Entity as MaintenanceDocuments;
pub use maintenance_parts::Entity as MaintenanceParts;
pub use order_items::Entity as OrderItems;
pub use order_statuses::Entity as OrderStatuses;
pub use orders::Entity as Orders;
pub use product_images::Entity as ProductImages;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use users::Entity as Users;
pub use vehicles::Entity as Vehicles;
