use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity, money::Money};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub shipping_address_id: Uuid,
    pub status: String,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
    pub unit_price: Money,
    pub discount: Money,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color: String,
    pub size: String,
    pub sku: String,
    pub price_adjustment: Money,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Asset {
    pub id: Uuid,
    pub url: String,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Maintenance {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub service_provider: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub labor_cost: Money,
    pub parts_cost: Money,
    pub total_cost: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenancePart {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_cost: Money,
    pub total: Money,
}

impl From<entity::addresses::Model> for Address {
    fn from(model: entity::addresses::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            postal_code: model.postal_code,
            country: model.country,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(model: entity::order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            variant_id: model.variant_id,
            quantity: model.quantity,
            unit_price: Money::from_cents(model.unit_price),
            discount: Money::from_cents(model.discount),
            subtotal: Money::from_cents(model.subtotal),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::products::Model> for Product {
    fn from(model: entity::products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            base_price: Money::from_cents(model.base_price),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::product_variants::Model> for ProductVariant {
    fn from(model: entity::product_variants::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            color: model.color,
            size: model.size,
            sku: model.sku,
            price_adjustment: Money::from_cents(model.price_adjustment),
            stock_quantity: model.stock_quantity,
        }
    }
}

impl From<entity::product_images::Model> for Asset {
    fn from(model: entity::product_images::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            original_name: model.original_name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::maintenance_documents::Model> for Asset {
    fn from(model: entity::maintenance_documents::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            original_name: model.original_name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::vehicles::Model> for Vehicle {
    fn from(model: entity::vehicles::Model) -> Self {
        Self {
            id: model.id,
            plate_number: model.plate_number,
            make: model.make,
            model: model.model,
            year: model.year,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::completed_maintenances::Model> for Maintenance {
    fn from(model: entity::completed_maintenances::Model) -> Self {
        Self {
            id: model.id,
            vehicle_id: model.vehicle_id,
            title: model.title,
            description: model.description,
            service_provider: model.service_provider,
            performed_at: model.performed_at.with_timezone(&Utc),
            labor_cost: Money::from_cents(model.labor_cost),
            parts_cost: Money::from_cents(model.parts_cost),
            total_cost: Money::from_cents(model.total_cost),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::maintenance_parts::Model> for MaintenancePart {
    fn from(model: entity::maintenance_parts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            quantity: model.quantity,
            unit_cost: Money::from_cents(model.unit_cost),
            total: Money::from_cents(model.total),
        }
    }
}
