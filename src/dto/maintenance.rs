use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Asset, Maintenance, MaintenancePart, Vehicle},
    money::{Money, validate_non_negative},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PartInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_cost: Money,
}

/// JSON part of the maintenance multipart form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MaintenanceInput {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub service_provider: Option<String>,
    pub performed_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub labor_cost: Money,
    #[serde(default)]
    #[validate(nested)]
    pub parts: Vec<PartInput>,
    /// Documents to keep on update. `None` keeps every existing document.
    pub retained_document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceDetail {
    pub maintenance: Maintenance,
    pub parts: Vec<MaintenancePart>,
    pub documents: Vec<Asset>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceList {
    pub items: Vec<Maintenance>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate_number: String,
    #[validate(length(min = 1, max = 100))]
    pub make: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleList {
    pub items: Vec<Vehicle>,
}
