use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Order, OrderItem},
    money::{Money, validate_non_negative},
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LineItemRequest {
    pub variant_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Money,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub discount: Money,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PricingSummary {
    #[validate(custom(function = "validate_non_negative"))]
    pub subtotal: Money,
    #[validate(custom(function = "validate_non_negative"))]
    pub tax: Money,
    #[validate(custom(function = "validate_non_negative"))]
    pub shipping: Option<Money>,
    #[validate(custom(function = "validate_non_negative"))]
    pub discount: Option<Money>,
    #[validate(custom(function = "validate_non_negative"))]
    pub total: Money,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub shipping_address_id: Uuid,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
    #[validate(nested)]
    pub pricing: PricingSummary,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub order_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
