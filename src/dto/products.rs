use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Asset, Product, ProductVariant},
    money::{Money, validate_non_negative},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VariantInput {
    /// Existing variant to update; omitted for new variants.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 50))]
    pub color: String,
    #[validate(length(min = 1, max = 20))]
    pub size: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[serde(default)]
    pub price_adjustment: Money,
    /// Opening stock for a new variant. Ignored when `id` names an existing
    /// variant; stock only moves through order placement.
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock_quantity: i32,
}

/// JSON part of the product multipart form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub base_price: Money,
    #[validate(length(min = 1, message = "at least one variant is required"))]
    #[validate(nested)]
    pub variants: Vec<VariantInput>,
    /// Images to keep on update. `None` keeps every existing image.
    pub retained_image_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<Asset>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductDetail>)]
    pub items: Vec<ProductDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(sku: &str, stock_quantity: i32) -> VariantInput {
        VariantInput {
            id: None,
            color: "Black".into(),
            size: "M".into(),
            sku: sku.into(),
            price_adjustment: Money::ZERO,
            stock_quantity,
        }
    }

    fn product(variants: Vec<VariantInput>) -> ProductInput {
        ProductInput {
            name: "Trail Jacket".into(),
            description: None,
            base_price: Money::from_cents(4999),
            variants,
            retained_image_ids: None,
        }
    }

    #[test]
    fn product_needs_a_variant() {
        let errors = product(Vec::new()).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("variants"));
    }

    #[test]
    fn variant_errors_are_reported() {
        assert!(product(vec![variant("JKT-BLK-M", 3)]).validate().is_ok());
        assert!(product(vec![variant("", 3)]).validate().is_err());
        assert!(product(vec![variant("JKT-BLK-M", -1)]).validate().is_err());
    }
}
