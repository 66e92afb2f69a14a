use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{filters::ProductFilter, money::Money};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-sensitive substring of the product name.
    pub q: Option<String>,
    #[param(value_type = Option<f64>)]
    pub min_price: Option<Money>,
    #[param(value_type = Option<f64>)]
    pub max_price: Option<Money>,
    /// Include deactivated products.
    pub include_inactive: Option<bool>,
}

impl ProductQuery {
    pub fn filters(&self) -> Vec<ProductFilter> {
        let mut filters = Vec::new();
        if !self.include_inactive.unwrap_or(false) {
            filters.push(ProductFilter::ActiveOnly);
        }
        if let Some(term) = self.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filters.push(ProductFilter::NameContains(term.to_string()));
        }
        if let Some(min) = self.min_price {
            filters.push(ProductFilter::MinPrice(min));
        }
        if let Some(max) = self.max_price {
            filters.push(ProductFilter::MaxPrice(max));
        }
        filters
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Status name, e.g. `Pending`.
    pub status: Option<String>,
    /// Include cancelled-out (inactive) orders.
    pub include_inactive: Option<bool>,
}
