//! Typed query predicates folded into SeaORM conditions.

use sea_orm::{ColumnTrait, Condition, sea_query::SimpleExpr};
use uuid::Uuid;

use crate::{
    entity::{orders::Column as OrderCol, products::Column as ProductCol},
    money::Money,
};

pub trait Predicate {
    fn to_expr(&self) -> SimpleExpr;
}

/// All predicates must hold.
pub fn all_of<P: Predicate>(filters: &[P]) -> Condition {
    filters
        .iter()
        .fold(Condition::all(), |cond, filter| cond.add(filter.to_expr()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductFilter {
    ActiveOnly,
    NameContains(String),
    MinPrice(Money),
    MaxPrice(Money),
}

impl Predicate for ProductFilter {
    fn to_expr(&self) -> SimpleExpr {
        match self {
            ProductFilter::ActiveOnly => ProductCol::IsActive.eq(true),
            ProductFilter::NameContains(term) => ProductCol::Name.contains(term),
            ProductFilter::MinPrice(min) => ProductCol::BasePrice.gte(min.cents()),
            ProductFilter::MaxPrice(max) => ProductCol::BasePrice.lte(max.cents()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    Customer(Uuid),
    Status(Uuid),
    ActiveOnly,
}

impl Predicate for OrderFilter {
    fn to_expr(&self) -> SimpleExpr {
        match self {
            OrderFilter::Customer(id) => OrderCol::CustomerId.eq(*id),
            OrderFilter::Status(id) => OrderCol::StatusId.eq(*id),
            OrderFilter::ActiveOnly => OrderCol::IsActive.eq(true),
        }
    }
}
