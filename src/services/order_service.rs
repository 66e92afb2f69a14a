use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_statuses::{
            Column as StatusCol, Entity as OrderStatuses, INITIAL_STATUS, Model as StatusModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
    },
    error::{AppError, AppResult, is_unique_violation_on},
    filters::{OrderFilter, all_of},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    money::Money,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::customer_service::resolve_customer,
    state::AppState,
};

const ORDER_NUMBER_PREFIX: &str = "ORD";
const ORDER_NUMBER_ATTEMPTS: usize = 3;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Places an order for the caller: the header, every line item and the
/// stock decrements commit together or not at all.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    payload.validate()?;

    let customer = resolve_customer(state, user).await?;

    let address_owned = Addresses::find_by_id(payload.shipping_address_id)
        .filter(AddressCol::CustomerId.eq(customer.id))
        .one(&state.orm)
        .await?
        .is_some();
    if !address_owned {
        return Err(AppError::NotFound("Shipping address".into()));
    }

    let status = OrderStatuses::find()
        .filter(StatusCol::Name.eq(INITIAL_STATUS))
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("order status {INITIAL_STATUS} is not configured"))
        })?;

    let line_total = payload
        .items
        .iter()
        .try_fold(Money::ZERO, |total, item| {
            item.unit_price
                .checked_mul(item.quantity)
                .and_then(|amount| total.checked_add(amount))
        })
        .ok_or_else(|| AppError::BadRequest("order amount overflows".into()))?;
    if line_total != payload.pricing.subtotal {
        tracing::warn!(
            customer_id = %customer.id,
            supplied = %payload.pricing.subtotal,
            computed = %line_total,
            "order subtotal does not match line items"
        );
    }

    let mut attempt = 1;
    let order = loop {
        let order_number = generate_order_number();
        let txn = state.orm.begin().await?;
        match insert_order(&txn, customer.id, &status, &order_number, &payload).await {
            Ok(order) => {
                txn.commit().await?;
                break order;
            }
            Err(AppError::OrmError(err))
                if attempt < ORDER_NUMBER_ATTEMPTS && is_unique_violation_on(&err, "order_number") =>
            {
                tracing::warn!(%order_number, attempt, "order number collision, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    };

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        items = payload.items.len(),
        "order placed"
    );

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "order_number": order.order_number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        PlacedOrder {
            order_id: order.id,
            order_number: order.order_number,
        },
    ))
}

async fn insert_order(
    txn: &DatabaseTransaction,
    customer_id: Uuid,
    status: &StatusModel,
    order_number: &str,
    payload: &PlaceOrderRequest,
) -> AppResult<OrderModel> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let pricing = &payload.pricing;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number.to_string()),
        customer_id: Set(customer_id),
        shipping_address_id: Set(payload.shipping_address_id),
        status_id: Set(status.id),
        subtotal: Set(pricing.subtotal.cents()),
        tax: Set(pricing.tax.cents()),
        shipping: Set(pricing.shipping.unwrap_or_default().cents()),
        discount: Set(pricing.discount.unwrap_or_default().cents()),
        total: Set(pricing.total.cents()),
        notes: Set(payload.notes.clone()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    for item in &payload.items {
        let variant = ProductVariants::find_by_id(item.variant_id)
            .lock(LockType::Update)
            .one(txn)
            .await?;
        let in_stock = variant.is_some_and(|v| v.stock_quantity >= item.quantity);
        if !in_stock {
            return Err(AppError::InsufficientStock {
                variant_id: item.variant_id,
            });
        }

        let subtotal = item
            .unit_price
            .checked_mul(item.quantity)
            .ok_or_else(|| AppError::BadRequest("line item amount overflows".into()))?;

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            variant_id: Set(item.variant_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price.cents()),
            discount: Set(item.discount.cents()),
            subtotal: Set(subtotal.cents()),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        // relative decrement, guarded so it can never cross zero
        let updated = ProductVariants::update_many()
            .col_expr(
                VariantCol::StockQuantity,
                Expr::col(VariantCol::StockQuantity).sub(item.quantity),
            )
            .col_expr(VariantCol::UpdatedAt, Expr::value(now))
            .filter(VariantCol::Id.eq(item.variant_id))
            .filter(VariantCol::StockQuantity.gte(item.quantity))
            .exec(txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(AppError::InsufficientStock {
                variant_id: item.variant_id,
            });
        }
    }

    Ok(order)
}

/// `ORD-<unix micros>-<8 uppercase alphanumerics>`.
pub fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!(
        "{}-{}-{}",
        ORDER_NUMBER_PREFIX,
        Utc::now().timestamp_micros(),
        suffix
    )
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let customer = resolve_customer(state, user).await?;
    let statuses = status_names(state).await?;

    let mut filters = vec![OrderFilter::Customer(customer.id)];
    if let Some(name) = query.status.as_ref().filter(|s| !s.is_empty()) {
        match statuses.iter().find(|(_, status)| status.eq_ignore_ascii_case(name)) {
            Some((id, _)) => filters.push(OrderFilter::Status(*id)),
            None => return Err(AppError::BadRequest(format!("Unknown order status {name}"))),
        }
    }
    if !query.include_inactive.unwrap_or(false) {
        filters.push(OrderFilter::ActiveOnly);
    }

    let items = Orders::find()
        .filter(all_of(&filters))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| order_from_entity(model, &statuses))
        .collect();

    Ok(ApiResponse::success("Ok", OrderList { items }))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".into()))?;

    if !user.is_admin() {
        let customer = resolve_customer(state, user).await?;
        if order.customer_id != customer.id {
            return Err(AppError::NotFound("Order".into()));
        }
    }

    let statuses = status_names(state).await?;
    let items: Vec<OrderItem> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order, &statuses),
            items,
        },
    ))
}

async fn status_names(state: &AppState) -> AppResult<HashMap<Uuid, String>> {
    let statuses = OrderStatuses::find()
        .order_by_asc(StatusCol::SortOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|status| (status.id, status.name))
        .collect();
    Ok(statuses)
}

fn order_from_entity(model: OrderModel, statuses: &HashMap<Uuid, String>) -> Order {
    Order {
        id: model.id,
        status: statuses
            .get(&model.status_id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string()),
        order_number: model.order_number,
        customer_id: model.customer_id,
        shipping_address_id: model.shipping_address_id,
        subtotal: Money::from_cents(model.subtotal),
        tax: Money::from_cents(model.tax),
        shipping: Money::from_cents(model.shipping),
        discount: Money::from_cents(model.discount),
        total: Money::from_cents(model.total),
        notes: model.notes,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn order_numbers_have_expected_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3, "{number}");
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].bytes().all(|b| SUFFIX_CHARSET.contains(&b)));
    }

    #[test]
    fn ten_thousand_order_numbers_are_distinct() {
        let numbers: HashSet<String> = (0..10_000).map(|_| generate_order_number()).collect();
        assert_eq!(numbers.len(), 10_000);
    }
}
