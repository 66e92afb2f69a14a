use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::addresses::{AddressList, CreateAddressRequest},
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        customers::{
            ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers,
            Model as CustomerModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::Address,
    response::ApiResponse,
    state::AppState,
};

/// Returns the caller's customer profile, creating it on first use.
pub async fn resolve_customer(state: &AppState, user: &AuthUser) -> AppResult<CustomerModel> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
    if !account.is_active {
        return Err(AppError::Forbidden);
    }

    if let Some(customer) = find_customer(state, user.user_id).await? {
        return Ok(customer);
    }

    let now = Utc::now();
    let display_name = account
        .email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(&account.email)
        .to_string();
    let created = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        display_name: Set(display_name),
        phone: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await;

    match created {
        Ok(customer) => {
            tracing::info!(user_id = %user.user_id, customer_id = %customer.id, "customer profile created");
            Ok(customer)
        }
        // another request created it first
        Err(err) if is_unique_violation(&err) => find_customer(state, user.user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unable to create customer profile".into())),
        Err(err) => {
            tracing::error!(user_id = %user.user_id, error = %err, "customer profile creation failed");
            Err(AppError::BadRequest("Unable to create customer profile".into()))
        }
    }
}

async fn find_customer(state: &AppState, user_id: Uuid) -> AppResult<Option<CustomerModel>> {
    let customer = Customers::find()
        .filter(CustomerCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?;
    Ok(customer)
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let customer = resolve_customer(state, user).await?;

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        line1: Set(payload.line1),
        line2: Set(payload.line2),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country.to_ascii_uppercase()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "address_create",
        Some("addresses"),
        Some(serde_json::json!({ "address_id": address.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Address created", Address::from(address)))
}

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let customer = resolve_customer(state, user).await?;
    let items = Addresses::find()
        .filter(AddressCol::CustomerId.eq(customer.id))
        .order_by_asc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success("OK", AddressList { items }))
}
