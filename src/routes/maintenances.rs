use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::maintenance::{MaintenanceDetail, MaintenanceInput},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::{
        extract::{ApiMultipart, ApiPath},
        upload::read_upsert_form,
    },
    services::maintenance_service,
    state::AppState,
};

const DOCUMENTS_FIELD: &str = "documents";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_maintenance))
        .route("/{id}", get(get_maintenance).put(update_maintenance))
}

#[utoipa::path(
    post,
    path = "/api/maintenances",
    request_body(content = MaintenanceInput, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Maintenance recorded", body = ApiResponse<MaintenanceDetail>),
        (status = 404, description = "Vehicle not found"),
        (status = 400, description = "No document could be stored"),
    ),
    tag = "Fleet"
)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    user: AuthUser,
    ApiMultipart(multipart): ApiMultipart,
) -> AppResult<(StatusCode, Json<ApiResponse<MaintenanceDetail>>)> {
    let (payload, files) =
        read_upsert_form::<MaintenanceInput>(multipart, DOCUMENTS_FIELD).await?;
    let resp = maintenance_service::create_maintenance(&state, &user, payload, files).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/maintenances/{id}",
    params(
        ("id" = Uuid, Path, description = "Maintenance ID")
    ),
    request_body(content = MaintenanceInput, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Maintenance updated", body = ApiResponse<MaintenanceDetail>),
        (status = 404, description = "Maintenance not found"),
    ),
    tag = "Fleet"
)]
pub async fn update_maintenance(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> AppResult<Json<ApiResponse<MaintenanceDetail>>> {
    let (payload, files) =
        read_upsert_form::<MaintenanceInput>(multipart, DOCUMENTS_FIELD).await?;
    let resp = maintenance_service::update_maintenance(&state, &user, id, payload, files).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/maintenances/{id}",
    params(
        ("id" = Uuid, Path, description = "Maintenance ID")
    ),
    responses(
        (status = 200, description = "Maintenance with parts and documents", body = ApiResponse<MaintenanceDetail>),
        (status = 404, description = "Maintenance not found"),
    ),
    tag = "Fleet"
)]
pub async fn get_maintenance(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<MaintenanceDetail>>> {
    let resp = maintenance_service::get_maintenance(&state, id).await?;
    Ok(Json(resp))
}
