use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::maintenance::{CreateVehicleRequest, MaintenanceList, VehicleList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Vehicle,
    response::ApiResponse,
    routes::extract::{ApiJson, ApiPath},
    services::maintenance_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/{id}/maintenances", get(list_vehicle_maintenances))
}

#[utoipa::path(
    get,
    path = "/api/vehicles",
    responses(
        (status = 200, description = "Active vehicles", body = ApiResponse<VehicleList>)
    ),
    tag = "Fleet"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<VehicleList>>> {
    let resp = maintenance_service::list_vehicles(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = ApiResponse<Vehicle>),
        (status = 409, description = "Plate number already registered"),
    ),
    tag = "Fleet"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vehicle>>)> {
    let resp = maintenance_service::create_vehicle(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/{id}/maintenances",
    params(
        ("id" = Uuid, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 200, description = "Maintenance history, newest first", body = ApiResponse<MaintenanceList>),
        (status = 404, description = "Vehicle not found"),
    ),
    tag = "Fleet"
)]
pub async fn list_vehicle_maintenances(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<MaintenanceList>>> {
    let resp = maintenance_service::list_maintenances_for_vehicle(&state, id).await?;
    Ok(Json(resp))
}
