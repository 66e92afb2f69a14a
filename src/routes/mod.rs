use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    response::{ApiResponse, ErrorCode},
    state::AppState,
};

pub mod addresses;
pub mod doc;
pub mod extract;
pub mod health;
pub mod maintenances;
pub mod orders;
pub mod params;
pub mod products;
pub mod upload;
pub mod vehicles;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/addresses", addresses::router())
        .nest("/vehicles", vehicles::router())
        .nest("/maintenances", maintenances::router())
}

/// The whole application: health, `/api`, uploaded files and the docs.
///
/// Request bodies are capped at `max_upload_bytes`; oversized bodies are
/// rejected by the extractors and come back as an error envelope.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let upload_base = state.config.public_upload_base.trim_end_matches('/').to_string();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest_service(&upload_base, uploads)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::failure(
        "Not Found",
        ErrorCode::NotFound,
        Some(serde_json::json!({ "path": uri.path() })),
    );
    (StatusCode::NOT_FOUND, Json(body))
}

async fn method_not_allowed(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::failure(
        "Method Not Allowed",
        ErrorCode::ValidationError,
        Some(serde_json::json!({ "path": uri.path() })),
    );
    (StatusCode::METHOD_NOT_ALLOWED, Json(body))
}
