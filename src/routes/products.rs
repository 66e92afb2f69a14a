use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductDetail, ProductInput, ProductList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::{
        extract::{ApiMultipart, ApiPath, ApiQuery},
        params::ProductQuery,
        upload::read_upsert_form,
    },
    services::product_service,
    state::AppState,
};

const IMAGES_FIELD: &str = "images";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

/// Multipart form: `payload` holds the JSON [`ProductInput`], every `images`
/// part is stored as a product image.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = ProductInput, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Create product", body = ApiResponse<ProductDetail>),
        (status = 409, description = "Duplicate product name or SKU"),
        (status = 400, description = "No image could be stored"),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiMultipart(multipart): ApiMultipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductDetail>>)> {
    let (payload, files) = read_upsert_form::<ProductInput>(multipart, IMAGES_FIELD).await?;
    let resp = product_service::create_product(&state, &user, payload, files).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductInput, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product or variant not found"),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let (payload, files) = read_upsert_form::<ProductInput>(multipart, IMAGES_FIELD).await?;
    let resp = product_service::update_product(&state, &user, id, payload, files).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deactivated")
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::deactivate_product(&state, &user, id).await?;
    Ok(Json(resp))
}
