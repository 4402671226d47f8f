use super::common::{
    created_response, no_content_response, success_response, validate_input, ListQuery, PageData,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::products::{CreateProductInput, UpdateProductInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let product = state.services.products.create(payload).await?;
    Ok(created_response(product))
}

/// List products with search and pagination
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListQuery),
    responses((status = 200, description = "Product page")),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .products
        .list(query.page, query.limit, query.search.clone())
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Products currently out on an open assignment
#[utoipa::path(
    get,
    path = "/api/v1/products/assigned",
    responses((status = 200, description = "Assigned products")),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn list_assigned_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.assigned().await?;
    Ok(success_response(products))
}

/// Product detail including the derived assignment facts
#[utoipa::path(
    get,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product detail", body = crate::services::products::ProductDetail),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.products.detail(product_id).await?;
    Ok(success_response(detail))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let product = state.services.products.update(product_id, payload).await?;
    Ok(success_response(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product has an open assignment", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.products.delete(product_id).await?;
    Ok(no_content_response())
}

/// Generate a QR code for a product
#[utoipa::path(
    post,
    path = "/api/v1/products/:id/generate-qr",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "QR code data URI", body = crate::services::products::QrCodePayload),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn generate_product_qr(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let payload = state.services.products.generate_qr(product_id).await?;
    Ok(success_response(payload))
}

/// Creates the router for product endpoints
pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product))
        .route("/", get(list_products))
        .route("/assigned", get(list_assigned_products))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/generate-qr", post(generate_product_qr))
}
