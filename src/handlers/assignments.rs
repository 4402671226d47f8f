use super::common::{created_response, success_response, validate_input, ListQuery, PageData};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::assignments::{
        AssignProductInput, AssignmentHistoryFilter, BulkAssignInput, CloseAssignmentInput,
        UpdateAssignmentInput,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Assign a product to an employee
#[utoipa::path(
    post,
    path = "/api/v1/product-assignments/assign",
    request_body = AssignProductInput,
    responses(
        (status = 201, description = "Assignment created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or employee not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product already assigned", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn assign_product(
    State(state): State<Arc<AppState>>,
    current_user: AuthUser,
    Json(payload): Json<AssignProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let assignment = state
        .services
        .assignments
        .assign(current_user.user_id, payload)
        .await?;
    Ok(created_response(assignment))
}

/// Assign several products to one employee in a single call
#[utoipa::path(
    post,
    path = "/api/v1/product-assignments/assign/bulk",
    request_body = BulkAssignInput,
    responses(
        (status = 200, description = "Per-item outcome", body = crate::services::assignments::BulkAssignOutcome),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn assign_products_bulk(
    State(state): State<Arc<AppState>>,
    current_user: AuthUser,
    Json(payload): Json<BulkAssignInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let outcome = state
        .services
        .assignments
        .assign_bulk(current_user.user_id, payload)
        .await?;
    Ok(success_response(outcome))
}

/// Close an assignment as RETURNED, LOST or DAMAGED
#[utoipa::path(
    post,
    path = "/api/v1/product-assignments/return/:id",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = CloseAssignmentInput,
    responses(
        (status = 200, description = "Assignment closed"),
        (status = 400, description = "Invalid target state or condition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Assignment already closed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn return_product(
    State(state): State<Arc<AppState>>,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<CloseAssignmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let assignment = state
        .services
        .assignments
        .close(assignment_id, payload)
        .await?;
    Ok(success_response(assignment))
}

/// Edit notes / expected return date on an open assignment
#[utoipa::path(
    put,
    path = "/api/v1/product-assignments/:id",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentInput,
    responses(
        (status = 200, description = "Assignment updated"),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Assignment is closed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn update_assignment(
    State(state): State<Arc<AppState>>,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let assignment = state
        .services
        .assignments
        .update(assignment_id, payload)
        .await?;
    Ok(success_response(assignment))
}

/// List open assignments
#[utoipa::path(
    get,
    path = "/api/v1/product-assignments/active",
    params(ListQuery),
    responses((status = 200, description = "Open assignments")),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn list_active_assignments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .assignments
        .active(query.page, query.limit)
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Assignment history with filters
#[utoipa::path(
    get,
    path = "/api/v1/product-assignments/history",
    params(AssignmentHistoryFilter),
    responses((status = 200, description = "Assignment history page")),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn assignment_history(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AssignmentHistoryFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = filter.page;
    let limit = filter.limit;
    let (items, total) = state.services.assignments.history(filter).await?;
    Ok(success_response(PageData::new(items, total, page, limit)))
}

/// Assignment history for one product
#[utoipa::path(
    get,
    path = "/api/v1/product-assignments/product/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Assignments for the product"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn assignments_for_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.assignments.for_product(product_id).await?;
    Ok(success_response(items))
}

/// Get a single assignment
#[utoipa::path(
    get,
    path = "/api/v1/product-assignments/:id",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment"),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "product-assignments"
)]
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let assignment = state.services.assignments.get(assignment_id).await?;
    Ok(success_response(assignment))
}

/// Creates the router for assignment endpoints
pub fn assignment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assign", post(assign_product))
        .route("/assign/bulk", post(assign_products_bulk))
        .route("/return/:id", post(return_product))
        .route("/active", get(list_active_assignments))
        .route("/history", get(assignment_history))
        .route("/product/:id", get(assignments_for_product))
        .route("/:id", get(get_assignment))
        .route("/:id", put(update_assignment))
}
