use super::common::{created_response, success_response, validate_input, ListQuery, PageData};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::users::{CreateUserInput, UpdateUserInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Create a system account (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserInput,
    responses(
        (status = 201, description = "User created"),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let user = state.services.users.create(payload).await?;
    Ok(created_response(user))
}

/// List system accounts (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListQuery),
    responses((status = 200, description = "User page")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state.services.users.list(query.page, query.limit).await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Get the authenticated caller's own account
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account"),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    current_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.users.get(current_user.user_id).await?,
    ))
}

/// Get a system account (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users/:id",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.users.get(id).await?))
}

/// Update role / password / active flag (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/:id",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.users.update(id, payload).await?,
    ))
}

/// Creates the router for user endpoints. `/me` is self-service for any
/// authenticated account; everything else requires admin authority.
pub fn user_routes() -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/", post(create_user))
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id", put(update_user))
        .layer(axum::middleware::from_fn(crate::auth::admin_middleware));

    Router::new().route("/me", get(get_current_user)).merge(admin)
}
