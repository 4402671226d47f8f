use super::common::{
    created_response, no_content_response, success_response, validate_input, ListQuery, PageData,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::directory::{BranchInput, CategoryInput, DepartmentInput, EmployeeInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

// ---- branches ----

/// Create a branch
#[utoipa::path(
    post,
    path = "/api/v1/branches",
    request_body = BranchInput,
    responses(
        (status = 201, description = "Branch created"),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn create_branch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BranchInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let branch = state.services.directory.create_branch(payload).await?;
    Ok(created_response(branch))
}

/// List branches
#[utoipa::path(
    get,
    path = "/api/v1/branches",
    params(ListQuery),
    responses((status = 200, description = "Branch page")),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn list_branches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .directory
        .list_branches(query.page, query.limit, query.search.clone())
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Get a branch
#[utoipa::path(
    get,
    path = "/api/v1/branches/:id",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn get_branch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.directory.get_branch(id).await?,
    ))
}

/// Update a branch
#[utoipa::path(
    put,
    path = "/api/v1/branches/:id",
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = BranchInput,
    responses(
        (status = 200, description = "Branch updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn update_branch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BranchInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.directory.update_branch(id, payload).await?,
    ))
}

/// Delete a branch
#[utoipa::path(
    delete,
    path = "/api/v1/branches/:id",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 204, description = "Branch deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Branch still has products", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn delete_branch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.directory.delete_branch(id).await?;
    Ok(no_content_response())
}

pub fn branch_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_branch))
        .route("/", get(list_branches))
        .route("/:id", get(get_branch))
        .route("/:id", put(update_branch))
        .route("/:id", delete(delete_branch))
}

// ---- categories ----

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created"),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let category = state.services.directory.create_category(payload).await?;
    Ok(created_response(category))
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(ListQuery),
    responses((status = 200, description = "Category page")),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .directory
        .list_categories(query.page, query.limit, query.search.clone())
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.directory.get_category(id).await?,
    ))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    Ok(success_response(
        state
            .services
            .directory
            .update_category(id, payload)
            .await?,
    ))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.directory.delete_category(id).await?;
    Ok(no_content_response())
}

pub fn category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_category))
        .route("/", get(list_categories))
        .route("/:id", get(get_category))
        .route("/:id", put(update_category))
        .route("/:id", delete(delete_category))
}

// ---- departments ----

/// Create a department
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = DepartmentInput,
    responses(
        (status = 201, description = "Department created"),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DepartmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let department = state.services.directory.create_department(payload).await?;
    Ok(created_response(department))
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    params(ListQuery),
    responses((status = 200, description = "Department page")),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .directory
        .list_departments(query.page, query.limit, query.search.clone())
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.directory.get_department(id).await?,
    ))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = DepartmentInput,
    responses(
        (status = 200, description = "Department updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn update_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    Ok(success_response(
        state
            .services
            .directory
            .update_department(id, payload)
            .await?,
    ))
}

/// Delete a department
#[utoipa::path(
    delete,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Department still has products", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.directory.delete_department(id).await?;
    Ok(no_content_response())
}

pub fn department_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_department))
        .route("/", get(list_departments))
        .route("/:id", get(get_department))
        .route("/:id", put(update_department))
        .route("/:id", delete(delete_department))
}

// ---- employees ----

/// Create an employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created"),
        (status = 409, description = "Employee id already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmployeeInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let employee = state.services.directory.create_employee(payload).await?;
    Ok(created_response(employee))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(ListQuery),
    responses((status = 200, description = "Employee page")),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .directory
        .list_employees(query.page, query.limit, query.search.clone())
        .await?;
    Ok(success_response(PageData::new(
        items,
        total,
        query.page,
        query.limit,
    )))
}

/// Get an employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.directory.get_employee(id).await?,
    ))
}

/// Update an employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee id already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeeInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    Ok(success_response(
        state
            .services
            .directory
            .update_employee(id, payload)
            .await?,
    ))
}

/// Delete an employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee holds assigned products", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.directory.delete_employee(id).await?;
    Ok(no_content_response())
}

pub fn employee_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_employee))
        .route("/", get(list_employees))
        .route("/:id", get(get_employee))
        .route("/:id", put(update_employee))
        .route("/:id", delete(delete_employee))
}
