use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetTrack API",
        version = env!("CARGO_PKG_VERSION"),
        description = r#"
# AssetTrack API

REST backend for company asset management: a product registry, an
assignment lifecycle (assign, return, lose, damage), directory data
(branches, categories, departments, employees), system accounts and a
dashboard aggregation view.

## Authentication

All `/api/v1` endpoints require a bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

## Pagination

List endpoints accept `page` (1-based), `limit` (capped at 100) and
`search` query parameters.

## Idempotency

Mutating endpoints honor an `Idempotency-Key` header: repeating a key
within ten minutes replays the stored response instead of re-executing
the mutation.
"#
    ),
    tags(
        (name = "product-assignments", description = "Assignment lifecycle and history"),
        (name = "products", description = "Asset registry"),
        (name = "directory", description = "Branches, categories, departments and employees"),
        (name = "users", description = "System account administration"),
        (name = "dashboard", description = "Aggregated reporting")
    ),
    paths(
        // Assignments
        crate::handlers::assignments::assign_product,
        crate::handlers::assignments::assign_products_bulk,
        crate::handlers::assignments::return_product,
        crate::handlers::assignments::update_assignment,
        crate::handlers::assignments::list_active_assignments,
        crate::handlers::assignments::assignment_history,
        crate::handlers::assignments::assignments_for_product,
        crate::handlers::assignments::get_assignment,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::list_assigned_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::generate_product_qr,

        // Directory
        crate::handlers::directory::create_branch,
        crate::handlers::directory::list_branches,
        crate::handlers::directory::get_branch,
        crate::handlers::directory::update_branch,
        crate::handlers::directory::delete_branch,
        crate::handlers::directory::create_category,
        crate::handlers::directory::list_categories,
        crate::handlers::directory::get_category,
        crate::handlers::directory::update_category,
        crate::handlers::directory::delete_category,
        crate::handlers::directory::create_department,
        crate::handlers::directory::list_departments,
        crate::handlers::directory::get_department,
        crate::handlers::directory::update_department,
        crate::handlers::directory::delete_department,
        crate::handlers::directory::create_employee,
        crate::handlers::directory::list_employees,
        crate::handlers::directory::get_employee,
        crate::handlers::directory::update_employee,
        crate::handlers::directory::delete_employee,

        // Users
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::get_current_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,

        // Dashboard
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Envelope
            crate::ApiResponse<serde_json::Value>,

            // Assignment types
            crate::entities::AssignmentStatus,
            crate::entities::AssignmentCondition,
            crate::services::assignments::AssignProductInput,
            crate::services::assignments::BulkAssignInput,
            crate::services::assignments::BulkAssignOutcome,
            crate::services::assignments::BulkAssignFailure,
            crate::services::assignments::CloseAssignmentInput,
            crate::services::assignments::UpdateAssignmentInput,

            // Product types
            crate::services::products::CreateProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::products::ProductDetail,
            crate::services::products::CurrentAssignment,
            crate::services::products::QrCodePayload,

            // Directory types
            crate::services::directory::BranchInput,
            crate::services::directory::CategoryInput,
            crate::services::directory::DepartmentInput,
            crate::services::directory::EmployeeInput,

            // User / auth types
            crate::entities::user::UserRole,
            crate::services::users::CreateUserInput,
            crate::services::users::UpdateUserInput,
            crate::auth::LoginRequest,
            crate::auth::RegisterRequest,
            crate::auth::LoginResponse,
            crate::auth::SessionUser,

            // Dashboard types
            crate::services::dashboard::DashboardPayload,
            crate::services::dashboard::DashboardSummary,
            crate::services::dashboard::TrendPoint,
            crate::services::dashboard::RecentActivity,
            crate::services::dashboard::CategorySlice,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
