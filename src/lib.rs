/*!
AssetTrack API: asset registry, assignment lifecycle, directory data and
dashboard reporting over HTTP/JSON.
*/

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Extension, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::middleware_helpers::idempotency::{idempotency_middleware, IdempotencyStore};
use crate::middleware_helpers::request_id::request_id_middleware;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

// Common response wrappers

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: middleware_helpers::request_id::current_request_id(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Versioned API routes. Everything here sits behind bearer auth; user
/// administration additionally requires an admin role. The idempotency
/// layer runs inside auth so replay keys are scoped to the authenticated
/// caller and failed auth never reaches the store.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    let authenticated = Router::new()
        .nest(
            "/product-assignments",
            handlers::assignments::assignment_routes(),
        )
        .nest("/products", handlers::products::product_routes())
        .nest("/branches", handlers::directory::branch_routes())
        .nest("/categories", handlers::directory::category_routes())
        .nest("/departments", handlers::directory::department_routes())
        .nest("/employees", handlers::directory::employee_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .layer(axum::middleware::from_fn(idempotency_middleware))
        .with_auth();

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(authenticated)
}

/// Full application router: auth endpoints, the versioned API, OpenAPI docs
/// and the cross-cutting middleware stack.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/auth", auth::auth_routes().with_state(state.auth.clone()))
        .nest("/api/v1", api_v1_routes().with_state(state.clone()))
        .merge(openapi::swagger_ui())
        .layer(Extension(IdempotencyStore::new()))
        .layer(Extension(state.auth.clone()))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "assettrack-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(ApiResponse::success(json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use crate::middleware_helpers::request_id::{scope_request_id, RequestId};

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            scope_request_id(RequestId::new("meta-123"), async { ApiResponse::success("ok") })
                .await;

        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
    }

    #[test]
    fn error_response_carries_message() {
        let response: ApiResponse<()> = ApiResponse::error("nope");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("nope"));
        assert!(response.data.is_none());
    }
}
