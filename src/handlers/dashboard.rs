use super::common::success_response;
use crate::{errors::ServiceError, handlers::AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use std::sync::Arc;

/// Dashboard aggregation payload
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard payload", body = crate::services::dashboard::DashboardPayload)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let payload = state.services.dashboard.dashboard().await?;
    Ok(success_response(payload))
}

/// Creates the router for the dashboard endpoint
pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_dashboard))
}
