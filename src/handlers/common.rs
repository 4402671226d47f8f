use crate::errors::ServiceError;
use crate::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}

/// Common query parameters for list endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, capped server-side
    pub limit: Option<u64>,
    /// Free-text search term
    pub search: Option<String>,
}

/// Page of items plus pagination metadata, carried inside the envelope.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PageData<T> {
    pub fn new(items: Vec<T>, total: u64, page: Option<u64>, limit: Option<u64>) -> Self {
        let (page, limit) = crate::services::normalize_page(page, limit);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}
