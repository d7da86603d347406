//! REST API module for HTTP endpoints
//!
//! - `GET /api/status` - Full current snapshot
//! - `POST /api/status` - Upsert a member's status
//! - `DELETE /api/status/:name` - Remove a member and its history
//! - `GET /api/history` - Paginated history of all members
//! - `GET /api/history/:name` - Paginated history of one member
//! - `GET /api/stats` - Subscriber and member counts

pub mod history;
pub mod status;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::realtime::BroadcastError;
use crate::service::ServiceError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
            status,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ServiceError::Store(_) => {
                tracing::error!(error = %e, "store failure");
                ApiError::internal(e.to_string())
            }
            ServiceError::Unavailable(_) => ApiError::unavailable(e.to_string()),
        }
    }
}

impl From<BroadcastError> for ApiError {
    fn from(e: BroadcastError) -> Self {
        match e {
            BroadcastError::Registry(_) => ApiError::unavailable(e.to_string()),
            _ => ApiError::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_mapping() {
        let not_found: ApiError = ServiceError::NotFound("A".to_string()).into();
        let invalid: ApiError = ServiceError::Validation("name is required".to_string()).into();

        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, "NOT_FOUND");
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error, "name is required");
    }

    #[test]
    fn test_error_body_shape() {
        let json = serde_json::to_value(ApiError::unavailable("down")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "down", "code": "SERVICE_UNAVAILABLE"}));
    }
}
