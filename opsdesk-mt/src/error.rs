//! API error type for opsdesk-mt
//!
//! Every handler failure is rendered as a JSON body of the shape
//! `{"error": {"code", "message"}}`. A training pipeline fault reaches
//! the client as a single 500; there is no partial-success response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No stored record for the requested customer (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Request parameters outside the accepted domain (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Pipeline fault surfaced by the orchestrator (500)
    #[error(transparent)]
    Training(#[from] anyhow::Error),

    /// Shared-layer failure reached a handler directly (500)
    #[error("Common error: {0}")]
    Common(#[from] opsdesk_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Training(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
