//! API error types mapped to HTTP status codes.
//!
//! Every variant produces a JSON body `{"detail": "message"}`.

use crate::error::SearchError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Detail returned for every server-side failure.
pub const GENERIC_FAILURE: &str = "An error occurred while searching";

/// Detail returned when the API key is missing or wrong.
pub const INVALID_API_KEY: &str = "Could not validate API key";

#[derive(Debug)]
pub enum ApiError {
    /// Invalid request parameters (400).
    BadRequest(String),
    /// Missing or invalid API key (403).
    Forbidden(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, axum::Json(json!({ "detail": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                // Details stay in the log; clients get one generic failure.
                error!(capability = other.is_capability(), "Search failed: {}", other);
                ApiError::Internal(GENERIC_FAILURE.to_string())
            }
        }
    }
}
