//! HTTP middleware: request tracing, security headers, API-key check.

use super::error::{ApiError, INVALID_API_KEY};
use super::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying the client's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
];

/// Request tracing middleware.
pub async fn trace_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    debug!(%request_id, "→ {} {}", method, uri);

    let response = next.run(request).await;

    debug!(
        %request_id,
        "← {} {} {} ({:?})",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed()
    );

    response
}

/// Add browser hardening headers to every response.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

/// Reject requests whose `X-API-Key` does not hash to the configured digest.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key_hash.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    match provided {
        Some(key) if digests_match(&hash_api_key(key), expected) => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Invalid API key attempt");
            Err(ApiError::Forbidden(INVALID_API_KEY.to_string()))
        }
        None => {
            warn!(path = %request.uri().path(), "Request without API key");
            Err(ApiError::Forbidden(INVALID_API_KEY.to_string()))
        }
    }
}

/// Hex SHA-256 digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare hex digests in constant time.
fn digests_match(actual: &str, expected: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
