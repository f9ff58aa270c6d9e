//! HTTP API server.
//!
//! Exposes the search pipeline over JSON endpoints:
//!
//! - `GET  /health`
//! - `POST /search` `{"text": ...}` → single best match or not-found
//! - `POST /search/multiple` `{"text": ..., "n": 5}` → ranked results

pub mod error;
mod handlers;
pub mod middleware;

pub use error::ApiError;

use crate::search::SearchPipeline;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state, built once at startup.
pub struct AppState {
    pub pipeline: SearchPipeline,
    /// Hex SHA-256 of the accepted API key; `None` disables the check.
    pub api_key_hash: Option<String>,
}

impl AppState {
    pub fn new(pipeline: SearchPipeline, api_key_hash: Option<String>) -> Self {
        Self {
            pipeline,
            api_key_hash: api_key_hash.filter(|h| !h.trim().is_empty()),
        }
    }
}

/// Build the router with all routes and layers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let search_routes = Router::new()
        .route("/search", post(handlers::search))
        .route("/search/", post(handlers::search))
        .route("/search/multiple", post(handlers::search_multiple))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(search_routes)
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::trace_request))
        .layer(cors)
        .with_state(state)
}
