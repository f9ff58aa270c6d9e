//! Request handlers.

use super::error::ApiError;
use super::AppState;
use crate::search::{MatchEntry, SearchOutcome};
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest `n` accepted by the multi-result endpoint.
const MAX_RESULTS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MultiSearchRequest {
    pub text: String,
    #[serde(default)]
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MultiSearchResponse {
    pub results: Vec<MatchEntry>,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let Json(req) = payload?;
    let outcome = state.pipeline.search(&req.text).await?;
    Ok(Json(outcome))
}

pub async fn search_multiple(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MultiSearchRequest>, JsonRejection>,
) -> Result<Json<MultiSearchResponse>, ApiError> {
    let Json(req) = payload?;
    if let Some(n) = req.n {
        if n == 0 || n > MAX_RESULTS {
            return Err(ApiError::BadRequest(format!(
                "n must be between 1 and {}",
                MAX_RESULTS
            )));
        }
    }

    let results = state.pipeline.search_multiple(&req.text, req.n).await?;
    Ok(Json(MultiSearchResponse { results }))
}
