//! Chroma collection client.
//!
//! Chroma reports distances; they are converted to scores before the
//! candidates leave this module.

use super::{normalize_candidates, Candidate, Retriever, ScoreConvention};
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Retriever backed by a Chroma collection's query endpoint.
pub struct ChromaRetriever {
    client: reqwest::Client,
    query_url: Url,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 3],
}

/// Column-oriented query result; one row per query embedding.
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

impl ChromaRetriever {
    /// Create a client for `collection_id` on the server at `base_url`.
    pub fn new(base_url: &str, collection_id: &str, timeout: Duration) -> Result<Self> {
        if collection_id.trim().is_empty() {
            return Err(SearchError::Config("Missing Chroma collection id".to_string()));
        }

        let base = format!("{}/", base_url.trim().trim_end_matches('/'));
        let query_url = Url::parse(&base)
            .and_then(|u| u.join(&format!("api/v1/collections/{}/query", collection_id.trim())))
            .map_err(|e| SearchError::Config(format!("Invalid Chroma URL {:?}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, query_url })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }
}

#[async_trait]
impl Retriever for ChromaRetriever {
    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let body = QueryRequest {
            query_embeddings: [vector],
            n_results: k,
            include: ["documents", "metadatas", "distances"],
        };

        let response = self.client.post(self.query_url.clone()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchError::Retrieval(format!("Chroma returned {}: {}", status, detail)));
        }

        let parsed: QueryResponse = response.json().await?;
        let candidates = candidates_from_response(parsed);
        debug!("Chroma returned {} candidates", candidates.len());
        Ok(candidates)
    }
}

fn candidates_from_response(response: QueryResponse) -> Vec<Candidate> {
    let QueryResponse {
        ids,
        documents,
        metadatas,
        distances,
    } = response;

    let ids = ids.into_iter().next().unwrap_or_default();
    let mut documents = documents.and_then(|d| d.into_iter().next()).unwrap_or_default().into_iter();
    let mut metadatas = metadatas.and_then(|m| m.into_iter().next()).unwrap_or_default().into_iter();
    let mut distances = distances.and_then(|d| d.into_iter().next()).unwrap_or_default().into_iter();

    let candidates = ids
        .into_iter()
        .map(|id| {
            let text = documents.next().flatten().unwrap_or_default();
            let metadata = metadatas.next().flatten().unwrap_or_default();
            // A missing distance ranks last.
            let distance = distances.next().flatten().unwrap_or(f32::INFINITY);
            Candidate::new(id, distance, metadata, text)
        })
        .collect();

    normalize_candidates(candidates, ScoreConvention::Distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_url() {
        let retriever = ChromaRetriever::new("http://localhost:8000/", "abc-123", Duration::from_secs(5)).unwrap();
        assert_eq!(
            retriever.query_url().as_str(),
            "http://localhost:8000/api/v1/collections/abc-123/query"
        );
        assert!(ChromaRetriever::new("http://localhost:8000", "", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = QueryRequest {
            query_embeddings: [&[0.5, 0.5]],
            n_results: 10,
            include: ["documents", "metadatas", "distances"],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["query_embeddings"], json!([[0.5, 0.5]]));
        assert_eq!(value["n_results"], 10);
    }

    #[test]
    fn test_distances_become_descending_scores() {
        let response: QueryResponse = serde_json::from_value(json!({
            "ids": [["far", "near", "unknown"]],
            "documents": [["far text", "near text", null]],
            "metadatas": [[{"video_id": "v2"}, {"video_id": "v1", "start_time": "00:00:10"}, null]],
            "distances": [[1.5, 0.2, null]]
        }))
        .unwrap();

        let candidates = candidates_from_response(response);
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "unknown"]);
        assert_eq!(candidates[0].text, "near text");
        assert_eq!(candidates[0].item_id(), Some("v1"));
        assert_eq!(candidates[2].score, 0.0);
    }

    #[test]
    fn test_empty_response() {
        assert!(candidates_from_response(QueryResponse::default()).is_empty());
    }
}
