//! Pinecone vector index client.
//!
//! Pinecone reports similarity scores, so no inversion is needed.

use super::{normalize_candidates, Candidate, Retriever, ScoreConvention};
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Retriever backed by a Pinecone index's `/query` endpoint.
pub struct PineconeRetriever {
    client: reqwest::Client,
    query_url: Url,
    namespace: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeRetriever {
    /// Create a client for the index served at `host`.
    ///
    /// `host` may omit the scheme, in which case https is assumed.
    pub fn new(host: &str, api_key: String, namespace: Option<String>, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SearchError::Config("Missing Pinecone API key".to_string()));
        }

        let host = host.trim().trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/", host)
        } else {
            format!("https://{}/", host)
        };
        let query_url = Url::parse(&base)
            .and_then(|u| u.join("query"))
            .map_err(|e| SearchError::Config(format!("Invalid Pinecone host {:?}: {}", host, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| SearchError::Config("Invalid Pinecone API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            query_url,
            namespace: namespace.filter(|n| !n.is_empty()),
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }
}

#[async_trait]
impl Retriever for PineconeRetriever {
    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let body = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let response = self.client.post(self.query_url.clone()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchError::Retrieval(format!("Pinecone returned {}: {}", status, detail)));
        }

        let parsed: QueryResponse = response.json().await?;
        let candidates = candidates_from_response(parsed);
        debug!("Pinecone returned {} candidates", candidates.len());
        Ok(candidates)
    }
}

fn candidates_from_response(response: QueryResponse) -> Vec<Candidate> {
    let candidates = response
        .matches
        .into_iter()
        .map(|m| {
            let metadata = m.metadata.unwrap_or_default();
            let text = metadata
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Candidate::new(m.id, m.score, metadata, text)
        })
        .collect();

    normalize_candidates(candidates, ScoreConvention::Similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_url_from_bare_host() {
        let retriever = PineconeRetriever::new(
            "video-data-abc123.svc.pinecone.io",
            "key".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            retriever.query_url().as_str(),
            "https://video-data-abc123.svc.pinecone.io/query"
        );
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(PineconeRetriever::new("host", "  ".to_string(), None, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 10,
            include_metadata: true,
            namespace: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["topK"], 10);
        assert_eq!(value["includeMetadata"], true);
        assert!(value.get("namespace").is_none());
    }

    #[test]
    fn test_candidates_from_response() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "b", "score": 0.4, "metadata": {"video_id": "v2", "start_time": "00:02:00"}},
                {"id": "a", "score": 0.9, "metadata": {"video_id": "v1", "start_time": "00:01:00", "text": "goal"}},
                {"id": "c", "score": 0.1}
            ],
            "namespace": ""
        }))
        .unwrap();

        let candidates = candidates_from_response(response);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].id, "a");
        assert_eq!(candidates[0].text, "goal");
        assert_eq!(candidates[0].item_id(), Some("v1"));
        assert!(candidates[2].metadata.is_empty());
    }
}
