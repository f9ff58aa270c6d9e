//! Nearest-neighbour retrieval over transcript segments.
//!
//! Provides a trait-based interface over the vector index backends. Every
//! backend hands back candidates ordered by descending `score`, whatever
//! convention the underlying index reports in.

mod chroma;
mod memory;
mod pinecone;

pub use chroma::ChromaRetriever;
pub use memory::{IndexedSegment, MemoryRetriever};
pub use pinecone::PineconeRetriever;

use crate::config::Settings;
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Metadata keys that may carry the video identifier, in lookup order.
const ITEM_ID_KEYS: &[&str] = &["video_id", "id"];

/// Metadata keys that may carry the segment start time, in lookup order.
const START_TIME_KEYS: &[&str] = &["start_time", "start_seconds", "start"];

/// Metadata key holding the transcript excerpt when it is not a top-level field.
const TEXT_KEY: &str = "text";

/// A retrieved transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Record ID in the vector index.
    pub id: String,
    /// Relevance score (higher is better).
    pub score: f32,
    /// Free-form metadata attached to the record.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Transcript excerpt, when the index returns it as a separate field.
    #[serde(default)]
    pub text: String,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(id: impl Into<String>, score: f32, metadata: Map<String, Value>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
            text: text.into(),
        }
    }

    /// The excerpt shown to the reranker: the flat `text` field, or the
    /// `text` metadata entry for records that nest it.
    pub fn excerpt(&self) -> &str {
        if !self.text.trim().is_empty() {
            return &self.text;
        }
        self.metadata
            .get(TEXT_KEY)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Video identifier from metadata, falling back to the record ID.
    pub fn item_id(&self) -> Option<&str> {
        ITEM_ID_KEYS
            .iter()
            .filter_map(|key| self.metadata.get(*key).and_then(Value::as_str))
            .chain(std::iter::once(self.id.as_str()))
            .map(str::trim)
            .find(|id| !id.is_empty())
    }

    /// Raw start-time value, skipping nulls and blank strings.
    pub fn start_time(&self) -> Option<&Value> {
        START_TIME_KEYS
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .find(|value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }
}

/// How an index reports relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreConvention {
    /// Similarity: higher is more relevant.
    Similarity,
    /// Distance: lower is more relevant.
    Distance,
}

impl ScoreConvention {
    /// Map a raw index value onto "higher is more relevant".
    pub fn normalize(self, raw: f32) -> f32 {
        match self {
            ScoreConvention::Similarity => raw,
            ScoreConvention::Distance => {
                if raw.is_nan() || raw < 0.0 {
                    0.0
                } else {
                    1.0 / (1.0 + raw)
                }
            }
        }
    }
}

/// Normalize raw scores in place and order candidates by descending score.
pub fn normalize_candidates(mut candidates: Vec<Candidate>, convention: ScoreConvention) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.score = convention.normalize(candidate.score);
    }
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

/// Trait for vector index backends.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` candidates nearest to `vector`, most relevant first.
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>>;
}

/// Build the retriever named by `retriever.provider`.
pub fn create_retriever(settings: &Settings) -> Result<Arc<dyn Retriever>> {
    let retriever = &settings.retriever;
    let timeout = Duration::from_secs(retriever.timeout_seconds);

    match retriever.provider.to_lowercase().as_str() {
        "pinecone" => {
            let host = retriever.pinecone_host.as_deref().ok_or_else(|| {
                SearchError::Config("retriever.pinecone_host is required for the pinecone provider".to_string())
            })?;
            let api_key = std::env::var(&retriever.pinecone_api_key_env).map_err(|_| {
                SearchError::Config(format!("{} is not set", retriever.pinecone_api_key_env))
            })?;
            Ok(Arc::new(PineconeRetriever::new(
                host,
                api_key,
                retriever.pinecone_namespace.clone(),
                timeout,
            )?))
        }
        "chroma" => {
            let collection = retriever.chroma_collection_id.as_deref().ok_or_else(|| {
                SearchError::Config("retriever.chroma_collection_id is required for the chroma provider".to_string())
            })?;
            Ok(Arc::new(ChromaRetriever::new(&retriever.chroma_url, collection, timeout)?))
        }
        "memory" => {
            let path = retriever.memory_path.as_deref().ok_or_else(|| {
                SearchError::Config("retriever.memory_path is required for the memory provider".to_string())
            })?;
            let memory = MemoryRetriever::from_json_file(&Settings::expand_path(path))?;
            if memory.is_empty() {
                warn!(path = %path, "Memory corpus has no segments; every search will come back empty");
            }
            Ok(Arc::new(memory))
        }
        other => Err(SearchError::Config(format!("Unknown retriever provider: {}", other))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
