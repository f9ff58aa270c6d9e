//! In-memory retriever backed by a local JSON corpus.
//!
//! Useful for testing and small, offline datasets.

use super::{cosine_similarity, normalize_candidates, Candidate, Retriever, ScoreConvention};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, instrument};

/// A transcript segment together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSegment {
    pub id: String,
    #[serde(alias = "values", alias = "embedding")]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub text: String,
}

/// In-memory retriever using exhaustive cosine similarity.
///
/// The corpus is read once at startup and never mutated.
pub struct MemoryRetriever {
    segments: Vec<IndexedSegment>,
}

impl MemoryRetriever {
    /// Create a retriever over the given segments.
    pub fn with_segments(segments: Vec<IndexedSegment>) -> Self {
        Self { segments }
    }

    /// Load segments from a JSON array file.
    #[instrument(skip_all)]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let segments: Vec<IndexedSegment> = serde_json::from_str(&content)?;
        info!("Loaded {} segments from {:?}", segments.len(), path);
        Ok(Self::with_segments(segments))
    }

    /// Number of indexed segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Retriever for MemoryRetriever {
    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let scored: Vec<Candidate> = self
            .segments
            .iter()
            .map(|segment| {
                Candidate::new(
                    segment.id.clone(),
                    cosine_similarity(vector, &segment.vector),
                    segment.metadata.clone(),
                    segment.text.clone(),
                )
            })
            .collect();

        let mut results = normalize_candidates(scored, ScoreConvention::Similarity);
        results.truncate(k);

        debug!("Memory index returned {} candidates", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use serde_json::json;
    use std::io::Write;

    fn segment(id: &str, vector: Vec<f32>, text: &str) -> IndexedSegment {
        IndexedSegment {
            id: id.to_string(),
            vector,
            metadata: Map::new(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_retriever_orders_by_similarity() {
        let retriever = MemoryRetriever::with_segments(vec![
            segment("a", vec![0.0, 1.0, 0.0], "Goodbye world"),
            segment("b", vec![1.0, 0.0, 0.0], "Hello world"),
            segment("c", vec![0.7, 0.7, 0.0], "Hello-ish"),
        ]);

        assert_eq!(retriever.len(), 3);

        let results = retriever.nearest(&[1.0, 0.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let top = retriever.nearest(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].text, "Hello world");
    }

    #[tokio::test]
    async fn test_empty_retriever() {
        let retriever = MemoryRetriever::with_segments(Vec::new());
        assert!(retriever.is_empty());
        assert!(retriever.nearest(&[1.0], 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_load_from_json_file() {
        let corpus = json!([
            {
                "id": "seg-1",
                "values": [0.1, 0.2],
                "metadata": {"video_id": "abc", "start_time": "00:01:30", "text": "a goal"}
            },
            {"id": "seg-2", "vector": [0.3, 0.4], "text": "flat"}
        ]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(corpus.to_string().as_bytes()).unwrap();

        let retriever = MemoryRetriever::from_json_file(file.path()).unwrap();
        assert_eq!(retriever.len(), 2);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(matches!(
            MemoryRetriever::from_json_file(file.path()),
            Err(SearchError::Json(_))
        ));
    }
}
