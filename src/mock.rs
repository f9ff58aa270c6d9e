//! Test doubles for the remote capabilities.

use crate::completion::Completion;
use crate::embedding::Embedder;
use crate::error::{Result, SearchError};
use crate::retrieval::{Candidate, Retriever};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a candidate with the usual metadata fields.
pub fn candidate(id: &str, score: f32, video_id: &str, start_time: &str, text: &str) -> Candidate {
    let metadata: Map<String, Value> = json!({
        "video_id": video_id,
        "start_time": start_time,
        "text": text,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    Candidate::new(id, score, metadata, text)
}

/// Embedder returning the same vector for every input.
pub struct StaticEmbedder {
    vector: Vec<f32>,
    dimensions: usize,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self::with_dimensions(vector, dimensions)
    }

    /// Report `dimensions` regardless of the vector actually returned.
    pub fn with_dimensions(vector: Vec<f32>, dimensions: usize) -> Self {
        Self {
            vector,
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(SearchError::Embedding("embedding service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Retriever returning a fixed candidate list, truncated to `k`.
pub struct FixedRetriever {
    candidates: Vec<Candidate>,
}

impl FixedRetriever {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn nearest(&self, _vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        Ok(self.candidates.iter().take(k).cloned().collect())
    }
}

/// Completion returning a canned reply and recording prompts.
pub struct ScriptedCompletion {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(&self, _system_instruction: &str, user_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| SearchError::Completion("completion service unavailable".to_string()))
    }
}
