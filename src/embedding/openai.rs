//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{Result, SearchError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("text-embedding-3-large", 3072)
    }

    /// Create a new OpenAI embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(SearchError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| SearchError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| SearchError::OpenAI(format!("Embedding API error: {}", e)))?;

        let mut embedding = response
            .data
            .into_iter()
            .min_by_key(|e| e.index)
            .map(|e| e.embedding)
            .ok_or_else(|| SearchError::Embedding("Empty embedding response".to_string()))?;

        // The index was built with a fixed width; never hand back a longer vector.
        embedding.truncate(self.dimensions);

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
