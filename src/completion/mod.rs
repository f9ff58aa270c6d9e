//! Text completion capability used by the reranker.

mod openai;

pub use openai::OpenAICompletion;

use crate::error::Result;
use async_trait::async_trait;

/// A single-round-trip text completion service.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Complete `user_prompt` under `system_instruction` and return the text.
    async fn complete(&self, system_instruction: &str, user_prompt: &str) -> Result<String>;
}
