//! OpenAI chat completion implementation.

use super::Completion;
use crate::error::{Result, SearchError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat-completions client.
pub struct OpenAICompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAICompletion {
    /// Create a completion client for `model`.
    pub fn new(model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completion for OpenAICompletion {
    #[instrument(skip(self, system_instruction, user_prompt), fields(model = %self.model))]
    async fn complete(&self, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_instruction.to_string())
                .build()
                .map_err(|e| SearchError::Completion(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt.to_string())
                .build()
                .map_err(|e| SearchError::Completion(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| SearchError::Completion(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            SearchError::OpenAI(format!("Failed to generate completion: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SearchError::Completion("Empty response from LLM".to_string()))?
            .clone();

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_creation() {
        let completion = OpenAICompletion::new("gpt-4o-mini", 0.0, Duration::from_secs(30)).unwrap();
        assert_eq!(completion.model(), "gpt-4o-mini");
    }
}
