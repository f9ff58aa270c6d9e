//! Configuration module for tubesearch.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RerankPrompts};
pub use settings::{
    EmbeddingSettings, LinkSettings, PromptSettings, RerankSettings, RetrieverSettings,
    ServerSettings, Settings,
};
