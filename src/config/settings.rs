//! Configuration settings for tubesearch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub retriever: RetrieverSettings,
    pub rerank: RerankSettings,
    pub links: LinkSettings,
    pub prompts: PromptSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Hex SHA-256 digest of the accepted `X-API-Key` value.
    /// Requests are not authenticated when unset.
    pub api_key_hash: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key_hash: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (must match the index).
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    /// Index provider (pinecone, chroma, memory).
    pub provider: String,
    /// Number of candidates fetched per query.
    pub top_k: usize,
    /// Request timeout for the index.
    pub timeout_seconds: u64,
    /// Pinecone index host, e.g. `video-data-medium-xxxx.svc.pinecone.io`.
    pub pinecone_host: Option<String>,
    /// Pinecone namespace.
    pub pinecone_namespace: Option<String>,
    /// Environment variable holding the Pinecone API key.
    pub pinecone_api_key_env: String,
    /// Chroma server URL.
    pub chroma_url: String,
    /// Chroma collection ID.
    pub chroma_collection_id: Option<String>,
    /// JSON corpus for the memory provider.
    pub memory_path: Option<String>,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            provider: "pinecone".to_string(),
            top_k: 10,
            timeout_seconds: 30,
            pinecone_host: None,
            pinecone_namespace: None,
            pinecone_api_key_env: "PINECONE_API_KEY".to_string(),
            chroma_url: "http://localhost:8000".to_string(),
            chroma_collection_id: None,
            memory_path: None,
        }
    }
}

/// LLM reranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSettings {
    /// Chat model used to pick among candidates.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Default result count for multi-match searches.
    pub top_n: usize,
    /// Request timeout for the completion call.
    pub timeout_seconds: u64,
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            top_n: 5,
            timeout_seconds: 120,
        }
    }
}

/// Deep-link construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Watch URL up to (not including) the `=` before the video ID.
    pub watch_url: String,
    /// Use `1h2m3s` style offsets instead of plain seconds.
    pub use_fragment: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            watch_url: "https://www.youtube.com/watch?v".to_string(),
            use_fragment: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SearchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubesearch")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 3072);
        assert_eq!(settings.retriever.top_k, 10);
        assert_eq!(settings.rerank.top_n, 5);
        assert_eq!(settings.links.watch_url, "https://www.youtube.com/watch?v");
        assert!(settings.server.api_key_hash.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retriever]
            provider = "chroma"
            chroma_collection_id = "abc"

            [rerank]
            top_n = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.retriever.provider, "chroma");
        assert_eq!(settings.retriever.top_k, 10);
        assert_eq!(settings.rerank.top_n, 3);
        assert_eq!(settings.rerank.model, "gpt-4o-mini");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 9100;
        settings.links.use_fragment = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 9100);
        assert!(loaded.links.use_fragment);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded.server.port, 8000);
    }
}
