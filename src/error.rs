//! Error types for tubesearch.

use thiserror::Error;

/// Library-level error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index query failed: {0}")]
    Retrieval(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SearchError {
    /// Whether this error came from one of the remote capabilities
    /// (embedding, vector index, completion).
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            SearchError::Embedding(_)
                | SearchError::Retrieval(_)
                | SearchError::Completion(_)
                | SearchError::OpenAI(_)
                | SearchError::Http(_)
        )
    }
}

/// Result type alias for tubesearch operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_classification() {
        assert!(SearchError::Embedding("down".into()).is_capability());
        assert!(SearchError::Completion("timeout".into()).is_capability());
        assert!(!SearchError::MalformedTimestamp("5".into()).is_capability());
        assert!(!SearchError::InvalidInput("empty".into()).is_capability());
    }
}
