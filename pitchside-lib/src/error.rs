//! Error types for Pitchside

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Pitchside operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Pitchside operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Failed to chunk a document
    #[error("chunking error: {0}")]
    Chunking(String),

    /// Failed to store, persist or load the vector store
    #[error("store error: {0}")]
    Store(String),

    /// File, directory or tool not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The data directory produced no documents to index
    #[error("no documents found in {}", .0.display())]
    NoDocuments(PathBuf),

    /// An operation was attempted before the reporter finished initializing
    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    /// Invalid or unreadable configuration
    #[error("config error: {0}")]
    Config(String),

    /// The agent loop could not produce an answer
    #[error("agent error: {0}")]
    Agent(String),

    /// A remote model provider answered with an error
    #[error("provider error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Transport-level failure talking to a remote provider
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Returns `true` for failures that came from a remote model call.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_display_includes_status() {
        let err = Error::Provider {
            status: Some(429),
            message: "rate_limit_exceeded: slow down".to_string(),
        };
        assert_eq!(err.to_string(), "provider error (429): rate_limit_exceeded: slow down");
    }

    #[test]
    fn test_provider_display_without_status() {
        let err = Error::Provider {
            status: None,
            message: "empty choices".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: empty choices");
    }

    #[test]
    fn test_is_remote() {
        let remote = Error::Provider {
            status: Some(500),
            message: String::new(),
        };
        assert!(remote.is_remote());
        assert!(!Error::NotInitialized("agent").is_remote());
        assert!(!Error::NoDocuments(PathBuf::from("data")).is_remote());
    }
}
