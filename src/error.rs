//! Error types for the Anamnesis intelligence layer
//!
//! This module provides structured error handling using thiserror for
//! error definitions and anyhow for propagation at the edges.
//!
//! The variants map onto four failure classes: unavailable dependencies
//! (`Embedding`, `Network`) which callers degrade around, malformed input
//! (`InvalidInput`) which fails before touching storage, unreachable
//! storage (`Database`) which is surfaced on retrieval and retried on
//! learning, and everything else. Insufficient data during prediction is
//! deliberately *not* an error; see [`crate::types::PredictionOutcome`].

use thiserror::Error;

/// Main error type for Anamnesis operations
#[derive(Error, Debug)]
pub enum AnamnesisError {
    /// Database operation failed or storage is unreachable
    #[error("Database error: {0}")]
    Database(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Network request failed (provider unreachable, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Input rejected before any storage access (empty query, empty concept)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Review record not found
    #[error("Review not found: {0}")]
    ReviewNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Anamnesis operations
pub type Result<T> = std::result::Result<T, AnamnesisError>;

impl From<libsql::Error> for AnamnesisError {
    fn from(err: libsql::Error) -> Self {
        AnamnesisError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to AnamnesisError
impl From<anyhow::Error> for AnamnesisError {
    fn from(err: anyhow::Error) -> Self {
        AnamnesisError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnamnesisError::ReviewNotFound("rev-42".to_string());
        assert_eq!(err.to_string(), "Review not found: rev-42");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = AnamnesisError::InvalidInput("query is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: query is empty");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AnamnesisError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AnamnesisError::Other(_)));
    }
}
