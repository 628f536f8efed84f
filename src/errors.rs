//! Error types for ChatDoc
//!
//! `RagError` is the taxonomy surfaced by every core operation. Provider
//! clients report `ProviderError`, which the pipeline wraps as the source of
//! an embedding or generation failure.

use thiserror::Error;

/// Main error type for the RAG core
#[derive(Error, Debug)]
pub enum RagError {
    /// Bad, unreadable or empty input document
    #[error("Failed to load document: {0}")]
    Load(String),

    /// Invalid chunking, retrieval or prompt parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider failure or inconsistent vectors
    #[error("Embedding failed: {0}")]
    Embedding(#[source] ProviderError),

    /// Ingest produced no chunks or vectors
    #[error("Cannot build an index from zero entries")]
    EmptyIndex,

    /// Query vector incompatible with the index
    #[error("Dimension mismatch: index holds {expected}-dim vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Question asked before a successful ingest
    #[error("No document has been indexed yet; ingest a document first")]
    NotReady,

    /// Language model failure
    #[error("Answer generation failed: {0}")]
    Generation(#[source] ProviderError),

    /// Session state machine violation
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl RagError {
    /// Stable kind name shown to users next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::Load(_) => "LoadError",
            RagError::Config(_) => "ConfigError",
            RagError::Embedding(_) => "EmbeddingError",
            RagError::EmptyIndex => "EmptyIndexError",
            RagError::DimensionMismatch { .. } => "DimensionMismatchError",
            RagError::NotReady => "NotReadyError",
            RagError::Generation(_) => "GenerationError",
            RagError::InvalidTransition { .. } => "StateError",
        }
    }
}

/// Errors raised by embedding and language-model backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the provider
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be interpreted
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// Call exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// API key env var unset or empty
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    /// Vector dimensionality differs from earlier vectors
    #[error("Inconsistent embedding dimension: expected {expected}, got {actual}")]
    InconsistentDimension { expected: usize, actual: usize },

    /// Provider returned a different number of vectors than inputs
    #[error("Provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

impl ProviderError {
    /// Whether a caller-side retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Timeout { .. } => true,
            ProviderError::Malformed(_)
            | ProviderError::MissingCredential(_)
            | ProviderError::InconsistentDimension { .. }
            | ProviderError::CountMismatch { .. } => false,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RagError::NotReady.kind(), "NotReadyError");
        assert_eq!(RagError::EmptyIndex.kind(), "EmptyIndexError");
        assert_eq!(RagError::Load("x".into()).kind(), "LoadError");
        assert_eq!(
            RagError::Embedding(ProviderError::Malformed("x".into())).kind(),
            "EmbeddingError"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = RagError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("384"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout { duration_ms: 10 }.is_transient());
        assert!(ProviderError::Status {
            status: 429,
            body: "rate limited".into()
        }
        .is_transient());
        assert!(ProviderError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ProviderError::Status {
            status: 401,
            body: "bad key".into()
        }
        .is_transient());
        assert!(!ProviderError::MissingCredential("GROQ_API_KEY".into()).is_transient());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;
        let err = RagError::Generation(ProviderError::Timeout { duration_ms: 5 });
        assert!(err.source().is_some());
    }
}
