//! Error types for the `kb-rag` crate.

use thiserror::Error;

/// Errors that can occur at the provider, store, and configuration seams.
///
/// The retrieval engine itself never surfaces these from `search`; embedding
/// failures there are logged and turned into a switch to keyword mode.
#[derive(Debug, Error)]
pub enum KbError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding did not match the dimensionality already held by the store.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the embeddings already in the store.
        expected: usize,
        /// Dimensionality of the rejected embedding.
        actual: usize,
    },

    /// A document failed validation on ingestion.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for knowledge base operations.
pub type Result<T> = std::result::Result<T, KbError>;
