//! In-memory knowledge base retrieval.
//!
//! This crate provides:
//! - An append-only [`DocumentStore`] with lookup by id and category
//! - Sentence-based chunking for excerpt selection
//! - A [`RetrievalEngine`] that ranks documents by embedding similarity and
//!   falls back to keyword scoring when no provider is available or the
//!   provider fails
//! - The static company corpus in [`seed_documents`]
//!
//! The OpenAI-compatible embedding provider is behind the `openai` feature.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod keyword;
pub mod seed;
pub mod similarity;
pub mod store;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, DEFAULT_MAX_CHUNK_LEN, SentenceChunker};
pub use config::{EmbeddingConfig, RetrievalConfig, RetrievalConfigBuilder};
pub use document::{Category, Document, DocumentMetadata, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{KnowledgeBaseStats, RetrievalEngine, RetrievalEngineBuilder, SearchMode};
pub use error::{KbError, Result};
pub use seed::seed_documents;
pub use similarity::cosine_similarity;
pub use store::DocumentStore;

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
