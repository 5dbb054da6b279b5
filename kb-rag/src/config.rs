//! Configuration for the retrieval engine and the embedding provider.

use serde::{Deserialize, Serialize};

use crate::chunking::DEFAULT_MAX_CHUNK_LEN;
use crate::error::{KbError, Result};

/// Environment variable holding the embedding API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the embedding model.
pub const MODEL_ENV: &str = "KB_EMBEDDING_MODEL";
/// Environment variable overriding the embedding dimensionality.
pub const DIMENSIONS_ENV: &str = "KB_EMBEDDING_DIMENSIONS";
/// Environment variable overriding the embedding API base URL.
pub const BASE_URL_ENV: &str = "KB_EMBEDDING_BASE_URL";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Dimensionality of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
/// The default embedding API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Tuning parameters for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Maximum chunk (and excerpt) length in characters.
    pub max_chunk_len: usize,
    /// Number of results returned when the caller gives no limit.
    pub default_limit: usize,
    /// Cosine similarity a document must exceed to be returned in embedding mode.
    pub similarity_threshold: f32,
    /// Minimum length of a query word to count as a keyword.
    pub min_keyword_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            default_limit: 3,
            similarity_threshold: 0.3,
            min_keyword_len: 3,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the maximum chunk length in characters.
    pub fn max_chunk_len(mut self, len: usize) -> Self {
        self.config.max_chunk_len = len;
        self
    }

    /// Set the number of results returned by default.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the cosine similarity threshold for embedding mode.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the minimum keyword length.
    pub fn min_keyword_len(mut self, len: usize) -> Self {
        self.config.min_keyword_len = len;
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::ConfigError`] if:
    /// - `max_chunk_len == 0`
    /// - `default_limit == 0`
    /// - `similarity_threshold` is outside `[-1, 1]`
    pub fn build(self) -> Result<RetrievalConfig> {
        if self.config.max_chunk_len == 0 {
            return Err(KbError::ConfigError("max_chunk_len must be greater than zero".into()));
        }
        if self.config.default_limit == 0 {
            return Err(KbError::ConfigError("default_limit must be greater than zero".into()));
        }
        if !(-1.0..=1.0).contains(&self.config.similarity_threshold) {
            return Err(KbError::ConfigError(format!(
                "similarity_threshold ({}) must be within [-1, 1]",
                self.config.similarity_threshold
            )));
        }
        Ok(self.config)
    }
}

/// Connection settings for the embedding provider.
///
/// Its presence is the "embedding available" signal: when
/// [`EmbeddingConfig::from_env`] returns `None` the engine runs in keyword
/// mode only.
#[derive(Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Bearer token for the embedding API.
    pub api_key: String,
    /// Model name sent with every request.
    pub model: String,
    /// Dimensionality of the vectors the model returns.
    pub dimensions: usize,
    /// API base URL, without the trailing `/embeddings`.
    pub base_url: String,
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl EmbeddingConfig {
    /// Create a config for the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read settings from the process environment.
    ///
    /// Returns `None` when `OPENAI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        if let Some(dimensions) = lookup(DIMENSIONS_ENV).and_then(|d| d.trim().parse().ok()) {
            config.dimensions = dimensions;
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RetrievalConfig::default();
        assert_eq!(config.max_chunk_len, 500);
        assert_eq!(config.default_limit, 3);
        assert!((config.similarity_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(RetrievalConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(RetrievalConfig::builder().max_chunk_len(0).build().is_err());
        assert!(RetrievalConfig::builder().default_limit(0).build().is_err());
        assert!(RetrievalConfig::builder().similarity_threshold(1.5).build().is_err());
    }

    #[test]
    fn embedding_config_requires_api_key() {
        let env: HashMap<&str, &str> = HashMap::from([(MODEL_ENV, "custom")]);
        assert!(EmbeddingConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).is_none());

        let env: HashMap<&str, &str> = HashMap::from([(API_KEY_ENV, "  ")]);
        assert!(EmbeddingConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).is_none());
    }

    #[test]
    fn embedding_config_applies_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (API_KEY_ENV, "sk-test"),
            (MODEL_ENV, "text-embedding-3-large"),
            (DIMENSIONS_ENV, "3072"),
            (BASE_URL_ENV, "http://localhost:8080/v1/"),
        ]);
        let config = EmbeddingConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.model, "text-embedding-3-large");
        assert_eq!(config.dimensions, 3072);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert!(!format!("{config:?}").contains("sk-test"));
    }
}
