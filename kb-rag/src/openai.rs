//! OpenAI-compatible embedding provider.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{DEFAULT_EMBEDDING_DIMENSIONS, EmbeddingConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{KbError, Result};

const PROVIDER: &str = "OpenAI";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// # Configuration
///
/// Built from an [`EmbeddingConfig`], usually via
/// [`EmbeddingConfig::from_env`]:
///
/// - `model` – defaults to `text-embedding-3-small`.
/// - `dimensions` – sent to the API only when it differs from the default 1536.
/// - `base_url` – defaults to `https://api.openai.com/v1`.
///
/// # Example
///
/// ```rust,ignore
/// use kb_rag::{EmbeddingConfig, openai::OpenAIEmbeddingProvider};
///
/// if let Some(config) = EmbeddingConfig::from_env() {
///     let provider = OpenAIEmbeddingProvider::new(config)?;
///     let embedding = provider.embed("phần mềm ERP").await?;
/// }
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::ConfigError`] if the API key is blank.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(KbError::ConfigError("embedding API key must not be empty".into()));
        }
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Create a provider from the environment, or `None` if no key is set.
    pub fn from_env() -> Option<Result<Self>> {
        EmbeddingConfig::from_env().map(Self::new)
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }

    fn request_dimensions(&self) -> Option<usize> {
        (self.config.dimensions != DEFAULT_EMBEDDING_DIMENSIONS).then_some(self.config.dimensions)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// The API's error message, or the raw body when it is not the usual JSON shape.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn provider_error(message: impl Into<String>) -> KbError {
    KbError::EmbeddingError { provider: PROVIDER.into(), message: message.into() }
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| provider_error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.config.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                provider_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(provider_error(format!("API returned {status}: {detail}")));
        }

        let mut response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            provider_error(format!("failed to parse response: {e}"))
        })?;

        if response.data.len() != texts.len() {
            return Err(provider_error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
