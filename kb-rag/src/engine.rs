//! Retrieval engine.
//!
//! The [`RetrievalEngine`] ranks the documents of a [`DocumentStore`] against
//! a free-text query and picks the best excerpt of each match. It runs in one
//! of two modes:
//!
//! - **embedding**: cosine similarity between the query embedding and each
//!   document embedding, keeping scores above the configured threshold;
//! - **keyword**: weighted keyword overlap over title, tags and content.
//!
//! The mode is chosen at construction from whether an [`EmbeddingProvider`]
//! was supplied. Any provider failure during initialization or search moves
//! the engine to keyword mode for the rest of its life. A query embedding
//! whose length differs from the corpus embeddings counts as a failure.
//! `search` never returns an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kb_rag::{RetrievalConfig, RetrievalEngine, seed_documents};
//!
//! let engine = Arc::new(
//!     RetrievalEngine::builder()
//!         .config(RetrievalConfig::default())
//!         .documents(seed_documents())
//!         .embedding_provider(Arc::new(my_embedder))
//!         .build()?,
//! );
//!
//! engine.initialize().await;
//! let results = engine.search("ERP giá cả", None).await;
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::chunking::{Chunker, SentenceChunker, truncate_chars};
use crate::config::RetrievalConfig;
use crate::document::{Category, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::keyword::{best_chunk, keyword_score, tokenize};
use crate::similarity::cosine_similarity;
use crate::store::DocumentStore;

/// The scoring strategy an engine is currently using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Cosine similarity over document embeddings.
    Embedding,
    /// Weighted keyword overlap.
    Keyword,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Embedding => f.write_str("embedding"),
            SearchMode::Keyword => f.write_str("keyword"),
        }
    }
}

/// Mode state. The only transition is `Embedding` → `Keyword`.
enum ModeState {
    Embedding(Arc<dyn EmbeddingProvider>),
    Keyword,
}

impl ModeState {
    fn kind(&self) -> SearchMode {
        match self {
            ModeState::Embedding(_) => SearchMode::Embedding,
            ModeState::Keyword => SearchMode::Keyword,
        }
    }
}

/// A summary of the engine's corpus and mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseStats {
    /// Number of stored documents.
    pub document_count: usize,
    /// Number of documents with an embedding attached.
    pub embedded_count: usize,
    /// Distinct categories present.
    pub categories: BTreeSet<Category>,
    /// The current search mode.
    pub mode: SearchMode,
}

/// Ranks stored documents against queries. Construct one via
/// [`RetrievalEngine::builder()`] and share it behind an `Arc`.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    store: DocumentStore,
    chunker: Arc<dyn Chunker>,
    mode: RwLock<ModeState>,
    initialized: OnceCell<bool>,
}

impl RetrievalEngine {
    /// Create a new [`RetrievalEngineBuilder`].
    pub fn builder() -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The current search mode.
    pub async fn mode(&self) -> SearchMode {
        self.mode.read().await.kind()
    }

    /// Whether the engine is in embedding mode with its corpus embedded.
    ///
    /// Becomes `false` for good once a provider failure demotes the engine.
    pub async fn is_embedding_ready(&self) -> bool {
        self.mode().await == SearchMode::Embedding && self.initialized.get() == Some(&true)
    }

    /// Batch-embed every document that has no embedding yet.
    ///
    /// Runs at most once per engine; later calls return the first outcome.
    /// In keyword mode this does nothing. A provider failure demotes the
    /// engine to keyword mode. Returns whether embeddings are ready.
    pub async fn initialize(&self) -> bool {
        *self.initialized.get_or_init(|| self.embed_corpus()).await
            && self.mode().await == SearchMode::Embedding
    }

    async fn embed_corpus(&self) -> bool {
        let Some(provider) = self.provider().await else {
            debug!("no embedding provider; skipping corpus embedding");
            return false;
        };

        let pending = self.store.pending_embeddings().await;
        if pending.is_empty() {
            info!(provider = provider.name(), "knowledge base embeddings ready");
            return true;
        }

        let texts: Vec<&str> = pending.iter().map(|(_, content)| content.as_str()).collect();
        let embeddings = match provider.embed_batch(&texts).await {
            Ok(embeddings) if embeddings.len() == pending.len() => embeddings,
            Ok(embeddings) => {
                let reason = format!(
                    "provider returned {} embeddings for {} documents",
                    embeddings.len(),
                    pending.len()
                );
                self.demote(&reason).await;
                return false;
            }
            Err(e) => {
                self.demote(&e.to_string()).await;
                return false;
            }
        };

        for ((index, _), embedding) in pending.iter().zip(embeddings) {
            if let Err(e) = self.store.attach_embedding(*index, embedding).await {
                warn!(index, error = %e, "discarding document embedding");
            }
        }

        info!(
            provider = provider.name(),
            document_count = pending.len(),
            "knowledge base embeddings ready"
        );
        true
    }

    async fn provider(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        match &*self.mode.read().await {
            ModeState::Embedding(provider) => Some(Arc::clone(provider)),
            ModeState::Keyword => None,
        }
    }

    async fn demote(&self, reason: &str) {
        let mut mode = self.mode.write().await;
        let provider = match &*mode {
            ModeState::Embedding(provider) => provider.name().to_string(),
            ModeState::Keyword => return,
        };
        warn!(
            provider = %provider,
            reason,
            "embedding provider failed; switching to keyword mode"
        );
        *mode = ModeState::Keyword;
    }

    /// Return up to `limit` documents ranked by relevance to `query`.
    ///
    /// `limit` defaults to the configured `default_limit`. Results are sorted
    /// by descending score; ties keep insertion order. Never fails: provider
    /// errors switch the engine to keyword mode and the query is answered
    /// from keywords.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Vec<SearchResult> {
        let limit = limit.unwrap_or(self.config.default_limit);
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let keywords = tokenize(query, self.config.min_keyword_len);
        let mut results = match self.embedding_search(query, &keywords).await {
            Some(results) => results,
            None => self.keyword_search(&keywords).await,
        };

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        info!(mode = %self.mode().await, result_count = results.len(), "search completed");
        results
    }

    /// Embedding-mode ranking; `None` means the caller should use keywords.
    async fn embedding_search(
        &self,
        query: &str,
        keywords: &[String],
    ) -> Option<Vec<SearchResult>> {
        self.initialize().await;
        let provider = self.provider().await?;

        let query_embedding = match provider.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                self.demote(&e.to_string()).await;
                return None;
            }
        };

        if let Some(expected) = self.store.dimensions().await {
            if expected != query_embedding.len() {
                let reason = format!(
                    "query embedding has {} dimensions, corpus has {expected}",
                    query_embedding.len()
                );
                self.demote(&reason).await;
                return None;
            }
        }

        let threshold = self.config.similarity_threshold;
        let results = self
            .store
            .snapshot()
            .await
            .into_iter()
            .filter_map(|document| {
                let score = cosine_similarity(document.embedding.as_deref()?, &query_embedding);
                if score.is_nan() || score <= threshold {
                    return None;
                }
                let excerpt = self.excerpt(&document.content, keywords);
                Some(SearchResult { document, score, excerpt })
            })
            .collect();

        Some(results)
    }

    async fn keyword_search(&self, keywords: &[String]) -> Vec<SearchResult> {
        if keywords.is_empty() {
            return Vec::new();
        }

        self.store
            .snapshot()
            .await
            .into_iter()
            .filter_map(|document| {
                let score = keyword_score(&document, keywords);
                if score <= 0.0 {
                    return None;
                }
                let excerpt = self.excerpt(&document.content, keywords);
                Some(SearchResult { document, score, excerpt })
            })
            .collect()
    }

    fn excerpt(&self, content: &str, keywords: &[String]) -> String {
        let chunks = self.chunker.chunk(content);
        let best = best_chunk(&chunks, keywords).unwrap_or(content);
        truncate_chars(best, self.chunker.max_len()).to_string()
    }

    /// Append a document to the store.
    ///
    /// In embedding mode the content is embedded first. If that fails, or
    /// the vector has the wrong dimensionality, the document is stored
    /// without an embedding. Duplicate ids are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::InvalidDocument`](crate::KbError::InvalidDocument)
    /// if the id or content is blank.
    pub async fn add_document(&self, mut document: Document) -> Result<()> {
        document.validate()?;

        if document.embedding.is_none() {
            if let Some(provider) = self.provider().await {
                match provider.embed(&document.content).await {
                    Ok(embedding) => document.embedding = Some(embedding),
                    Err(e) => {
                        warn!(
                            document.id = %document.id,
                            error = %e,
                            "embedding failed; storing document without embedding"
                        );
                    }
                }
            }
        }

        let id = document.id.clone();
        let embedded = document.embedding.is_some();
        let fallback = embedded.then(|| Document { embedding: None, ..document.clone() });

        let embedded = match self.store.push(document).await {
            Ok(_) => embedded,
            Err(e) => {
                warn!(document.id = %id, error = %e, "storing document without embedding");
                if let Some(document) = fallback {
                    self.store.push(document).await?;
                }
                false
            }
        };

        info!(document.id = %id, embedded, "added document");
        Ok(())
    }

    /// The first document with the given id, if any.
    pub async fn get_by_id(&self, id: &str) -> Option<Document> {
        self.store.get_by_id(id).await
    }

    /// All documents in `category`, in insertion order.
    pub async fn get_by_category(&self, category: Category) -> Vec<Document> {
        self.store.get_by_category(category).await
    }

    /// The distinct categories present in the corpus.
    pub async fn list_categories(&self) -> BTreeSet<Category> {
        self.store.list_categories().await
    }

    /// A copy of every document, in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.store.snapshot().await
    }

    /// Counts, categories and mode.
    pub async fn stats(&self) -> KnowledgeBaseStats {
        KnowledgeBaseStats {
            document_count: self.store.len().await,
            embedded_count: self.store.embedded_count().await,
            categories: self.store.list_categories().await,
            mode: self.mode().await,
        }
    }

    /// Render the results of [`search`](Self::search) as a prompt context block.
    ///
    /// Each match becomes a `[title] (category)` line followed by its
    /// excerpt; blocks are separated by a blank line. Returns an empty string
    /// when nothing matched.
    pub async fn relevant_context(&self, query: &str, limit: Option<usize>) -> String {
        self.search(query, limit)
            .await
            .iter()
            .map(|r| format!("[{}] ({})\n{}", r.document.title, r.document.category, r.excerpt))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builder for constructing a [`RetrievalEngine`].
///
/// Every field is optional: the config defaults to
/// [`RetrievalConfig::default()`], the chunker to a [`SentenceChunker`] sized
/// by `max_chunk_len`, and without an embedding provider the engine starts in
/// keyword mode.
///
/// # Example
///
/// ```rust,ignore
/// let engine = RetrievalEngine::builder()
///     .documents(seed_documents())
///     .embedding_provider(Arc::new(embedder))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalEngineBuilder {
    config: Option<RetrievalConfig>,
    documents: Vec<Document>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RetrievalEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the documents the store starts with.
    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    /// Set the embedding provider, enabling embedding mode.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the chunker used for excerpt selection.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RetrievalEngine`].
    ///
    /// # Errors
    ///
    /// Returns [`KbError::InvalidDocument`](crate::KbError::InvalidDocument)
    /// if a seeded document has a blank id or content.
    pub fn build(self) -> Result<RetrievalEngine> {
        let config = self.config.unwrap_or_default();
        for document in &self.documents {
            document.validate()?;
        }

        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(SentenceChunker::new(config.max_chunk_len)));
        let mode = match self.embedding_provider {
            Some(provider) => ModeState::Embedding(provider),
            None => ModeState::Keyword,
        };

        info!(
            document_count = self.documents.len(),
            mode = %mode.kind(),
            "retrieval engine created"
        );

        Ok(RetrievalEngine {
            config,
            store: DocumentStore::with_documents(self.documents),
            chunker,
            mode: RwLock::new(mode),
            initialized: OnceCell::new(),
        })
    }
}
