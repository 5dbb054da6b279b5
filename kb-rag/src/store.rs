//! In-memory, append-only document store.
//!
//! [`DocumentStore`] keeps documents in insertion order behind a
//! `tokio::sync::RwLock`. Documents are never removed; the only mutation
//! after insertion is attaching an embedding. The store also pins the
//! embedding dimensionality to the first vector it accepts.

use std::collections::BTreeSet;

use tokio::sync::RwLock;
use tracing::warn;

use crate::document::{Category, Document};
use crate::error::{KbError, Result};

#[derive(Debug, Default)]
struct StoreInner {
    documents: Vec<Document>,
    dimensions: Option<usize>,
}

impl StoreInner {
    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                Err(KbError::DimensionMismatch { expected, actual: embedding.len() })
            }
            _ => Ok(()),
        }
    }
}

/// An in-memory document collection with lookup by id and category.
///
/// # Example
///
/// ```rust,ignore
/// use kb_rag::{DocumentStore, seed_documents};
///
/// let store = DocumentStore::with_documents(seed_documents());
/// let erp = store.get_by_id("erp-product").await;
/// ```
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
}

impl DocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `documents`, in order.
    ///
    /// Precomputed embeddings whose length differs from the first one seen
    /// are dropped with a warning; the documents themselves are kept.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let mut inner = StoreInner::default();
        for mut document in documents {
            if let Some(embedding) = &document.embedding {
                if let Err(e) = inner.check_dimensions(embedding) {
                    warn!(document.id = %document.id, error = %e, "dropping seeded embedding");
                    document.embedding = None;
                } else {
                    inner.dimensions.get_or_insert(embedding.len());
                }
            }
            inner.documents.push(document);
        }
        Self { inner: RwLock::new(inner) }
    }

    /// Append a document and return its position.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::DimensionMismatch`] if the document carries an
    /// embedding of the wrong length. Nothing is stored in that case.
    pub async fn push(&self, document: Document) -> Result<usize> {
        let mut inner = self.inner.write().await;
        if let Some(embedding) = &document.embedding {
            inner.check_dimensions(embedding)?;
            inner.dimensions.get_or_insert(embedding.len());
        }
        inner.documents.push(document);
        Ok(inner.documents.len() - 1)
    }

    /// Attach an embedding to the document at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::DimensionMismatch`] on a length mismatch and
    /// [`KbError::InvalidDocument`] if `index` is out of range.
    pub async fn attach_embedding(&self, index: usize, embedding: Vec<f32>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_dimensions(&embedding)?;
        let dimensions = embedding.len();
        let document = inner
            .documents
            .get_mut(index)
            .ok_or_else(|| KbError::InvalidDocument(format!("no document at index {index}")))?;
        document.embedding = Some(embedding);
        inner.dimensions.get_or_insert(dimensions);
        Ok(())
    }

    /// Positions and contents of documents that have no embedding yet.
    pub async fn pending_embeddings(&self) -> Vec<(usize, String)> {
        let inner = self.inner.read().await;
        inner
            .documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.embedding.is_none())
            .map(|(i, d)| (i, d.content.clone()))
            .collect()
    }

    /// The first document with the given id, if any.
    pub async fn get_by_id(&self, id: &str) -> Option<Document> {
        let inner = self.inner.read().await;
        inner.documents.iter().find(|d| d.id == id).cloned()
    }

    /// All documents in `category`, in insertion order.
    pub async fn get_by_category(&self, category: Category) -> Vec<Document> {
        let inner = self.inner.read().await;
        inner.documents.iter().filter(|d| d.category == category).cloned().collect()
    }

    /// The distinct categories present in the store.
    pub async fn list_categories(&self) -> BTreeSet<Category> {
        let inner = self.inner.read().await;
        inner.documents.iter().map(|d| d.category).collect()
    }

    /// A copy of every document, in insertion order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.inner.read().await.documents.clone()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Number of documents with an embedding attached.
    pub async fn embedded_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.documents.iter().filter(|d| d.embedding.is_some()).count()
    }

    /// The embedding dimensionality pinned by the first accepted vector.
    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }
}
