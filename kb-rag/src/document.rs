//! Data types for documents and search results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KbError, Result};

/// The fixed set of tags a [`Document`] can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Company profile, history, and team.
    Company,
    /// Software products and their pricing.
    Product,
    /// Professional services such as implementation and outsourcing.
    Service,
    /// Warranty, support channels, and FAQs.
    Support,
    /// Addresses, phone numbers, and office hours.
    Contact,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Company,
        Category::Product,
        Category::Service,
        Category::Support,
        Category::Contact,
    ];

    /// The lowercase label used in serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Company => "company",
            Category::Product => "product",
            Category::Service => "service",
            Category::Support => "support",
            Category::Contact => "contact",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KbError::InvalidDocument(format!("unknown category '{s}'")))
    }
}

/// Bookkeeping attached to every [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// When the document text was last revised.
    pub last_updated: DateTime<Utc>,
    /// Where the text came from (page name, brochure, ...).
    pub source: String,
    /// Editorial priority; higher values are more important.
    pub priority: i32,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self { last_updated: Utc::now(), source: "manual".to_string(), priority: 1 }
    }
}

/// A unit of retrievable text with its tags and optional embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier for the document.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Plain text body.
    pub content: String,
    /// The category this document is filed under.
    pub category: Category,
    /// Keyword tags used by keyword-mode scoring.
    pub keywords: Vec<String>,
    /// Vector embedding of `content`, attached once the provider has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Timestamp, source and priority.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document with no keywords, no embedding and default metadata.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            category,
            keywords: Vec::new(),
            embedding: None,
            metadata: DocumentMetadata::default(),
        }
    }

    /// Set the keyword tags.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the metadata block.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Check the invariants every stored document must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::InvalidDocument`] if the id or content is blank.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(KbError::InvalidDocument("document id must not be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(KbError::InvalidDocument(format!(
                "document '{}' has empty content",
                self.id
            )));
        }
        Ok(())
    }
}

/// A retrieved [`Document`] paired with its relevance score and best excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching document.
    pub document: Document,
    /// Relevance score (higher is more relevant).
    pub score: f32,
    /// The passage of the document content that best matches the query.
    pub excerpt: String,
}
