//! Behavioural tests for the retrieval engine in both modes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kb_rag::{
    Category, Document, EmbeddingProvider, KbError, RetrievalConfig, RetrievalEngine, SearchMode,
    seed_documents,
};

/// Embeds text as a bag-of-words over a fixed vocabulary.
struct VocabEmbedder {
    vocabulary: Vec<&'static str>,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl VocabEmbedder {
    fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        self.vocabulary.iter().map(|w| if text.contains(w) { 1.0 } else { 0.0 }).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for VocabEmbedder {
    async fn embed(&self, text: &str) -> kb_rag::Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> kb_rag::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Succeeds for batches, fails for single texts.
struct QueryFailingEmbedder {
    inner: VocabEmbedder,
}

#[async_trait]
impl EmbeddingProvider for QueryFailingEmbedder {
    async fn embed(&self, _text: &str) -> kb_rag::Result<Vec<f32>> {
        self.inner.single_calls.fetch_add(1, Ordering::SeqCst);
        Err(KbError::EmbeddingError { provider: "test".into(), message: "quota exceeded".into() })
    }

    async fn embed_batch(&self, texts: &[&str]) -> kb_rag::Result<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Fails every request.
#[derive(Default)]
struct DownEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _text: &str) -> kb_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(KbError::EmbeddingError {
            provider: "test".into(),
            message: "connection refused".into(),
        })
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Returns huge vectors whose cosine overflows to a non-finite value.
struct OverflowEmbedder;

#[async_trait]
impl EmbeddingProvider for OverflowEmbedder {
    async fn embed(&self, _text: &str) -> kb_rag::Result<Vec<f32>> {
        Ok(vec![1e30, 1e30])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Embeds the corpus correctly but returns one extra dimension for single texts.
struct WideQueryEmbedder {
    inner: VocabEmbedder,
}

#[async_trait]
impl EmbeddingProvider for WideQueryEmbedder {
    async fn embed(&self, text: &str) -> kb_rag::Result<Vec<f32>> {
        let mut vector = self.inner.embed(text).await?;
        vector.push(1.0);
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> kb_rag::Result<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

fn keyword_engine(documents: Vec<Document>) -> RetrievalEngine {
    RetrievalEngine::builder().documents(documents).build().unwrap()
}

fn ids(results: &[kb_rag::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.document.id.as_str()).collect()
}

fn lang_documents() -> Vec<Document> {
    vec![
        Document::new("rust", "Rust", "Rust is a systems language.", Category::Product),
        Document::new("python", "Python", "Python is a scripting language.", Category::Product),
        Document::new("both", "Both", "Rust and Python interoperate via PyO3.", Category::Service),
    ]
}

#[tokio::test]
async fn keyword_mode_ranks_erp_product_first() {
    let engine = keyword_engine(seed_documents());
    assert_eq!(engine.mode().await, SearchMode::Keyword);

    let results = engine.search("ERP giá cả", None).await;
    assert!(!results.is_empty());
    assert_eq!(results[0].document.id, "erp-product");
    assert!(results[0].score > 0.0);

    if let Some(crm) = results.iter().position(|r| r.document.id == "crm-product") {
        assert!(results[crm].score < results[0].score);
    }
    for window in results.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn excerpt_is_the_best_matching_chunk() {
    let engine = RetrievalEngine::builder()
        .config(RetrievalConfig::builder().max_chunk_len(60).build().unwrap())
        .documents(seed_documents())
        .build()
        .unwrap();

    let results = engine.search("dùng thử miễn phí", Some(1)).await;
    assert_eq!(ids(&results), vec!["erp-product"]);
    assert_eq!(results[0].excerpt, "Khách hàng được dùng thử miễn phí 30 ngày.");
    assert!(results[0].excerpt.chars().count() <= 60);
}

#[tokio::test]
async fn no_overlap_returns_empty() {
    let engine = keyword_engine(seed_documents());
    assert!(engine.search("blockchain quantum", None).await.is_empty());
    assert!(engine.search("a b c", None).await.is_empty());
    assert!(engine.search("   ", None).await.is_empty());

    let embedder = Arc::new(VocabEmbedder::new(&["rust", "python", "golang"]));
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    assert!(engine.search("golang", None).await.is_empty());
    assert_eq!(engine.mode().await, SearchMode::Embedding);
}

#[tokio::test]
async fn limit_caps_results_in_descending_order() {
    let documents = vec![
        Document::new("content", "One", "alpha in body.", Category::Support),
        Document::new("tags", "Two", "body.", Category::Support).with_keywords(["alpha"]),
        Document::new("title", "Alpha three", "body.", Category::Support),
        Document::new("title-body", "Alpha four", "alpha body.", Category::Support),
        Document::new("all", "Alpha five", "alpha body.", Category::Support)
            .with_keywords(["alpha"]),
        Document::new("none", "Six", "body.", Category::Support),
    ];
    let engine = keyword_engine(documents);

    let results = engine.search("alpha", Some(3)).await;
    assert_eq!(ids(&results), vec!["all", "title-body", "title"]);
    assert!((results[0].score - 2.0).abs() < 1e-6);
    for window in results.windows(2) {
        assert!(window[0].score > window[1].score);
    }

    assert_eq!(engine.search("alpha", None).await.len(), 3);
    assert_eq!(engine.search("alpha", Some(10)).await.len(), 5);
    assert_eq!(ids(&engine.search("six", Some(3)).await), vec!["none"]);
    assert!(engine.search("alpha", Some(0)).await.is_empty());
}

#[tokio::test]
async fn embedding_mode_ranks_by_cosine_and_applies_threshold() {
    let embedder = Arc::new(VocabEmbedder::new(&["rust", "python"]));
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder.clone())
        .build()
        .unwrap();

    assert!(!engine.is_embedding_ready().await);
    assert!(engine.initialize().await);
    assert!(engine.is_embedding_ready().await);

    let results = engine.search("rust", None).await;
    assert_eq!(ids(&results), vec!["rust", "both"]);
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

    let strict = RetrievalEngine::builder()
        .config(RetrievalConfig::builder().similarity_threshold(0.8).build().unwrap())
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    assert_eq!(ids(&strict.search("rust", None).await), vec!["rust"]);
}

#[tokio::test]
async fn non_finite_similarity_is_discarded() {
    let documents = vec![Document::new("other", "Other", "Unrelated text.", Category::Support)];
    let engine = RetrievalEngine::builder()
        .documents(documents)
        .embedding_provider(Arc::new(OverflowEmbedder))
        .build()
        .unwrap();

    assert!(engine.initialize().await);
    let results = engine.search("anything", None).await;
    let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
    assert!(results.is_empty(), "scores: {scores:?}");
    assert_eq!(engine.mode().await, SearchMode::Embedding);
}

#[tokio::test]
async fn query_dimension_mismatch_demotes_to_keyword_mode() {
    let embedder = Arc::new(WideQueryEmbedder { inner: VocabEmbedder::new(&["rust", "python"]) });
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    assert!(engine.initialize().await);

    let results = engine.search("python", None).await;
    assert_eq!(engine.mode().await, SearchMode::Keyword);
    assert!(!engine.is_embedding_ready().await);
    assert_eq!(ids(&results), vec!["python", "both"]);
}

#[tokio::test]
async fn initialization_runs_once() {
    let embedder = Arc::new(VocabEmbedder::new(&["rust", "python"]));
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder.clone())
        .build()
        .unwrap();

    // search initializes lazily
    engine.search("python", None).await;
    assert!(engine.initialize().await);
    engine.search("rust", None).await;

    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.stats().await.embedded_count, 3);
}

#[tokio::test]
async fn query_failure_demotes_to_keyword_mode_permanently() {
    let embedder = Arc::new(QueryFailingEmbedder { inner: VocabEmbedder::new(&["erp", "crm"]) });
    let engine = RetrievalEngine::builder()
        .documents(seed_documents())
        .embedding_provider(embedder.clone())
        .build()
        .unwrap();

    assert!(engine.initialize().await);
    assert!(engine.is_embedding_ready().await);

    let results = engine.search("ERP giá cả", None).await;
    assert_eq!(results[0].document.id, "erp-product");
    assert_eq!(engine.mode().await, SearchMode::Keyword);
    assert!(!engine.is_embedding_ready().await);
    assert_eq!(embedder.inner.single_calls.load(Ordering::SeqCst), 1);

    let again = engine.search("phần mềm CRM", None).await;
    assert_eq!(again[0].document.id, "crm-product");
    assert_eq!(embedder.inner.single_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn initialization_failure_demotes_without_failing_search() {
    let embedder = Arc::new(DownEmbedder::default());
    let engine = RetrievalEngine::builder()
        .documents(seed_documents())
        .embedding_provider(embedder.clone())
        .build()
        .unwrap();
    assert_eq!(engine.mode().await, SearchMode::Embedding);

    let results = engine.search("hotline liên hệ", None).await;
    assert_eq!(results[0].document.id, "contact-info");
    assert_eq!(engine.mode().await, SearchMode::Keyword);
    let calls = embedder.calls.load(Ordering::SeqCst);
    assert_eq!(calls, 1);

    assert!(!engine.initialize().await);
    engine.search("bảo hành", None).await;
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn add_document_allows_duplicate_ids() {
    let engine = keyword_engine(seed_documents());
    let before = engine.stats().await.document_count;

    let doc =
        Document::new("promo", "Khuyến mãi", "Giảm giá mùa hè cho phần mềm.", Category::Product);
    engine.add_document(doc.clone()).await.unwrap();
    engine.add_document(doc).await.unwrap();

    let documents = engine.documents().await;
    assert_eq!(documents.len(), before + 2);
    assert_eq!(documents.iter().filter(|d| d.id == "promo").count(), 2);
    assert_eq!(engine.search("khuyến mãi", Some(5)).await.len(), 2);
}

#[tokio::test]
async fn add_document_rejects_blank_content() {
    let engine = keyword_engine(Vec::new());
    let err = engine
        .add_document(Document::new("blank", "Blank", " ", Category::Company))
        .await
        .unwrap_err();
    assert!(matches!(err, KbError::InvalidDocument(_)));
    assert_eq!(engine.stats().await.document_count, 0);
}

#[tokio::test]
async fn add_document_embeds_in_embedding_mode() {
    let embedder = Arc::new(VocabEmbedder::new(&["rust", "python"]));
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    engine.initialize().await;

    let doc = Document::new("rust-2", "Rust again", "More rust.", Category::Product);
    engine.add_document(doc).await.unwrap();

    let stored = engine.get_by_id("rust-2").await.unwrap();
    assert_eq!(stored.embedding, Some(vec![1.0, 0.0]));
    let results = engine.search("rust", Some(5)).await;
    assert!(ids(&results).contains(&"rust-2"));
}

#[tokio::test]
async fn add_document_survives_embedding_failure() {
    let embedder = Arc::new(QueryFailingEmbedder { inner: VocabEmbedder::new(&["rust"]) });
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    engine.initialize().await;

    let doc = Document::new("go", "Go", "Go is compiled.", Category::Product);
    engine.add_document(doc).await.unwrap();

    let stored = engine.get_by_id("go").await.unwrap();
    assert!(stored.embedding.is_none());
    assert!(engine.is_embedding_ready().await);
    assert_eq!(engine.stats().await.embedded_count, 3);
}

#[tokio::test]
async fn add_document_drops_embedding_of_wrong_dimensionality() {
    let embedder = Arc::new(WideQueryEmbedder { inner: VocabEmbedder::new(&["rust", "python"]) });
    let engine = RetrievalEngine::builder()
        .documents(lang_documents())
        .embedding_provider(embedder)
        .build()
        .unwrap();
    assert!(engine.initialize().await);
    let before = engine.stats().await;

    let doc = Document::new("rust-3", "Rust three", "Even more rust.", Category::Product);
    engine.add_document(doc).await.unwrap();

    let stored = engine.get_by_id("rust-3").await.unwrap();
    assert!(stored.embedding.is_none());
    let after = engine.stats().await;
    assert_eq!(after.document_count, before.document_count + 1);
    assert_eq!(after.embedded_count, before.embedded_count);
    assert_eq!(after.mode, SearchMode::Embedding);
}

#[tokio::test]
async fn read_helpers_and_stats() {
    let engine = keyword_engine(seed_documents());

    assert_eq!(engine.get_by_id("crm-product").await.unwrap().title, "Phần mềm CRM");
    assert!(engine.get_by_id("missing").await.is_none());

    let products: Vec<String> =
        engine.get_by_category(Category::Product).await.into_iter().map(|d| d.id).collect();
    assert_eq!(products, vec!["erp-product", "crm-product", "hrm-product", "pricing-policy"]);

    let stats = engine.stats().await;
    assert_eq!(stats.document_count, seed_documents().len());
    assert_eq!(stats.embedded_count, 0);
    assert_eq!(stats.categories.len(), Category::ALL.len());
    assert_eq!(stats.categories, engine.list_categories().await);
    assert_eq!(stats.mode, SearchMode::Keyword);
}

#[tokio::test]
async fn relevant_context_formats_matches() {
    let engine = keyword_engine(seed_documents());

    let context = engine.relevant_context("hotline email", Some(1)).await;
    assert!(context.starts_with("[Thông tin liên hệ] (contact)\n"));
    assert!(context.contains("1900 6868"));

    assert_eq!(engine.relevant_context("blockchain", None).await, "");
}
