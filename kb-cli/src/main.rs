//! # kb: knowledge base search from the command line
//!
//! Loads the seeded company corpus, picks embedding or keyword mode from the
//! environment (`OPENAI_API_KEY`, optionally from `.env`), and answers
//! queries.
//!
//! Usage:
//!   kb search "ERP giá cả"            # top 3 matches
//!   kb search "bảo hành" --limit 5 --json
//!   kb context "hotline"              # prompt context block
//!   kb show erp-product
//!   kb categories
//!   kb stats --keyword-only

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kb_rag::{
    Category, EmbeddingConfig, OpenAIEmbeddingProvider, RetrievalConfig, RetrievalEngine,
    SearchResult, seed_documents,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kb", version, about = "Search the company knowledge base")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ignore OPENAI_API_KEY and use keyword scoring only
    #[arg(long, global = true)]
    keyword_only: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Maximum excerpt length in characters
    #[arg(long, global = true, default_value_t = kb_rag::DEFAULT_MAX_CHUNK_LEN)]
    max_chunk_len: usize,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rank documents against a query
    Search {
        query: String,
        /// Number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the prompt context block for a query
    Context {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one document by id
    Show { id: String },
    /// List categories, or the documents in one category
    Categories { category: Option<Category> },
    /// Corpus size, embedding coverage and mode
    Stats,
}

impl Command {
    /// Whether the corpus must be embedded before running. `search` and
    /// `context` embed lazily; lookups never need embeddings.
    fn needs_embeddings(&self) -> bool {
        matches!(self, Command::Stats)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "kb_rag=debug,kb=debug" } else { "kb_rag=info,kb=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_engine(cli: &Cli) -> Result<Arc<RetrievalEngine>> {
    let config = RetrievalConfig::builder()
        .max_chunk_len(cli.max_chunk_len)
        .build()
        .context("invalid retrieval settings")?;

    let mut builder = RetrievalEngine::builder().config(config).documents(seed_documents());

    match EmbeddingConfig::from_env().filter(|_| !cli.keyword_only) {
        Some(embedding) => {
            info!(model = %embedding.model, "embedding provider configured");
            let provider = OpenAIEmbeddingProvider::new(embedding)?;
            builder = builder.embedding_provider(Arc::new(provider));
        }
        None => info!("no embedding provider; using keyword search"),
    }

    Ok(Arc::new(builder.build()?))
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matching documents.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. {} [{}] ({}) score={:.3}",
            rank + 1,
            result.document.title,
            result.document.id,
            result.document.category,
            result.score
        );
        println!("   {}\n", result.excerpt);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine = build_engine(&cli)?;
    if cli.command.needs_embeddings() {
        engine.initialize().await;
    }

    match &cli.command {
        Command::Search { query, limit } => {
            let results = engine.search(query, *limit).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }
        Command::Context { query, limit } => {
            let context = engine.relevant_context(query, *limit).await;
            if cli.json {
                println!("{}", serde_json::json!({ "query": query, "context": context }));
            } else {
                println!("{context}");
            }
        }
        Command::Show { id } => {
            let Some(document) = engine.get_by_id(id).await else {
                bail!("no document with id '{id}'");
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("{} [{}] ({})", document.title, document.id, document.category);
                println!("keywords: {}", document.keywords.join(", "));
                println!("updated: {}", document.metadata.last_updated.to_rfc3339());
                println!("\n{}", document.content);
            }
        }
        Command::Categories { category: Some(category) } => {
            let documents = engine.get_by_category(*category).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                for document in documents {
                    println!("{}\t{}", document.id, document.title);
                }
            }
        }
        Command::Categories { category: None } => {
            let categories = engine.list_categories().await;
            if cli.json {
                println!("{}", serde_json::to_string(&categories)?);
            } else {
                for category in categories {
                    println!("{category}");
                }
            }
        }
        Command::Stats => {
            let stats = engine.stats().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("documents: {}", stats.document_count);
                println!("embedded:  {}", stats.embedded_count);
                println!("mode:      {}", stats.mode);
                let categories: Vec<&str> = stats.categories.iter().map(|c| c.as_str()).collect();
                println!("categories: {}", categories.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_with_global_flags() {
        let cli = Cli::try_parse_from(["kb", "search", "ERP giá cả", "--limit", "5", "--json"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Search { ref query, limit: Some(5) } if query == "ERP giá cả"
        ));
    }

    #[test]
    fn parses_category_filter() {
        let cli = Cli::try_parse_from(["kb", "categories", "product"]).unwrap();
        assert!(matches!(cli.command, Command::Categories { category: Some(Category::Product) }));
        assert!(Cli::try_parse_from(["kb", "categories", "blog"]).is_err());
    }

    #[tokio::test]
    async fn keyword_only_engine_answers_from_seed() {
        let cli = Cli::try_parse_from(["kb", "--keyword-only", "stats"]).unwrap();
        let engine = build_engine(&cli).unwrap();
        assert_eq!(engine.mode().await, kb_rag::SearchMode::Keyword);
        let results = engine.search("ERP giá cả", None).await;
        assert_eq!(results[0].document.id, "erp-product");
    }

    #[test]
    fn only_stats_needs_embedded_corpus() {
        let needs = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.needs_embeddings();
        assert!(needs(&["kb", "stats"]));
        assert!(!needs(&["kb", "show", "erp-product"]));
        assert!(!needs(&["kb", "categories"]));
        assert!(!needs(&["kb", "search", "ERP"]));
    }
}
