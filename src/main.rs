//! # docqa CLI
//!
//! Command-line interface to the document QA pipeline. Documents are
//! ingested fresh on every invocation — the index lives in memory for
//! the process lifetime and is never persisted.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa ask` | Ingest documents and answer a question about one of them |
//! | `docqa search` | Ingest documents and print the nearest chunks for a query |
//! | `docqa chunks` | Show chunking statistics without embedding (dry run) |
//!
//! ## Examples
//!
//! ```bash
//! # Answer a question about a report
//! docqa ask report.pdf notes.txt --doc report.pdf \
//!     --question "What were the quarterly findings?"
//!
//! # Inspect retrieval without calling the completion backend
//! docqa search report.pdf notes.txt --question "quarterly findings"
//!
//! # Check chunk counts before spending embedding calls
//! docqa chunks report.pdf --chunk-size 500 --chunk-overlap 100
//! ```
//!
//! The OpenAI API key is read from the `OPENAI_API_KEY` environment
//! variable (a `.env` file is honored).

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::completion::create_completion;
use docqa::config::{load_config, Config};
use docqa::embedding::create_embedder;
use docqa::loader::load_documents;
use docqa::models::Question;
use docqa::store::CorpusStore;
use docqa::{chunker, pipeline};

/// docqa — ask questions about your documents.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; built-in defaults apply when the file is absent.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa — a document question-answering pipeline",
    version,
    long_about = "docqa ingests documents (txt, md, pdf, doc, docx), splits them into \
    overlapping chunks, embeds and indexes the chunks, and answers natural-language \
    questions grounded in retrieved content."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docqa.toml`. Chunking, retrieval, context,
    /// and backend settings are read from this file.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest documents and answer a question about one of them.
    ///
    /// Builds a fresh in-memory index from the given files, retrieves
    /// content relevant to the question, and prints the generated
    /// answer. Requires `OPENAI_API_KEY`.
    Ask {
        /// Document files to ingest.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// The question to answer.
        #[arg(long)]
        question: String,

        /// Name of the document to query (defaults to the first file).
        #[arg(long)]
        doc: Option<String>,

        /// Desired answer length in words.
        #[arg(long)]
        answer_length: Option<usize>,

        /// Completion backend display name (e.g. "Claude Sonnet").
        #[arg(long)]
        backend: Option<String>,
    },

    /// Ingest documents and print the nearest chunks for a query.
    ///
    /// Runs the retrieval path only — no completion backend is called.
    /// Results are printed nearest-first with their squared L2 distance.
    Search {
        /// Document files to ingest.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// The query text.
        #[arg(long)]
        question: String,

        /// Number of results to return.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show chunking statistics without embedding anything.
    ///
    /// Dry run for tuning chunk geometry before spending embedding
    /// calls. No network access is required.
    Chunks {
        /// Document files to inspect.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target chunk size in characters.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap between consecutive chunks in characters.
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ask {
            files,
            question,
            doc,
            answer_length,
            backend,
        } => {
            if let Some(backend) = backend {
                config.completion.backend = backend;
                config.completion.resolved_model()?;
            }
            if let Some(words) = answer_length {
                config.answer.length_words = words;
            }
            run_ask(&config, &files, &question, doc).await
        }
        Commands::Search {
            files,
            question,
            top_k,
        } => {
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            run_search(&config, &files, &question).await
        }
        Commands::Chunks {
            files,
            chunk_size,
            chunk_overlap,
        } => {
            if let Some(size) = chunk_size {
                config.chunking.chunk_size = size;
            }
            if let Some(overlap) = chunk_overlap {
                config.chunking.chunk_overlap = overlap;
            }
            run_chunks(&config, &files)
        }
    }
}

async fn run_ask(
    config: &Config,
    files: &[PathBuf],
    question: &str,
    doc: Option<String>,
) -> Result<()> {
    let (documents, failures) = load_documents(files);
    report_failures(&failures);
    if documents.is_empty() {
        bail!("no documents could be loaded");
    }

    let selected = match doc {
        Some(name) => name,
        None => documents[0].name.clone(),
    };

    let embedder = create_embedder(&config.embedding)?;
    let completion = create_completion(&config.completion)?;

    let store = CorpusStore::new();
    let version = store
        .rebuild(
            embedder.as_ref(),
            documents,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )
        .await?;

    let question = Question {
        text: question.to_string(),
        document: selected,
        answer_length: config.answer.length_words,
    };

    let answer = pipeline::answer(
        embedder.as_ref(),
        completion.as_ref(),
        &version.corpus,
        &question,
        config,
    )
    .await?;

    println!("{}", answer);
    Ok(())
}

async fn run_search(config: &Config, files: &[PathBuf], question: &str) -> Result<()> {
    let (documents, failures) = load_documents(files);
    report_failures(&failures);
    if documents.is_empty() {
        bail!("no documents could be loaded");
    }

    let embedder = create_embedder(&config.embedding)?;
    let store = CorpusStore::new();
    let version = store
        .rebuild(
            embedder.as_ref(),
            documents,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )
        .await?;

    let hits = pipeline::query(
        embedder.as_ref(),
        &version.corpus.index,
        question,
        config.retrieval.top_k,
    )
    .await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in hits {
        println!("{:>10.4}  {}", hit.distance, hit.tag);
    }
    Ok(())
}

fn run_chunks(config: &Config, files: &[PathBuf]) -> Result<()> {
    let (documents, failures) = load_documents(files);
    report_failures(&failures);

    let mut total = 0usize;
    let mut skipped = 0usize;

    println!("chunks (dry-run)");
    for doc in &documents {
        if doc.text.trim().is_empty() {
            skipped += 1;
            println!("  {}: empty, would be skipped", doc.name);
            continue;
        }
        let chunks = chunker::split(
            &doc.text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )?;
        println!("  {}: {} chunks", doc.name, chunks.len());
        total += chunks.len();
    }
    println!("  documents: {}", documents.len());
    println!("  skipped empty: {}", skipped);
    println!("  total chunks: {}", total);
    println!("ok");
    Ok(())
}

fn report_failures(failures: &[docqa::error::Error]) {
    for failure in failures {
        eprintln!("warning: {}", failure);
    }
}
