//! Retrieval pipeline orchestration.
//!
//! Two paths share the embedder and the vector index:
//!
//! - **Ingestion**: chunk every document, embed all chunks in one batch
//!   call, build a fresh index. Runs once per corpus change and fully
//!   replaces the previous index.
//! - **Query**: embed the question, search the index corpus-wide, then
//!   assemble a token-budgeted context with the selected document's
//!   full text in front of the retrieved content.
//!
//! Retrieval is deliberately corpus-wide even though the caller selects
//! one document: cross-document matches supplement the document-scoped
//! primary context rather than replacing it.

use tracing::{info, warn};

use crate::chunker;
use crate::completion::Completion;
use crate::config::Config;
use crate::context;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::index::{SearchHit, VectorIndex, VectorRecord};
use crate::models::{Document, Question};

/// One fully built corpus version: the vector index plus the documents
/// it was derived from.
#[derive(Debug)]
pub struct Corpus {
    pub index: VectorIndex,
    pub documents: Vec<Document>,
}

impl Corpus {
    /// Full text of a document by name.
    pub fn document_text(&self, name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.text.as_str())
    }
}

/// Chunk and embed `documents` into a fresh [`Corpus`].
///
/// Empty or whitespace-only documents are skipped with a warning rather
/// than failing the batch; if no document yields any chunk the whole
/// ingestion fails with [`Error::EmptyCorpus`]. All chunks go to the
/// embedder in a single batch call, so the caller never observes a
/// partially embedded corpus.
pub async fn ingest(
    embedder: &dyn Embedder,
    documents: Vec<Document>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Corpus> {
    let mut chunks = Vec::new();
    let mut tags = Vec::new();

    for doc in &documents {
        if doc.text.trim().is_empty() {
            warn!(document = %doc.name, "document is empty or invalid, skipping");
            continue;
        }
        for piece in chunker::split(&doc.text, chunk_size, chunk_overlap)? {
            chunks.push(piece);
            tags.push(doc.name.clone());
        }
    }

    if chunks.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    let vectors = embedder.embed_batch(&chunks).await?;
    let records = vectors
        .into_iter()
        .zip(tags)
        .map(|(vector, tag)| VectorRecord { vector, tag })
        .collect();
    let index = VectorIndex::build(records)?;

    info!(
        documents = documents.len(),
        chunks = index.len(),
        "corpus indexed"
    );

    Ok(Corpus { index, documents })
}

/// Embed `question` and return the `top_k` nearest chunks' provenance
/// tags, ordered by ascending distance. The search spans the entire
/// corpus, not just the selected document.
pub async fn query(
    embedder: &dyn Embedder,
    index: &VectorIndex,
    question: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>> {
    let query_vector = embedder.embed_one(question).await?;
    index.search(&query_vector, top_k)
}

/// Assemble the answer context: the selected document's full text comes
/// first so the primary source wins under the token budget, followed by
/// retrieved content in relevance order.
pub fn answer_context(
    selected_document_text: &str,
    retrieved: &[String],
    max_tokens: usize,
    model_name: &str,
) -> Result<String> {
    let mut fragments = Vec::with_capacity(retrieved.len() + 1);
    fragments.push(selected_document_text.to_string());
    fragments.extend(retrieved.iter().cloned());
    context::assemble(&fragments, max_tokens, model_name)
}

/// Build the final prompt handed to the completion backend.
pub fn build_prompt(
    document_name: &str,
    answer_length: usize,
    question: &str,
    context: &str,
) -> String {
    format!(
        "You are an AI assistant with a thorough knowledge of the selected document '{}'.\n\
         Deliver an answer that is approximately {} words.\n\
         Question: {}\n\nContext: {}\n\nAnswer:",
        document_name, answer_length, question, context
    )
}

/// Full query path: retrieve, assemble context, prompt, generate.
///
/// Fails with [`Error::DocumentNotFound`] when the selected document is
/// not part of the corpus; service failures abort the query with no
/// partial answer.
pub async fn answer(
    embedder: &dyn Embedder,
    completion: &dyn Completion,
    corpus: &Corpus,
    question: &Question,
    config: &Config,
) -> Result<String> {
    let selected_text = corpus
        .document_text(&question.document)
        .ok_or_else(|| Error::DocumentNotFound(question.document.clone()))?;

    let hits = query(
        embedder,
        &corpus.index,
        &question.text,
        config.retrieval.top_k,
    )
    .await?;
    let retrieved: Vec<String> = hits.into_iter().map(|h| h.tag).collect();

    let context = answer_context(
        selected_text,
        &retrieved,
        config.context.max_tokens,
        &config.context.model_name,
    )?;

    let prompt = build_prompt(
        &question.document,
        question.answer_length,
        &question.text,
        &context,
    );

    completion.generate(&prompt).await
}
