//! End-to-end pipeline tests against a deterministic embedder.
//!
//! The embedder stub maps each text to a normalized byte-histogram
//! vector, so identical texts embed identically and similar texts land
//! near each other — enough locality to exercise retrieval ordering
//! without a network call.

use std::sync::Mutex;

use async_trait::async_trait;

use docqa::completion::Completion;
use docqa::config::Config;
use docqa::embedding::Embedder;
use docqa::error::{Error, Result};
use docqa::models::{Document, Question};
use docqa::store::CorpusStore;
use docqa::{context, pipeline, token};

const DIMS: usize = 16;

#[derive(Debug)]
struct HistogramEmbedder;

fn histogram(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for b in text.bytes() {
        v[b as usize % DIMS] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[async_trait]
impl Embedder for HistogramEmbedder {
    fn model_name(&self) -> &str {
        "histogram-test"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| histogram(t)).collect())
    }
}

/// Completion stub that records the prompt and echoes a canned answer.
struct RecordingCompletion {
    prompts: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Completion for RecordingCompletion {
    fn model_name(&self) -> &str {
        "recording-test"
    }
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("A generated answer.".to_string())
    }
}

#[tokio::test]
async fn ingest_hello_world_document_yields_two_chunks() {
    // 13 chars × 100 = 1300 chars with the default geometry.
    let text = "Hello world. ".repeat(100);
    let documents = vec![Document::new("doc1", text)];

    let corpus = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();

    assert_eq!(corpus.index.len(), 2);
    let hits = corpus
        .index
        .search(&histogram("Hello world."), 2)
        .unwrap();
    assert!(hits.iter().all(|h| h.tag == "doc1"));
}

#[tokio::test]
async fn query_returns_at_most_index_size_ordered_ascending() {
    let documents = vec![
        Document::new("a.txt", "rust systems programming"),
        Document::new("b.txt", "gardening in spring"),
        Document::new("c.txt", "medieval naval history"),
    ];
    let corpus = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();
    assert_eq!(corpus.index.len(), 3);

    let hits = pipeline::query(&HistogramEmbedder, &corpus.index, "rust programming", 5)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn repeated_ingest_produces_identical_shape() {
    let documents = vec![
        Document::new("one.txt", "Hello world. ".repeat(100)),
        Document::new("two.txt", "Completely different body text. ".repeat(40)),
    ];

    let a = pipeline::ingest(&HistogramEmbedder, documents.clone(), 1000, 200)
        .await
        .unwrap();
    let b = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();

    assert_eq!(a.index.len(), b.index.len());
    assert_eq!(a.index.dims(), b.index.dims());
}

#[tokio::test]
async fn empty_documents_are_skipped_but_batch_survives() {
    let documents = vec![
        Document::new("empty.txt", "   \n  "),
        Document::new("real.txt", "Actual content to index."),
    ];
    let corpus = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();
    assert_eq!(corpus.index.len(), 1);
}

#[tokio::test]
async fn all_empty_documents_fail_the_whole_ingestion() {
    let documents = vec![
        Document::new("a.txt", ""),
        Document::new("b.txt", "\n\n\t "),
    ];
    let err = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus));
}

#[tokio::test]
async fn assembled_context_respects_token_budget() {
    let documents = vec![
        Document::new("big.txt", "Sentence of filler content here. ".repeat(200)),
        Document::new("other.txt", "Short other document."),
    ];
    let corpus = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();

    let hits = pipeline::query(&HistogramEmbedder, &corpus.index, "filler content", 5)
        .await
        .unwrap();
    let retrieved: Vec<String> = hits.into_iter().map(|h| h.tag).collect();

    let selected = corpus.document_text("big.txt").unwrap();
    for budget in [50, 200, 2000] {
        let ctx = pipeline::answer_context(selected, &retrieved, budget, "gpt-3.5-turbo").unwrap();
        assert!(token::estimate(&ctx, "gpt-3.5-turbo").unwrap() <= budget);
    }
}

#[tokio::test]
async fn answer_flow_prompts_with_selected_document_first() {
    let documents = vec![
        Document::new("selected.txt", "The selected document body."),
        Document::new("other.txt", "Another document entirely."),
    ];
    let corpus = pipeline::ingest(&HistogramEmbedder, documents, 1000, 200)
        .await
        .unwrap();

    let completion = RecordingCompletion::new();
    let question = Question {
        text: "What does the document say?".to_string(),
        document: "selected.txt".to_string(),
        answer_length: 150,
    };

    let answer = pipeline::answer(
        &HistogramEmbedder,
        &completion,
        &corpus,
        &question,
        &Config::default(),
    )
    .await
    .unwrap();
    assert_eq!(answer, "A generated answer.");

    let prompts = completion.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("'selected.txt'"));
    assert!(prompt.contains("approximately 150 words"));
    assert!(prompt.contains("Question: What does the document say?"));
    // The selected document's text leads the context.
    let ctx_pos = prompt.find("Context:").unwrap();
    let body_pos = prompt.find("The selected document body.").unwrap();
    assert!(body_pos > ctx_pos);
    assert!(prompt.ends_with("Answer:"));
}

#[tokio::test]
async fn store_publishes_complete_versions_only() {
    let store = CorpusStore::new();
    assert!(store.current().is_none());

    let v1 = store
        .rebuild(
            &HistogramEmbedder,
            vec![Document::new("a.txt", "first corpus")],
            1000,
            200,
        )
        .await
        .unwrap();
    assert_eq!(v1.version, 1);

    // A failing rebuild must leave the published version untouched.
    let err = store
        .rebuild(
            &HistogramEmbedder,
            vec![Document::new("empty.txt", " ")],
            1000,
            200,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus));
    assert_eq!(store.current().unwrap().version, 1);

    // A successful rebuild atomically supersedes it; old handles stay
    // readable.
    let v2 = store
        .rebuild(
            &HistogramEmbedder,
            vec![Document::new("b.txt", "second corpus")],
            1000,
            200,
        )
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(store.current().unwrap().version, 2);
    assert!(v1.corpus.document_text("a.txt").is_some());
}

#[tokio::test]
async fn query_against_stale_handle_still_works() {
    let store = CorpusStore::new();
    let v1 = store
        .rebuild(
            &HistogramEmbedder,
            vec![Document::new("old.txt", "the old corpus body")],
            1000,
            200,
        )
        .await
        .unwrap();
    store
        .rebuild(
            &HistogramEmbedder,
            vec![Document::new("new.txt", "the new corpus body")],
            1000,
            200,
        )
        .await
        .unwrap();

    let hits = pipeline::query(&HistogramEmbedder, &v1.corpus.index, "old corpus", 1)
        .await
        .unwrap();
    assert_eq!(hits[0].tag, "old.txt");
}

#[test]
fn context_assembly_matches_estimator_guarantee() {
    let fragments: Vec<String> = (0..10)
        .map(|i| format!("fragment {} with a reasonable amount of text", i))
        .collect();
    let out = context::assemble(&fragments, 40, "gpt-3.5-turbo").unwrap();
    assert!(token::estimate(&out, "gpt-3.5-turbo").unwrap() <= 40);
}
