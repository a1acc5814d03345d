//! Error types for the document QA pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load document {file}: {reason}")]
    Load { file: String, reason: String },

    #[error("No valid chunks were generated from the documents")]
    EmptyCorpus,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Completion service error: {0}")]
    CompletionService(String),

    #[error("Unknown model for token estimation: {0}")]
    UnknownModel(String),

    #[error("No content found for document: {0}")]
    DocumentNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
