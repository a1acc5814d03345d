//! Core data models used throughout the pipeline.

/// A named document with its decoded plain-text body.
///
/// Created at ingestion time by the loader; immutable for the lifetime
/// of one corpus version. Chunks reference their source document by
/// name only, never by ownership.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A user question against one selected document.
#[derive(Debug, Clone)]
pub struct Question {
    /// Free-text question.
    pub text: String,
    /// Name of the document the user selected.
    pub document: String,
    /// Desired answer length in words (prompt hint, not enforced).
    pub answer_length: usize,
}
