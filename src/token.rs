//! Approximate token counting for context budgeting.
//!
//! The real tokenizer lives server-side; this module only needs an
//! estimate that is deterministic and conservative enough that the
//! context assembler never overstates the remaining headroom. The
//! heuristic combines a characters-per-token ratio with a word-count
//! floor: short words tokenize to at least one token each.

use crate::error::{Error, Result};

/// Recognized model families and their approximate characters-per-token
/// ratio. Matched by prefix so versioned ids (`gpt-4-0613`) resolve to
/// their family.
const MODEL_SCHEMES: &[(&str, f64)] = &[
    ("gpt-3.5", 4.0),
    ("gpt-4", 4.0),
    ("claude", 3.5),
    ("gemini", 4.0),
];

fn chars_per_token(model_name: &str) -> Result<f64> {
    MODEL_SCHEMES
        .iter()
        .find(|(prefix, _)| model_name.starts_with(prefix))
        .map(|(_, ratio)| *ratio)
        .ok_or_else(|| Error::UnknownModel(model_name.to_string()))
}

/// Estimate the number of tokens `text` would consume under `model_name`.
///
/// Deterministic for a given (text, model) pair. Fails with
/// [`Error::UnknownModel`] for unrecognized model names; the config layer
/// validates the configured model up front so callers on the query path
/// never hit that at runtime.
pub fn estimate(text: &str, model_name: &str) -> Result<usize> {
    let ratio = chars_per_token(model_name)?;
    let chars = text.chars().count();
    let by_chars = (chars as f64 / ratio).ceil() as usize;
    let by_words = text.split_whitespace().count();
    Ok(by_chars.max(by_words))
}
