//! Recursive character text splitter.
//!
//! Splits document body text into overlapping chunks bounded by
//! `chunk_size` characters. Splitting walks a separator ladder —
//! paragraph breaks, then line breaks, then spaces, then raw characters —
//! so chunk boundaries prefer natural units. Adjacent small pieces are
//! merged back up to `chunk_size`, and when a split is forced mid-unit
//! the trailing `chunk_overlap` characters of the previous chunk lead
//! the next one, so nothing spanning a boundary is lost to either side.
//!
//! Lengths are measured in characters, not bytes, so multi-byte UTF-8
//! input never splits inside a code point.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Separator ladder, in decreasing priority. An oversized piece descends
/// to the next rung; past the last rung it is split into raw characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Split `text` into an ordered sequence of chunks.
///
/// # Errors
///
/// Fails with [`Error::Config`] when `chunk_size` is zero or
/// `chunk_overlap >= chunk_size`.
///
/// # Guarantees
///
/// - Empty or whitespace-only text yields an empty sequence.
/// - Text of at most `chunk_size` characters yields a single chunk equal
///   to the input.
/// - Every chunk is at most `chunk_size` characters.
/// - Consecutive chunks overlap by `chunk_overlap` characters: exactly on
///   raw-character splits, rounded to whole pieces on natural boundaries.
pub fn split(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::Config("chunk_size must be > 0".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(Error::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    if char_len(text) <= chunk_size {
        return Ok(vec![text.to_string()]);
    }

    let mut pieces = Vec::new();
    split_recursive(text, SEPARATORS, chunk_size, &mut pieces);
    Ok(merge_pieces(&pieces, chunk_size, chunk_overlap))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Break `text` into pieces no longer than `chunk_size`, preserving order.
/// Pieces keep their trailing separators, so concatenating them restores
/// the input exactly and chunks remain substrings of the source.
fn split_recursive<'a>(
    text: &'a str,
    separators: &[&str],
    chunk_size: usize,
    out: &mut Vec<&'a str>,
) {
    if char_len(text) <= chunk_size {
        out.push(text);
        return;
    }

    match separators.split_first() {
        Some((&sep, rest)) => {
            if text.contains(sep) {
                for part in text.split_inclusive(sep) {
                    if char_len(part) <= chunk_size {
                        out.push(part);
                    } else {
                        split_recursive(part, rest, chunk_size, out);
                    }
                }
            } else {
                split_recursive(text, rest, chunk_size, out);
            }
        }
        // Past the last rung: raw characters. The merge pass reassembles
        // them into windows with an exact character-level overlap.
        None => {
            let mut start = 0;
            for (idx, _) in text.char_indices().skip(1) {
                out.push(&text[start..idx]);
                start = idx;
            }
            out.push(&text[start..]);
        }
    }
}

/// Greedily merge pieces into chunks of at most `chunk_size` characters.
///
/// When a chunk is flushed, trailing pieces totaling at most
/// `chunk_overlap` characters stay in the window and lead the next chunk.
fn merge_pieces(pieces: &[&str], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let piece_len = char_len(piece);

        if total + piece_len > chunk_size && !window.is_empty() {
            let chunk: String = window.iter().copied().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            // Keep an overlap window, leaving room for the incoming piece.
            while total > chunk_overlap
                || (total + piece_len > chunk_size && total > 0)
            {
                let front = window.pop_front().expect("window is non-empty");
                total -= char_len(front);
            }
        }

        window.push_back(piece);
        total += piece_len;
    }

    if !window.is_empty() {
        let chunk: String = window.iter().copied().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }

    chunks
}
