//! Token-budgeted context assembly.
//!
//! Concatenates candidate fragments, in caller-supplied priority order,
//! until the next fragment would push the estimated token count past the
//! budget. Fragments are all-or-nothing: nothing is ever truncated
//! mid-string, and everything after the first overflowing fragment is
//! dropped.

use crate::error::Result;
use crate::token;

/// Greedily join `fragments` with newlines while the estimated token
/// count of the accumulated text stays within `max_tokens`.
///
/// Callers control priority by ordering fragments; once a fragment does
/// not fit, no later fragment is considered. The returned string's
/// estimated token count is always at most `max_tokens` — a first
/// fragment that alone overflows yields the empty string.
pub fn assemble(fragments: &[String], max_tokens: usize, model_name: &str) -> Result<String> {
    let mut combined = String::new();

    for fragment in fragments {
        let candidate = format!("{}\n{}", combined, fragment);
        if token::estimate(&candidate, model_name)? <= max_tokens {
            combined = candidate;
        } else {
            break;
        }
    }

    Ok(combined.trim().to_string())
}
