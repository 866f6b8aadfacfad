//! Greedy word-wrap against measured pixel widths.
//!
//! The measure function is supplied by the caller (normally a `FontHandle`),
//! so the algorithm itself is independent of any font backend.

use tracing::debug;

/// Maximum number of lines the caption panel has room for.
pub const MAX_LINES: usize = 4;

/// Wraps `text` into at most [`MAX_LINES`] lines no wider than `width_budget`.
///
/// Words are split on whitespace and never broken: a single word wider than the
/// budget overflows its own line. Lines past the cap are dropped.
pub fn wrap_text<F>(text: &str, width_budget: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= width_budget {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_LINES {
        debug!(
            "Wrapped text truncated from {} to {} lines",
            lines.len(),
            MAX_LINES
        );
        lines.truncate(MAX_LINES);
    }

    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
