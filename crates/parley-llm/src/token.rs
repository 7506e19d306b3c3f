//! Length-based token estimation
//!
//! Exact tokenization is not needed for context budgeting; one token per four
//! characters (rounded up) is close enough for English chat text.

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of a piece of text: `ceil(chars / 4)`
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
