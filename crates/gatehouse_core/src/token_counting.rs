//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Input and output tokens of one backend call, as reported by the provider
/// or estimated from text length.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    /// Always `prompt_tokens + completion_tokens`, saturating.
    total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// USD cost at the given per-million-token rates.
    pub fn priced_at(&self, input_per_million: f64, output_per_million: f64) -> f64 {
        let per_token = |tokens: u64, rate: f64| tokens as f64 * rate / 1_000_000.0;
        per_token(self.prompt_tokens, input_per_million)
            + per_token(self.completion_tokens, output_per_million)
    }
}

/// Rough token estimate: one token per four characters, rounded up.
///
/// ```
/// use gatehouse_core::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(4) as u64
}
