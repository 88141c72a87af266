//! Token counter implementations.

use crate::types::WirePayload;

pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;

    /// Sum of the estimates for every text part of a payload.
    ///
    /// Inline image data is not counted.
    fn count_payload(&self, payload: &WirePayload) -> usize {
        payload.texts().iter().map(|t| self.count_tokens(t)).sum()
    }
}

/// Length-based approximation: one token per `chars_per_token` characters,
/// rounded up. Counts Unicode scalar values, not bytes.
#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: f64,
}

impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4.0)
    }

    pub fn with_ratio(r: f64) -> Self {
        Self { chars_per_token: r }
    }
}

impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharacterEstimator {
    fn count_tokens(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}
