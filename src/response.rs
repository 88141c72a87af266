//! The response envelope: a decoded API reply plus the model that produced it.
//!
//! All accessors are derived on demand from `raw`; nothing is cached or
//! mutated after construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tokens::{CostEstimate, PricingTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiResponse {
    raw: Value,
    model: String,
}

impl GeminiResponse {
    pub fn new(raw: Value, model: impl Into<String>) -> Self {
        Self {
            raw,
            model: model.into(),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn first_candidate(&self) -> Option<&Value> {
        self.raw
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
    }

    /// Text of the first part of the first candidate, or `""`.
    pub fn content(&self) -> &str {
        self.first_candidate()
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Token counts from `usageMetadata`; zeros when absent.
    pub fn token_usage(&self) -> TokenUsage {
        let usage = self.raw.get("usageMetadata");
        let count = |field: &str| {
            usage
                .and_then(|u| u.get(field))
                .and_then(Value::as_u64)
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(0)
        };
        TokenUsage {
            prompt_tokens: count("promptTokenCount"),
            completion_tokens: count("candidatesTokenCount"),
            total_tokens: count("totalTokenCount"),
        }
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.first_candidate()
            .and_then(|c| c.get("finishReason"))
            .and_then(Value::as_str)
    }

    /// True when the reply carries at least one candidate.
    ///
    /// Embedding replies have no candidates; use [`embedding`](Self::embedding)
    /// for those.
    pub fn successful(&self) -> bool {
        self.raw
            .get("candidates")
            .and_then(Value::as_array)
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    pub fn estimated_cost(&self, pricing: &PricingTable) -> f64 {
        self.cost_estimate(pricing).total_cost
    }

    pub fn cost_estimate(&self, pricing: &PricingTable) -> CostEstimate {
        let usage = self.token_usage();
        pricing.cost_estimate(usage.prompt_tokens, usage.completion_tokens, &self.model)
    }

    /// Vector from an `embedContent` reply (`embedding.values`).
    pub fn embedding(&self) -> Option<Vec<f32>> {
        let values = self.raw.pointer("/embedding/values")?.as_array()?;
        values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }
}
