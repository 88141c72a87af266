//! Model pricing and cost estimation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Limits and per-1k-token prices of one model, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRates {
    pub max_tokens: u32,
    pub input_price_per_1k: f64,
    pub output_price_per_1k: f64,
}

impl ModelRates {
    pub fn new(max_tokens: u32, input: f64, output: f64) -> Self {
        Self {
            max_tokens,
            input_price_per_1k: input,
            output_price_per_1k: output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub rates: ModelRates,
}

impl ModelDescriptor {
    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> CostEstimate {
        let ic = (input_tokens as f64 / 1000.0) * self.rates.input_price_per_1k;
        let oc = (output_tokens as f64 / 1000.0) * self.rates.output_price_per_1k;
        CostEstimate {
            model: self.name.clone(),
            input_tokens,
            output_tokens,
            input_cost: ic,
            output_cost: oc,
            total_cost: ic + oc,
            currency: "USD".into(),
        }
    }
}

/// Static per-model rate table. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    models: BTreeMap<String, ModelRates>,
}

impl PricingTable {
    pub fn new(models: BTreeMap<String, ModelRates>) -> Self {
        Self { models }
    }

    /// The built-in Gemini rates.
    pub fn builtin_models() -> BTreeMap<String, ModelRates> {
        [
            ("gemini-pro", ModelRates::new(8192, 0.00025, 0.0005)),
            ("gemini-pro-vision", ModelRates::new(8192, 0.0025, 0.0005)),
            ("gemini-ultra", ModelRates::new(8192, 0.0025, 0.0075)),
            ("gemini-ultra-vision", ModelRates::new(8192, 0.0025, 0.0075)),
        ]
        .into_iter()
        .map(|(name, rates)| (name.to_string(), rates))
        .collect()
    }

    pub fn descriptor(&self, model: &str) -> Option<ModelDescriptor> {
        let name = model.strip_prefix("models/").unwrap_or(model);
        self.models.get(name).map(|rates| ModelDescriptor {
            name: name.to_string(),
            rates: *rates,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Cost in USD; 0.0 for models without a price.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.cost_estimate(input_tokens, output_tokens, model)
            .total_cost
    }

    pub fn cost_estimate(&self, input_tokens: u32, output_tokens: u32, model: &str) -> CostEstimate {
        match self.descriptor(model) {
            Some(d) => d.calculate_cost(input_tokens, output_tokens),
            None => CostEstimate {
                model: model.to_string(),
                input_tokens,
                output_tokens,
                input_cost: 0.0,
                output_cost: 0.0,
                total_cost: 0.0,
                currency: "USD".into(),
            },
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new(Self::builtin_models())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl CostEstimate {
    pub fn format_detailed(&self) -> String {
        if self.total_cost < 0.01 {
            format!("{:.4}¢", self.total_cost * 100.0)
        } else {
            format!("${:.4}", self.total_cost)
        }
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.6}", self.total_cost)
    }
}
