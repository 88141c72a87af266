//! Token counting and cost estimation.
//!
//! Token counts are a cheap length-based approximation, not a tokenizer.
//! Prices come from a static per-model table; unknown models cost nothing.
//!
//! ```rust
//! use gemini_lib_rust::tokens::{CharacterEstimator, PricingTable, TokenCounter};
//!
//! let counter = CharacterEstimator::new();
//! assert_eq!(counter.count_tokens("Hello, world"), 3);
//!
//! let pricing = PricingTable::default();
//! let cost = pricing.estimate_cost(1000, 1000, "gemini-pro");
//! assert!((cost - 0.00075).abs() < 1e-12);
//! assert_eq!(pricing.estimate_cost(1000, 1000, "unknown-model"), 0.0);
//! ```

mod counter;
mod pricing;

pub use counter::{CharacterEstimator, TokenCounter};
pub use pricing::{CostEstimate, ModelDescriptor, ModelRates, PricingTable};
