//! HTTP client for the Gemini REST API.
//!
//! Keep the public surface small: build a [`GeminiClient`], then `send`
//! payloads. Model catalog handling, endpoint resolution and error
//! classification live in submodules under `src/client/`.

pub mod builder;
mod catalog;
pub mod core;
mod endpoint;
mod error_classification;

pub use builder::GeminiClientBuilder;
pub use catalog::ModelCatalog;
pub use core::GeminiClient;
pub use endpoint::candidate_endpoints;
