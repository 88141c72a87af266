//! # gemini-lib-rust
//!
//! Client library for the Google Gemini generative-AI REST API.
//!
//! ## Overview
//!
//! Structured requests (text prompts, chat turns, image + text inputs,
//! embedding requests) are converted into wire payloads, sent with the API key
//! and a timeout, and returned as a [`GeminiResponse`] envelope or a typed
//! [`Error`]. Idempotent requests are memoized in a fingerprint-keyed cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gemini_lib_rust::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> gemini_lib_rust::Result<()> {
//!     let gemini = Gemini::from_config(&GeminiConfig::from_env())?;
//!
//!     let reply = gemini
//!         .chat(
//!             vec![ChatTurn::user("Hi"), ChatTurn::model("Hello!"), ChatTurn::user("Tell me a joke")],
//!             GenerationOptions::new().max_tokens(256),
//!         )
//!         .await?;
//!     println!("{} ({:?})", reply.content(), reply.token_usage());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | HTTP client, model catalog, endpoint resolution, error classification |
//! | [`response`] | Response envelope with content/usage/cost accessors |
//! | [`cache`] | Compute-if-absent response cache with pluggable storage |
//! | [`services`] | Text, vision and embedding orchestrators |
//! | [`facade`] | The [`Gemini`] entry point |
//! | [`jobs`] | Background jobs with bounded retries and callbacks |
//! | [`tokens`] | Token estimation and cost tables |
//! | [`embeddings`] | Vector math for embedding results |
//! | [`transport`] | reqwest-based HTTP exchange |
//! | [`config`] | YAML/env configuration |
//! | [`logging`] | Request/response logging over `tracing` |
//! | [`types`] | Request variants and wire bodies |

pub mod cache;
pub mod client;
pub mod config;
pub mod embeddings;
pub mod facade;
pub mod jobs;
pub mod logging;
pub mod response;
pub mod services;
pub mod tokens;
pub mod transport;
pub mod types;

pub use client::{GeminiClient, GeminiClientBuilder};
pub use config::GeminiConfig;
pub use facade::{prelude, Gemini};
pub use response::{GeminiResponse, TokenUsage};
pub use types::{ChatTurn, EmbeddingOptions, GenerateRequest, GenerationOptions};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
