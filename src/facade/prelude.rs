//! Minimal prelude for application code.

pub use crate::client::{GeminiClient, GeminiClientBuilder};
pub use crate::config::GeminiConfig;
pub use crate::facade::Gemini;
pub use crate::response::{GeminiResponse, TokenUsage};
pub use crate::types::{ChatTurn, EmbeddingOptions, GenerationOptions, SafetySetting};
pub use crate::{Error, ErrorKind, Result};
