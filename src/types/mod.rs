//! Request-side types.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | Tagged request variants and generation options |
//! | [`wire`] | Serde bodies posted to the API |
//! | [`image`] | Image file loading and data-URL parsing |

pub mod image;
pub mod request;
pub mod wire;

pub use request::{ChatTurn, EmbeddingOptions, GenerateRequest, GenerationOptions};
pub use wire::{
    Content, EmbedContentBody, GenerateContentBody, GenerationConfig, InlineData, Part,
    SafetySetting, WirePayload,
};
