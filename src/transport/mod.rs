//! HTTP transport for the Gemini REST API.
//!
//! The transport only moves JSON over the wire. Status interpretation lives in
//! the client's error classification.

mod http;

pub use http::{HttpReply, HttpTransport, TransportError};
