//! Mapping of completed HTTP exchanges to error kinds.

use serde_json::Value;

use crate::transport::HttpReply;
use crate::Error;

pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";

/// Classify a non-2xx reply. Never retries, only produces a typed failure.
pub(crate) fn classify(reply: &HttpReply) -> Error {
    let message = server_message(&reply.body);
    match reply.status {
        400 => Error::BadRequest { message },
        401 => Error::Authentication { message },
        404 => Error::ModelNotFound {
            message,
            status: Some(404),
        },
        429 => Error::RateLimitExceeded { message },
        status => Error::Api { status, message },
    }
}

/// `error.message` from the body, or a generic fallback.
pub(crate) fn server_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}
