//! Request/response logging.
//!
//! Records go through `tracing`; the host decides where they end up. Every
//! record carries the configured channel name as a field.

use serde_json::Value;
use tracing::{error, info};

use crate::config::LoggingSettings;
use crate::response::GeminiResponse;
use crate::types::WirePayload;
use crate::Error;

const MAX_LOGGED_TEXT: usize = 100;
const TRUNCATION_MARKER: &str = "... [truncated]";

#[derive(Debug, Clone)]
pub struct RequestLogger {
    enabled: bool,
    channel: String,
}

impl RequestLogger {
    pub fn new(enabled: bool, channel: impl Into<String>) -> Self {
        Self {
            enabled,
            channel: channel.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, "stack")
    }

    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self::new(settings.enabled, settings.channel.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn log_request(&self, payload: &WirePayload, model: &str) {
        if !self.enabled {
            return;
        }
        let payload = sanitize_payload(payload);
        info!(channel = %self.channel, model, payload = %payload, "Gemini API Request");
    }

    pub fn log_response(&self, response: &GeminiResponse, estimated_cost: f64) {
        if !self.enabled {
            return;
        }
        let usage = response.token_usage();
        info!(
            channel = %self.channel,
            model = response.model(),
            successful = response.successful(),
            finish_reason = response.finish_reason(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            estimated_cost,
            "Gemini API Response"
        );
    }

    pub fn log_error(&self, err: &Error) {
        if !self.enabled {
            return;
        }
        error!(
            channel = %self.channel,
            kind = %err.kind(),
            status = err.http_status(),
            message = %err,
            "Gemini API Error"
        );
    }
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Payload as JSON with long text parts shortened. Inline image data is kept.
pub fn sanitize_payload(payload: &WirePayload) -> Value {
    let mut value = serde_json::to_value(payload).unwrap_or(Value::Null);
    if let Some(contents) = value.get_mut("contents").and_then(Value::as_array_mut) {
        for content in contents {
            truncate_parts(content);
        }
    }
    if let Some(content) = value.get_mut("content") {
        truncate_parts(content);
    }
    value
}

fn truncate_parts(content: &mut Value) {
    let Some(parts) = content.get_mut("parts").and_then(Value::as_array_mut) else {
        return;
    };
    for part in parts {
        if let Some(Value::String(text)) = part.get_mut("text") {
            if text.len() > MAX_LOGGED_TEXT {
                let mut cut = MAX_LOGGED_TEXT;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
                text.push_str(TRUNCATION_MARKER);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatTurn, EmbeddingOptions, GenerateRequest, GenerationOptions};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let buf = Capture::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buf.text()
    }

    fn chat_payload(text: &str) -> WirePayload {
        GenerateRequest::Chat {
            turns: vec![ChatTurn::user(text), ChatTurn::model("short")],
            options: GenerationOptions::new(),
        }
        .to_payload()
        .unwrap()
    }

    #[test]
    fn test_long_text_is_truncated() {
        let sanitized = sanitize_payload(&chat_payload(&"a".repeat(150)));
        let expected = format!("{}{}", "a".repeat(100), TRUNCATION_MARKER);
        assert_eq!(sanitized["contents"][0]["parts"][0]["text"], expected);
        assert_eq!(sanitized["contents"][1]["parts"][0]["text"], "short");
    }

    #[test]
    fn test_exactly_limit_is_kept() {
        let text = "b".repeat(100);
        let sanitized = sanitize_payload(&chat_payload(&text));
        assert_eq!(sanitized["contents"][0]["parts"][0]["text"], text);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 'é' is two bytes; byte 100 falls inside one
        let text = format!("a{}", "é".repeat(60));
        let sanitized = sanitize_payload(&chat_payload(&text));
        let out = sanitized["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.len(), 99 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_embed_payload_is_truncated_too() {
        let payload = GenerateRequest::Embed {
            text: "z".repeat(200),
            model: "embedding-001".into(),
            options: EmbeddingOptions::new(),
        }
        .to_payload()
        .unwrap();
        let sanitized = sanitize_payload(&payload);
        assert!(sanitized["content"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let logger = RequestLogger::disabled();
        let out = capture(|| {
            logger.log_request(&chat_payload("hi"), "gemini-pro");
            logger.log_error(&Error::configuration("x"));
        });
        assert!(out.is_empty());
    }

    #[test]
    fn test_enabled_logger_writes_channel_and_model() {
        let logger = RequestLogger::new(true, "gemini");
        let out = capture(|| {
            logger.log_request(&chat_payload("hi"), "gemini-pro");
            logger.log_error(&Error::RateLimitExceeded {
                message: "slow".into(),
            });
        });
        assert!(out.contains("Gemini API Request"));
        assert!(out.contains("channel=gemini"));
        assert!(out.contains("gemini-pro"));
        assert!(out.contains("Gemini API Error"));
        assert!(out.contains("rate_limit_exceeded"));
    }
}
