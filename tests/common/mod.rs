//! Mock Gemini server shared by the integration tests.

#![allow(dead_code)]

use gemini_lib_rust::GeminiClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-key";

/// Catalog served by [`MockGemini::mock_models`] unless a test passes its own.
pub const DEFAULT_MODELS: &[&str] = &[
    "models/gemini-pro",
    "models/gemini-pro-vision",
    "models/embedding-001",
];

pub struct MockGemini {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockGemini {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn client(&self) -> GeminiClient {
        GeminiClient::builder()
            .api_key(API_KEY)
            .base_url(&self.base_url)
            .build()
            .expect("client against mock server")
    }

    /// `GET /models` returning `names`, expected exactly once.
    pub async fn mock_models(&mut self, names: &[&str]) -> Mock {
        let models: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        self.server
            .mock("GET", "/models")
            .match_query(Matcher::UrlEncoded("key".into(), API_KEY.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "models": models }).to_string())
            .expect(1)
            .create_async()
            .await
    }

    /// POST to `path` answering `status` with `body`, expected `hits` times.
    pub async fn mock_post(&mut self, path: &str, status: usize, body: Value, hits: usize) -> Mock {
        self.server
            .mock("POST", path)
            .match_query(Matcher::UrlEncoded("key".into(), API_KEY.into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create_async()
            .await
    }
}

pub fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 4,
            "candidatesTokenCount": 6,
            "totalTokenCount": 10
        }
    })
}

pub fn error_reply(code: u16, message: &str) -> Value {
    json!({"error": {"code": code, "message": message, "status": "ERROR"}})
}
