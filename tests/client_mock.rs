//! GeminiClient against a mockito server: catalog, endpoints, classification.

mod common;

use common::{error_reply, text_reply, MockGemini, DEFAULT_MODELS};
use gemini_lib_rust::client::candidate_endpoints;
use gemini_lib_rust::types::{Content, GenerateContentBody, WirePayload};
use gemini_lib_rust::{ErrorKind, GeminiClient, GeminiConfig};
use std::time::Duration;

fn hello() -> WirePayload {
    WirePayload::Generate(GenerateContentBody {
        contents: vec![Content::text("Hello")],
        generation_config: None,
        safety_settings: vec![],
    })
}

#[tokio::test]
async fn test_send_returns_envelope() {
    let mut mock = MockGemini::new().await;
    let models = mock.mock_models(DEFAULT_MODELS).await;
    let generate = mock
        .mock_post("/models/gemini-pro:generateContent", 200, text_reply("Hi there"), 1)
        .await;

    let client = mock.client();
    let resp = client.send(&hello(), None).await.unwrap();

    assert_eq!(resp.content(), "Hi there");
    assert_eq!(resp.model(), "gemini-pro");
    assert_eq!(resp.token_usage().total_tokens, 10);
    assert!(resp.successful());
    models.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_catalog_is_fetched_once_and_shared_by_clones() {
    let mut mock = MockGemini::new().await;
    let models = mock.mock_models(DEFAULT_MODELS).await;
    let generate = mock
        .mock_post("/models/gemini-pro:generateContent", 200, text_reply("ok"), 3)
        .await;

    let client = mock.client();
    let clone = client.clone();
    client.send(&hello(), None).await.unwrap();
    client.send(&hello(), None).await.unwrap();
    clone.send(&hello(), None).await.unwrap();

    assert_eq!(client.catalog().unwrap().len(), DEFAULT_MODELS.len());
    models.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_model_override_uses_catalog_path() {
    let mut mock = MockGemini::new().await;
    let _models = mock.mock_models(&["tunedModels/gemini-pro-tuned"]).await;
    let generate = mock
        .mock_post(
            "/tunedModels/gemini-pro-tuned:generateContent",
            200,
            text_reply("tuned"),
            1,
        )
        .await;

    let client = mock.client();
    let resp = client.send(&hello(), Some("gemini-pro-tuned")).await.unwrap();
    assert_eq!(resp.content(), "tuned");
    assert_eq!(resp.model(), "gemini-pro-tuned");
    generate.assert_async().await;
}

#[tokio::test]
async fn test_unlisted_model_is_rejected_before_sending() {
    let mut mock = MockGemini::new().await;
    let _models = mock.mock_models(DEFAULT_MODELS).await;
    let generate = mock
        .mock_post("/models/gemini-nano:generateContent", 200, text_reply("x"), 0)
        .await;

    let err = mock
        .client()
        .send(&hello(), Some("gemini-nano"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelNotFound);
    assert!(err.to_string().contains("Model 'gemini-nano' not found"));
    assert!(err.to_string().contains("models/gemini-pro"));
    generate.assert_async().await;
}

#[tokio::test]
async fn test_empty_catalog_is_model_not_found() {
    let mut mock = MockGemini::new().await;
    let _models = mock.mock_models(&[]).await;

    let err = mock.client().list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelNotFound);
    assert!(err.to_string().contains("No models returned from the API."));
}

#[tokio::test]
async fn test_catalog_failure_is_classified() {
    let mut mock = MockGemini::new().await;
    let _models = mock
        .server
        .mock("GET", "/models")
        .match_query(mockito::Matcher::Any)
        .with_status(401)
        .with_body(error_reply(401, "API key not valid").to_string())
        .create_async()
        .await;

    let err = mock.client().send(&hello(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test]
async fn test_status_classification() {
    let cases = [
        (400, ErrorKind::BadRequest),
        (401, ErrorKind::Authentication),
        (404, ErrorKind::ModelNotFound),
        (429, ErrorKind::RateLimitExceeded),
        (500, ErrorKind::Api),
        (503, ErrorKind::Api),
    ];
    for (status, kind) in cases {
        let mut mock = MockGemini::new().await;
        let _models = mock.mock_models(DEFAULT_MODELS).await;
        let _generate = mock
            .mock_post(
                "/models/gemini-pro:generateContent",
                status,
                error_reply(status as u16, "server says no"),
                1,
            )
            .await;

        let err = mock.client().send(&hello(), None).await.unwrap_err();
        assert_eq!(err.kind(), kind, "status {}", status);
        assert_eq!(err.http_status(), Some(status as u16));
        assert!(err.to_string().contains("server says no"), "status {}", status);
    }
}

#[tokio::test]
async fn test_error_without_message_uses_fallback() {
    let mut mock = MockGemini::new().await;
    let _models = mock.mock_models(DEFAULT_MODELS).await;
    let _generate = mock
        .server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let err = mock.client().send(&hello(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.to_string().contains("Unknown error"));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let client = GeminiClient::builder()
        .api_key("k")
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.send(&hello(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert!(err
        .to_string()
        .contains("Network error while fetching available models"));
}

#[tokio::test]
async fn test_zero_timeout_means_unbounded() {
    let mut mock = MockGemini::new().await;
    let models = mock.mock_models(DEFAULT_MODELS).await;
    let generate = mock
        .mock_post("/models/gemini-pro:generateContent", 200, text_reply("no rush"), 1)
        .await;

    let yaml = format!(
        "api_key: {}\nbase_url: {}\nrequest_timeout: 0\n",
        common::API_KEY,
        mock.base_url
    );
    let config = GeminiConfig::from_yaml_str(&yaml).unwrap();
    assert!(config.timeout().is_zero());

    let client = GeminiClient::from_config(&config).unwrap();
    let resp = client.send(&hello(), None).await.unwrap();
    assert_eq!(resp.content(), "no rush");
    models.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_stalled_server_reports_timeout() {
    // accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stalled = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = GeminiClient::builder()
        .api_key("k")
        .base_url(format!("http://{}", addr))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let err = client.list_models().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.to_string().contains("(request timed out)"), "{}", err);
    stalled.abort();
}

#[test]
fn test_candidate_endpoint_shapes() {
    let [bare, qualified] = candidate_endpoints("https://h/v1", "gemini-pro", "generateContent");
    assert_eq!(bare, "https://h/v1/gemini-pro:generateContent");
    assert_eq!(qualified, "https://h/v1/models/gemini-pro:generateContent");
}

#[test]
fn test_builder_requires_api_key() {
    let err = GeminiClient::builder().build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}
