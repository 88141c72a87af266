//! YAML-configured file cache shared by two independently built facades.

mod common;

use common::{text_reply, MockGemini, API_KEY, DEFAULT_MODELS};
use gemini_lib_rust::{Gemini, GeminiConfig, GenerationOptions};

fn config_yaml(base_url: &str, cache_dir: &std::path::Path) -> String {
    format!(
        r#"
api_key: {API_KEY}
base_url: {base_url}
request_timeout: 5
cache:
  enabled: true
  ttl: 600
  store: file
  path: {}
logging:
  enabled: true
  channel: gemini
"#,
        cache_dir.display()
    )
}

#[tokio::test]
async fn test_file_cache_survives_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let mut mock = MockGemini::new().await;
    let _models = mock
        .server
        .mock("GET", "/models")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            serde_json::json!({"models": DEFAULT_MODELS
                .iter()
                .map(|n| serde_json::json!({"name": n}))
                .collect::<Vec<_>>()})
            .to_string(),
        )
        .create_async()
        .await;
    let generate = mock
        .mock_post("/models/gemini-pro:generateContent", 200, text_reply("persisted"), 1)
        .await;

    let config = GeminiConfig::from_yaml_str(&config_yaml(&mock.base_url, dir.path())).unwrap();
    assert!(config.cache.enabled);

    let first = Gemini::from_config(&config).unwrap();
    let reply = first.generate("Remember me", GenerationOptions::new()).await.unwrap();
    assert_eq!(reply.content(), "persisted");

    let second = Gemini::from_config(&config).unwrap();
    let cached = second.generate("Remember me", GenerationOptions::new()).await.unwrap();
    assert_eq!(cached, reply);
    assert_eq!(second.cache_stats().hits, 1);
    generate.assert_async().await;

    second.flush_cache().await.unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_key_in_config_fails_construction() {
    let config = GeminiConfig::from_yaml_str("base_url: https://example.test/v1\n").unwrap();
    let err = Gemini::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), gemini_lib_rust::ErrorKind::Configuration);
}
