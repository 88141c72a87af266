use crate::client::catalog::ModelCatalog;
use crate::client::core::GeminiClient;
use crate::config::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`GeminiClient`].
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Seed the builder from a loaded configuration.
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.default_model.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the API base URL (primarily for testing with mock servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Default model used when `send` is not given one.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client. Fails eagerly on an empty API key or malformed base URL.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = match self.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(missing_api_key("client_builder")),
        };

        let base_url = self.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL '{}'", base_url),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(e.to_string())
                    .with_source("client_builder"),
            )
        })?;

        let transport = HttpTransport::new(self.timeout).map_err(|e| {
            Error::configuration_with_context(
                "Failed to create HTTP transport",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("client_builder"),
            )
        })?;

        Ok(GeminiClient {
            api_key,
            base_url,
            model: self.model,
            transport: Arc::new(transport),
            catalog: Arc::new(ModelCatalog::new()),
        })
    }
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn missing_api_key(source: &str) -> Error {
    Error::configuration_with_context(
        "Gemini API key is not set. Please set GEMINI_API_KEY in your environment.",
        ErrorContext::new()
            .with_field_path("api_key")
            .with_source(source),
    )
}
