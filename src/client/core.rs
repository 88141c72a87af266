use crate::client::builder::{missing_api_key, GeminiClientBuilder};
use crate::client::catalog::{self, ModelCatalog};
use crate::client::endpoint::resolve_endpoint;
use crate::client::error_classification::classify;
use crate::config::GeminiConfig;
use crate::response::GeminiResponse;
use crate::transport::{HttpTransport, TransportError};
use crate::types::WirePayload;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Client for the Gemini REST API.
///
/// Cloning is cheap; clones share the transport and the model catalog.
/// Mutating the default model or key needs `&mut self`, so it can never race
/// a `send` on the same value.
#[derive(Clone)]
pub struct GeminiClient {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) catalog: Arc<ModelCatalog>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.transport.timeout())
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        GeminiClientBuilder::new().api_key(api_key).build()
    }

    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        GeminiClientBuilder::from_config(config).build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.model = model.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the API key. An empty key is rejected and the old one kept.
    pub fn set_api_key(&mut self, key: impl Into<String>) -> Result<&mut Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(missing_api_key("gemini_client"));
        }
        self.api_key = key;
        Ok(self)
    }

    /// Cached catalog entries, if they have been fetched.
    pub fn catalog(&self) -> Option<Arc<Vec<String>>> {
        self.catalog.get()
    }

    /// Catalog entries, fetching them on first use.
    pub async fn list_models(&self) -> Result<Arc<Vec<String>>> {
        match self.catalog.get() {
            Some(names) => Ok(names),
            None => self.refresh_catalog().await,
        }
    }

    /// Fetch the catalog again, replacing whatever was cached.
    pub async fn refresh_catalog(&self) -> Result<Arc<Vec<String>>> {
        let url = format!("{}/models", self.base_url);
        debug!(url = %url, "fetching gemini model catalog");

        let reply = self
            .transport
            .get_json(&url, &self.api_key)
            .await
            .map_err(|e| network_failure("Network error while fetching available models", e))?;
        if !reply.is_success() {
            return Err(classify(&reply));
        }

        let names = catalog::parse_model_names(&reply.body);
        if names.is_empty() {
            return Err(Error::model_not_found("No models returned from the API."));
        }
        debug!(count = names.len(), "gemini model catalog loaded");
        Ok(self.catalog.store(names))
    }

    /// Send one payload and wrap the reply.
    ///
    /// `model` overrides the client default for this call only. Exactly one
    /// request is made, plus the catalog fetch the first time it is needed.
    /// No retries.
    pub async fn send(&self, payload: &WirePayload, model: Option<&str>) -> Result<GeminiResponse> {
        let model = model.unwrap_or(&self.model);
        let names = self.list_models().await?;
        catalog::ensure_listed(&names, model)?;

        let url = resolve_endpoint(&self.base_url, model, payload.operation(), Some(names.as_slice()));
        debug!(model, url = %url, "sending gemini request");

        let reply = self
            .transport
            .post_json(&url, &self.api_key, payload)
            .await
            .map_err(|e| network_failure("Network error while connecting to Gemini API", e))?;
        if !reply.is_success() {
            return Err(classify(&reply));
        }

        Ok(GeminiResponse::new(reply.body, model))
    }
}

fn network_failure(context: &str, err: TransportError) -> Error {
    if err.is_timeout() {
        Error::network(format!("{} (request timed out)", context), err)
    } else {
        Error::network(context, err)
    }
}
