//! Request orchestrators.
//!
//! Each service shapes a payload for its operation family, fingerprints it and
//! runs the send through the response cache:
//!
//! ```text
//! caller -> service (payload + fingerprint) -> cache.compute_if_absent -> client.send -> GeminiResponse
//! ```
//!
//! Services never mutate the client; the model for a call is resolved up front
//! and passed to `send` explicitly.

mod embedding;
mod text;
mod vision;

pub use embedding::{EmbeddingService, DEFAULT_EMBEDDING_MODEL};
pub use text::TextService;
pub use vision::{VisionService, DEFAULT_VISION_MODEL};

use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheConfig, Fingerprint, NullCache, ResponseCache};
use crate::client::GeminiClient;
use crate::logging::RequestLogger;
use crate::response::GeminiResponse;
use crate::tokens::{CharacterEstimator, PricingTable, TokenCounter};
use crate::types::{GenerateRequest, WirePayload};
use crate::{Error, Result};

/// Collaborators shared by every service. Cheap to clone.
#[derive(Clone)]
pub struct ServiceContext {
    client: GeminiClient,
    cache: Arc<ResponseCache>,
    logger: RequestLogger,
    counter: Arc<dyn TokenCounter>,
    pricing: Arc<PricingTable>,
}

impl ServiceContext {
    pub fn new(
        client: GeminiClient,
        cache: Arc<ResponseCache>,
        logger: RequestLogger,
        pricing: Arc<PricingTable>,
    ) -> Self {
        Self {
            client,
            cache,
            logger,
            counter: Arc::new(CharacterEstimator::new()),
            pricing,
        }
    }

    /// No caching, no logging, built-in prices.
    pub fn bare(client: GeminiClient) -> Self {
        Self::new(
            client,
            Arc::new(ResponseCache::new(
                CacheConfig::new().with_enabled(false),
                Arc::new(NullCache::new()),
            )),
            RequestLogger::disabled(),
            Arc::new(PricingTable::default()),
        )
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn logger(&self) -> &RequestLogger {
        &self.logger
    }

    pub fn pricing(&self) -> &Arc<PricingTable> {
        &self.pricing
    }

    pub fn token_counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    pub fn with_client(mut self, client: GeminiClient) -> Self {
        self.client = client;
        self
    }

    /// Payload, fingerprint, request log, cache-or-send, then response or
    /// error log.
    pub(crate) async fn execute(
        &self,
        request: &GenerateRequest,
        model: &str,
    ) -> Result<GeminiResponse> {
        let payload = match build_payload(request).await {
            Ok(p) => p,
            Err(e) => {
                self.logger.log_error(&e);
                return Err(e);
            }
        };
        let fingerprint = Fingerprint::for_request(request, model);
        debug!(
            fingerprint = %fingerprint,
            estimated_prompt_tokens = self.counter.count_payload(&payload),
            "prepared gemini request"
        );

        self.logger.log_request(&payload, model);
        let result = self
            .cache
            .compute_if_absent(fingerprint.as_str(), request.cache_ttl(), || {
                self.client.send(&payload, Some(model))
            })
            .await;

        match &result {
            Ok(response) => self
                .logger
                .log_response(response, response.estimated_cost(&self.pricing)),
            Err(e) => self.logger.log_error(e),
        }
        result
    }
}

/// Image reads go to the blocking pool so large files do not stall the runtime.
async fn build_payload(request: &GenerateRequest) -> Result<WirePayload> {
    if !request.reads_files() {
        return request.to_payload();
    }
    let owned = request.clone();
    tokio::task::spawn_blocking(move || owned.to_payload())
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?
}
