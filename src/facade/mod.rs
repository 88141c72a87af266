//! Single entry point composing the client, cache, logger and services.
//!
//! ```rust,no_run
//! use gemini_lib_rust::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> gemini_lib_rust::Result<()> {
//!     let gemini = Gemini::from_config(&GeminiConfig::from_env())?;
//!     let reply = gemini
//!         .generate("Write a haiku about Rust", GenerationOptions::new().temperature(0.7))
//!         .await?;
//!     println!("{}", reply.content());
//!     Ok(())
//! }
//! ```

pub mod prelude;

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::{backend_from_settings, CacheConfig, CacheStats, ResponseCache};
use crate::client::GeminiClient;
use crate::config::GeminiConfig;
use crate::jobs::{CallbackRegistry, GenerationJob, JobRunner, RetryPolicy};
use crate::logging::RequestLogger;
use crate::response::GeminiResponse;
use crate::services::{EmbeddingService, ServiceContext, TextService, VisionService};
use crate::tokens::PricingTable;
use crate::types::{ChatTurn, EmbeddingOptions, GenerateRequest, GenerationOptions};
use crate::Result;

#[derive(Clone)]
pub struct Gemini {
    ctx: ServiceContext,
    text: TextService,
    vision: VisionService,
    embeddings: EmbeddingService,
    jobs: JobRunner,
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini").finish_non_exhaustive()
    }
}

impl Gemini {
    /// Build everything from configuration. Fails on a missing API key.
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let client = GeminiClient::from_config(config)?;
        let cache = ResponseCache::new(
            CacheConfig::from_settings(&config.cache),
            backend_from_settings(&config.cache),
        );
        let ctx = ServiceContext::new(
            client,
            Arc::new(cache),
            RequestLogger::from_settings(&config.logging),
            Arc::new(config.pricing()),
        );
        Ok(Self::from_parts(ctx, Arc::new(CallbackRegistry::new())))
    }

    pub fn from_parts(ctx: ServiceContext, callbacks: Arc<CallbackRegistry>) -> Self {
        let jobs = JobRunner::new(ctx.client().clone(), callbacks);
        Self {
            text: TextService::new(ctx.clone()),
            vision: VisionService::new(ctx.clone()),
            embeddings: EmbeddingService::new(ctx.clone()),
            jobs,
            ctx,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.jobs = self.jobs.with_policy(policy);
        self
    }

    /// Same collaborators, different default model.
    pub fn with_model(self, model: impl Into<String>) -> Self {
        let client = self.ctx.client().clone().with_model(model);
        self.rebuild(client)
    }

    pub fn with_api_key(self, key: impl Into<String>) -> Result<Self> {
        let mut client = self.ctx.client().clone();
        client.set_api_key(key)?;
        Ok(self.rebuild(client))
    }

    fn rebuild(self, client: GeminiClient) -> Self {
        let policy = self.jobs.policy().clone();
        let callbacks = self.jobs.callbacks().clone();
        Self::from_parts(self.ctx.with_client(client), callbacks).with_retry_policy(policy)
    }

    pub fn client(&self) -> &GeminiClient {
        self.ctx.client()
    }

    pub fn text(&self) -> &TextService {
        &self.text
    }

    pub fn vision(&self) -> &VisionService {
        &self.vision
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn jobs(&self) -> &JobRunner {
        &self.jobs
    }

    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        self.jobs.callbacks()
    }

    pub fn pricing(&self) -> &PricingTable {
        self.ctx.pricing()
    }

    pub async fn generate(
        &self,
        prompt: impl Into<String>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        self.text.generate(prompt, options).await
    }

    pub async fn chat(
        &self,
        turns: Vec<ChatTurn>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        self.text.chat(turns, options).await
    }

    pub async fn generate_from_image(
        &self,
        image: impl Into<PathBuf>,
        prompt: Option<&str>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        self.vision.generate_from_image(image, prompt, options).await
    }

    pub async fn generate_from_images<I, P>(
        &self,
        images: I,
        prompt: Option<&str>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.vision.generate_from_images(images, prompt, options).await
    }

    pub async fn generate_from_base64(
        &self,
        data: impl Into<String>,
        prompt: Option<&str>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        self.vision.generate_from_base64(data, prompt, options).await
    }

    pub async fn embed_text(
        &self,
        text: impl Into<String>,
        options: EmbeddingOptions,
    ) -> Result<GeminiResponse> {
        self.embeddings.embed_text(text, options).await
    }

    pub async fn embed_batch<I, S>(
        &self,
        texts: I,
        options: EmbeddingOptions,
    ) -> Result<Vec<GeminiResponse>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embeddings.embed_batch(texts, options).await
    }

    pub fn calculate_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        self.embeddings.calculate_similarity(a, b)
    }

    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.ctx
            .pricing()
            .estimate_cost(input_tokens, output_tokens, model)
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.ctx.token_counter().count_tokens(text)
    }

    /// Forget one cached response by fingerprint.
    pub async fn forget_cached(&self, fingerprint: &str) -> Result<bool> {
        self.ctx.cache().forget(fingerprint).await
    }

    pub async fn flush_cache(&self) -> Result<()> {
        self.ctx.cache().flush().await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ctx.cache().stats()
    }

    /// Queue a text generation as a background job. The response cache is
    /// bypassed; `callback` names an entry in [`callbacks`](Self::callbacks).
    pub fn generate_async(
        &self,
        prompt: impl Into<String>,
        options: GenerationOptions,
        callback: Option<&str>,
        params: Vec<Value>,
    ) -> Result<JoinHandle<Result<GeminiResponse>>> {
        let model = options.model.clone();
        let request = GenerateRequest::Generate {
            prompt: prompt.into(),
            options,
        };
        self.dispatch(request, model, callback, params)
    }

    pub fn chat_async(
        &self,
        turns: Vec<ChatTurn>,
        options: GenerationOptions,
        callback: Option<&str>,
        params: Vec<Value>,
    ) -> Result<JoinHandle<Result<GeminiResponse>>> {
        let model = options.model.clone();
        let request = GenerateRequest::Chat { turns, options };
        self.dispatch(request, model, callback, params)
    }

    fn dispatch(
        &self,
        request: GenerateRequest,
        model: Option<String>,
        callback: Option<&str>,
        params: Vec<Value>,
    ) -> Result<JoinHandle<Result<GeminiResponse>>> {
        let mut job = GenerationJob::new(request.to_payload()?);
        job.model = model;
        if let Some(name) = callback {
            job = job.with_callback(name, params);
        }
        Ok(self.jobs.dispatch(job))
    }
}
