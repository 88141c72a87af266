use super::ServiceContext;
use crate::embeddings::cosine_similarity;
use crate::response::GeminiResponse;
use crate::types::{EmbeddingOptions, GenerateRequest};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";

/// Text embeddings (`embedContent`) and similarity.
#[derive(Clone)]
pub struct EmbeddingService {
    ctx: ServiceContext,
}

impl EmbeddingService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn embed_text(
        &self,
        text: impl Into<String>,
        options: EmbeddingOptions,
    ) -> Result<GeminiResponse> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let request = GenerateRequest::Embed {
            text: text.into(),
            model: model.clone(),
            options,
        };
        self.ctx.execute(&request, &model).await
    }

    /// Embed each text in turn. Results keep input order; the first failure
    /// stops the batch.
    pub async fn embed_batch<I, S>(
        &self,
        texts: I,
        options: EmbeddingOptions,
    ) -> Result<Vec<GeminiResponse>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        if texts.is_empty() {
            return Err(Error::invalid_input_with_context(
                "At least one text is required for batch embedding",
                ErrorContext::new()
                    .with_field_path("texts")
                    .with_source("embedding_service"),
            ));
        }
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_text(text, options.clone()).await?);
        }
        Ok(results)
    }

    pub fn calculate_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        cosine_similarity(a, b)
    }
}
