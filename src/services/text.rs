use super::ServiceContext;
use crate::response::GeminiResponse;
use crate::types::{ChatTurn, GenerateRequest, GenerationOptions};
use crate::{Error, ErrorContext, Result};

/// Single-prompt and multi-turn text generation.
#[derive(Clone)]
pub struct TextService {
    ctx: ServiceContext,
}

impl TextService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    fn model_for(&self, options: &GenerationOptions) -> String {
        options
            .model
            .clone()
            .unwrap_or_else(|| self.ctx.client().model().to_string())
    }

    pub async fn generate(
        &self,
        prompt: impl Into<String>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        let model = self.model_for(&options);
        let request = GenerateRequest::Generate {
            prompt: prompt.into(),
            options,
        };
        self.ctx.execute(&request, &model).await
    }

    /// Turns are sent in order; a turn without a role is sent as `user`.
    pub async fn chat(
        &self,
        turns: Vec<ChatTurn>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        if turns.is_empty() {
            return Err(Error::invalid_input_with_context(
                "Chat requires at least one message",
                ErrorContext::new()
                    .with_field_path("messages")
                    .with_source("text_service"),
            ));
        }
        let model = self.model_for(&options);
        let request = GenerateRequest::Chat { turns, options };
        self.ctx.execute(&request, &model).await
    }
}
