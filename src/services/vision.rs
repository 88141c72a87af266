use std::path::PathBuf;

use super::ServiceContext;
use crate::response::GeminiResponse;
use crate::types::{GenerateRequest, GenerationOptions};
use crate::Result;

/// Model used when the requested one cannot take images.
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";

/// Image + text generation.
#[derive(Clone)]
pub struct VisionService {
    ctx: ServiceContext,
}

impl VisionService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// The requested (or client default) model, replaced by
    /// [`DEFAULT_VISION_MODEL`] unless its name contains `vision`.
    pub fn resolve_model(&self, options: &GenerationOptions) -> String {
        let requested = options
            .model
            .as_deref()
            .unwrap_or_else(|| self.ctx.client().model());
        if requested.contains("vision") {
            requested.to_string()
        } else {
            DEFAULT_VISION_MODEL.to_string()
        }
    }

    pub async fn generate_from_image(
        &self,
        image: impl Into<PathBuf>,
        prompt: Option<&str>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        let model = self.resolve_model(&options);
        let request = GenerateRequest::VisionSingle {
            image: image.into(),
            prompt: prompt.map(str::to_string),
            options,
        };
        self.ctx.execute(&request, &model).await
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
        let model = self.resolve_model(&options);
        let request = GenerateRequest::VisionMulti {
            images: images.into_iter().map(Into::into).collect(),
            prompt: prompt.map(str::to_string),
            options,
        };
        self.ctx.execute(&request, &model).await
    }

    /// `data` may carry a `data:<mime>;base64,` prefix; otherwise PNG is assumed.
    pub async fn generate_from_base64(
        &self,
        data: impl Into<String>,
        prompt: Option<&str>,
        options: GenerationOptions,
    ) -> Result<GeminiResponse> {
        let model = self.resolve_model(&options);
        let request = GenerateRequest::VisionBase64 {
            data: data.into(),
            prompt: prompt.map(str::to_string),
            options,
        };
        self.ctx.execute(&request, &model).await
    }
}
