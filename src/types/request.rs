//! Typed request variants and their conversion into wire bodies.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;

use super::image::{load_image_file, parse_base64_image};
use super::wire::{
    Content, EmbedContentBody, GenerateContentBody, GenerationConfig, Part, SafetySetting,
    WirePayload,
};
use crate::{Error, ErrorContext, Result};

/// Task type sent with every embedding request.
pub const EMBEDDING_TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

/// Role applied to chat turns that do not name one.
pub const DEFAULT_ROLE: &str = "user";

/// Generation options shared by text and vision requests.
///
/// Unset fields are left out of the payload entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
    /// Per-call cache TTL override; not part of the request identity.
    #[serde(skip)]
    pub cache_ttl: Option<Duration>,
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn stop<I, S>(mut self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = Some(sequences.into_iter().map(Into::into).collect());
        self
    }

    pub fn safety_setting(mut self, setting: SafetySetting) -> Self {
        self.safety_settings.push(setting);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn generation_config(&self) -> Option<GenerationConfig> {
        let config = GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_tokens,
            stop_sequences: self.stop.clone(),
        };
        if config.is_empty() {
            None
        } else {
            Some(config)
        }
    }

    fn body(&self, contents: Vec<Content>) -> WirePayload {
        WirePayload::Generate(GenerateContentBody {
            contents,
            generation_config: self.generation_config(),
            safety_settings: self.safety_settings.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip)]
    pub cache_ttl: Option<Duration>,
}

impl EmbeddingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new("model", content)
    }

    /// A turn without an explicit role; it is sent as `user`.
    pub fn unattributed(content: impl Into<String>) -> Self {
        Self {
            role: None,
            content: content.into(),
        }
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }
}

/// One variant per public operation, each with its own field set.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateRequest {
    Generate {
        prompt: String,
        options: GenerationOptions,
    },
    Chat {
        turns: Vec<ChatTurn>,
        options: GenerationOptions,
    },
    VisionSingle {
        image: PathBuf,
        prompt: Option<String>,
        options: GenerationOptions,
    },
    VisionMulti {
        images: Vec<PathBuf>,
        prompt: Option<String>,
        options: GenerationOptions,
    },
    VisionBase64 {
        data: String,
        prompt: Option<String>,
        options: GenerationOptions,
    },
    Embed {
        text: String,
        model: String,
        options: EmbeddingOptions,
    },
}

impl GenerateRequest {
    /// Build the wire body. Vision variants read and encode their images here.
    pub fn to_payload(&self) -> Result<WirePayload> {
        match self {
            GenerateRequest::Generate { prompt, options } => {
                Ok(options.body(vec![Content::text(prompt.clone())]))
            }
            GenerateRequest::Chat { turns, options } => {
                let contents = turns
                    .iter()
                    .map(|t| Content::with_role(t.role(), vec![Part::text(t.content.clone())]))
                    .collect();
                Ok(options.body(contents))
            }
            GenerateRequest::VisionSingle {
                image,
                prompt,
                options,
            } => {
                let mut parts = prompt_part(prompt.as_deref());
                parts.push(Part::inline(load_image_file(image)?));
                Ok(options.body(vec![Content::new(parts)]))
            }
            GenerateRequest::VisionMulti {
                images,
                prompt,
                options,
            } => {
                if images.is_empty() {
                    return Err(Error::invalid_input_with_context(
                        "At least one image path is required",
                        ErrorContext::new()
                            .with_field_path("images")
                            .with_source("vision_service"),
                    ));
                }
                let mut parts = prompt_part(prompt.as_deref());
                for image in images {
                    parts.push(Part::inline(load_image_file(image)?));
                }
                Ok(options.body(vec![Content::new(parts)]))
            }
            GenerateRequest::VisionBase64 {
                data,
                prompt,
                options,
            } => {
                let mut parts = prompt_part(prompt.as_deref());
                parts.push(Part::inline(parse_base64_image(data)));
                Ok(options.body(vec![Content::new(parts)]))
            }
            GenerateRequest::Embed {
                text,
                model,
                options,
            } => Ok(WirePayload::Embed(EmbedContentBody {
                model: qualified_model_name(model),
                content: Content::text(text.clone()),
                task_type: EMBEDDING_TASK_TYPE.to_string(),
                title: options.title.clone(),
            })),
        }
    }

    /// Whether building the payload touches the filesystem.
    pub fn reads_files(&self) -> bool {
        matches!(
            self,
            GenerateRequest::VisionSingle { .. } | GenerateRequest::VisionMulti { .. }
        )
    }

    /// Cache namespace of the operation family.
    pub fn namespace(&self) -> &'static str {
        match self {
            GenerateRequest::Generate { .. } | GenerateRequest::Chat { .. } => "gemini",
            GenerateRequest::VisionSingle { .. }
            | GenerateRequest::VisionMulti { .. }
            | GenerateRequest::VisionBase64 { .. } => "gemini_vision",
            GenerateRequest::Embed { .. } => "gemini_embedding",
        }
    }

    /// The semantic input that identifies this request in the cache.
    ///
    /// Images are identified by path, base64 images by a digest of their data.
    pub fn identity_input(&self) -> String {
        match self {
            GenerateRequest::Generate { prompt, .. } => prompt.clone(),
            GenerateRequest::Chat { turns, .. } => {
                let resolved: Vec<serde_json::Value> = turns
                    .iter()
                    .map(|t| serde_json::json!({"role": t.role(), "content": t.content}))
                    .collect();
                serde_json::Value::Array(resolved).to_string()
            }
            GenerateRequest::VisionSingle { image, prompt, .. } => {
                format!("{}{}", image.display(), prompt.as_deref().unwrap_or(""))
            }
            GenerateRequest::VisionMulti { images, prompt, .. } => {
                let joined: String = images.iter().map(|p| p.display().to_string()).collect();
                format!("{}{}", joined, prompt.as_deref().unwrap_or(""))
            }
            GenerateRequest::VisionBase64 { data, prompt, .. } => {
                let digest: String = Sha256::digest(data.as_bytes())
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect();
                format!("{}{}", digest, prompt.as_deref().unwrap_or(""))
            }
            GenerateRequest::Embed { text, .. } => text.clone(),
        }
    }

    /// Serialized options that take part in the request identity.
    pub fn identity_options(&self) -> serde_json::Value {
        let value = match self {
            GenerateRequest::Generate { options, .. }
            | GenerateRequest::Chat { options, .. }
            | GenerateRequest::VisionSingle { options, .. }
            | GenerateRequest::VisionMulti { options, .. }
            | GenerateRequest::VisionBase64 { options, .. } => serde_json::to_value(options),
            GenerateRequest::Embed { options, .. } => serde_json::to_value(options),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        match self {
            GenerateRequest::Generate { options, .. }
            | GenerateRequest::Chat { options, .. }
            | GenerateRequest::VisionSingle { options, .. }
            | GenerateRequest::VisionMulti { options, .. }
            | GenerateRequest::VisionBase64 { options, .. } => options.cache_ttl,
            GenerateRequest::Embed { options, .. } => options.cache_ttl,
        }
    }
}

fn prompt_part(prompt: Option<&str>) -> Vec<Part> {
    match prompt {
        Some(p) if !p.is_empty() => vec![Part::text(p)],
        _ => Vec::new(),
    }
}

/// `embedding-001` -> `models/embedding-001`; already-qualified names pass through.
pub fn qualified_model_name(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
