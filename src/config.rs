//! Library configuration.
//!
//! [`GeminiConfig`] can be read from YAML, from `GEMINI_*` environment
//! variables, or both (file first, environment on top). Every field has a
//! default, so partial files are fine. A missing API key is not an error here;
//! the client constructor rejects it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::tokens::{ModelRates, PricingTable};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";
pub const DEFAULT_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    /// Seconds; 0 disables the timeout.
    pub request_timeout: u64,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub rate_limiting: RateLimitSettings,
    pub models: BTreeMap<String, ModelRates>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout: 30,
            cache: CacheSettings::default(),
            logging: LoggingSettings::default(),
            rate_limiting: RateLimitSettings::default(),
            models: PricingTable::builtin_models(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStore {
    #[default]
    Memory,
    File,
    Null,
}

impl FromStr for CacheStore {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "array" => Ok(CacheStore::Memory),
            "file" => Ok(CacheStore::File),
            "null" | "none" => Ok(CacheStore::Null),
            other => Err(Error::configuration_with_context(
                format!("Unknown cache store '{}'", other),
                ErrorContext::new()
                    .with_field_path("cache.store")
                    .with_details("expected memory, file or null"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Seconds.
    pub ttl: u64,
    pub prefix: String,
    pub store: CacheStore,
    /// Directory used by the file store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Capacity of the memory store.
    pub max_entries: usize,
    pub single_flight: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: 3600,
            prefix: "gemini_cache_".to_string(),
            store: CacheStore::Memory,
            path: None,
            max_entries: 1000,
            single_flight: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub enabled: bool,
    pub channel: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: "stack".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_retries: u32,
    /// Milliseconds.
    pub retry_delay: u64,
    pub backoff_multiplier: f64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl GeminiConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid configuration: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read configuration file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Defaults with `GEMINI_*` environment variables applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Values that fail to parse are
    /// ignored and the current value is kept.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let flag = |name: &str| var(name).and_then(|v| parse_flag(&v));

        if let Some(key) = var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = var("GEMINI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = var("GEMINI_DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(timeout) = parse_var(&var, "GEMINI_REQUEST_TIMEOUT") {
            self.request_timeout = timeout;
        }
        if let Some(enabled) = flag("GEMINI_ENABLE_CACHE") {
            self.cache.enabled = enabled;
        }
        if let Some(ttl) = parse_var(&var, "GEMINI_CACHE_TTL") {
            self.cache.ttl = ttl;
        }
        if let Some(store) = var("GEMINI_CACHE_STORE").and_then(|v| v.parse().ok()) {
            self.cache.store = store;
        }
        if let Some(path) = var("GEMINI_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(path));
        }
        if let Some(enabled) = flag("GEMINI_ENABLE_LOGGING") {
            self.logging.enabled = enabled;
        }
        if let Some(channel) = var("GEMINI_LOG_CHANNEL") {
            self.logging.channel = channel;
        }
        if let Some(retries) = parse_var(&var, "GEMINI_MAX_RETRIES") {
            self.rate_limiting.max_retries = retries;
        }
        if let Some(delay) = parse_var(&var, "GEMINI_RETRY_DELAY") {
            self.rate_limiting.retry_delay = delay;
        }
        if let Some(multiplier) = parse_var(&var, "GEMINI_BACKOFF_MULTIPLIER") {
            self.rate_limiting.backoff_multiplier = multiplier;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl)
    }

    pub fn pricing(&self) -> PricingTable {
        PricingTable::new(self.models.clone())
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    var(name).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = GeminiConfig::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.default_model, "gemini-pro");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl, 3600);
        assert_eq!(cfg.cache.prefix, "gemini_cache_");
        assert!(!cfg.logging.enabled);
        assert_eq!(cfg.logging.channel, "stack");
        assert_eq!(cfg.rate_limiting.max_retries, 3);
        assert_eq!(cfg.rate_limiting.retry_delay, 1000);
        assert_eq!(cfg.models.len(), 4);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = GeminiConfig::from_yaml_str(
            r#"
api_key: abc
cache:
  enabled: true
  ttl: 60
  store: file
  path: /tmp/gemini
models:
  gemini-1.5-flash:
    max_tokens: 1048576
    input_price_per_1k: 0.000075
    output_price_per_1k: 0.0003
"#,
        )
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl, 60);
        assert_eq!(cfg.cache.store, CacheStore::File);
        assert_eq!(cfg.cache.prefix, "gemini_cache_");
        assert_eq!(cfg.default_model, "gemini-pro");
        assert!(cfg.pricing().descriptor("gemini-1.5-flash").is_some());
        assert!(cfg.pricing().descriptor("gemini-pro").is_none());
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        let err = GeminiConfig::from_yaml_str("request_timeout: [nope").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "env-key"),
            ("GEMINI_DEFAULT_MODEL", "gemini-ultra"),
            ("GEMINI_REQUEST_TIMEOUT", "5"),
            ("GEMINI_ENABLE_CACHE", "true"),
            ("GEMINI_CACHE_STORE", "null"),
            ("GEMINI_ENABLE_LOGGING", "1"),
            ("GEMINI_LOG_CHANNEL", "gemini"),
            ("GEMINI_BACKOFF_MULTIPLIER", "1.5"),
            ("GEMINI_CACHE_TTL", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let cfg = GeminiConfig::default()
            .with_overrides_from(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.api_key.as_deref(), Some("env-key"));
        assert_eq!(cfg.default_model, "gemini-ultra");
        assert_eq!(cfg.request_timeout, 5);
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.store, CacheStore::Null);
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.channel, "gemini");
        assert_eq!(cfg.rate_limiting.backoff_multiplier, 1.5);
        assert_eq!(cfg.cache.ttl, 3600);
    }

    #[test]
    fn test_cache_store_parse() {
        assert_eq!("FILE".parse::<CacheStore>().unwrap(), CacheStore::File);
        assert!("redis".parse::<CacheStore>().is_err());
    }
}
