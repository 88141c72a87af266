//! Remote model catalog.

use arc_swap::ArcSwapOption;
use serde_json::Value;
use std::sync::Arc;

use crate::{Error, Result};

/// Model names reported by `GET {base_url}/models`.
///
/// Filled once on first need and never re-fetched implicitly. Concurrent first
/// fetches may both store; the entries are identical so the last store wins.
#[derive(Debug)]
pub struct ModelCatalog {
    entries: ArcSwapOption<Vec<String>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self {
            entries: ArcSwapOption::empty(),
        }
    }

    pub fn get(&self) -> Option<Arc<Vec<String>>> {
        self.entries.load_full()
    }

    pub fn store(&self, names: Vec<String>) -> Arc<Vec<String>> {
        let names = Arc::new(names);
        self.entries.store(Some(names.clone()));
        names
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_model_names(body: &Value) -> Vec<String> {
    body.get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts an exact name, its `models/` form, or any entry ending in `/<model>`.
pub(crate) fn ensure_listed(names: &[String], model: &str) -> Result<()> {
    let qualified = format!("models/{}", model);
    let suffix = format!("/{}", model);
    let listed = names
        .iter()
        .any(|n| n == model || *n == qualified || n.ends_with(&suffix));
    if listed {
        Ok(())
    } else {
        Err(Error::model_not_found(format!(
            "Model '{}' not found or not supported. Available models: {}",
            model,
            names.join(", ")
        )))
    }
}
