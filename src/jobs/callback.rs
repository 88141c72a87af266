use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::response::GeminiResponse;

/// Completion hook for a background job.
#[async_trait]
pub trait JobCallback: Send + Sync {
    async fn on_complete(&self, response: &GeminiResponse, params: &[Value]);
}

#[async_trait]
impl<F> JobCallback for F
where
    F: Fn(&GeminiResponse, &[Value]) + Send + Sync,
{
    async fn on_complete(&self, response: &GeminiResponse, params: &[Value]) {
        self(response, params)
    }
}

/// Callbacks addressable by name, so that jobs stay plain data.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<String, Arc<dyn JobCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, callback: Arc<dyn JobCallback>) {
        self.callbacks
            .write()
            .unwrap()
            .insert(name.into(), callback);
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.callbacks.write().unwrap().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn JobCallback>> {
        self.callbacks.read().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.callbacks.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}
