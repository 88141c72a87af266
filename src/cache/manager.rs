//! Compute-if-absent memoization over a [`CacheBackend`].

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::backend::CacheBackend;
use crate::config::CacheSettings;
use crate::Result;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    pub prefix: String,
    /// Serialize concurrent misses for one fingerprint so only one computes.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl),
            prefix: settings.prefix.clone(),
            single_flight: settings.single_flight,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

type Gate = Arc<tokio::sync::Mutex<()>>;

struct Flight {
    gate: Gate,
    holders: usize,
}

type Inflight = Mutex<HashMap<String, Flight>>;

/// Membership in the single-flight group for one key. Leaving happens on
/// drop, so a cancelled caller still releases its slot.
struct FlightTicket<'a> {
    inflight: &'a Inflight,
    key: String,
    gate: Gate,
}

impl Drop for FlightTicket<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flight) = inflight.get_mut(&self.key) {
            flight.holders -= 1;
            if flight.holders == 0 {
                inflight.remove(&self.key);
            }
        }
    }
}

/// Response cache keyed by `prefix + fingerprint`.
///
/// Without single-flight, two concurrent misses for one fingerprint both
/// compute and both store; the last write wins. Failed computations are never
/// stored.
pub struct ResponseCache {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    stats: AtomicStats,
    inflight: Inflight,
}

impl ResponseCache {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            stats: AtomicStats::default(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    /// Return the live entry for `fingerprint`, or run `compute` and store its
    /// result under `ttl` (the configured TTL when `None`).
    ///
    /// When caching is disabled `compute` always runs and storage is never
    /// touched.
    pub async fn compute_if_absent<T, F, Fut>(
        &self,
        fingerprint: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.config.enabled {
            return compute().await;
        }

        let key = self.storage_key(fingerprint);
        if let Some(hit) = self.lookup(&key).await {
            return Ok(hit);
        }

        if !self.config.single_flight {
            return self.compute_and_store(&key, ttl, compute).await;
        }

        let ticket = self.join_flight(&key);
        let _permit = ticket.gate.lock().await;
        match self.lookup(&key).await {
            Some(hit) => Ok(hit),
            None => self.compute_and_store(&key, ttl, compute).await,
        }
    }

    /// Store a value directly, bypassing `compute_if_absent`.
    pub async fn put<T: Serialize>(
        &self,
        fingerprint: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let data = serde_json::to_vec(value)?;
        self.backend
            .put(
                &self.storage_key(fingerprint),
                &data,
                ttl.unwrap_or(self.config.ttl),
            )
            .await
    }

    /// Remove an entry. Returns whether a live entry was removed.
    pub async fn forget(&self, fingerprint: &str) -> Result<bool> {
        self.backend.forget(&self.storage_key(fingerprint)).await
    }

    pub async fn has(&self, fingerprint: &str) -> Result<bool> {
        self.backend.has(&self.storage_key(fingerprint)).await
    }

    /// Drop every entry in the backing store.
    pub async fn flush(&self) -> Result<()> {
        self.backend.clear().await
    }

    pub async fn len(&self) -> Result<usize> {
        self.backend.len().await
    }

    fn storage_key(&self, fingerprint: &str) -> String {
        format!("{}{}", self.config.prefix, fingerprint)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key).await {
            Ok(Some(data)) => match serde_json::from_slice(&data) {
                Ok(value) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(key, error = %e, "undecodable cache entry treated as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, backend = self.backend.name(), "cache lookup failed");
                None
            }
        }
    }

    async fn compute_and_store<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "cache miss");
        let value = compute().await?;

        let stored = match serde_json::to_vec(&value) {
            Ok(data) => {
                self.backend
                    .put(key, &data, ttl.unwrap_or(self.config.ttl))
                    .await
            }
            Err(e) => Err(e.into()),
        };
        match stored {
            Ok(()) => {
                self.stats.stores.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache store");
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, backend = self.backend.name(), "cache store failed");
            }
        }
        Ok(value)
    }

    fn join_flight(&self, key: &str) -> FlightTicket<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let flight = inflight.entry(key.to_string()).or_insert_with(|| Flight {
            gate: Gate::default(),
            holders: 0,
        });
        flight.holders += 1;
        FlightTicket {
            inflight: &self.inflight,
            key: key.to_string(),
            gate: flight.gate.clone(),
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }
}
