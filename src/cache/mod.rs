//! Response caching with pluggable storage.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Compute-if-absent memoization with TTL and statistics |
//! | [`CacheConfig`] | Enabled flag, default TTL, key prefix, single-flight |
//! | [`CacheBackend`] | Storage trait: `has`, `get`, `put`, `forget`, `clear` |
//! | [`MemoryCache`] | Bounded in-process store |
//! | [`FileCache`] | One JSON file per key under a directory |
//! | [`NullCache`] | Stores nothing |
//! | [`Fingerprint`] | Deterministic request identity used as the key |
//!
//! ```rust
//! use gemini_lib_rust::cache::{CacheConfig, MemoryCache, ResponseCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache = ResponseCache::new(
//!     CacheConfig::new()
//!         .with_enabled(true)
//!         .with_ttl(Duration::from_secs(600)),
//!     Arc::new(MemoryCache::new(1000)),
//! );
//! assert_eq!(cache.backend_name(), "memory");
//! ```

mod backend;
mod file;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use file::FileCache;
pub use key::Fingerprint;
pub use manager::{CacheConfig, CacheStats, ResponseCache};

use crate::config::{CacheSettings, CacheStore};
use std::sync::Arc;

/// Backend selected by configuration. The file store defaults to
/// `<tmp>/gemini-cache` when no path is configured.
pub fn backend_from_settings(settings: &CacheSettings) -> Arc<dyn CacheBackend> {
    match settings.store {
        CacheStore::Memory => Arc::new(MemoryCache::new(settings.max_entries)),
        CacheStore::File => Arc::new(FileCache::new(
            settings
                .path
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("gemini-cache")),
        )),
        CacheStore::Null => Arc::new(NullCache::new()),
    }
}
