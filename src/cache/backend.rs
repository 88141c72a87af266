//! Cache storage backends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::Result;

/// Key/value store with per-entry TTL.
///
/// Keys arrive already prefixed. Expired entries behave as absent.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn has(&self, key: &str) -> Result<bool>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    /// Whether a live entry was removed.
    async fn forget(&self, key: &str) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    /// Number of live entries.
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

struct Slot {
    bytes: Vec<u8>,
    /// `None` when the TTL does not fit in an `Instant`.
    expires_at: Option<Instant>,
    /// Logical access time, bumped on every read and write.
    touched: u64,
}

impl Slot {
    fn live_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Default)]
struct Slots {
    map: HashMap<String, Slot>,
    clock: u64,
}

impl Slots {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop expired slots, then the least recently touched until one more fits.
    fn make_room(&mut self, capacity: usize) {
        let now = Instant::now();
        self.map.retain(|_, slot| slot.live_at(now));
        while self.map.len() >= capacity {
            let Some(coldest) = self
                .map
                .iter()
                .min_by_key(|(_, slot)| slot.touched)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.map.remove(&coldest);
        }
    }
}

/// Bounded in-process store. When full, expired entries go first, then the
/// least recently accessed.
pub struct MemoryCache {
    slots: RwLock<Slots>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            capacity: max_entries.max(1),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn has(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let slots = self.slots.read().unwrap();
        Ok(slots.map.get(key).is_some_and(|slot| slot.live_at(now)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut slots = self.slots.write().unwrap();
        match slots.map.get(key).map(|slot| slot.live_at(now)) {
            None => Ok(None),
            Some(false) => {
                slots.map.remove(key);
                Ok(None)
            }
            Some(true) => {
                let tick = slots.tick();
                let slot = slots.map.get_mut(key).map(|slot| {
                    slot.touched = tick;
                    slot.bytes.clone()
                });
                Ok(slot)
            }
        }
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut slots = self.slots.write().unwrap();
        if !slots.map.contains_key(key) {
            slots.make_room(self.capacity);
        }
        let touched = slots.tick();
        slots.map.insert(
            key.to_string(),
            Slot {
                bytes: value.to_vec(),
                expires_at: Instant::now().checked_add(ttl),
                touched,
            },
        );
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.slots.write().unwrap().map.remove(key);
        Ok(removed.is_some_and(|slot| slot.live_at(now)))
    }

    async fn clear(&self) -> Result<()> {
        self.slots.write().unwrap().map.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let now = Instant::now();
        let slots = self.slots.read().unwrap();
        Ok(slots.map.values().filter(|slot| slot.live_at(now)).count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Accepts every write and never returns anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        NullCache
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn has(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn forget(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
