//! Time-boxed key/value cache for external call results
//!
//! [`CacheStore`] is the raw storage seam (SQLite in the client, memory in
//! tests). [`TtlCache`] owns the policy: entries are stored as
//! `{ "data": <value>, "timestamp": <epoch ms> }` and the TTL is supplied by
//! the caller on every read.

use crate::error::CacheError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw string storage keyed by string
pub trait CacheStore {
    fn load(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn save(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

/// Stored form of one cached value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let age_ms = now_ms.saturating_sub(self.timestamp);
        age_ms >= 0 && (age_ms as u128) < ttl.as_millis()
    }
}

pub struct TtlCache<S: CacheStore> {
    store: S,
}

impl<S: CacheStore> TtlCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read `key` if it was written less than `ttl` ago
    pub fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.get_at(key, ttl, Utc::now().timestamp_millis())
    }

    pub fn get_at(&self, key: &str, ttl: Duration, now_ms: i64) -> Option<Value> {
        let raw = match self.store.load(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss: {}", key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.discard(key);
                return None;
            }
        };

        if !entry.is_fresh(ttl, now_ms) {
            debug!("Cache entry {} expired", key);
            self.discard(key);
            return None;
        }

        debug!("Cache hit: {}", key);
        Some(entry.data)
    }

    /// Typed read. A value that no longer matches `T` counts as corrupt.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let value = self.get(key, ttl)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Discarding cache entry {} with unexpected shape: {}", key, e);
                self.discard(key);
                None
            }
        }
    }

    pub fn put(&self, key: &str, value: Value) {
        self.put_at(key, value, Utc::now().timestamp_millis());
    }

    pub fn put_at(&self, key: &str, value: Value, now_ms: i64) {
        let entry = CacheEntry {
            data: value,
            timestamp: now_ms,
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.save(key, &raw) {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    pub fn put_as<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.put(key, value),
            Err(e) => warn!("Failed to serialize cache entry {}: {}", key, e),
        }
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("Failed to remove cache entry {}: {}", key, e);
        }
    }
}

/// In-process store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock().clear();
        Ok(())
    }
}
