//! Key/value store and clock traits backing the expiring cache.

use async_trait::async_trait;
use chrono::Utc;
use flora_core::{CacheError, Timestamp};
use std::fmt;
use std::sync::{Arc, RwLock};

/// A persistent string key/value store, the local equivalent of browser
/// storage.
///
/// Every write is a single whole-value replace of one key; implementations
/// must never leave a partially written value behind.
///
/// # Errors
///
/// Writes that do not fit in the store's capacity fail with
/// [`CacheError::QuotaExceeded`]. Any other failure is
/// [`CacheError::Backend`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replace the value stored at `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// List every key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: Timestamp) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of reads that returned a fresh entry.
    pub hits: u64,
    /// Number of reads that found nothing usable.
    pub misses: u64,
    /// Number of live (unexpired) namespaced entries.
    pub entry_count: u64,
    /// Number of expired namespaced entries still in the store.
    pub expired_count: u64,
    /// Approximate serialized size of live entries, keys included.
    pub size_bytes: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Size in kilobytes, rounded to two decimals.
    pub fn size_kb(&self) -> f64 {
        (self.size_bytes as f64 / 1024.0 * 100.0).round() / 100.0
    }
}
