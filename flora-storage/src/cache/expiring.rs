//! Expiring cache over a [`KeyValueStore`].
//!
//! Entries are stored as JSON `{"data": <payload>, "timestamp": <ms>}`. An
//! entry older than the TTL is treated as absent and removed when read.
//! There is no background expiry; [`ExpiringCache::sweep`] is the only bulk
//! cleanup and runs when a write hits the store's quota (or on demand).
//!
//! Every operation is fail-soft: store errors and corrupt entries degrade to
//! a cache miss and are logged, never returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flora_core::{
    CacheError, CacheSettings, EpochMillis, OperationKind, RecordId, DEFAULT_CACHE_NAMESPACE,
    DEFAULT_CACHE_TTL_DAYS,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::CacheKey;
use super::traits::{CacheStats, Clock, KeyValueStore, SystemClock};

/// Configuration for an [`ExpiringCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Key namespace; only keys under it are read, swept or counted.
    pub namespace: String,
    /// Entries older than this are treated as absent.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            ttl: Duration::from_secs(u64::from(DEFAULT_CACHE_TTL_DAYS) * 24 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self::new(settings.namespace.clone()).with_ttl(settings.ttl())
    }
}

/// Stored form of a cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    timestamp: EpochMillis,
}

/// Outcome of reading one raw entry.
enum EntryState {
    Fresh(Value),
    Expired,
    Corrupt,
}

/// Timestamped, namespaced cache of AI results.
pub struct ExpiringCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExpiringCache {
    /// Create a cache over `store` using wall-clock time.
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Replace the clock used for timestamps and expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derive a key in this cache's namespace.
    pub fn key(&self, kind: OperationKind, record_id: &RecordId, variant: &str) -> CacheKey {
        CacheKey::derive(&self.config.namespace, kind, record_id, variant)
    }

    /// Read a payload.
    ///
    /// Returns `None` when the entry is missing, expired (the entry is then
    /// deleted), unreadable, or does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let encoded = key.encode();
        let raw = match self.store.get(&encoded).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %encoded, "cache miss");
                return self.miss();
            }
            Err(e) => {
                tracing::warn!(key = %encoded, error = %e, "cache read failed, treating as miss");
                return self.miss();
            }
        };

        match self.classify(&raw) {
            EntryState::Fresh(data) => match serde_json::from_value(data) {
                Ok(payload) => {
                    tracing::debug!(key = %encoded, "cache hit");
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(payload)
                }
                Err(e) => {
                    tracing::warn!(key = %encoded, error = %e, "cached payload has unexpected shape");
                    self.miss()
                }
            },
            EntryState::Expired => {
                tracing::debug!(key = %encoded, "cache entry expired");
                if let Err(e) = self.store.remove(&encoded).await {
                    tracing::warn!(key = %encoded, error = %e, "failed to remove expired entry");
                }
                self.miss()
            }
            EntryState::Corrupt => {
                tracing::warn!(key = %encoded, "corrupt cache entry, treating as miss");
                self.miss()
            }
        }
    }

    /// Write a payload stamped with the current time.
    ///
    /// When the store is out of space, expired entries are swept and the
    /// write is not retried; the caller may put again.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &CacheKey, payload: &T) {
        let encoded = key.encode();
        let entry = CacheEntry {
            data: payload,
            timestamp: self.now_millis(),
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(key = %encoded, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        match self.store.set(&encoded, &serialized).await {
            Ok(()) => tracing::debug!(key = %encoded, bytes = serialized.len(), "cache write"),
            Err(CacheError::QuotaExceeded) => {
                tracing::warn!(key = %encoded, "cache quota exceeded, sweeping expired entries");
                self.sweep().await;
            }
            Err(e) => {
                tracing::warn!(key = %encoded, error = %e, "cache write failed");
            }
        }
    }

    /// Remove every expired (or unreadable) entry in this namespace.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self) -> u64 {
        let keys = match self.namespaced_keys().await {
            Some(keys) => keys,
            None => return 0,
        };

        let mut removed = 0u64;
        for key in keys {
            let stale = match self.store.get(&key).await {
                Ok(Some(raw)) => !matches!(self.classify(&raw), EntryState::Fresh(_)),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "sweep read failed");
                    false
                }
            };
            if !stale {
                continue;
            }
            match self.store.remove(&key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "sweep remove failed"),
            }
        }

        tracing::debug!(namespace = %self.config.namespace, removed, "cache sweep finished");
        removed
    }

    /// Remove every entry cached for `record_id`, whatever its operation or
    /// variant. Used when a record is edited or deleted.
    pub async fn invalidate_record(&self, record_id: &RecordId) -> u64 {
        let Some(keys) = self.namespaced_keys().await else {
            return 0;
        };

        let mut removed = 0u64;
        for key in keys {
            let belongs = CacheKey::decode(&key)
                .map(|decoded| decoded.record_matches(record_id))
                .unwrap_or(false);
            if !belongs {
                continue;
            }
            match self.store.remove(&key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "cache invalidation failed"),
            }
        }

        tracing::debug!(record_id = %record_id, removed, "cache entries invalidated");
        removed
    }

    /// Count and size of entries in this namespace, plus hit/miss counters.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..Default::default()
        };

        let Some(keys) = self.namespaced_keys().await else {
            return stats;
        };

        for key in keys {
            let Ok(Some(raw)) = self.store.get(&key).await else {
                continue;
            };
            match self.classify(&raw) {
                EntryState::Fresh(_) => {
                    stats.entry_count += 1;
                    stats.size_bytes += (key.len() + raw.len()) as u64;
                }
                EntryState::Expired | EntryState::Corrupt => stats.expired_count += 1,
            }
        }
        stats
    }

    async fn namespaced_keys(&self) -> Option<Vec<String>> {
        let prefix = CacheKey::namespace_prefix(&self.config.namespace);
        match self.store.keys_with_prefix(&prefix).await {
            Ok(keys) => Some(keys),
            Err(e) => {
                tracing::warn!(prefix = %prefix, error = %e, "failed to list cache keys");
                None
            }
        }
    }

    fn classify(&self, raw: &str) -> EntryState {
        match serde_json::from_str::<CacheEntry<Value>>(raw) {
            Ok(entry) if self.is_expired(entry.timestamp) => EntryState::Expired,
            Ok(entry) => EntryState::Fresh(entry.data),
            Err(_) => EntryState::Corrupt,
        }
    }

    fn is_expired(&self, timestamp: EpochMillis) -> bool {
        let ttl_ms = i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX);
        self.now_millis().saturating_sub(timestamp) > ttl_ms
    }

    fn now_millis(&self) -> EpochMillis {
        self.clock.now().timestamp_millis()
    }

    fn miss<T>(&self) -> Option<T> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }
}

impl std::fmt::Debug for ExpiringCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
