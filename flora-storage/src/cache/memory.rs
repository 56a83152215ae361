//! In-memory key/value store with an optional byte quota.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use flora_core::CacheError;

use super::traits::KeyValueStore;

/// In-memory [`KeyValueStore`].
///
/// Size is counted as key length plus value length in bytes, the way browser
/// storage quotas are. A write that would push the total past the quota fails
/// with [`CacheError::QuotaExceeded`] and leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            quota_bytes: None,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a store that rejects writes beyond `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Simulate the backing storage becoming unreachable (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Backend {
                reason: "storage unavailable".to_string(),
            })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> CacheError {
    CacheError::Backend {
        reason: "cache lock poisoned".to_string(),
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            if used - replaced + key.len() + value.len() > quota {
                return Err(CacheError::QuotaExceeded);
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").await.expect("set should succeed");
        assert_eq!(store.get("a").await.expect("get should succeed"), Some("1".to_string()));
        assert!(store.remove("a").await.expect("remove should succeed"));
        assert!(!store.remove("a").await.expect("remove should succeed"));
        assert_eq!(store.get("a").await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").await.expect("fits in quota");
        let err = store.set("j", "123456789").await.expect_err("exceeds quota");
        assert_eq!(err, CacheError::QuotaExceeded);
        assert_eq!(store.used_bytes(), 6);
    }

    #[tokio::test]
    async fn test_quota_counts_replacement_not_addition() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "123456789").await.expect("fits in quota");
        store.set("k", "987654321").await.expect("replacement fits in quota");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryStore::new();
        store.set("flora_ai:a", "1").await.expect("set should succeed");
        store.set("flora_ai:b", "2").await.expect("set should succeed");
        store.set("other", "3").await.expect("set should succeed");

        let keys = store
            .keys_with_prefix("flora_ai:")
            .await
            .expect("list should succeed");
        assert_eq!(keys, vec!["flora_ai:a".to_string(), "flora_ai:b".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(store.get("a").await.is_err());
        assert!(store.set("a", "1").await.is_err());
        store.set_available(true);
        assert!(store.set("a", "1").await.is_ok());
    }
}
