//! LMDB-backed key/value store for the AI cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a memory-mapped,
//! persistent store that survives restarts, so cached translations and
//! summaries are reused across sessions.
//!
//! # Capacity
//!
//! LMDB has a fixed map size. A write that does not fit fails with
//! `MDB_MAP_FULL`, which this backend reports as
//! [`CacheError::QuotaExceeded`] so the cache can sweep expired entries.
//!
//! # Atomicity
//!
//! Each `set` and `remove` runs in its own write transaction, so a value is
//! either fully replaced or untouched.

use std::path::Path;

use async_trait::async_trait;
use flora_core::CacheError;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, MdbError};

use super::traits::KeyValueStore;

/// Error type for opening an LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbStoreError> for flora_core::FloraError {
    fn from(e: LmdbStoreError) -> Self {
        flora_core::FloraError::Cache(CacheError::Backend {
            reason: e.to_string(),
        })
    }
}

/// Map a heed error onto the cache error taxonomy.
fn map_heed_error(e: heed::Error) -> CacheError {
    match e {
        heed::Error::Mdb(MdbError::MapFull) => CacheError::QuotaExceeded,
        other => CacheError::Backend {
            reason: other.to_string(),
        },
    }
}

/// LMDB-backed [`KeyValueStore`].
///
/// # Example
///
/// ```ignore
/// use flora_storage::cache::{CacheConfig, ExpiringCache, LmdbStore};
/// use std::sync::Arc;
///
/// let store = LmdbStore::open("/var/lib/flora/cache", 16)?;
/// let cache = ExpiringCache::new(Arc::new(store), CacheConfig::default());
/// ```
pub struct LmdbStore {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open (or create) an LMDB store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Map size in megabytes; writes beyond it are quota errors
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per directory by this process
        // and the memory map is never handed out beyond heed's read guards.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

#[async_trait]
impl KeyValueStore for LmdbStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let rtxn = self.env.read_txn().map_err(map_heed_error)?;
        match self.db.get(&rtxn, key.as_bytes()).map_err(map_heed_error)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| CacheError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut wtxn = self.env.write_txn().map_err(map_heed_error)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), value.as_bytes())
            .map_err(map_heed_error)?;
        wtxn.commit().map_err(map_heed_error)
    }

    async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let mut wtxn = self.env.write_txn().map_err(map_heed_error)?;
        let deleted = self
            .db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(map_heed_error)?;
        wtxn.commit().map_err(map_heed_error)?;
        Ok(deleted)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let rtxn = self.env.read_txn().map_err(map_heed_error)?;
        let iter = self.db.iter(&rtxn).map_err(map_heed_error)?;

        let prefix = prefix.as_bytes();
        let mut keys = Vec::new();
        for result in iter {
            let Ok((key, _)) = result else {
                continue;
            };
            if key.starts_with(prefix) {
                if let Ok(key) = std::str::from_utf8(key) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}
