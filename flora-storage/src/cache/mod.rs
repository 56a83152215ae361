//! Local cache for AI results.
//!
//! Translations and summaries are expensive provider calls, so results are
//! kept in a local key/value store for a fixed time-to-live and reused across
//! sessions.
//!
//! # Layers
//!
//! - [`KeyValueStore`]: a raw string store ([`LmdbStore`] on disk,
//!   [`MemoryStore`] in memory). Reports quota exhaustion distinctly.
//! - [`CacheKey`]: the deterministic `namespace:kind:recordId:variant` scheme.
//! - [`ExpiringCache`]: timestamped entries, lazy expiry on read, quota
//!   sweeps, statistics. Never surfaces an error to its caller.
//!
//! # Example
//!
//! ```ignore
//! let cache = ExpiringCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
//! let key = CacheKey::translation(&cache.config().namespace, &record_id, Language::Hindi);
//!
//! if let Some(hit) = cache.get::<TranslatedContent>(&key).await {
//!     return hit;
//! }
//! let fresh = provider.translate(&flower, Language::Hindi).await?;
//! cache.put(&key, &fresh).await;
//! ```

pub mod expiring;
pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod traits;

pub use expiring::{CacheConfig, ExpiringCache};
pub use key::CacheKey;
pub use lmdb_backend::{LmdbStore, LmdbStoreError};
pub use memory::MemoryStore;
pub use traits::{CacheStats, Clock, KeyValueStore, ManualClock, SystemClock};
