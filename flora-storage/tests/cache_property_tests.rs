use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flora_core::{Language, OperationKind, RecordId};
use flora_storage::{CacheConfig, CacheKey, ExpiringCache, ManualClock, MemoryStore};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}

fn component() -> impl Strategy<Value = String> {
    // Includes the separator and the escape character on purpose.
    "[a-z0-9:%_ ]{0,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A payload written and read back before the TTL elapses is unchanged.
    #[test]
    fn prop_put_then_get_within_ttl(
        payload in prop::collection::vec("[A-Za-z ]{0,16}", 0..5),
        elapsed_secs in 0u64..(7 * 24 * 60 * 60),
    ) {
        let rt = runtime();
        let clock = ManualClock::new(Utc::now());
        let cache = ExpiringCache::new(Arc::new(MemoryStore::new()), CacheConfig::default())
            .with_clock(Arc::new(clock.clone()));
        let key = CacheKey::summary("flora_ai", &RecordId::new("r1"));

        let read: Option<Vec<String>> = rt.block_on(async {
            cache.put(&key, &payload).await;
            clock.advance(chrono::Duration::seconds(elapsed_secs as i64));
            cache.get(&key).await
        });
        prop_assert_eq!(read, Some(payload));
    }

    /// Entries strictly older than the TTL always read as a miss.
    #[test]
    fn prop_get_after_ttl_misses(ttl_secs in 1u64..10_000, extra_ms in 1i64..10_000) {
        let rt = runtime();
        let clock = ManualClock::new(Utc::now());
        let cache = ExpiringCache::new(
            Arc::new(MemoryStore::new()),
            CacheConfig::default().with_ttl(Duration::from_secs(ttl_secs)),
        )
        .with_clock(Arc::new(clock.clone()));
        let key = CacheKey::translation("flora_ai", &RecordId::new("r1"), Language::Hindi);

        let read: Option<String> = rt.block_on(async {
            cache.put(&key, "namaste").await;
            clock.advance(chrono::Duration::seconds(ttl_secs as i64) + chrono::Duration::milliseconds(extra_ms));
            cache.get(&key).await
        });
        prop_assert_eq!(read, None);
    }

    /// Key derivation is deterministic and decodes back to its components.
    #[test]
    fn prop_key_encoding_roundtrips(ns in component(), id in component(), variant in component()) {
        let key = CacheKey::derive(&ns, OperationKind::Translate, &RecordId::new(id.clone()), &variant);
        let again = CacheKey::derive(&ns, OperationKind::Translate, &RecordId::new(id), &variant);
        prop_assert_eq!(key.encode(), again.encode());
        prop_assert_eq!(CacheKey::decode(&key.encode()), Some(key));
    }

    /// Different component tuples never share an encoded key.
    #[test]
    fn prop_distinct_components_give_distinct_keys(
        a in (component(), component()),
        b in (component(), component()),
    ) {
        prop_assume!(a != b);
        let ka = CacheKey::derive("flora_ai", OperationKind::Summarize, &RecordId::new(a.0), &a.1);
        let kb = CacheKey::derive("flora_ai", OperationKind::Summarize, &RecordId::new(b.0), &b.1);
        prop_assert_ne!(ka.encode(), kb.encode());
    }
}
