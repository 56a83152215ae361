//! Cache-first AI content resolution.

use std::sync::Arc;

use flora_core::{
    ContentHash, Flower, Language, OperationKind, ProviderError, RecordId, SummaryContent,
    TranslatedContent,
};
use flora_llm::ProviderRegistry;
use flora_storage::{CacheKey, CacheStats, ExpiringCache};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Cached AI content, stamped with the [`Flower::source_hash`] of the record
/// text it was generated from.
///
/// A response that finishes after the record was edited is still written
/// back; the stamp makes it a miss for the edited record.
#[derive(Debug, Serialize, Deserialize)]
struct Sourced<T> {
    source: ContentHash,
    content: T,
}

/// Resolves AI content for a record: cache lookup, provider call on a miss,
/// then write-back of the fresh result.
///
/// Cache failures are invisible here; provider failures are returned and
/// never cached.
#[derive(Clone)]
pub struct ContentResolver {
    cache: Arc<ExpiringCache>,
    providers: ProviderRegistry,
}

impl ContentResolver {
    pub fn new(cache: Arc<ExpiringCache>, providers: ProviderRegistry) -> Self {
        Self { cache, providers }
    }

    /// Whether AI entry points should be offered.
    pub fn is_configured(&self) -> bool {
        self.providers.is_configured()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Translation of `flower` into `language`; `None` for the base language.
    pub async fn translate(
        &self,
        flower: &Flower,
        language: Language,
    ) -> Result<Option<TranslatedContent>, ProviderError> {
        if language.is_base() {
            return Ok(None);
        }

        let key = self.cache.key(OperationKind::Translate, &flower.id, language.code());
        let source = flower.source_hash();
        if let Some(cached) = self.cached::<TranslatedContent>(&key, &source).await {
            if cached.language == language {
                return Ok(Some(cached));
            }
            tracing::warn!(key = %key, "cached translation has wrong language, refetching");
        }

        let provider = self.providers.provider()?;
        let translated = provider.translate(flower, language).await?;
        if let Some(content) = translated.clone() {
            self.store(&key, source, content).await;
        }
        Ok(translated)
    }

    /// Summary or expansion of `flower`.
    pub async fn summarize(&self, flower: &Flower) -> Result<SummaryContent, ProviderError> {
        let key = self.cache.key(OperationKind::Summarize, &flower.id, "");
        let source = flower.source_hash();
        if let Some(cached) = self.cached::<SummaryContent>(&key, &source).await {
            return Ok(cached);
        }

        let provider = self.providers.provider()?;
        let content = provider.summarize_or_expand(flower).await?;
        self.store(&key, source, content.clone()).await;
        Ok(content)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey, source: &str) -> Option<T> {
        let entry = self.cache.get::<Sourced<T>>(key).await?;
        if entry.source != source {
            tracing::debug!(key = %key, "cached content is for older record text");
            return None;
        }
        Some(entry.content)
    }

    async fn store<T: Serialize>(&self, key: &CacheKey, source: ContentHash, content: T) {
        self.cache.put(key, &Sourced { source, content }).await;
    }

    /// Drop cached AI content for a record whose text changed or which was
    /// deleted.
    pub async fn invalidate(&self, record_id: &RecordId) -> u64 {
        self.cache.invalidate_record(record_id).await
    }

    /// Remove expired cache entries.
    pub async fn sweep(&self) -> u64 {
        self.cache.sweep().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("namespace", &self.cache.config().namespace)
            .field("providers", &self.providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_storage::{CacheConfig, ManualClock, MemoryStore};
    use flora_test_utils::{fixtures, MockContentProvider};

    fn resolver(mock: &MockContentProvider) -> (ContentResolver, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = ExpiringCache::new(Arc::new(MemoryStore::new()), CacheConfig::default())
            .with_clock(clock.clone());
        let registry = ProviderRegistry::with_provider(Arc::new(mock.clone()));
        (ContentResolver::new(Arc::new(cache), registry), clock)
    }

    #[tokio::test]
    async fn test_translation_is_cached_after_first_call() {
        let mock = MockContentProvider::new().with_translation(fixtures::hindi_rose());
        let (resolver, _) = resolver(&mock);
        let rose = fixtures::rose();

        let first = resolver.translate(&rose, Language::Hindi).await.expect("translate");
        let second = resolver.translate(&rose, Language::Hindi).await.expect("translate");
        assert_eq!(first, second);
        assert_eq!(first, Some(fixtures::hindi_rose()));
        assert_eq!(mock.translate_calls(), 1);
    }

    #[tokio::test]
    async fn test_languages_are_cached_separately() {
        let mock = MockContentProvider::new();
        let (resolver, _) = resolver(&mock);
        let rose = fixtures::rose();

        let hindi = resolver.translate(&rose, Language::Hindi).await.expect("translate");
        let malayalam = resolver.translate(&rose, Language::Malayalam).await.expect("translate");
        assert_ne!(hindi, malayalam);
        assert_eq!(mock.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_base_language_skips_cache_and_provider() {
        let mock = MockContentProvider::new();
        let (resolver, _) = resolver(&mock);
        let result = resolver.translate(&fixtures::rose(), Language::English).await.expect("translate");
        assert!(result.is_none());
        assert_eq!(mock.translate_calls(), 0);
        assert_eq!(resolver.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let mock = MockContentProvider::new();
        let (resolver, clock) = resolver(&mock);
        let rose = fixtures::rose();

        resolver.summarize(&rose).await.expect("summarize");
        clock.advance(chrono::Duration::days(8));
        resolver.summarize(&rose).await.expect("summarize");
        assert_eq!(mock.summarize_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mock = MockContentProvider::new();
        let (resolver, _) = resolver(&mock);
        let rose = fixtures::rose();

        mock.set_failure(Some(fixtures::rate_limited()));
        assert!(resolver.summarize(&rose).await.is_err());
        mock.set_failure(None);
        resolver.summarize(&rose).await.expect("summarize");
        assert_eq!(mock.summarize_calls(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_errors_without_cache_hit() {
        let cache = ExpiringCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
        let resolver = ContentResolver::new(Arc::new(cache), ProviderRegistry::new());
        assert!(!resolver.is_configured());
        let err = resolver.summarize(&fixtures::rose()).await.expect_err("not configured");
        assert_eq!(err, ProviderError::NotConfigured);
    }

    #[tokio::test]
    async fn test_edited_record_misses_entry_for_old_text() {
        let mock = MockContentProvider::new();
        let (resolver, _) = resolver(&mock);
        let rose = fixtures::rose();
        resolver.translate(&rose, Language::Hindi).await.expect("translate");
        resolver.summarize(&rose).await.expect("summarize");

        let mut edited = rose.clone();
        edited.description = "New text".to_string();
        let hindi = resolver
            .translate(&edited, Language::Hindi)
            .await
            .expect("translate")
            .expect("content");
        assert_eq!(hindi.description.as_deref(), Some("New text [hi]"));
        resolver.summarize(&edited).await.expect("summarize");
        assert_eq!(mock.translate_calls(), 2);
        assert_eq!(mock.summarize_calls(), 2);

        // The edited text is now what the cache serves.
        resolver.translate(&edited, Language::Hindi).await.expect("translate");
        assert_eq!(mock.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mock = MockContentProvider::new();
        let (resolver, _) = resolver(&mock);
        let rose = fixtures::rose();

        resolver.translate(&rose, Language::Hindi).await.expect("translate");
        resolver.summarize(&rose).await.expect("summarize");
        assert_eq!(resolver.invalidate(&rose.id).await, 2);

        resolver.translate(&rose, Language::Hindi).await.expect("translate");
        assert_eq!(mock.translate_calls(), 2);
    }
}
