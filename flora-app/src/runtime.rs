//! Effect execution.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use flora_context::ContentResolver;
use flora_core::{FloraConfig, FloraResult};
use flora_llm::ProviderRegistry;
use flora_storage::{
    CacheConfig, ExpiringCache, KeyValueStore, LmdbStore, MemoryStore, RecordStore,
};
use tokio::sync::mpsc;

use crate::persistence;
use crate::state::{update, Action, AppState, CacheSummary, Effect};

/// Executes [`Effect`]s against the record store and content resolver.
#[derive(Clone)]
pub struct Runtime {
    store: Arc<dyn RecordStore>,
    resolver: ContentResolver,
    preferences_path: Option<PathBuf>,
}

impl Runtime {
    pub fn new(store: Arc<dyn RecordStore>, resolver: ContentResolver) -> Self {
        Self {
            store,
            resolver,
            preferences_path: None,
        }
    }

    /// Persist preferences to `path` when they change.
    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = Some(path.into());
        self
    }

    /// Build the cache and provider from configuration.
    ///
    /// A cache directory that cannot be opened falls back to an in-memory
    /// cache; an unconfigured provider leaves AI features disabled.
    pub fn from_config(config: &FloraConfig, store: Arc<dyn RecordStore>) -> FloraResult<Self> {
        let backend: Arc<dyn KeyValueStore> = match &config.cache.path {
            Some(path) => match LmdbStore::open(path, config.cache.map_size_mb) {
                Ok(lmdb) => Arc::new(lmdb),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache unavailable, using memory");
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        let cache = ExpiringCache::new(backend, CacheConfig::from(&config.cache));
        let providers = ProviderRegistry::from_settings(&config.provider)?;
        Ok(Self::new(store, ContentResolver::new(Arc::new(cache), providers)))
    }

    pub fn ai_enabled(&self) -> bool {
        self.resolver.is_configured()
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Initial state: preferences restored, AI availability set.
    pub fn initial_state(&self) -> AppState {
        let preferences = match &self.preferences_path {
            Some(path) => persistence::load(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
                None
            }),
            None => None,
        };
        AppState::new(self.ai_enabled()).with_preferences(preferences.unwrap_or_default())
    }

    /// Run one effect to completion, returning the action carrying its outcome.
    pub async fn execute(&self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::LoadRecords => Some(Action::Loaded(self.store.list().await)),
            Effect::FetchRecord(id) => {
                let result = self.store.get(&id).await;
                Some(Action::SharedRecordLoaded { id, result })
            }
            Effect::CreateRecord(draft) => Some(Action::Created(self.store.create(draft).await)),
            Effect::UpdateRecord { id, draft } => {
                Some(Action::Updated(self.store.update(&id, draft).await))
            }
            Effect::DeleteRecord(id) => {
                let result = self.store.delete(&id).await;
                Some(Action::Deleted { id, result })
            }
            Effect::Translate {
                tag,
                flower,
                language,
            } => {
                let result = self.resolver.translate(&flower, language).await;
                Some(Action::TranslationResolved { tag, result })
            }
            Effect::Summarize { tag, flower } => {
                let result = self.resolver.summarize(&flower).await;
                Some(Action::SummaryResolved { tag, result })
            }
            Effect::DescribeImage(image) => {
                let result = match self.resolver.providers().provider() {
                    Ok(provider) => provider.generate_description(&image).await,
                    Err(e) => Err(e),
                };
                Some(Action::DescriptionGenerated(result))
            }
            Effect::Chat {
                message,
                history,
                flower,
            } => {
                let result = match self.resolver.providers().provider() {
                    Ok(provider) => provider.chat(&message, flower.as_ref(), &history).await,
                    Err(e) => Err(e),
                };
                Some(Action::ChatReplied(result))
            }
            Effect::InvalidateCache(id) => {
                self.resolver.invalidate(&id).await;
                None
            }
            Effect::LoadCacheStats => {
                let stats = self.resolver.stats().await;
                Some(Action::CacheStatsLoaded(CacheSummary::from(&stats)))
            }
            Effect::LoadStoreStats => Some(Action::StoreStatsLoaded(self.store.statistics().await)),
            Effect::SweepCache => Some(Action::CacheSwept(self.resolver.sweep().await)),
            Effect::SavePreferences(preferences) => {
                if let Some(path) = &self.preferences_path {
                    if let Err(e) = persistence::save(path, &preferences) {
                        tracing::warn!(path = %path.display(), error = %e, "failed to save preferences");
                    }
                }
                None
            }
        }
    }

    /// Apply `action` and every action its effects produce, one effect at a
    /// time.
    pub async fn dispatch(&self, state: &mut AppState, action: Action) {
        let mut pending = VecDeque::from([action]);
        while let Some(action) = pending.pop_front() {
            for effect in update(state, action) {
                if let Some(next) = self.execute(effect).await {
                    pending.push_back(next);
                }
            }
        }
    }

    /// Run `effect` in the background, sending its outcome to `outcomes`.
    ///
    /// Effects spawned this way may finish in any order; `update` discards
    /// outcomes for superseded requests.
    pub fn spawn(&self, effect: Effect, outcomes: mpsc::UnboundedSender<Action>) {
        let runtime = self.clone();
        tokio::spawn(async move {
            if let Some(action) = runtime.execute(effect).await {
                if outcomes.send(action).is_err() {
                    tracing::debug!("outcome receiver closed");
                }
            }
        });
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("resolver", &self.resolver)
            .field("preferences_path", &self.preferences_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_core::{FlowerDraft, Language, ProviderSettings};
    use flora_storage::MemoryRecordStore;
    use flora_test_utils::{fixtures, MockContentProvider};

    fn runtime(mock: Option<&MockContentProvider>) -> (Runtime, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        let cache = ExpiringCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
        let providers = match mock {
            Some(mock) => ProviderRegistry::with_provider(Arc::new(mock.clone())),
            None => ProviderRegistry::new(),
        };
        let runtime = Runtime::new(store.clone(), ContentResolver::new(Arc::new(cache), providers));
        (runtime, store)
    }

    #[tokio::test]
    async fn test_from_config_without_key_disables_ai() {
        let config = FloraConfig::default();
        let runtime = Runtime::from_config(&config, Arc::new(MemoryRecordStore::new())).expect("runtime");
        assert!(!runtime.ai_enabled());
        assert!(!runtime.initial_state().ai_enabled);
    }

    #[tokio::test]
    async fn test_from_config_with_key_and_lmdb_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = FloraConfig::default();
        config.cache.path = Some(dir.path().join("cache"));
        config.provider = ProviderSettings {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let runtime = Runtime::from_config(&config, Arc::new(MemoryRecordStore::new())).expect("runtime");
        assert!(runtime.ai_enabled());
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let (runtime, _) = runtime(None);
        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::NewRecord).await;
        runtime
            .dispatch(&mut state, Action::FormChanged(FlowerDraft::new("Tulip")))
            .await;
        runtime.dispatch(&mut state, Action::Submit).await;
        assert_eq!(state.flowers.len(), 1);

        let mut fresh = runtime.initial_state();
        runtime.dispatch(&mut fresh, Action::LoadStarted).await;
        assert_eq!(fresh.flowers.len(), 1);
        assert_eq!(fresh.flowers[0].name, "Tulip");
    }

    #[tokio::test]
    async fn test_translation_flows_through_resolver() {
        let mock = MockContentProvider::new().with_translation(fixtures::hindi_rose());
        let (runtime, store) = runtime(Some(&mock));
        let rose = store
            .create(FlowerDraft::from(&fixtures::rose()))
            .await
            .expect("create");

        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::LoadStarted).await;
        runtime.dispatch(&mut state, Action::Select(rose.id.clone())).await;
        runtime
            .dispatch(&mut state, Action::SelectLanguage(Language::Hindi))
            .await;
        assert_eq!(state.detail.as_ref().expect("detail").resolved().name, "गुलाब");

        // Editing the record drops its cached translation.
        runtime.dispatch(&mut state, Action::EditRecord).await;
        runtime.dispatch(&mut state, Action::Submit).await;
        assert_eq!(runtime.resolver().stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_translation_finishing_after_edit_is_not_served() {
        let mock = MockContentProvider::new();
        mock.gate(Language::Hindi);
        let (runtime, store) = runtime(Some(&mock));
        let rose = store
            .create(FlowerDraft::from(&fixtures::rose()))
            .await
            .expect("create");

        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::LoadStarted).await;
        runtime.dispatch(&mut state, Action::Select(rose.id.clone())).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        for effect in update(&mut state, Action::SelectLanguage(Language::Hindi)) {
            runtime.spawn(effect, tx.clone());
        }

        let mut draft = FlowerDraft::from(&rose);
        draft.description = "New text".to_string();
        runtime.dispatch(&mut state, Action::EditRecord).await;
        runtime.dispatch(&mut state, Action::FormChanged(draft)).await;
        runtime.dispatch(&mut state, Action::Submit).await;

        mock.release(Language::Hindi);
        let late = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("translation should finish")
            .expect("outcome");
        runtime.dispatch(&mut state, late).await;

        runtime.dispatch(&mut state, Action::ResetLanguage).await;
        runtime
            .dispatch(&mut state, Action::SelectLanguage(Language::Hindi))
            .await;
        let detail = state.detail.as_ref().expect("detail");
        assert_eq!(detail.flower().description, "New text");
        assert_eq!(detail.resolved().description, "New text [hi]");
        assert_eq!(mock.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_preferences_are_saved_and_restored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        let (runtime, _) = runtime(None);
        let runtime = runtime.with_preferences_path(&path);

        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::ToggleDarkMode).await;
        assert!(runtime.initial_state().dark_mode);
    }

    #[tokio::test]
    async fn test_settings_show_cache_stats() {
        let (runtime, _) = runtime(None);
        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::NewRecord).await;
        runtime
            .dispatch(&mut state, Action::FormChanged(FlowerDraft::new("Tulip")))
            .await;
        runtime.dispatch(&mut state, Action::Submit).await;

        runtime.dispatch(&mut state, Action::ToggleSettings).await;
        assert_eq!(state.cache.as_ref().map(|c| c.entries), Some(0));
        assert_eq!(state.store_stats.as_ref().map(|s| s.record_count), Some(1));
        runtime.dispatch(&mut state, Action::ClearExpiredCache).await;
        assert!(state.notifications.latest().expect("info").message.contains('0'));
    }

    #[tokio::test]
    async fn test_chat_reply_reaches_session() {
        let mock = MockContentProvider::new().with_chat_replies(&["Roses love morning sun."]);
        let (runtime, store) = runtime(Some(&mock));
        let rose = store
            .create(FlowerDraft::from(&fixtures::rose()))
            .await
            .expect("create");

        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::LoadStarted).await;
        runtime.dispatch(&mut state, Action::Select(rose.id.clone())).await;
        runtime.dispatch(&mut state, Action::ToggleChat).await;
        runtime
            .dispatch(&mut state, Action::SendChat("Where should I plant it?".to_string()))
            .await;

        let chat = state.chat.as_ref().expect("chat session");
        assert_eq!(mock.chat_calls(), 1);
        assert!(!chat.is_pending());
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[2].content, "Roses love morning sun.");
    }

    #[tokio::test]
    async fn test_chat_failure_appends_apology() {
        let mock = MockContentProvider::new();
        mock.set_failure(Some(fixtures::rate_limited()));
        let (runtime, _) = runtime(Some(&mock));

        let mut state = runtime.initial_state();
        runtime.dispatch(&mut state, Action::ToggleChat).await;
        runtime
            .dispatch(&mut state, Action::SendChat("Hello".to_string()))
            .await;
        let chat = state.chat.as_ref().expect("chat session");
        assert_eq!(
            chat.messages().last().expect("reply").content,
            flora_llm::CHAT_FAILURE_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_spawned_effect_reports_outcome() {
        let (runtime, _) = runtime(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        runtime.spawn(Effect::LoadRecords, tx);
        let action = rx.recv().await.expect("outcome");
        assert_eq!(action, Action::Loaded(Ok(Vec::new())));
    }
}
