//! Application state and the update function.
//!
//! [`update`] is the only place state changes. It is synchronous and performs
//! no I/O: anything that has to touch the record store, the cache or the AI
//! provider is returned as an [`Effect`]. The runtime executes effects and
//! feeds their outcomes back in as [`Action`]s.

use chrono::{DateTime, Utc};
use flora_context::{ApplyOutcome, DetailViewState, RequestTag};
use flora_core::{
    Category, Flower, FlowerDraft, Language, ProviderError, RecordId, StoreError, SummaryContent,
    TranslatedContent,
};
use flora_llm::{ChatMessage, ChatSession, GeneratedDescription};
use flora_storage::{CacheStats, StoreStatistics};
use serde::{Deserialize, Serialize};

use crate::gallery::GalleryFilter;
use crate::nav::View;
use crate::notifications::{Notification, NotificationAction, NotificationLevel, Notifications};
use crate::persistence::PersistedPreferences;
use crate::share::parse_share_url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed { message: String },
}

/// The record form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub draft: FlowerDraft,
    pub editing: Option<RecordId>,
    /// Validation message shown under the form.
    pub error: Option<String>,
    pub submitting: bool,
    /// An image description is being generated.
    pub generating: bool,
}

impl FormState {
    fn new(editing: Option<RecordId>, draft: FlowerDraft) -> Self {
        Self {
            draft,
            editing,
            ..Default::default()
        }
    }

    /// Fill blank fields from a generated description; typed input is kept.
    fn autofill(&mut self, generated: GeneratedDescription) {
        let fill = |field: &mut String, value: String| {
            if field.trim().is_empty() && !value.trim().is_empty() {
                *field = value;
            }
        };
        fill(&mut self.draft.name, generated.name);
        fill(&mut self.draft.flower_type, generated.flower_type);
        fill(&mut self.draft.color, generated.color);
        fill(&mut self.draft.description, generated.description);
        fill(&mut self.draft.blooming_season, generated.blooming_season);
        fill(&mut self.draft.care_instructions, generated.care_instructions);
    }
}

/// Cache figures for the settings screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub entries: u64,
    pub expired: u64,
    pub size_kb: f64,
    pub hit_rate: f64,
}

impl From<&CacheStats> for CacheSummary {
    fn from(stats: &CacheStats) -> Self {
        Self {
            entries: stats.entry_count,
            expired: stats.expired_count,
            size_kb: stats.size_kb(),
            hit_rate: stats.hit_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub flowers: Vec<Flower>,
    pub view: View,
    pub detail: Option<DetailViewState>,
    pub form: Option<FormState>,
    /// Opened from a share link: no edit, delete or sidebar.
    pub view_only: bool,
    pub sidebar_open: bool,
    pub settings_open: bool,
    pub chat_open: bool,
    /// Conversation with Flora; kept while the panel is closed.
    pub chat: Option<ChatSession>,
    pub dark_mode: bool,
    pub load: LoadState,
    pub notifications: Notifications,
    /// Preferred AI translation language.
    pub ai_language: Language,
    /// Whether an AI provider is configured; AI entry points are hidden
    /// otherwise.
    pub ai_enabled: bool,
    pub filter: GalleryFilter,
    pub cache: Option<CacheSummary>,
    pub store_stats: Option<StoreStatistics>,
}

impl AppState {
    pub fn new(ai_enabled: bool) -> Self {
        Self {
            ai_enabled,
            ..Default::default()
        }
    }

    pub fn with_preferences(mut self, preferences: PersistedPreferences) -> Self {
        self.dark_mode = preferences.dark_mode;
        self.ai_language = preferences.ai_language;
        self
    }

    pub fn preferences(&self) -> PersistedPreferences {
        PersistedPreferences {
            dark_mode: self.dark_mode,
            ai_language: self.ai_language,
        }
    }

    /// Gallery records after search and category filtering.
    pub fn visible_flowers(&self) -> Vec<&Flower> {
        self.filter.apply(&self.flowers)
    }

    pub fn flower(&self, id: &RecordId) -> Option<&Flower> {
        self.flowers.iter().find(|f| &f.id == id)
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    fn warn_transient(&mut self, message: impl Into<String>) {
        self.notifications
            .push(Notification::new(NotificationLevel::Warning, message).transient());
    }

    fn can_modify(&self) -> bool {
        !self.view_only
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadStarted,
    Loaded(Result<Vec<Flower>, StoreError>),
    Select(RecordId),
    Back,
    NewRecord,
    EditRecord,
    FormChanged(FlowerDraft),
    Submit,
    Created(Result<Flower, StoreError>),
    Updated(Result<Flower, StoreError>),
    Delete(RecordId),
    Deleted {
        id: RecordId,
        result: Result<(), StoreError>,
    },
    SelectLanguage(Language),
    ResetLanguage,
    RequestSummary,
    ResetSummary,
    TranslationResolved {
        tag: RequestTag,
        result: Result<Option<TranslatedContent>, ProviderError>,
    },
    SummaryResolved {
        tag: RequestTag,
        result: Result<SummaryContent, ProviderError>,
    },
    GenerateDescription {
        image: String,
    },
    DescriptionGenerated(Result<GeneratedDescription, ProviderError>),
    OpenSharedLink(String),
    SharedRecordLoaded {
        id: RecordId,
        result: Result<Option<Flower>, StoreError>,
    },
    SearchChanged(String),
    CategoryFilter(Option<Category>),
    ToggleSidebar,
    ToggleSettings,
    ToggleChat,
    SendChat(String),
    ChatReplied(Result<String, ProviderError>),
    ToggleDarkMode,
    CacheStatsLoaded(CacheSummary),
    StoreStatsLoaded(Result<StoreStatistics, StoreError>),
    ClearExpiredCache,
    CacheSwept(u64),
    DismissNotification(u64),
    Tick(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadRecords,
    FetchRecord(RecordId),
    CreateRecord(FlowerDraft),
    UpdateRecord { id: RecordId, draft: FlowerDraft },
    DeleteRecord(RecordId),
    Translate {
        tag: RequestTag,
        flower: Flower,
        language: Language,
    },
    Summarize { tag: RequestTag, flower: Flower },
    DescribeImage(String),
    Chat {
        message: String,
        history: Vec<ChatMessage>,
        flower: Option<Flower>,
    },
    InvalidateCache(RecordId),
    LoadCacheStats,
    LoadStoreStats,
    SweepCache,
    SavePreferences(PersistedPreferences),
}

/// Apply `action` to `state`, returning the I/O to perform.
pub fn update(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::LoadStarted => {
            state.load = LoadState::Loading;
            vec![Effect::LoadRecords]
        }
        Action::Loaded(Ok(flowers)) => {
            tracing::info!(count = flowers.len(), "records loaded");
            state.flowers = flowers;
            state.load = LoadState::Ready;
            Vec::new()
        }
        Action::Loaded(Err(error)) => {
            tracing::warn!(error = %error, "initial load failed");
            state.load = LoadState::Failed {
                message: error.to_string(),
            };
            state.notifications.push(
                Notification::new(NotificationLevel::Error, "Failed to load flowers")
                    .with_action(NotificationAction::Retry),
            );
            Vec::new()
        }

        Action::Select(id) => select(state, id),
        Action::Back => {
            state.view = state.view.back();
            state.form = None;
            if !matches!(state.view, View::Detail { .. }) {
                state.detail = None;
                state.view_only = false;
            }
            Vec::new()
        }

        Action::NewRecord => {
            if state.can_modify() {
                state.form = Some(FormState::new(None, FlowerDraft::default()));
                state.view = View::Form { editing: None };
            }
            Vec::new()
        }
        Action::EditRecord => {
            if !state.can_modify() {
                return Vec::new();
            }
            if let Some(detail) = &state.detail {
                let flower = detail.flower();
                state.form = Some(FormState::new(Some(flower.id.clone()), FlowerDraft::from(flower)));
                state.view = View::Form {
                    editing: Some(flower.id.clone()),
                };
            }
            Vec::new()
        }
        Action::FormChanged(draft) => {
            if let Some(form) = &mut state.form {
                form.draft = draft;
                form.error = None;
            }
            Vec::new()
        }
        Action::Submit => submit(state),
        Action::Created(result) => {
            if let Some(form) = &mut state.form {
                form.submitting = false;
            }
            match result {
                Ok(flower) => {
                    tracing::info!(record_id = %flower.id, "record created");
                    state.flowers.insert(0, flower);
                    state.form = None;
                    state.view = View::Gallery;
                    state.notify(NotificationLevel::Success, "Flower added");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "create failed");
                    state.notify(NotificationLevel::Error, format!("Failed to save flower: {error}"));
                }
            }
            Vec::new()
        }
        Action::Updated(result) => {
            if let Some(form) = &mut state.form {
                form.submitting = false;
            }
            match result {
                Ok(flower) => {
                    let id = flower.id.clone();
                    tracing::info!(record_id = %id, "record updated");
                    if let Some(existing) = state.flowers.iter_mut().find(|f| f.id == id) {
                        *existing = flower.clone();
                    }
                    match state.detail.as_mut().filter(|d| d.flower().id == id) {
                        Some(detail) => detail.replace_flower(flower),
                        None => state.detail = Some(DetailViewState::new(flower, false)),
                    }
                    state.form = None;
                    state.view = View::Detail { id: id.clone() };
                    state.notify(NotificationLevel::Success, "Flower updated");
                    vec![Effect::InvalidateCache(id)]
                }
                Err(error) => {
                    tracing::warn!(error = %error, "update failed");
                    state.notify(NotificationLevel::Error, format!("Failed to update flower: {error}"));
                    Vec::new()
                }
            }
        }
        Action::Delete(id) => {
            if state.can_modify() {
                vec![Effect::DeleteRecord(id)]
            } else {
                Vec::new()
            }
        }
        Action::Deleted { id, result } => match result {
            Ok(()) => {
                tracing::info!(record_id = %id, "record deleted");
                state.flowers.retain(|f| f.id != id);
                if state.view.record_id() == Some(&id) {
                    state.view = View::Gallery;
                    state.detail = None;
                    state.form = None;
                }
                state.notify(NotificationLevel::Success, "Flower deleted");
                vec![Effect::InvalidateCache(id)]
            }
            Err(error) => {
                tracing::warn!(record_id = %id, error = %error, "delete failed");
                state.notify(NotificationLevel::Error, format!("Failed to delete flower: {error}"));
                Vec::new()
            }
        },

        Action::SelectLanguage(language) => select_language(state, language),
        Action::ResetLanguage => {
            if let Some(detail) = &mut state.detail {
                detail.reset_language();
            }
            Vec::new()
        }
        Action::RequestSummary => {
            if !state.ai_enabled {
                return Vec::new();
            }
            let Some(detail) = &mut state.detail else {
                return Vec::new();
            };
            match detail.request_summary() {
                Some(tag) => vec![Effect::Summarize {
                    tag,
                    flower: detail.flower().clone(),
                }],
                None => Vec::new(),
            }
        }
        Action::ResetSummary => {
            if let Some(detail) = &mut state.detail {
                detail.reset_summary();
            }
            Vec::new()
        }
        Action::TranslationResolved { tag, result } => {
            let outcome = match &mut state.detail {
                Some(detail) => detail.apply_translation(&tag, result),
                None => ApplyOutcome::Discarded,
            };
            if outcome == ApplyOutcome::Failed {
                state.warn_transient("Translation failed. Showing original content.");
            }
            Vec::new()
        }
        Action::SummaryResolved { tag, result } => {
            let outcome = match &mut state.detail {
                Some(detail) => detail.apply_summary(&tag, result),
                None => ApplyOutcome::Discarded,
            };
            if outcome == ApplyOutcome::Failed {
                state.warn_transient("Summary failed. Showing original content.");
            }
            Vec::new()
        }

        Action::GenerateDescription { image } => {
            if !state.ai_enabled {
                return Vec::new();
            }
            match &mut state.form {
                Some(form) if !form.generating => {
                    form.generating = true;
                    vec![Effect::DescribeImage(image)]
                }
                _ => Vec::new(),
            }
        }
        Action::DescriptionGenerated(result) => {
            let Some(form) = &mut state.form else {
                return Vec::new();
            };
            form.generating = false;
            match result {
                Ok(generated) => form.autofill(generated),
                Err(error) => {
                    tracing::warn!(error = %error, "description generation failed");
                    state.warn_transient("Could not generate a description for this image.");
                }
            }
            Vec::new()
        }

        Action::OpenSharedLink(url) => match parse_share_url(&url) {
            Some(id) => {
                state.view_only = true;
                state.sidebar_open = false;
                state.detail = None;
                state.form = None;
                state.view = View::Detail { id: id.clone() };
                vec![Effect::FetchRecord(id)]
            }
            None => {
                state.notify(NotificationLevel::Error, "Invalid share link");
                Vec::new()
            }
        },
        Action::SharedRecordLoaded { id, result } => {
            if state.view != (View::Detail { id: id.clone() }) {
                tracing::debug!(record_id = %id, "discarding shared record for another view");
                return Vec::new();
            }
            match result {
                Ok(Some(flower)) => {
                    state.detail = Some(DetailViewState::new(flower, state.view_only));
                    Vec::new()
                }
                Ok(None) => {
                    state.view = View::Gallery;
                    state.view_only = false;
                    state.notify(NotificationLevel::Error, "Flower not found");
                    Vec::new()
                }
                Err(error) => {
                    tracing::warn!(record_id = %id, error = %error, "shared record load failed");
                    state.notifications.push(
                        Notification::new(NotificationLevel::Error, "Failed to load flower")
                            .with_action(NotificationAction::Retry),
                    );
                    Vec::new()
                }
            }
        }

        Action::SearchChanged(query) => {
            state.filter.query = query;
            Vec::new()
        }
        Action::CategoryFilter(category) => {
            state.filter.category = category;
            Vec::new()
        }
        Action::ToggleSidebar => {
            if !state.view_only {
                state.sidebar_open = !state.sidebar_open;
            }
            Vec::new()
        }
        Action::ToggleSettings => {
            state.settings_open = !state.settings_open;
            if state.settings_open {
                vec![Effect::LoadCacheStats, Effect::LoadStoreStats]
            } else {
                Vec::new()
            }
        }
        Action::ToggleChat => {
            if !state.ai_enabled {
                return Vec::new();
            }
            state.chat_open = !state.chat_open;
            if state.chat_open {
                let flower = state.detail.as_ref().map(|d| d.flower().clone());
                let same_context = state.chat.as_ref().is_some_and(|chat| {
                    chat.flower().map(|f| &f.id) == flower.as_ref().map(|f| &f.id)
                });
                if !same_context {
                    state.chat = Some(ChatSession::new(flower));
                }
            }
            Vec::new()
        }
        Action::SendChat(text) => {
            if !state.ai_enabled {
                return Vec::new();
            }
            let Some(chat) = &mut state.chat else {
                return Vec::new();
            };
            match chat.begin(&text) {
                Some((message, history)) => vec![Effect::Chat {
                    message,
                    history,
                    flower: chat.flower().cloned(),
                }],
                None => Vec::new(),
            }
        }
        Action::ChatReplied(reply) => {
            match state.chat.as_mut().filter(|chat| chat.is_pending()) {
                Some(chat) => chat.finish(reply),
                None => tracing::debug!("discarding chat reply without a pending message"),
            }
            Vec::new()
        }
        Action::ToggleDarkMode => {
            state.dark_mode = !state.dark_mode;
            vec![Effect::SavePreferences(state.preferences())]
        }
        Action::CacheStatsLoaded(summary) => {
            state.cache = Some(summary);
            Vec::new()
        }
        Action::StoreStatsLoaded(result) => {
            match result {
                Ok(stats) => state.store_stats = Some(stats),
                Err(error) => {
                    tracing::warn!(error = %error, "store statistics unavailable");
                    state.store_stats = None;
                }
            }
            Vec::new()
        }
        Action::ClearExpiredCache => vec![Effect::SweepCache],
        Action::CacheSwept(removed) => {
            state.notify(
                NotificationLevel::Info,
                format!("Cleared {removed} expired cache entries"),
            );
            vec![Effect::LoadCacheStats]
        }
        Action::DismissNotification(id) => {
            state.notifications.dismiss(id);
            Vec::new()
        }
        Action::Tick(now) => {
            state.notifications.expire(now);
            Vec::new()
        }
    }
}

fn select(state: &mut AppState, id: RecordId) -> Vec<Effect> {
    let Some(flower) = state.flower(&id).cloned() else {
        state.notify(NotificationLevel::Warning, "Flower not found");
        return Vec::new();
    };
    state.view = View::Detail { id };
    state.form = None;
    state.sidebar_open = false;
    state.detail = Some(DetailViewState::new(flower, state.view_only));

    // Reopen in the preferred language.
    let preferred = state.ai_language;
    if state.ai_enabled && !preferred.is_base() {
        return translate(state, preferred);
    }
    Vec::new()
}

fn select_language(state: &mut AppState, language: Language) -> Vec<Effect> {
    if !language.is_base() && !state.ai_enabled {
        return Vec::new();
    }
    let mut effects = Vec::new();
    if state.ai_language != language {
        state.ai_language = language;
        effects.push(Effect::SavePreferences(state.preferences()));
    }
    effects.extend(translate(state, language));
    effects
}

fn translate(state: &mut AppState, language: Language) -> Vec<Effect> {
    let Some(detail) = &mut state.detail else {
        return Vec::new();
    };
    match detail.select_language(language) {
        Some(tag) => vec![Effect::Translate {
            tag,
            flower: detail.flower().clone(),
            language,
        }],
        None => Vec::new(),
    }
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    let Some(form) = &mut state.form else {
        return Vec::new();
    };
    if form.submitting {
        return Vec::new();
    }
    if let Err(error) = form.draft.validate() {
        tracing::debug!(error = %error, "form rejected");
        form.error = Some("Please enter a flower name".to_string());
        return Vec::new();
    }

    form.submitting = true;
    let draft = form.draft.clone();
    match form.editing.clone() {
        Some(id) => vec![Effect::UpdateRecord { id, draft }],
        None => vec![Effect::CreateRecord(draft)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_test_utils::fixtures;

    fn ready(ai_enabled: bool) -> AppState {
        let mut state = AppState::new(ai_enabled);
        update(&mut state, Action::Loaded(Ok(fixtures::catalog())));
        state
    }

    #[test]
    fn test_load_lifecycle() {
        let mut state = AppState::new(false);
        assert_eq!(update(&mut state, Action::LoadStarted), vec![Effect::LoadRecords]);
        assert_eq!(state.load, LoadState::Loading);

        let error = StoreError::Unavailable {
            reason: "offline".to_string(),
        };
        update(&mut state, Action::Loaded(Err(error)));
        assert!(matches!(state.load, LoadState::Failed { .. }));
        let latest = state.notifications.latest().expect("notification");
        assert_eq!(latest.action, Some(NotificationAction::Retry));
    }

    #[test]
    fn test_blank_name_blocks_submit() {
        let mut state = ready(false);
        update(&mut state, Action::NewRecord);
        update(&mut state, Action::FormChanged(FlowerDraft::new("   ")));
        assert!(update(&mut state, Action::Submit).is_empty());
        let form = state.form.as_ref().expect("form open");
        assert!(form.error.is_some());
        assert!(!form.submitting);
    }

    #[test]
    fn test_submit_new_record() {
        let mut state = ready(false);
        update(&mut state, Action::NewRecord);
        update(&mut state, Action::FormChanged(FlowerDraft::new("Tulip")));
        let effects = update(&mut state, Action::Submit);
        assert_eq!(effects, vec![Effect::CreateRecord(FlowerDraft::new("Tulip"))]);
        // Double submit is ignored while saving.
        assert!(update(&mut state, Action::Submit).is_empty());

        let tulip = FlowerDraft::new("Tulip").into_flower(RecordId::new("tulip-1"), None, None);
        update(&mut state, Action::Created(Ok(tulip)));
        assert_eq!(state.flowers[0].name, "Tulip");
        assert_eq!(state.view, View::Gallery);
        assert!(state.form.is_none());
    }

    #[test]
    fn test_edit_submits_update_and_invalidates_cache() {
        let mut state = ready(false);
        let rose = fixtures::rose();
        update(&mut state, Action::Select(rose.id.clone()));
        update(&mut state, Action::EditRecord);
        assert_eq!(state.view, View::Form { editing: Some(rose.id.clone()) });

        let effects = update(&mut state, Action::Submit);
        assert!(matches!(&effects[..], [Effect::UpdateRecord { id, .. }] if *id == rose.id));

        let mut edited = rose.clone();
        edited.description = "New".to_string();
        let effects = update(&mut state, Action::Updated(Ok(edited)));
        assert_eq!(effects, vec![Effect::InvalidateCache(rose.id.clone())]);
        assert_eq!(state.detail.as_ref().expect("detail").flower().description, "New");
        assert_eq!(state.view, View::Detail { id: rose.id });
    }

    #[test]
    fn test_delete_removes_record_and_returns_to_gallery() {
        let mut state = ready(false);
        let id = fixtures::rose().id;
        update(&mut state, Action::Select(id.clone()));
        assert_eq!(update(&mut state, Action::Delete(id.clone())), vec![Effect::DeleteRecord(id.clone())]);
        let effects = update(&mut state, Action::Deleted { id: id.clone(), result: Ok(()) });
        assert_eq!(effects, vec![Effect::InvalidateCache(id.clone())]);
        assert!(state.flower(&id).is_none());
        assert_eq!(state.view, View::Gallery);
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_ai_actions_hidden_without_provider() {
        let mut state = ready(false);
        update(&mut state, Action::Select(fixtures::rose().id));
        assert!(update(&mut state, Action::SelectLanguage(Language::Hindi)).is_empty());
        assert!(update(&mut state, Action::RequestSummary).is_empty());
        update(&mut state, Action::ToggleChat);
        assert!(!state.chat_open);
    }

    #[test]
    fn test_translation_effect_and_stale_discard() {
        let mut state = ready(true);
        let rose = fixtures::rose();
        update(&mut state, Action::Select(rose.id.clone()));

        let hindi = update(&mut state, Action::SelectLanguage(Language::Hindi));
        let hindi_tag = match &hindi[..] {
            [Effect::SavePreferences(_), Effect::Translate { tag, language, .. }] => {
                assert_eq!(*language, Language::Hindi);
                tag.clone()
            }
            other => panic!("unexpected effects: {other:?}"),
        };
        let malayalam = update(&mut state, Action::SelectLanguage(Language::Malayalam));
        let Some(Effect::Translate { tag: malayalam_tag, .. }) = malayalam.last().cloned() else {
            panic!("expected translate effect");
        };

        update(
            &mut state,
            Action::TranslationResolved {
                tag: malayalam_tag,
                result: Ok(Some(fixtures::malayalam_rose())),
            },
        );
        update(
            &mut state,
            Action::TranslationResolved {
                tag: hindi_tag,
                result: Ok(Some(fixtures::hindi_rose())),
            },
        );
        assert_eq!(state.detail.as_ref().expect("detail").resolved().name, "റോസ്");
        assert_eq!(state.ai_language, Language::Malayalam);
    }

    #[test]
    fn test_summary_failure_sets_flag_and_warns() {
        let mut state = ready(true);
        update(&mut state, Action::Select(fixtures::rose().id));
        let before = state.detail.as_ref().expect("detail").resolved();

        let effects = update(&mut state, Action::RequestSummary);
        let Some(Effect::Summarize { tag, .. }) = effects.into_iter().next() else {
            panic!("expected summarize effect");
        };
        update(
            &mut state,
            Action::SummaryResolved {
                tag,
                result: Err(fixtures::rate_limited()),
            },
        );
        let detail = state.detail.as_ref().expect("detail");
        assert_eq!(detail.resolved(), before);
        assert!(detail.failure().is_some());
        let warning = state.notifications.latest().expect("warning");
        assert!(warning.transient);
    }

    #[test]
    fn test_select_restores_preferred_language() {
        let mut state = ready(true).with_preferences(PersistedPreferences {
            dark_mode: false,
            ai_language: Language::Hindi,
        });
        let effects = update(&mut state, Action::Select(fixtures::rose().id));
        assert!(matches!(&effects[..], [Effect::Translate { language: Language::Hindi, .. }]));
    }

    #[test]
    fn test_shared_link_opens_view_only_detail() {
        let mut state = ready(true);
        let effects = update(
            &mut state,
            Action::OpenSharedLink("http://localhost:5173/?flower=rose-1".to_string()),
        );
        let id = RecordId::new("rose-1");
        assert_eq!(effects, vec![Effect::FetchRecord(id.clone())]);
        assert!(state.view_only);

        update(
            &mut state,
            Action::SharedRecordLoaded {
                id: id.clone(),
                result: Ok(Some(fixtures::rose())),
            },
        );
        assert!(state.detail.as_ref().expect("detail").is_view_only());
        assert!(update(&mut state, Action::Delete(id)).is_empty());
        update(&mut state, Action::EditRecord);
        assert!(state.form.is_none());
        update(&mut state, Action::ToggleSidebar);
        assert!(!state.sidebar_open);
    }

    #[test]
    fn test_shared_link_for_missing_record() {
        let mut state = ready(false);
        update(&mut state, Action::OpenSharedLink("https://x/?flower=gone".to_string()));
        update(
            &mut state,
            Action::SharedRecordLoaded {
                id: RecordId::new("gone"),
                result: Ok(None),
            },
        );
        assert_eq!(state.view, View::Gallery);
        assert!(!state.view_only);
    }

    #[test]
    fn test_generated_description_fills_blank_fields_only() {
        let mut state = ready(true);
        update(&mut state, Action::NewRecord);
        update(&mut state, Action::FormChanged(FlowerDraft::new("My Sunflower")));
        let effects = update(&mut state, Action::GenerateDescription { image: "QUJD".to_string() });
        assert_eq!(effects, vec![Effect::DescribeImage("QUJD".to_string())]);

        update(
            &mut state,
            Action::DescriptionGenerated(Ok(GeneratedDescription {
                name: "Sunflower".to_string(),
                color: "Yellow".to_string(),
                ..Default::default()
            })),
        );
        let form = state.form.as_ref().expect("form");
        assert_eq!(form.draft.name, "My Sunflower");
        assert_eq!(form.draft.color, "Yellow");
        assert!(!form.generating);
    }

    #[test]
    fn test_settings_and_cache_sweep() {
        let mut state = ready(false);
        assert_eq!(
            update(&mut state, Action::ToggleSettings),
            vec![Effect::LoadCacheStats, Effect::LoadStoreStats]
        );
        let stats = StoreStatistics {
            record_count: 3,
            image_count: 5,
        };
        update(&mut state, Action::StoreStatsLoaded(Ok(stats.clone())));
        assert_eq!(state.store_stats, Some(stats));
        assert_eq!(update(&mut state, Action::ClearExpiredCache), vec![Effect::SweepCache]);
        assert_eq!(update(&mut state, Action::CacheSwept(3)), vec![Effect::LoadCacheStats]);
        assert!(state.notifications.latest().expect("info").message.contains('3'));
    }

    #[test]
    fn test_chat_opens_with_record_context_and_round_trips() {
        let mut state = ready(true);
        let rose = fixtures::rose();
        update(&mut state, Action::Select(rose.id.clone()));
        update(&mut state, Action::ToggleChat);
        assert!(state.chat_open);
        let chat = state.chat.as_ref().expect("chat session");
        assert_eq!(chat.flower().map(|f| &f.id), Some(&rose.id));
        assert_eq!(chat.messages().len(), 1);

        let effects = update(&mut state, Action::SendChat("How much water?".to_string()));
        match &effects[..] {
            [Effect::Chat { message, history, flower }] => {
                assert_eq!(message, "How much water?");
                assert_eq!(history.len(), 1);
                assert_eq!(flower.as_ref().map(|f| &f.id), Some(&rose.id));
            }
            other => panic!("unexpected effects: {other:?}"),
        }
        // One message at a time.
        assert!(update(&mut state, Action::SendChat("And sun?".to_string())).is_empty());

        update(&mut state, Action::ChatReplied(Ok("Twice a week.".to_string())));
        let chat = state.chat.as_ref().expect("chat session");
        assert!(!chat.is_pending());
        assert_eq!(chat.messages().last().expect("reply").content, "Twice a week.");

        // Closing keeps the conversation; a stray reply is ignored.
        update(&mut state, Action::ToggleChat);
        update(&mut state, Action::ChatReplied(Ok("late".to_string())));
        assert_eq!(state.chat.as_ref().expect("chat session").messages().len(), 3);
    }

    #[test]
    fn test_chat_reopened_for_another_record_starts_fresh() {
        let mut state = ready(true);
        update(&mut state, Action::ToggleChat);
        assert!(state.chat.as_ref().expect("chat").flower().is_none());
        update(&mut state, Action::ToggleChat);

        update(&mut state, Action::Select(fixtures::lily().id));
        update(&mut state, Action::ToggleChat);
        let chat = state.chat.as_ref().expect("chat");
        assert_eq!(chat.flower().map(|f| f.name.as_str()), Some("Lily"));
    }

    #[test]
    fn test_dark_mode_persists() {
        let mut state = ready(false);
        let effects = update(&mut state, Action::ToggleDarkMode);
        assert_eq!(
            effects,
            vec![Effect::SavePreferences(PersistedPreferences {
                dark_mode: true,
                ai_language: Language::BASE,
            })]
        );
    }

    #[test]
    fn test_state_serializes() {
        let mut state = ready(true);
        update(&mut state, Action::Select(fixtures::rose().id));
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["view"]["view"], "detail");
        let back: AppState = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, state);
    }
}
