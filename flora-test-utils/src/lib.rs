//! Flora Test Utilities
//!
//! Shared test infrastructure for the Flora workspace:
//! - A scripted mock content provider
//! - Proptest generators for entity types
//! - Fixtures for common records and AI content

pub use flora_storage::{ManualClock, MemoryBlobStore, MemoryRecordStore, MemoryStore};

pub use flora_core::{
    Category, ContentKind, Flower, FlowerDraft, ImageRef, Language, OperationKind, ProviderError,
    RecordId, SummaryContent, TranslatedContent,
};

use async_trait::async_trait;
use flora_llm::{
    prompts, ChatMessage, Confidence, ContentProvider, GeneratedDescription, Identification,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// MOCK CONTENT PROVIDER
// ============================================================================

#[derive(Default)]
struct Script {
    translations: HashMap<Language, TranslatedContent>,
    summary: Option<SummaryContent>,
    failure: Option<ProviderError>,
    gates: HashMap<Language, Arc<Notify>>,
    chat_replies: Vec<String>,
}

/// Scripted [`ContentProvider`] for tests.
///
/// Unscripted calls answer deterministically from the record itself. A
/// translation can be gated so it only completes when released, which lets
/// tests reorder responses.
#[derive(Clone, Default)]
pub struct MockContentProvider {
    script: Arc<Mutex<Script>>,
    translate_calls: Arc<AtomicUsize>,
    summarize_calls: Arc<AtomicUsize>,
    chat_calls: Arc<AtomicUsize>,
}

impl MockContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer translations into `content.language` with `content`.
    pub fn with_translation(self, content: TranslatedContent) -> Self {
        self.script().translations.insert(content.language, content);
        self
    }

    /// Answer every summarize-or-expand call with `content`.
    pub fn with_summary(self, content: SummaryContent) -> Self {
        self.script().summary = Some(content);
        self
    }

    /// Queue chat replies, answered in order.
    pub fn with_chat_replies(self, replies: &[&str]) -> Self {
        self.script()
            .chat_replies
            .extend(replies.iter().map(|r| r.to_string()));
        self
    }

    /// Make every subsequent call fail with `error` (or succeed again).
    pub fn set_failure(&self, error: Option<ProviderError>) {
        self.script().failure = error;
    }

    /// Hold translations into `language` until [`release`](Self::release).
    pub fn gate(&self, language: Language) {
        self.script().gates.insert(language, Arc::new(Notify::new()));
    }

    /// Let the held translation into `language` complete and stop holding
    /// later ones.
    pub fn release(&self, language: Language) {
        if let Some(gate) = self.script().gates.remove(&language) {
            gate.notify_one();
        }
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Result<(), ProviderError> {
        match &self.script().failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentProvider for MockContentProvider {
    fn provider_id(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        flower: &Flower,
        language: Language,
    ) -> Result<Option<TranslatedContent>, ProviderError> {
        if language.is_base() {
            return Ok(None);
        }
        self.translate_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.script().gates.get(&language).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.failure()?;

        let scripted = self.script().translations.get(&language).cloned();
        Ok(Some(scripted.unwrap_or_else(|| fixtures::tagged_translation(flower, language))))
    }

    async fn summarize_or_expand(&self, flower: &Flower) -> Result<SummaryContent, ProviderError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        self.failure()?;

        if let Some(summary) = self.script().summary.clone() {
            return Ok(summary);
        }
        Ok(if prompts::should_expand(flower) {
            SummaryContent::expanded(
                vec![format!("{} is lovely", flower.name)],
                format!("{} (expanded)", flower.description),
                format!("{} (expanded)", flower.care_instructions),
            )
        } else {
            let mut summary = SummaryContent::summarized(vec![format!("{} in brief", flower.name)]);
            summary.quick_care = Some("Water weekly.".to_string());
            summary.best_for = Some("Gardens".to_string());
            summary
        })
    }

    async fn generate_description(&self, _image: &str) -> Result<GeneratedDescription, ProviderError> {
        self.failure()?;
        Ok(GeneratedDescription {
            name: "Sunflower".to_string(),
            scientific_name: "Helianthus annuus".to_string(),
            flower_type: "Asteraceae".to_string(),
            color: "Yellow".to_string(),
            description: "A tall annual with a large flower head.".to_string(),
            blooming_season: "Summer".to_string(),
            care_instructions: "Full sun, water deeply.".to_string(),
        })
    }

    async fn identify(&self, _image: &str) -> Result<Identification, ProviderError> {
        self.failure()?;
        Ok(Identification {
            name: "Sunflower".to_string(),
            scientific_name: "Helianthus annuus".to_string(),
            confidence: Confidence::High,
            description: "A tall annual.".to_string(),
            similar_flowers: vec!["Black-eyed Susan".to_string()],
        })
    }

    async fn care_recommendations(
        &self,
        flower_name: &str,
        climate: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.failure()?;
        Ok(match climate {
            Some(climate) => format!("Care for {flower_name} in {climate} climate."),
            None => format!("Care for {flower_name}."),
        })
    }

    async fn flower_facts(&self, flower_name: &str) -> Vec<String> {
        if self.failure().is_err() {
            return Vec::new();
        }
        (1..=5).map(|i| format!("{flower_name} fact {i}")).collect()
    }

    async fn chat(
        &self,
        message: &str,
        _flower: Option<&Flower>,
        _history: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.failure()?;
        let mut script = self.script();
        if script.chat_replies.is_empty() {
            Ok(format!("You asked: {message}"))
        } else {
            Ok(script.chat_replies.remove(0))
        }
    }
}

impl std::fmt::Debug for MockContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContentProvider")
            .field("translate_calls", &self.translate_calls())
            .field("summarize_calls", &self.summarize_calls())
            .finish()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Flora entity types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_language() -> impl Strategy<Value = Language> {
        proptest::sample::select(Language::ALL.to_vec())
    }

    /// Languages other than the base language.
    pub fn arb_target_language() -> impl Strategy<Value = Language> {
        arb_language().prop_filter("non-base language", |l| !l.is_base())
    }

    pub fn arb_category() -> impl Strategy<Value = Category> {
        proptest::sample::select(Category::ALL.to_vec())
    }

    pub fn arb_record_id() -> impl Strategy<Value = RecordId> {
        "[A-Za-z0-9_:-]{1,20}".prop_map(RecordId::new)
    }

    pub fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z ,.]{0,40}"
    }

    pub fn arb_flower() -> impl Strategy<Value = Flower> {
        (
            arb_record_id(),
            "[A-Za-z]{1,12}",
            arb_text(),
            arb_text(),
            arb_category(),
            arb_text(),
            arb_text(),
            arb_text(),
        )
            .prop_map(|(id, name, flower_type, color, category, season, care, description)| {
                let mut draft = FlowerDraft::new(name)
                    .with_type(flower_type)
                    .with_color(color)
                    .with_description(description)
                    .with_care_instructions(care);
                draft.category = category.as_str().to_string();
                draft.blooming_season = season;
                draft.into_flower(id, None, None)
            })
    }

    pub fn arb_translated(language: Language) -> impl Strategy<Value = TranslatedContent> {
        (
            proptest::option::of(arb_text()),
            proptest::option::of(arb_text()),
            proptest::option::of(arb_text()),
        )
            .prop_map(move |(name, description, care)| TranslatedContent {
                name,
                description,
                care_instructions: care,
                ..TranslatedContent::empty(language)
            })
    }

    pub fn arb_summary() -> impl Strategy<Value = SummaryContent> {
        (
            any::<bool>(),
            proptest::collection::vec("[A-Za-z ]{1,20}", 0..5),
            arb_text(),
            arb_text(),
        )
            .prop_map(|(expanded, key_points, a, b)| {
                if expanded {
                    SummaryContent::expanded(key_points, a, b)
                } else {
                    let mut summary = SummaryContent::summarized(key_points);
                    summary.quick_care = Some(a);
                    summary.best_for = Some(b);
                    summary
                }
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records and AI content.

    use super::*;
    use serde_json::{json, Value};

    pub fn rose() -> Flower {
        let mut draft = FlowerDraft::new("Rose")
            .with_type("Rosaceae")
            .with_color("Red")
            .with_description("D1")
            .with_care_instructions("Water regularly")
            .with_images(vec![ImageRef::from("https://img.example.com/rose.jpg")]);
        draft.category = Category::Flower.as_str().to_string();
        draft.blooming_season = "Summer".to_string();
        draft.into_flower(RecordId::new("rose-1"), None, None)
    }

    pub fn lily() -> Flower {
        let mut draft = FlowerDraft::new("Lily")
            .with_type("Liliaceae")
            .with_color("White")
            .with_description("Trumpet-shaped blooms.");
        draft.category = Category::Flower.as_str().to_string();
        draft.parental = "Rose, Tulip".to_string();
        draft.into_flower(RecordId::new("lily-1"), None, None)
    }

    pub fn basil() -> Flower {
        let mut draft = FlowerDraft::new("Basil").with_color("Green");
        draft.category = Category::Herb.as_str().to_string();
        draft.into_flower(RecordId::new("basil-1"), None, None)
    }

    pub fn catalog() -> Vec<Flower> {
        vec![rose(), lily(), basil()]
    }

    /// A stored document in the legacy single-`image` shape.
    pub fn legacy_document() -> Value {
        json!({
            "name": "Lily",
            "type": null,
            "image": "url1",
            "createdAt": 1_700_000_000_000i64
        })
    }

    /// The Hindi translation of [`rose`].
    pub fn hindi_rose() -> TranslatedContent {
        TranslatedContent {
            name: Some("गुलाब".to_string()),
            color: Some("लाल".to_string()),
            ..TranslatedContent::empty(Language::Hindi)
        }
    }

    /// The Malayalam translation of [`rose`].
    pub fn malayalam_rose() -> TranslatedContent {
        TranslatedContent {
            name: Some("റോസ്".to_string()),
            ..TranslatedContent::empty(Language::Malayalam)
        }
    }

    pub fn expanded_rose() -> SummaryContent {
        SummaryContent::expanded(
            vec!["Symbol of love".to_string()],
            "D2 expanded".to_string(),
            "Care expanded".to_string(),
        )
    }

    pub fn summarized_rose() -> SummaryContent {
        let mut summary = SummaryContent::summarized(vec!["Thorny stems".to_string(), "Fragrant".to_string()]);
        summary.quick_care = Some("Water weekly.".to_string());
        summary.best_for = Some("Bouquets".to_string());
        summary
    }

    /// Translation whose fields are the originals tagged with the language
    /// code, e.g. `"Rose [hi]"`.
    pub fn tagged_translation(flower: &Flower, language: Language) -> TranslatedContent {
        let tag = |value: &str| (!value.is_empty()).then(|| format!("{value} [{}]", language.code()));
        TranslatedContent {
            language,
            name: tag(&flower.name),
            flower_type: tag(&flower.flower_type),
            color: tag(&flower.color),
            description: tag(&flower.description),
            blooming_season: tag(&flower.blooming_season),
            care_instructions: tag(&flower.care_instructions),
        }
    }

    pub fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            provider: "mock".to_string(),
            retry_after_ms: 1000,
        }
    }
}
