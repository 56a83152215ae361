//! Flora LLM - AI content provider abstraction
//!
//! Provider-agnostic trait for the AI features of the catalog (translation,
//! summarize-or-expand, image description, identification, care tips, facts
//! and the Flora chat assistant), the prompts sent to the model, and the
//! Gemini implementation.

pub mod chat;
pub mod extract;
pub mod prompts;
pub mod providers;

pub use chat::{ChatSession, CHAT_FAILURE_MESSAGE};
pub use providers::{GeminiClient, GeminiContentProvider};

use async_trait::async_trait;
use flora_core::{Flower, Language, ProviderError, ProviderSettings, SummaryContent, TranslatedContent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// PROVIDER OUTPUT TYPES
// ============================================================================

/// Record details generated from a photo, used to pre-fill the record form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(rename = "type", default)]
    pub flower_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub blooming_season: String,
    #[serde(default)]
    pub care_instructions: String,
}

/// How sure the model is about an identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient parse of the model's answer; anything unrecognized is `Low`.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// A flower identified from a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub name: String,
    #[serde(default)]
    pub scientific_name: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub similar_flowers: Vec<String>,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a Flora conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// CONTENT PROVIDER TRAIT
// ============================================================================

/// Trait for AI content providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// Every call may fail with a [`ProviderError`]; callers treat failures as
/// recoverable and keep showing the original record content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short identifier used in logs and errors (e.g. `"gemini"`).
    fn provider_id(&self) -> &str;

    /// Translate a record's text fields.
    ///
    /// Returns `Ok(None)` for the base language without contacting the model.
    async fn translate(
        &self,
        flower: &Flower,
        language: Language,
    ) -> Result<Option<TranslatedContent>, ProviderError>;

    /// Expand short records, summarize long ones. See
    /// [`prompts::should_expand`] for the threshold.
    async fn summarize_or_expand(&self, flower: &Flower) -> Result<SummaryContent, ProviderError>;

    /// Generate record details from an image (base64, with or without a
    /// `data:` prefix).
    async fn generate_description(&self, image: &str) -> Result<GeneratedDescription, ProviderError>;

    /// Identify the flower in an image.
    async fn identify(&self, image: &str) -> Result<Identification, ProviderError>;

    /// Practical care tips, optionally for a climate.
    async fn care_recommendations(
        &self,
        flower_name: &str,
        climate: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Five fun facts. Empty on any failure.
    async fn flower_facts(&self, flower_name: &str) -> Vec<String>;

    /// Answer a chat message as Flora, with optional record context and the
    /// conversation so far.
    async fn chat(
        &self,
        message: &str,
        flower: Option<&Flower>,
        history: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Holds the configured content provider, if any.
///
/// An empty registry is a normal state: AI entry points are hidden rather
/// than failing.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    provider: Option<Arc<dyn ContentProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { provider: None }
    }

    /// Build a registry from settings: a Gemini provider when an API key is
    /// configured, otherwise empty.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        if !settings.is_configured() {
            tracing::info!("no AI provider configured, AI features disabled");
            return Ok(Self::new());
        }
        let provider = GeminiContentProvider::new(GeminiClient::new(settings)?);
        tracing::info!(model = %settings.model, "AI provider configured");
        Ok(Self::with_provider(Arc::new(provider)))
    }

    pub fn with_provider(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Register a provider, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) {
        self.provider = Some(provider);
    }

    /// The registered provider.
    pub fn provider(&self) -> Result<Arc<dyn ContentProvider>, ProviderError> {
        self.provider.clone().ok_or(ProviderError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn clear(&mut self) {
        self.provider = None;
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.provider_id().to_string()),
            )
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
