//! Gemini content provider implementation

use super::client::GeminiClient;
use crate::extract::{parse_array, parse_object};
use crate::{prompts, ChatMessage, Confidence, ContentProvider, GeneratedDescription, Identification};
use async_trait::async_trait;
use flora_core::{ContentKind, Flower, Language, ProviderError, SummaryContent, TranslatedContent};
use serde::Deserialize;

const PROVIDER: &str = "gemini";

/// Strip a `data:...;base64,` prefix, leaving the raw base64 payload.
fn image_payload(image: &str) -> &str {
    image
        .split_once("base64,")
        .map(|(_, payload)| payload)
        .unwrap_or(image)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TranslationAnswer {
    name: Option<String>,
    #[serde(rename = "type")]
    flower_type: Option<String>,
    color: Option<String>,
    description: Option<String>,
    blooming_season: Option<String>,
    care_instructions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryAnswer {
    key_points: Vec<String>,
    quick_care: Option<String>,
    best_for: Option<String>,
    description: Option<String>,
    care_instructions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IdentificationAnswer {
    name: String,
    scientific_name: String,
    confidence: String,
    description: String,
    similar_flowers: Vec<String>,
}

/// Content provider backed by Gemini.
pub struct GeminiContentProvider {
    client: GeminiClient,
}

impl GeminiContentProvider {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentProvider for GeminiContentProvider {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    async fn translate(
        &self,
        flower: &Flower,
        language: Language,
    ) -> Result<Option<TranslatedContent>, ProviderError> {
        if language.is_base() {
            return Ok(None);
        }

        let text = self.client.generate(&prompts::translate(flower, language), None).await?;
        let answer: TranslationAnswer = parse_object(PROVIDER, &text)?;
        tracing::debug!(record_id = %flower.id, language = language.code(), "translation received");

        Ok(Some(TranslatedContent {
            language,
            name: answer.name,
            flower_type: answer.flower_type,
            color: answer.color,
            description: answer.description,
            blooming_season: answer.blooming_season,
            care_instructions: answer.care_instructions,
        }))
    }

    async fn summarize_or_expand(&self, flower: &Flower) -> Result<SummaryContent, ProviderError> {
        let kind = if prompts::should_expand(flower) {
            ContentKind::Expanded
        } else {
            ContentKind::Summarized
        };
        let prompt = match kind {
            ContentKind::Expanded => prompts::expand(flower),
            ContentKind::Summarized => prompts::summarize(flower),
        };

        let text = self.client.generate(&prompt, None).await?;
        let answer: SummaryAnswer = parse_object(PROVIDER, &text)?;
        tracing::debug!(record_id = %flower.id, kind = ?kind, key_points = answer.key_points.len(), "summary received");

        // The mode is decided locally; the answer's own "type" is ignored.
        Ok(match kind {
            ContentKind::Expanded => SummaryContent {
                kind,
                key_points: answer.key_points,
                quick_care: None,
                best_for: None,
                description: answer.description,
                care_instructions: answer.care_instructions,
            },
            ContentKind::Summarized => SummaryContent {
                kind,
                key_points: answer.key_points,
                quick_care: answer.quick_care,
                best_for: answer.best_for,
                description: None,
                care_instructions: None,
            },
        })
    }

    async fn generate_description(&self, image: &str) -> Result<GeneratedDescription, ProviderError> {
        let text = self
            .client
            .generate(prompts::DESCRIBE_IMAGE, Some(image_payload(image)))
            .await?;
        parse_object(PROVIDER, &text)
    }

    async fn identify(&self, image: &str) -> Result<Identification, ProviderError> {
        let text = self
            .client
            .generate(prompts::IDENTIFY_IMAGE, Some(image_payload(image)))
            .await?;
        let answer: IdentificationAnswer = parse_object(PROVIDER, &text)?;
        if answer.name.trim().is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "identification has no name".to_string(),
            });
        }
        Ok(Identification {
            name: answer.name,
            scientific_name: answer.scientific_name,
            confidence: Confidence::from_answer(&answer.confidence),
            description: answer.description,
            similar_flowers: answer.similar_flowers,
        })
    }

    async fn care_recommendations(
        &self,
        flower_name: &str,
        climate: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.client
            .generate(&prompts::care_recommendations(flower_name, climate), None)
            .await
    }

    async fn flower_facts(&self, flower_name: &str) -> Vec<String> {
        let result = match self.client.generate(&prompts::flower_facts(flower_name), None).await {
            Ok(text) => parse_array(PROVIDER, &text),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(flower = %flower_name, error = %e, "fun facts unavailable");
            Vec::new()
        })
    }

    async fn chat(
        &self,
        message: &str,
        flower: Option<&Flower>,
        history: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let text = self
            .client
            .generate(&prompts::chat(message, flower, history), None)
            .await?;
        Ok(text.trim().to_string())
    }
}

impl std::fmt::Debug for GeminiContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiContentProvider")
            .field("model", &self.client.model())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_payload_strips_data_url_prefix() {
        assert_eq!(image_payload("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(image_payload("AAAA"), "AAAA");
    }
}
