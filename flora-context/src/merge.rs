//! Content resolution: merging original, translated and summary content.

use flora_core::{ContentKind, Flower, Language, SummaryContent, TextField, TranslatedContent};
use serde::{Deserialize, Serialize};

/// What the detail view shows for a record, after merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContent {
    pub name: String,
    #[serde(rename = "type")]
    pub flower_type: String,
    pub color: String,
    pub description: String,
    pub blooming_season: String,
    pub care_instructions: String,
    /// Language the translated fields are in (base when untranslated).
    pub language: Language,
    /// Kind of the summary section, if one is shown.
    pub summary_kind: Option<ContentKind>,
    pub key_points: Vec<String>,
    pub quick_care: Option<String>,
    pub best_for: Option<String>,
}

/// Merge a record with its AI content.
///
/// Per text field: an expanded value wins for the long-form fields; otherwise
/// a non-blank translation in the active language wins; otherwise the
/// original. Key points, quick care and best-for are added from the summary.
/// A translation in a language other than `active_language` is ignored.
pub fn resolve(
    flower: &Flower,
    translated: Option<&TranslatedContent>,
    summary: Option<&SummaryContent>,
    active_language: Language,
) -> ResolvedContent {
    let translated = translated.filter(|t| !active_language.is_base() && t.language == active_language);

    let pick = |field: TextField| -> String {
        if let Some(expanded) = summary.and_then(|s| s.expanded_field(field)) {
            return expanded.to_string();
        }
        if let Some(value) = translated.and_then(|t| t.field(field)) {
            return value.to_string();
        }
        flower.field(field).to_string()
    };

    ResolvedContent {
        name: pick(TextField::Name),
        flower_type: pick(TextField::Type),
        color: pick(TextField::Color),
        description: pick(TextField::Description),
        blooming_season: pick(TextField::BloomingSeason),
        care_instructions: pick(TextField::CareInstructions),
        language: translated.map(|t| t.language).unwrap_or(Language::BASE),
        summary_kind: summary.map(|s| s.kind),
        key_points: summary.map(|s| s.key_points.clone()).unwrap_or_default(),
        quick_care: summary.and_then(|s| s.quick_care.clone()).filter(|s| !s.trim().is_empty()),
        best_for: summary.and_then(|s| s.best_for.clone()).filter(|s| !s.trim().is_empty()),
    }
}

impl ResolvedContent {
    pub fn field(&self, field: TextField) -> &str {
        match field {
            TextField::Name => &self.name,
            TextField::Type => &self.flower_type,
            TextField::Color => &self.color,
            TextField::Description => &self.description,
            TextField::BloomingSeason => &self.blooming_season,
            TextField::CareInstructions => &self.care_instructions,
        }
    }

    /// `Label: value.` sentences for every non-empty field, in narration order.
    fn sentences(&self) -> Vec<String> {
        TextField::NARRATION_ORDER
            .iter()
            .filter_map(|&field| {
                let value = self.field(field).trim();
                (!value.is_empty()).then(|| sentence(field.label(), value))
            })
            .collect()
    }

    /// Text handed to speech synthesis.
    pub fn narration_text(&self) -> String {
        let mut parts = vec!["Flower details.".to_string()];
        parts.extend(self.sentences());
        parts.join(" ")
    }

    /// Text shared alongside the record's share link.
    pub fn share_text(&self, share_url: &str) -> String {
        let mut parts = self.sentences();
        parts.push(share_url.to_string());
        parts.join(" ")
    }
}

/// `"{label}: {value}."`, without doubling a terminal mark already present.
fn sentence(label: &str, value: &str) -> String {
    if value.ends_with(['.', '!', '?', '।']) {
        format!("{label}: {value}")
    } else {
        format!("{label}: {value}.")
    }
}
