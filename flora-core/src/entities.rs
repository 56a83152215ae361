//! Core entity structures

use crate::{
    compute_content_hash, ContentHash, ContentKind, Language, RecordId, TextField, Timestamp,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text keys that are normalized from `null` to the empty string on load.
const TEXT_KEYS: [&str; 8] = [
    "name",
    "type",
    "color",
    "category",
    "parental",
    "bloomingSeason",
    "careInstructions",
    "description",
];

// ============================================================================
// IMAGES
// ============================================================================

/// Reference to a record image.
///
/// Images picked in the form are inline `data:` URLs until the store uploads
/// them; afterwards they are resolved download URLs. Serialized as the bare
/// string either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    /// Inline-encoded bytes pending upload (`data:<mime>;base64,...`).
    Inline(String),
    /// Resolved URL of an uploaded image.
    Url(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Inline(s) | ImageRef::Url(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ImageRef::Inline(_))
    }

    /// Base64 payload of an inline image (the text after `base64,`).
    pub fn base64_payload(&self) -> Option<&str> {
        match self {
            ImageRef::Inline(s) => s.split_once("base64,").map(|(_, payload)| payload),
            ImageRef::Url(_) => None,
        }
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        if value.starts_with("data:") {
            ImageRef::Inline(value)
        } else {
            ImageRef::Url(value)
        }
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        ImageRef::from(value.to_string())
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        match value {
            ImageRef::Inline(s) | ImageRef::Url(s) => s,
        }
    }
}

// ============================================================================
// FLOWER RECORD
// ============================================================================

/// A catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flower {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub flower_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub category: String,
    /// Comma-separated names of parent records.
    #[serde(default)]
    pub parental: String,
    #[serde(default)]
    pub blooming_season: String,
    #[serde(default)]
    pub care_instructions: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<Timestamp>,
}

impl Flower {
    /// Decode a stored document, applying [`migrate_legacy_record`] first.
    ///
    /// The document id is authoritative and overrides any `id` inside the body.
    pub fn from_stored(id: &RecordId, value: Value) -> Result<Self, serde_json::Error> {
        let mut value = migrate_legacy_record(value);
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }
        serde_json::from_value(value)
    }

    /// Value of a text field as stored (may be empty).
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

    /// Hash of the text AI content is generated from.
    ///
    /// Changes whenever a narrated field changes; images, category and
    /// timestamps do not contribute.
    pub fn source_hash(&self) -> ContentHash {
        compute_content_hash(TextField::NARRATION_ORDER.iter().map(|field| self.field(*field)))
    }

    /// Parent names listed in `parental`, trimmed, empties dropped.
    pub fn parental_names(&self) -> Vec<&str> {
        self.parental
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Resolve parent names against the catalog by case-insensitive name.
    pub fn resolve_parents<'a>(&self, catalog: &'a [Flower]) -> Vec<(String, Option<&'a Flower>)> {
        self.parental_names()
            .into_iter()
            .map(|name| {
                let found = catalog
                    .iter()
                    .find(|f| f.name.trim().eq_ignore_ascii_case(name));
                (name.to_string(), found)
            })
            .collect()
    }

    /// Gallery search: case-insensitive substring over name, type, color and
    /// category. An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.name, &self.flower_type, &self.color, &self.category]
            .iter()
            .any(|value| value.to_lowercase().contains(&query))
    }

    /// First image, used as the gallery thumbnail.
    pub fn cover_image(&self) -> Option<&ImageRef> {
        self.images.first()
    }
}

/// Normalize a stored record document to the canonical schema.
///
/// A legacy single `image` string becomes `images: [image]` and the `image`
/// key is removed. When both keys exist, `images` wins. A missing or
/// non-array `images` becomes an empty array, and `null` text fields become
/// empty strings.
pub fn migrate_legacy_record(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        let legacy = map.remove("image");
        if !matches!(map.get("images"), Some(Value::Array(_))) {
            let images = match legacy {
                Some(Value::String(url)) if !url.is_empty() => vec![Value::String(url)],
                _ => Vec::new(),
            };
            map.insert("images".to_string(), Value::Array(images));
        }

        for key in TEXT_KEYS {
            if matches!(map.get(key), Some(Value::Null)) {
                map.insert(key.to_string(), Value::String(String::new()));
            }
        }
    }
    value
}

// ============================================================================
// DRAFTS
// ============================================================================

/// Fields submitted from the record form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowerDraft {
    pub name: String,
    #[serde(rename = "type", default)]
    pub flower_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub parental: String,
    #[serde(default)]
    pub blooming_season: String,
    #[serde(default)]
    pub care_instructions: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl FlowerDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, flower_type: impl Into<String>) -> Self {
        self.flower_type = flower_type.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_care_instructions(mut self, care: impl Into<String>) -> Self {
        self.care_instructions = care.into();
        self
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    /// Name is required and must be non-empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        Ok(())
    }

    /// Build the record the store persists for this draft.
    pub fn into_flower(
        self,
        id: RecordId,
        created_at: Option<Timestamp>,
        updated_at: Option<Timestamp>,
    ) -> Flower {
        Flower {
            id,
            name: self.name.trim().to_string(),
            flower_type: self.flower_type,
            color: self.color,
            category: self.category,
            parental: self.parental,
            blooming_season: self.blooming_season,
            care_instructions: self.care_instructions,
            description: self.description,
            images: self.images,
            created_at,
            updated_at,
        }
    }
}

impl From<&Flower> for FlowerDraft {
    fn from(flower: &Flower) -> Self {
        Self {
            name: flower.name.clone(),
            flower_type: flower.flower_type.clone(),
            color: flower.color.clone(),
            category: flower.category.clone(),
            parental: flower.parental.clone(),
            blooming_season: flower.blooming_season.clone(),
            care_instructions: flower.care_instructions.clone(),
            description: flower.description.clone(),
            images: flower.images.clone(),
        }
    }
}

// ============================================================================
// AI CONTENT
// ============================================================================

/// Record text fields translated into one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedContent {
    pub language: Language,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub flower_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blooming_season: Option<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
}

impl TranslatedContent {
    pub fn empty(language: Language) -> Self {
        Self {
            language,
            name: None,
            flower_type: None,
            color: None,
            description: None,
            blooming_season: None,
            care_instructions: None,
        }
    }

    /// Translated value for a field, if present and non-blank.
    pub fn field(&self, field: TextField) -> Option<&str> {
        let value = match field {
            TextField::Name => &self.name,
            TextField::Type => &self.flower_type,
            TextField::Color => &self.color,
            TextField::Description => &self.description,
            TextField::BloomingSeason => &self.blooming_season,
            TextField::CareInstructions => &self.care_instructions,
        };
        value.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Summarized or expanded record content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryContent {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_care: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub care_instructions: Option<String>,
}

impl SummaryContent {
    pub fn summarized(key_points: Vec<String>) -> Self {
        Self {
            kind: ContentKind::Summarized,
            key_points,
            quick_care: None,
            best_for: None,
            description: None,
            care_instructions: None,
        }
    }

    pub fn expanded(key_points: Vec<String>, description: String, care_instructions: String) -> Self {
        Self {
            kind: ContentKind::Expanded,
            key_points,
            quick_care: None,
            best_for: None,
            description: Some(description),
            care_instructions: Some(care_instructions),
        }
    }

    /// Expanded long-form text for a field. Only `expanded` content carries
    /// replacements, and only for description and care instructions.
    pub fn expanded_field(&self, field: TextField) -> Option<&str> {
        if self.kind != ContentKind::Expanded {
            return None;
        }
        let value = match field {
            TextField::Description => &self.description,
            TextField::CareInstructions => &self.care_instructions,
            _ => return None,
        };
        value.as_deref().filter(|s| !s.trim().is_empty())
    }
}
