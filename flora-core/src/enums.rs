//! Enum types for Flora records and AI content

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LANGUAGE
// ============================================================================

/// Languages the catalog can present record content in.
///
/// English is the base (authoring) language. Every language has a BCP-47
/// locale used for speech narration and a short translation code used in
/// cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Tamil,
    Telugu,
    Bengali,
    Marathi,
    Gujarati,
    Kannada,
    Malayalam,
    Punjabi,
}

impl Language {
    /// The base language record content is authored in.
    pub const BASE: Language = Language::English;

    /// Every supported language, base first.
    pub const ALL: [Language; 10] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Bengali,
        Language::Marathi,
        Language::Gujarati,
        Language::Kannada,
        Language::Malayalam,
        Language::Punjabi,
    ];

    /// Languages offered by the AI translation menu.
    pub const AI_TRANSLATION: [Language; 2] = [Language::Hindi, Language::Malayalam];

    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }

    /// English name, also the name passed to the AI provider.
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Bengali => "Bengali",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
            Language::Punjabi => "Punjabi",
        }
    }

    /// Name in the language's own script.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिन्दी",
            Language::Tamil => "தமிழ்",
            Language::Telugu => "తెలుగు",
            Language::Bengali => "বাংলা",
            Language::Marathi => "मराठी",
            Language::Gujarati => "ગુજરાતી",
            Language::Kannada => "ಕನ್ನಡ",
            Language::Malayalam => "മലയാളം",
            Language::Punjabi => "ਪੰਜਾਬੀ",
        }
    }

    /// Short translation code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Bengali => "bn",
            Language::Marathi => "mr",
            Language::Gujarati => "gu",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Punjabi => "pa",
        }
    }

    /// Speech synthesis locale.
    pub fn locale(&self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
            Language::Tamil => "ta-IN",
            Language::Telugu => "te-IN",
            Language::Bengali => "bn-IN",
            Language::Marathi => "mr-IN",
            Language::Gujarati => "gu-IN",
            Language::Kannada => "kn-IN",
            Language::Malayalam => "ml-IN",
            Language::Punjabi => "pa-IN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = EnumParseError;

    /// Accepts the English name, the translation code or the locale,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.name().to_lowercase() == needle
                    || lang.code() == needle
                    || lang.locale().to_lowercase() == needle
            })
            .ok_or_else(|| EnumParseError::new("language", s))
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Plant category offered by the record form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Flower,
    Fruit,
    Vegetable,
    Herb,
    Tree,
    Shrub,
    Succulent,
    Cactus,
    Vine,
    Fern,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Flower,
        Category::Fruit,
        Category::Vegetable,
        Category::Herb,
        Category::Tree,
        Category::Shrub,
        Category::Succulent,
        Category::Cactus,
        Category::Vine,
        Category::Fern,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flower => "Flower",
            Category::Fruit => "Fruit",
            Category::Vegetable => "Vegetable",
            Category::Herb => "Herb",
            Category::Tree => "Tree",
            Category::Shrub => "Shrub",
            Category::Succulent => "Succulent",
            Category::Cactus => "Cactus",
            Category::Vine => "Vine",
            Category::Fern => "Fern",
            Category::Other => "Other",
        }
    }

    /// Parse a stored category string; `None` for empty or free-text values.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| EnumParseError::new("category", s))
    }
}

// ============================================================================
// AI CONTENT
// ============================================================================

/// AI operation a cache entry was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Translate,
    Summarize,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Translate => "translate",
            OperationKind::Summarize => "summarize",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translate" => Ok(OperationKind::Translate),
            "summarize" => Ok(OperationKind::Summarize),
            _ => Err(EnumParseError::new("operation", s)),
        }
    }
}

/// Shape of summary content returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Long content condensed into key points; long-form fields untouched.
    Summarized,
    /// Short content enriched; replaces description and care instructions.
    Expanded,
}

/// Text fields of a record that take part in translation and narration,
/// in narration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextField {
    Name,
    Type,
    Color,
    Description,
    BloomingSeason,
    CareInstructions,
}

impl TextField {
    pub const NARRATION_ORDER: [TextField; 6] = [
        TextField::Name,
        TextField::Type,
        TextField::Color,
        TextField::Description,
        TextField::BloomingSeason,
        TextField::CareInstructions,
    ];

    /// Human label used in narration and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            TextField::Name => "Name",
            TextField::Type => "Type",
            TextField::Color => "Color",
            TextField::Description => "Description",
            TextField::BloomingSeason => "Blooming Season",
            TextField::CareInstructions => "Care Instructions",
        }
    }

    /// Whether expanded summary content may replace this field.
    pub fn is_long_form(&self) -> bool {
        matches!(self, TextField::Description | TextField::CareInstructions)
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error when parsing an unknown enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}
