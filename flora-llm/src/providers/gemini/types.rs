//! Gemini `generateContent` request and response types

use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

impl GenerateContentRequest {
    /// A single-turn request: the optional JPEG image first, then the prompt.
    pub fn new(prompt: &str, image_base64: Option<&str>) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some(data) = image_base64 {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: data.to_string(),
                },
            });
        }
        parts.push(Part::Text {
            text: prompt.to_string(),
        });
        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::default(),
        }
    }
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, or empty.
    pub fn text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or("")
    }
}

// ============================================================================
// SHARED TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_with_image_puts_image_first() {
        let request = GenerateContentRequest::new("describe", Some("AAAA"));
        let value = serde_json::to_value(&request).expect("serialize should succeed");
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "parts": [
                        { "inline_data": { "mime_type": "image/jpeg", "data": "AAAA" } },
                        { "text": "describe" }
                    ]
                }],
                "generationConfig": { "temperature": 0.7f32, "maxOutputTokens": 2048 }
            })
        );
    }

    #[test]
    fn test_response_text_defaults_to_empty() {
        let empty: GenerateContentResponse = serde_json::from_str("{}").expect("parse should succeed");
        assert_eq!(empty.text(), "");

        let full: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "hello" }, { "text": "ignored" }] } }]
        }))
        .expect("parse should succeed");
        assert_eq!(full.text(), "hello");
    }
}
