//! Extraction of JSON payloads from free-form model text.
//!
//! Models often wrap the requested JSON in prose or code fences. The payload
//! is taken greedily: from the first opening bracket to the last matching
//! closing bracket in the text.

use flora_core::ProviderError;
use serde::de::DeserializeOwned;

/// Slice from the first `open` to the last `close`, inclusive.
fn greedy_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// The outermost `{ ... }` span of `text`.
pub fn json_object_span(text: &str) -> Option<&str> {
    greedy_span(text, '{', '}')
}

/// The outermost `[ ... ]` span of `text`.
pub fn json_array_span(text: &str) -> Option<&str> {
    greedy_span(text, '[', ']')
}

/// Parse the JSON object embedded in model output.
pub fn parse_object<T: DeserializeOwned>(provider: &str, text: &str) -> Result<T, ProviderError> {
    let span = json_object_span(text).ok_or_else(|| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: "no JSON object in response".to_string(),
    })?;
    serde_json::from_str(span).map_err(|e| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: format!("malformed JSON object: {e}"),
    })
}

/// Parse the JSON array embedded in model output.
pub fn parse_array<T: DeserializeOwned>(provider: &str, text: &str) -> Result<Vec<T>, ProviderError> {
    let span = json_array_span(text).ok_or_else(|| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: "no JSON array in response".to_string(),
    })?;
    serde_json::from_str(span).map_err(|e| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: format!("malformed JSON array: {e}"),
    })
}
