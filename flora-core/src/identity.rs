//! Identity types for Flora records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Milliseconds since the Unix epoch, as persisted in cache entries.
pub type EpochMillis = i64;

/// Hex-encoded SHA-256 digest.
pub type ContentHash = String;

/// Compute the SHA-256 hash of a sequence of parts.
///
/// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
pub fn compute_content_hash<'a>(parts: impl IntoIterator<Item = &'a str>) -> ContentHash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Identifier of a flower record.
///
/// Ids are assigned by the record store and are opaque strings; they never
/// change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh store id (UUIDv7, so ids sort by creation time).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable_and_boundary_sensitive() {
        let a = compute_content_hash(["ab", "c"]);
        assert_eq!(a, compute_content_hash(["ab", "c"]));
        assert_ne!(a, compute_content_hash(["a", "bc"]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_record_id_serializes_as_plain_string() {
        let id = RecordId::new("abc123");
        let json = serde_json::to_string(&id).expect("serialize should succeed");
        assert_eq!(json, "\"abc123\"");
    }
}
