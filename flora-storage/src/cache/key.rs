//! Cache key scheme for AI content.
//!
//! Keys render as `namespace:kind:recordId:variant`. Every component except the
//! operation kind is percent-encoded, so a `:` inside a record id or variant can
//! never shift a component boundary and two distinct tuples never render to
//! the same string.

use flora_core::{Language, OperationKind, RecordId};
use std::fmt;

/// Separator between key components.
const SEPARATOR: char = ':';

/// A cache key for one (operation, record, variant) tuple within a namespace.
///
/// # Design
///
/// The private inner struct means a key can only be built through
/// [`CacheKey::derive`] (or the typed helpers), so every key in the store was
/// rendered by the same scheme and can be decoded again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    inner: CacheKeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKeyInner {
    namespace: String,
    kind: OperationKind,
    record_id: RecordId,
    variant: String,
}

impl CacheKey {
    /// Derive the key for an operation on a record.
    ///
    /// `variant` is empty for operations without a sub-variant.
    pub fn derive(
        namespace: &str,
        kind: OperationKind,
        record_id: &RecordId,
        variant: &str,
    ) -> Self {
        Self {
            inner: CacheKeyInner {
                namespace: namespace.to_string(),
                kind,
                record_id: record_id.clone(),
                variant: variant.to_string(),
            },
        }
    }

    /// Key for a record translated into `language`, keyed by language code.
    pub fn translation(namespace: &str, record_id: &RecordId, language: Language) -> Self {
        Self::derive(namespace, OperationKind::Translate, record_id, language.code())
    }

    /// Key for a record's summary. Summaries have a single variant per record.
    pub fn summary(namespace: &str, record_id: &RecordId) -> Self {
        Self::derive(namespace, OperationKind::Summarize, record_id, "")
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn kind(&self) -> OperationKind {
        self.inner.kind
    }

    pub fn record_id(&self) -> &RecordId {
        &self.inner.record_id
    }

    pub fn variant(&self) -> &str {
        &self.inner.variant
    }

    /// Render the key as stored.
    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            urlencoding::encode(&self.inner.namespace),
            self.inner.kind.as_str(),
            urlencoding::encode(self.inner.record_id.as_str()),
            urlencoding::encode(&self.inner.variant),
        )
    }

    /// Decode a stored key.
    ///
    /// Returns `None` unless the string is exactly what [`encode`](Self::encode)
    /// would produce for some key.
    pub fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.split(SEPARATOR);
        let namespace = urlencoding::decode(parts.next()?).ok()?;
        let kind: OperationKind = parts.next()?.parse().ok()?;
        let record_id = urlencoding::decode(parts.next()?).ok()?;
        let variant = urlencoding::decode(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }

        let key = Self::derive(&namespace, kind, &RecordId::new(record_id), &variant);
        (key.encode() == raw).then_some(key)
    }

    /// Prefix shared by every key in a namespace.
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{}{SEPARATOR}", urlencoding::encode(namespace))
    }

    /// Whether this key belongs to `record_id`, for any operation or variant.
    pub fn record_matches(&self, record_id: &RecordId) -> bool {
        &self.inner.record_id == record_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
