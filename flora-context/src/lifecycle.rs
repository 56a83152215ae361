//! Request lifecycle for AI content requests.
//!
//! Every AI request is issued with a [`RequestTag`] naming the record,
//! operation and variant it was issued for plus a sequence number. A response
//! is applied only while its tag is still the current one; anything else is
//! stale and discarded. There is no network cancellation.

use flora_core::{Language, OperationKind, ProviderError, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one outstanding AI request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTag {
    pub record_id: RecordId,
    pub operation: OperationKind,
    /// Language code for translations, empty for summaries.
    pub variant: String,
    pub seq: u64,
}

impl RequestTag {
    /// The language a translation request was issued for.
    pub fn language(&self) -> Option<Language> {
        match self.operation {
            OperationKind::Translate => self.variant.parse().ok(),
            OperationKind::Summarize => None,
        }
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}#{}",
            self.operation, self.record_id, self.variant, self.seq
        )
    }
}

/// Hands out tags with increasing sequence numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSequencer {
    next: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, record_id: &RecordId, operation: OperationKind, variant: &str) -> RequestTag {
        self.next += 1;
        RequestTag {
            record_id: record_id.clone(),
            operation,
            variant: variant.to_string(),
            seq: self.next,
        }
    }

    pub fn translation(&mut self, record_id: &RecordId, language: Language) -> RequestTag {
        self.issue(record_id, OperationKind::Translate, language.code())
    }

    pub fn summary(&mut self, record_id: &RecordId) -> RequestTag {
        self.issue(record_id, OperationKind::Summarize, "")
    }
}

/// A provider failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub message: String,
    pub retryable: bool,
}

impl From<&ProviderError> for RequestFailure {
    fn from(error: &ProviderError) -> Self {
        Self {
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Lifecycle of the current AI request for a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    InFlight { tag: RequestTag },
    Succeeded { tag: RequestTag },
    Failed { tag: RequestTag, failure: RequestFailure },
}

impl RequestState {
    /// Tag of the request this state refers to.
    pub fn tag(&self) -> Option<&RequestTag> {
        match self {
            RequestState::Idle => None,
            RequestState::InFlight { tag }
            | RequestState::Succeeded { tag }
            | RequestState::Failed { tag, .. } => Some(tag),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight { .. })
    }

    /// Whether a response carrying `tag` may be applied.
    pub fn accepts(&self, tag: &RequestTag) -> bool {
        matches!(self, RequestState::InFlight { tag: current } if current == tag)
    }

    /// Whether `operation` is in flight, optionally for a specific variant.
    pub fn is_pending(&self, operation: OperationKind, variant: Option<&str>) -> bool {
        match self {
            RequestState::InFlight { tag } => {
                tag.operation == operation && variant.map(|v| v == tag.variant).unwrap_or(true)
            }
            _ => false,
        }
    }

    pub fn failure(&self) -> Option<&RequestFailure> {
        match self {
            RequestState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
