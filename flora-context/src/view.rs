//! Per-record detail view state.

use flora_core::{ContentKind, Flower, Language, OperationKind, ProviderError, SummaryContent, TranslatedContent};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{RequestFailure, RequestSequencer, RequestState, RequestTag};
use crate::merge::{resolve, ResolvedContent};

/// Result of offering a response to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response matched the current request and is now shown.
    Applied,
    /// The response matched but carried a failure; originals stay shown.
    Failed,
    /// The response was for a superseded request and was dropped.
    Discarded,
}

/// What the detail view shows for one record and which AI request is live.
///
/// AI requests are serialized per record: issuing a new request supersedes the
/// previous one, whose response is then discarded. Expanded content and a
/// translation are never shown together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailViewState {
    flower: Flower,
    active_language: Language,
    translated: Option<TranslatedContent>,
    summary: Option<SummaryContent>,
    request: RequestState,
    sequencer: RequestSequencer,
    view_only: bool,
}

impl DetailViewState {
    pub fn new(flower: Flower, view_only: bool) -> Self {
        Self {
            flower,
            active_language: Language::BASE,
            translated: None,
            summary: None,
            request: RequestState::Idle,
            sequencer: RequestSequencer::new(),
            view_only,
        }
    }

    pub fn flower(&self) -> &Flower {
        &self.flower
    }

    pub fn active_language(&self) -> Language {
        self.active_language
    }

    pub fn translated(&self) -> Option<&TranslatedContent> {
        self.translated.as_ref()
    }

    pub fn summary(&self) -> Option<&SummaryContent> {
        self.summary.as_ref()
    }

    pub fn request(&self) -> &RequestState {
        &self.request
    }

    /// Opened from a share link: no edit or delete.
    pub fn is_view_only(&self) -> bool {
        self.view_only
    }

    pub fn is_translating(&self) -> bool {
        self.request.is_pending(OperationKind::Translate, None)
    }

    pub fn is_summarizing(&self) -> bool {
        self.request.is_pending(OperationKind::Summarize, None)
    }

    /// The most recent failure, if the last request failed.
    pub fn failure(&self) -> Option<&RequestFailure> {
        self.request.failure()
    }

    /// Merged content to display.
    pub fn resolved(&self) -> ResolvedContent {
        resolve(
            &self.flower,
            self.translated.as_ref(),
            self.summary.as_ref(),
            self.active_language,
        )
    }

    /// Replace the record (after an edit), dropping AI content for the old
    /// text and superseding any outstanding request.
    pub fn replace_flower(&mut self, flower: Flower) {
        self.flower = flower;
        self.translated = None;
        self.summary = None;
        self.active_language = Language::BASE;
        self.request = RequestState::Idle;
    }

    /// Switch the active language.
    ///
    /// The displayed translation is cleared either way. For a non-base
    /// language a translation request is issued and its tag returned; for the
    /// base language the view simply shows originals. Expanded content is
    /// cleared when a translation is requested.
    pub fn select_language(&mut self, language: Language) -> Option<RequestTag> {
        if language == self.active_language && (self.translated.is_some() || self.is_translating()) {
            return None;
        }

        self.translated = None;
        self.active_language = language;

        if language.is_base() {
            if self.is_translating() {
                self.request = RequestState::Idle;
            }
            return None;
        }

        if matches!(self.summary.as_ref().map(|s| s.kind), Some(ContentKind::Expanded)) {
            self.summary = None;
        }
        let tag = self.sequencer.translation(&self.flower.id, language);
        self.request = RequestState::InFlight { tag: tag.clone() };
        Some(tag)
    }

    /// Back to base-language originals.
    pub fn reset_language(&mut self) {
        self.select_language(Language::BASE);
    }

    /// Issue a summarize-or-expand request.
    ///
    /// Supersedes an in-flight translation; the active language then falls
    /// back to the base language since no translation will arrive.
    pub fn request_summary(&mut self) -> Option<RequestTag> {
        if self.is_summarizing() {
            return None;
        }
        if self.is_translating() {
            self.active_language = Language::BASE;
            self.translated = None;
        }
        let tag = self.sequencer.summary(&self.flower.id);
        self.request = RequestState::InFlight { tag: tag.clone() };
        Some(tag)
    }

    /// Drop summary content, returning to the pre-summary view.
    pub fn reset_summary(&mut self) {
        self.summary = None;
        if self.is_summarizing() {
            self.request = RequestState::Idle;
        }
    }

    /// Offer a translation response.
    pub fn apply_translation(
        &mut self,
        tag: &RequestTag,
        result: Result<Option<TranslatedContent>, ProviderError>,
    ) -> ApplyOutcome {
        if !self.accepts(tag, OperationKind::Translate) {
            return ApplyOutcome::Discarded;
        }
        match result {
            Ok(Some(content)) if content.language == self.active_language => {
                self.translated = Some(content);
                self.request = RequestState::Succeeded { tag: tag.clone() };
                ApplyOutcome::Applied
            }
            Ok(_) => {
                // Nothing usable; show originals.
                self.translated = None;
                self.request = RequestState::Succeeded { tag: tag.clone() };
                ApplyOutcome::Applied
            }
            Err(error) => {
                self.request = RequestState::Failed {
                    tag: tag.clone(),
                    failure: RequestFailure::from(&error),
                };
                ApplyOutcome::Failed
            }
        }
    }

    /// Offer a summary response.
    pub fn apply_summary(
        &mut self,
        tag: &RequestTag,
        result: Result<SummaryContent, ProviderError>,
    ) -> ApplyOutcome {
        if !self.accepts(tag, OperationKind::Summarize) {
            return ApplyOutcome::Discarded;
        }
        match result {
            Ok(content) => {
                if content.kind == ContentKind::Expanded {
                    self.translated = None;
                    self.active_language = Language::BASE;
                }
                self.summary = Some(content);
                self.request = RequestState::Succeeded { tag: tag.clone() };
                ApplyOutcome::Applied
            }
            Err(error) => {
                self.request = RequestState::Failed {
                    tag: tag.clone(),
                    failure: RequestFailure::from(&error),
                };
                ApplyOutcome::Failed
            }
        }
    }

    fn accepts(&self, tag: &RequestTag, operation: OperationKind) -> bool {
        let current = tag.operation == operation
            && tag.record_id == self.flower.id
            && self.request.accepts(tag);
        if !current {
            tracing::debug!(tag = %tag, "discarding stale AI response");
        }
        current
    }
}
