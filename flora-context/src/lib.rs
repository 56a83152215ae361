//! Flora Context - Content Resolution
//!
//! Decides what a record's detail view shows. Original record text, an AI
//! translation and an AI summary or expansion are merged field by field
//! ([`merge`]); AI requests are tagged so late responses for a superseded
//! selection are dropped ([`lifecycle`], [`view`]); and AI content is looked
//! up in the expiring cache before the provider is asked ([`resolver`]).

pub mod lifecycle;
pub mod merge;
pub mod resolver;
pub mod view;

pub use lifecycle::{RequestFailure, RequestSequencer, RequestState, RequestTag};
pub use merge::{resolve, ResolvedContent};
pub use resolver::ContentResolver;
pub use view::{ApplyOutcome, DetailViewState};
