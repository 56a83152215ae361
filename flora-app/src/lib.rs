//! Flora application core.
//!
//! Presentation-independent state for the catalog: the serializable
//! [`state::AppState`], the pure [`state::update`] function and the
//! [`runtime::Runtime`] that executes its effects. Rendering is left to the
//! embedding front end.

pub mod config;
pub mod gallery;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod runtime;
pub mod share;
pub mod state;
pub mod telemetry;

pub use runtime::Runtime;
pub use state::{update, Action, AppState, Effect};
