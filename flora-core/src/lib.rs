//! Flora Core - Entity Types
//!
//! Pure data structures shared by every Flora crate: record identities,
//! the flower record and its drafts, AI content shapes, enums, configuration
//! and the error taxonomy. No I/O lives here.

mod config;
mod entities;
mod enums;
mod error;
mod identity;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
