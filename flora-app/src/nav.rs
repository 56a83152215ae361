//! Navigation between the catalog's screens.

use flora_core::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    #[default]
    Gallery,
    /// Record form; `editing` is `None` when adding a new record.
    Form { editing: Option<RecordId> },
    Detail { id: RecordId },
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Gallery => "Gallery",
            View::Form { editing: None } => "Add Flower",
            View::Form { editing: Some(_) } => "Edit Flower",
            View::Detail { .. } => "Flower Details",
        }
    }

    /// Record the view is about, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            View::Gallery | View::Form { editing: None } => None,
            View::Form { editing: Some(id) } | View::Detail { id } => Some(id),
        }
    }

    /// Where "back" leads from here.
    pub fn back(&self) -> View {
        match self {
            View::Form { editing: Some(id) } => View::Detail { id: id.clone() },
            _ => View::Gallery,
        }
    }
}
