//! Gallery filtering.

use flora_core::{Category, Flower};
use serde::{Deserialize, Serialize};

/// Search text plus an optional category filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryFilter {
    pub query: String,
    pub category: Option<Category>,
}

impl GalleryFilter {
    pub fn matches(&self, flower: &Flower) -> bool {
        flower.matches_query(&self.query)
            && self
                .category
                .map(|c| flower.category.trim().eq_ignore_ascii_case(c.as_str()))
                .unwrap_or(true)
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.category.is_some()
    }

    /// Records passing the filter, in catalog order.
    pub fn apply<'a>(&self, flowers: &'a [Flower]) -> Vec<&'a Flower> {
        flowers.iter().filter(|f| self.matches(f)).collect()
    }
}

/// Records whose name, type, color or category contains `query`.
pub fn search<'a>(flowers: &'a [Flower], query: &str) -> Vec<&'a Flower> {
    flowers.iter().filter(|f| f.matches_query(query)).collect()
}

pub fn by_category(flowers: &[Flower], category: Category) -> Vec<&Flower> {
    GalleryFilter {
        query: String::new(),
        category: Some(category),
    }
    .apply(flowers)
}
