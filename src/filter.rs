//! Client-side search and category filtering over an already-fetched page.
//!
//! Pure functions: they run on every keystroke and never reorder results.

use serde::{Deserialize, Serialize};

use crate::model::Entity;

/// Key the renderer uses for "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Exact-match filter on an entity's status/type key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parse a filter key. `all` (and the legacy `todas`/`todos`) or an empty
    /// string mean no filter; anything else is matched verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | ALL_CATEGORIES | "todas" | "todos" => CategoryFilter::All,
            key => CategoryFilter::Only(key.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(key) => key,
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(key) => key == category,
        }
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CategoryFilter::parse(&raw))
    }
}

/// Current search box + category selection of a list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl ListFilter {
    pub fn new(search: &str, category: CategoryFilter) -> Self {
        Self {
            search: search.to_string(),
            category,
        }
    }

    pub fn has_search(&self) -> bool {
        !self.search.is_empty()
    }
}

/// Case-insensitive substring match of `term` against any field. An empty
/// term matches everything; absent fields count as the empty string.
pub fn text_matches(fields: &[Option<&str>], term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields
        .iter()
        .any(|field| field.unwrap_or("").to_lowercase().contains(&needle))
}

pub fn matches<E: Entity>(entity: &E, search: &str, category: &CategoryFilter) -> bool {
    text_matches(&entity.search_fields(), search) && category.matches(entity.category())
}

/// Entities passing `filter`, in fetch order.
pub fn apply<'a, E: Entity>(items: &'a [E], filter: &ListFilter) -> Vec<&'a E> {
    items
        .iter()
        .filter(|e| matches(*e, &filter.search, &filter.category))
        .collect()
}

/// Filter buttons for a kind: the sentinel first, then its category keys.
pub fn category_choices<E: Entity>() -> Vec<&'static str> {
    let mut choices = vec![ALL_CATEGORIES];
    choices.extend(E::category_options());
    choices
}
