//! Category filter and free-text search over normalized exercises

use crate::catalog::ExerciseRecord;
use serde::{Deserialize, Serialize};

/// Category chip that stands for "no category filter"
pub const ALL_CATEGORIES: &str = "All";

/// Ephemeral filter state held by the presentation layer
///
/// Changing the category or the search query always resets
/// `current_page` to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub selected_category: Option<String>,
    pub search_query: String,
    pub current_page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_category: None,
            search_query: String::new(),
            current_page: 1,
        }
    }
}

impl FilterState {
    /// Select a category; `None`, empty input and "All" clear the filter
    pub fn select_category(&mut self, category: Option<&str>) {
        self.selected_category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_string);
        self.current_page = 1;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.current_page = 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply this state's predicates to `records`
    pub fn apply<'a>(&self, records: &'a [ExerciseRecord]) -> Vec<&'a ExerciseRecord> {
        filter_exercises(
            records,
            self.selected_category.as_deref(),
            &self.search_query,
        )
    }
}

fn matches_category(record: &ExerciseRecord, selected_category: Option<&str>) -> bool {
    selected_category.is_none_or(|category| record.category == category)
}

fn matches_search(record: &ExerciseRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.description.to_lowercase().contains(needle)
}

/// Stable, order-preserving filter
///
/// A record survives when it passes the category predicate (exact
/// equality, or no category selected) AND the search predicate
/// (case-insensitive substring of name OR description, or empty query).
pub fn filter_exercises<'a>(
    records: &'a [ExerciseRecord],
    selected_category: Option<&str>,
    search_query: &str,
) -> Vec<&'a ExerciseRecord> {
    let needle = search_query.to_lowercase();

    records
        .iter()
        .filter(|record| matches_category(record, selected_category))
        .filter(|record| matches_search(record, &needle))
        .collect()
}
