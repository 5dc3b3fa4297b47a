//! Transformation functions for exercise catalog API responses
//!
//! The catalog is fetched as two flat collections: exercises and their
//! images. This module joins them and normalizes every exercise into an
//! [`ExerciseRecord`], the in-memory working set the rest of the crate
//! filters and paginates.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Category shown for exercises the upstream catalog does not categorize
pub const UNCATEGORIZED: &str = "Uncategorized";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex"));

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Exercise identifier as provided upstream (integer or string)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ExerciseId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseId::Number(id) => write!(f, "{id}"),
            ExerciseId::Text(id) => write!(f, "{id}"),
        }
    }
}

impl ExerciseId {
    /// Parse user input into an identifier, preferring the numeric form
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        trimmed
            .parse::<u64>()
            .map(ExerciseId::Number)
            .unwrap_or_else(|_| ExerciseId::Text(trimmed.to_string()))
    }
}

/// Paginated collection envelope returned by the catalog API
///
/// Only `results` is consumed; `count` and the cursor fields are logged.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogPage<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Upstream category field: a nested object, a bare name or a bare id
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawCategory {
    Named { name: Option<String> },
    Id(u64),
    Name(String),
}

/// Exercise record from the catalog API
#[derive(Debug, Deserialize, Clone)]
pub struct RawExercise {
    pub id: ExerciseId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<RawCategory>,
}

/// Exercise image record from the catalog API
///
/// Older catalog versions name the owner `exercise_base`.
#[derive(Debug, Deserialize, Clone)]
pub struct RawExerciseImage {
    #[serde(default)]
    pub exercise: Option<ExerciseId>,
    #[serde(default)]
    pub exercise_base: Option<ExerciseId>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_main: Option<bool>,
}

impl RawExerciseImage {
    /// Owning exercise id, preferring `exercise` over `exercise_base`
    pub fn owner(&self) -> Option<&ExerciseId> {
        self.exercise.as_ref().or(self.exercise_base.as_ref())
    }
}

// =============================================================================
// Output Types (Serialization)
// =============================================================================

/// Mapping from exercise identifier to its primary image URL
pub type ImageMap = HashMap<ExerciseId, String>;

/// Normalized exercise, rebuilt on every fetch
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExerciseRecord {
    pub id: ExerciseId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    /// UI flag, the only field mutated after creation
    pub expanded: bool,
}

// =============================================================================
// Transformation Functions
// =============================================================================

/// Remove every `<tag>`-style substring
///
/// A single global replace; HTML entities are left untouched.
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

/// Qualify a possibly relative image path against the media base URL
pub fn qualify_image_url(media_base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    format!(
        "{}/{}",
        media_base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Decode each raw collection entry on its own
///
/// Entries that do not fit `T` are dropped. Returns the decoded records
/// and the number of dropped entries.
pub fn decode_records<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> (Vec<T>, usize) {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    let skipped = total - records.len();

    (records, skipped)
}

/// Build the exercise id -> primary image URL mapping
///
/// Images explicitly flagged as non-primary are ignored; an absent flag
/// means the query already filtered to primary images. Records missing
/// the owning id or the image path are skipped. When several primary
/// images share an id, the last one wins.
pub fn build_image_map(images: &[RawExerciseImage], media_base: &str) -> ImageMap {
    let mut map = ImageMap::new();

    for image in images {
        if image.is_main == Some(false) {
            continue;
        }

        let (Some(exercise), Some(path)) = (image.owner(), &image.image) else {
            continue;
        };

        if path.is_empty() {
            continue;
        }

        map.insert(exercise.clone(), qualify_image_url(media_base, path));
    }

    map
}

fn resolve_category(category: Option<&RawCategory>) -> String {
    let name = match category {
        Some(RawCategory::Named { name: Some(name) }) => name.trim().to_string(),
        Some(RawCategory::Name(name)) => name.trim().to_string(),
        Some(RawCategory::Id(id)) => id.to_string(),
        Some(RawCategory::Named { name: None }) | None => String::new(),
    };

    if name.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        name
    }
}

/// Merge exercises with their joined image URLs
///
/// Pure function of its two inputs. Duplicate upstream ids keep their
/// first occurrence.
pub fn normalize_exercises(exercises: &[RawExercise], images: &ImageMap) -> Vec<ExerciseRecord> {
    let mut seen = HashSet::new();

    exercises
        .iter()
        .filter(|exercise| seen.insert(exercise.id.clone()))
        .map(|exercise| ExerciseRecord {
            id: exercise.id.clone(),
            name: exercise.name.clone().unwrap_or_default(),
            description: exercise
                .description
                .as_deref()
                .map(strip_tags)
                .unwrap_or_default(),
            image_url: images.get(&exercise.id).cloned(),
            category: resolve_category(exercise.category.as_ref()),
            expanded: false,
        })
        .collect()
}

/// Category names in order of first appearance
pub fn distinct_categories(records: &[ExerciseRecord]) -> Vec<String> {
    let mut seen = HashSet::new();

    records
        .iter()
        .filter(|record| seen.insert(record.category.as_str()))
        .map(|record| record.category.clone())
        .collect()
}
