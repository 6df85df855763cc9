//! Recipe records
//!
//! A [`PartialRecord`] is what one extractor could read from one page. Partial
//! records are combined with [`merge`] and turned into the emitted
//! [`CanonicalRecord`] once the detail workflow for a locator is finished.

mod merge;

pub use merge::merge;

use crate::url::fallback_title;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Separator used for the flat `instructions_text` rendering
pub const INSTRUCTION_SEPARATOR: &str = "\n";

/// Separator used when multi-valued classification fields are flattened
pub const CLASSIFICATION_SEPARATOR: &str = ", ";

/// Sparse bag of recipe fields produced by a single extractor invocation
///
/// List-valued fields behave as ordered sets: source order is kept and
/// duplicates are removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub cuisine: Vec<String>,
    pub category: Vec<String>,
    pub rating_value: Option<Value>,
    pub rating_count: Option<Value>,
    pub rating_best: Option<Value>,
    pub rating_worst: Option<Value>,
    pub nutrition: Option<Value>,
    pub date_published: Option<String>,
}

impl PartialRecord {
    /// True iff title, ingredients and instructions are all non-empty
    pub fn is_core_complete(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
            && !self.ingredients.is_empty()
            && !self.instructions.is_empty()
    }

    /// True if no field carries any data
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The authoritative, merged record for one detail locator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub ingredients_count: usize,
    pub instructions: Vec<String>,
    pub instructions_text: String,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    pub rating_value: Option<Value>,
    pub rating_count: Option<Value>,
    pub rating_best: Option<Value>,
    pub rating_worst: Option<Value>,
    pub nutrition: Option<Value>,
    pub date_published: Option<String>,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    pub recipe_type: String,
}

impl CanonicalRecord {
    /// Builds the emitted record from the merged fields of one detail workflow
    ///
    /// An empty title is replaced by a title derived from the locator's path.
    pub fn finalize(
        record: PartialRecord,
        url: &Url,
        recipe_type: &str,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        let title = record
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fallback_title(url));

        Self {
            title,
            author: record.author,
            description: record.description,
            ingredients_count: record.ingredients.len(),
            instructions_text: record.instructions.join(INSTRUCTION_SEPARATOR),
            ingredients: record.ingredients,
            instructions: record.instructions,
            prep_time: record.prep_time,
            cook_time: record.cook_time,
            total_time: record.total_time,
            servings: record.servings,
            tags: record.tags,
            image_url: record.image_url,
            cuisine: join_non_empty(&record.cuisine),
            category: join_non_empty(&record.category),
            rating_value: record.rating_value,
            rating_count: record.rating_count,
            rating_best: record.rating_best,
            rating_worst: record.rating_worst,
            nutrition: record.nutrition,
            date_published: record.date_published,
            url: url.to_string(),
            scraped_at,
            recipe_type: recipe_type.to_string(),
        }
    }

    /// Record emitted for a listing hit when detail collection is disabled
    pub fn minimal(url: &Url, recipe_type: &str, scraped_at: DateTime<Utc>) -> Self {
        Self::finalize(PartialRecord::default(), url, recipe_type, scraped_at)
    }

    /// Same completeness signal as [`PartialRecord::is_core_complete`]
    pub fn is_core_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.ingredients.is_empty() && !self.instructions.is_empty()
    }
}

fn join_non_empty(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(CLASSIFICATION_SEPARATOR))
    }
}

/// Removes duplicates while keeping first-seen order
pub fn dedup_ordered<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
