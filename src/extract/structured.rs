//! JSON-LD extraction
//!
//! Reads every `<script type="application/ld+json">` block on a page, flattens
//! `@graph` containers and top-level arrays into individual nodes, and maps
//! `ItemList` nodes to detail locators and `Recipe` nodes to a partial record.

use super::shape::{clean_text, first_text, has_type, passthrough, text_list, url_of, Shape, MAX_DEPTH};
use crate::record::{dedup_ordered, PartialRecord};
use crate::url::{is_detail_locator, normalize, strip_query};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use url::Url;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Extracts list locators and recipe fields from embedded JSON-LD
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    detail_path_pattern: String,
}

impl StructuredExtractor {
    pub fn new(detail_path_pattern: impl Into<String>) -> Self {
        Self {
            detail_path_pattern: detail_path_pattern.into(),
        }
    }

    /// Detail locators listed by `ItemList` nodes, in document order
    ///
    /// Entries may be a bare URL string, a `ListItem` with `url`, or a
    /// `ListItem` whose `item` is a URL or an object with `url`/`@id`. Only
    /// locators whose path matches the detail pattern are kept; their query
    /// strings are dropped.
    pub fn extract_list(&self, document: &Html, base: &Url) -> Vec<Url> {
        let mut locators: Vec<Url> = Vec::new();

        for node in json_ld_nodes(document) {
            let Some(map) = node.as_object() else {
                continue;
            };
            if !has_type(map, "ItemList") {
                continue;
            }

            let element = map.get("itemListElement");
            let entries: &[Value] = match Shape::of(element) {
                Shape::List(items) => items,
                Shape::Absent => &[],
                _ => element.map(std::slice::from_ref).unwrap_or(&[]),
            };

            for entry in entries {
                let Some(raw) = entry_locator(entry) else {
                    continue;
                };
                let Some(url) = normalize(&raw, base).map(|u| strip_query(&u)) else {
                    tracing::trace!("Dropping unresolvable list entry {}", raw);
                    continue;
                };
                if is_detail_locator(&url, &self.detail_path_pattern) && !locators.contains(&url) {
                    locators.push(url);
                }
            }
        }

        locators
    }

    /// Recipe fields from the first `Recipe` node on the page
    ///
    /// Returns `None` when the page carries no recipe metadata at all.
    pub fn extract_detail(&self, document: &Html) -> Option<PartialRecord> {
        let nodes = json_ld_nodes(document);
        let recipe = nodes
            .iter()
            .filter_map(Value::as_object)
            .find(|map| has_type(map, "Recipe"))?;

        Some(map_recipe(recipe))
    }
}

fn entry_locator(entry: &Value) -> Option<String> {
    match Shape::of(Some(entry)) {
        Shape::Scalar(Value::String(s)) => clean_text(s),
        Shape::Object(map) => url_of(map.get("url"))
            .or_else(|| url_of(map.get("item")))
            .or_else(|| url_of(map.get("@id"))),
        _ => None,
    }
}

fn map_recipe(recipe: &Map<String, Value>) -> PartialRecord {
    let rating = match Shape::of(recipe.get("aggregateRating")) {
        Shape::Object(map) => Some(map),
        _ => None,
    };
    let rating_field = |keys: &[&str]| {
        rating.and_then(|map| keys.iter().find_map(|key| passthrough(map.get(*key))))
    };

    let mut instructions = Vec::new();
    collect_steps(recipe.get("recipeInstructions"), 0, &mut instructions);

    let ingredients = match Shape::of(recipe.get("recipeIngredient")) {
        Shape::Absent => text_list(recipe.get("ingredients")),
        _ => text_list(recipe.get("recipeIngredient")),
    };

    PartialRecord {
        title: first_text(recipe.get("name")).or_else(|| first_text(recipe.get("headline"))),
        author: first_text(recipe.get("author")),
        description: first_text(recipe.get("description")),
        prep_time: first_text(recipe.get("prepTime")),
        cook_time: first_text(recipe.get("cookTime")),
        total_time: first_text(recipe.get("totalTime")),
        servings: first_text(recipe.get("recipeYield")),
        ingredients,
        instructions: dedup_ordered(instructions),
        tags: keywords(recipe.get("keywords")),
        image_url: url_of(recipe.get("image")),
        cuisine: text_list(recipe.get("recipeCuisine")),
        category: text_list(recipe.get("recipeCategory")),
        rating_value: rating_field(&["ratingValue"]),
        rating_count: rating_field(&["ratingCount", "reviewCount"]),
        rating_best: rating_field(&["bestRating"]),
        rating_worst: rating_field(&["worstRating"]),
        nutrition: passthrough(recipe.get("nutrition")),
        date_published: first_text(recipe.get("datePublished")),
    }
}

/// Keywords arrive either as a list or as one comma-separated string
fn keywords(value: Option<&Value>) -> Vec<String> {
    dedup_ordered(
        text_list(value)
            .iter()
            .flat_map(|k| k.split(','))
            .filter_map(clean_text),
    )
}

/// Walks an instruction tree into flat step strings
///
/// Handles plain strings, `HowToStep` objects (`text`, then `description`,
/// then `name`), `HowToSection` objects (`itemListElement`) and nested lists.
fn collect_steps(value: Option<&Value>, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    match Shape::of(value) {
        Shape::Absent => {}
        Shape::Scalar(Value::String(s)) => out.extend(clean_text(s)),
        Shape::Scalar(_) => {}
        Shape::List(items) => {
            for item in items {
                collect_steps(Some(item), depth + 1, out);
            }
        }
        Shape::Object(map) => {
            if map.contains_key("itemListElement") {
                collect_steps(map.get("itemListElement"), depth + 1, out);
            } else if let Some(step) = ["text", "description", "name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).and_then(clean_text))
            {
                out.push(step);
            }
        }
    }
}

/// Parses every JSON-LD block and flattens containers into nodes
///
/// Blocks that fail to parse are skipped; they never affect other blocks.
fn json_ld_nodes(document: &Html) -> Vec<Value> {
    let mut nodes = Vec::new();

    let Ok(selector) = Selector::parse(JSON_LD_SELECTOR) else {
        return nodes;
    };

    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => flatten(value, 0, &mut nodes),
            Err(e) => tracing::debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    nodes
}

fn flatten(value: Value, depth: usize, out: &mut Vec<Value>) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(item, depth + 1, out);
            }
        }
        Value::Object(mut map) => {
            let graph = map.remove("@graph");
            let main_entity = match map.get("mainEntity") {
                Some(Value::Object(_)) | Some(Value::Array(_)) => map.get("mainEntity").cloned(),
                _ => None,
            };

            if map.contains_key("@type") {
                out.push(Value::Object(map));
            }
            if let Some(graph) = graph {
                flatten(graph, depth + 1, out);
            }
            if let Some(entity) = main_entity {
                flatten(entity, depth + 1, out);
            }
        }
        _ => {}
    }
}
