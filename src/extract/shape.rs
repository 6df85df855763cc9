//! Decoding of polymorphic JSON-LD values
//!
//! Schema.org publishers are free to write most properties as a string, a
//! number, an array or a nested object. [`Shape`] names those cases once, and
//! the helpers below are reused by every field with that polymorphism.

use crate::record::dedup_ordered;
use serde_json::{Map, Value};

/// Nesting depth beyond which values are ignored
pub const MAX_DEPTH: usize = 12;

/// Object keys that carry a URL, in preference order
const URL_KEYS: &[&str] = &["url", "contentUrl", "@id"];

/// Object keys that carry a display string, in preference order
const TEXT_KEYS: &[&str] = &["name", "text", "@value"];

/// The four shapes a JSON-LD property value can take
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Absent,
    Scalar(&'a Value),
    List(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> Shape<'a> {
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Shape::Absent,
            Some(Value::Array(items)) => Shape::List(items),
            Some(Value::Object(map)) => Shape::Object(map),
            Some(scalar) => Shape::Scalar(scalar),
        }
    }
}

/// Collapses whitespace runs and trims; empty results are absent
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First usable string in a scalar, list or object value
pub fn first_text(value: Option<&Value>) -> Option<String> {
    first_text_at(value, 0)
}

fn first_text_at(value: Option<&Value>, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }
    match Shape::of(value) {
        Shape::Absent => None,
        Shape::Scalar(v) => scalar_text(v),
        Shape::List(items) => items
            .iter()
            .find_map(|item| first_text_at(Some(item), depth + 1)),
        Shape::Object(map) => TEXT_KEYS
            .iter()
            .find_map(|key| first_text_at(map.get(*key), depth + 1)),
    }
}

/// Every usable string in a scalar, list or object value, as an ordered set
pub fn text_list(value: Option<&Value>) -> Vec<String> {
    let mut out = Vec::new();
    collect_texts(value, 0, &mut out);
    dedup_ordered(out)
}

fn collect_texts(value: Option<&Value>, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    match Shape::of(value) {
        Shape::Absent => {}
        Shape::Scalar(v) => out.extend(scalar_text(v)),
        Shape::List(items) => {
            for item in items {
                collect_texts(Some(item), depth + 1, out);
            }
        }
        Shape::Object(_) => out.extend(first_text_at(value, depth)),
    }
}

/// Resolves an image-like value to a single URL string
///
/// Prefers a scalar URL, then the first element of an array, then an
/// object's URL-bearing field, recursively.
pub fn url_of(value: Option<&Value>) -> Option<String> {
    url_at(value, 0)
}

fn url_at(value: Option<&Value>, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }
    match Shape::of(value) {
        Shape::Absent => None,
        Shape::Scalar(Value::String(s)) => clean_text(s),
        Shape::Scalar(_) => None,
        Shape::List(items) => items.first().and_then(|first| url_at(Some(first), depth + 1)),
        Shape::Object(map) => URL_KEYS
            .iter()
            .find_map(|key| url_at(map.get(*key), depth + 1)),
    }
}

/// True if the node's `@type` is `wanted`, either directly or in a type array
pub fn has_type(node: &Map<String, Value>, wanted: &str) -> bool {
    let matches = |v: &Value| {
        v.as_str().is_some_and(|t| {
            let t = t.rsplit(['/', ':']).next().unwrap_or(t);
            t.eq_ignore_ascii_case(wanted)
        })
    };

    match Shape::of(node.get("@type")) {
        Shape::Scalar(v) => matches(v),
        Shape::List(items) => items.iter().any(matches),
        _ => false,
    }
}

/// Passes a sub-value through unchanged unless it is empty
pub fn passthrough(value: Option<&Value>) -> Option<Value> {
    match Shape::of(value) {
        Shape::Absent => None,
        Shape::Scalar(Value::String(s)) if s.trim().is_empty() => None,
        Shape::List(items) if items.is_empty() => None,
        Shape::Object(map) if map.is_empty() => None,
        _ => value.cloned(),
    }
}
