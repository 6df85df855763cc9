use super::PartialRecord;
use serde_json::Value;

/// Combines two partial records field by field
///
/// Scalars: `base` wins when present and non-empty, otherwise `extra` is
/// adopted. Lists: `base` order followed by the elements of `extra` that are
/// not already present. Nothing already in `base` is ever removed, so callers
/// merge in priority order: structured data first, markup second.
pub fn merge(base: PartialRecord, extra: Option<&PartialRecord>) -> PartialRecord {
    let Some(extra) = extra else {
        return base;
    };

    PartialRecord {
        title: pick_text(base.title, &extra.title),
        author: pick_text(base.author, &extra.author),
        description: pick_text(base.description, &extra.description),
        prep_time: pick_text(base.prep_time, &extra.prep_time),
        cook_time: pick_text(base.cook_time, &extra.cook_time),
        total_time: pick_text(base.total_time, &extra.total_time),
        servings: pick_text(base.servings, &extra.servings),
        ingredients: union(base.ingredients, &extra.ingredients),
        instructions: union(base.instructions, &extra.instructions),
        tags: union(base.tags, &extra.tags),
        image_url: pick_text(base.image_url, &extra.image_url),
        cuisine: union(base.cuisine, &extra.cuisine),
        category: union(base.category, &extra.category),
        rating_value: pick_value(base.rating_value, &extra.rating_value),
        rating_count: pick_value(base.rating_count, &extra.rating_count),
        rating_best: pick_value(base.rating_best, &extra.rating_best),
        rating_worst: pick_value(base.rating_worst, &extra.rating_worst),
        nutrition: pick_value(base.nutrition, &extra.nutrition),
        date_published: pick_text(base.date_published, &extra.date_published),
    }
}

fn pick_text(base: Option<String>, extra: &Option<String>) -> Option<String> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    if present(&base) || !present(extra) {
        base.or_else(|| extra.clone())
    } else {
        extra.clone()
    }
}

fn pick_value(base: Option<Value>, extra: &Option<Value>) -> Option<Value> {
    let present = |v: &Option<Value>| v.as_ref().is_some_and(value_present);

    if present(&base) || !present(extra) {
        base.or_else(|| extra.clone())
    } else {
        extra.clone()
    }
}

fn value_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn union(mut base: Vec<String>, extra: &[String]) -> Vec<String> {
    for item in extra {
        if !base.contains(item) {
            base.push(item.clone());
        }
    }
    base
}
