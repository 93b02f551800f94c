//! Numeric comparison handler.

use serde_json::{Map, Value, json};

use crate::statement::{BoolVerb, Filter};

use super::{BoolBody, verb_body};

/// Builds a single `range` clause merging every comparison of `filter`.
pub fn build_clause(filter: &Filter, field: &str) -> Option<BoolBody> {
    let range = merge_range(filter, field)?;
    verb_body(BoolVerb::Must, vec![range])
}

/// Merges comparator/value pairs into one `range` clause.
///
/// Values without a comparator are ignored; a repeated comparator keeps its
/// last value. Returns `None` when no value carries a comparator.
pub fn merge_range(filter: &Filter, field: &str) -> Option<Value> {
    let mut bounds = Map::new();
    for value in &filter.values {
        if let Some(comparator) = value.comparator() {
            bounds.insert(comparator.boundary().to_string(), value.value().clone());
        }
    }

    if bounds.is_empty() {
        return None;
    }

    Some(json!({ "range": { field: bounds } }))
}
