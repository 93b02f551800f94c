//! Generic boolean handler.
//!
//! Values are facet ids; each one selects the boolean field it maps to in
//! the filter's id-keyed search map.

use serde_json::{Value, json};
use tracing::debug;

use crate::schema::FieldRef;
use crate::statement::{BoolVerb, Filter};

use super::{BoolBody, verb_body};

/// Builds a `should` of `{term: {field: true}}` clauses.
pub fn build_clause(filter: &Filter, search: &FieldRef) -> Option<BoolBody> {
    let clauses: Vec<Value> = filter
        .values
        .iter()
        .filter_map(|value| {
            let key = value.value().as_str()?;
            let field = match search {
                FieldRef::Single(field) => Some(field.as_str()),
                FieldRef::Keyed(fields) => fields.get(key).map(String::as_str),
            };
            if field.is_none() {
                debug!(filter = %filter.id, key, "boolean value has no mapped field");
            }
            field
        })
        .map(|field| json!({ "term": { field: true } }))
        .collect();

    verb_body(BoolVerb::Should, clauses)
}
