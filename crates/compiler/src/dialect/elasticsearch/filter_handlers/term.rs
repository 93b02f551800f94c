//! Equality handler for generic, specific and autocomplete filters.

use serde_json::{Value, json};

use crate::statement::Filter;

use super::{BoolBody, verb_body};

/// Builds one `term` clause per value, combined by the filter's operand.
pub fn build_clause(filter: &Filter, field: &str) -> Option<BoolBody> {
    let clauses: Vec<Value> = filter
        .values
        .iter()
        .map(|value| json!({ "term": { field: value.value() } }))
        .collect();

    verb_body(filter.operand.verb(), clauses)
}
