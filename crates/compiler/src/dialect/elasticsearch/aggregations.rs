//! Facet aggregations.
//!
//! A facet document carries three families of aggregations:
//!
//! - `filtered`: every non-nested facet, scoped by the base query.
//! - `nested_<path>`: facets living in a nested subtype, restricted to the
//!   identity's own nested entries when the subtype declares a scoping field.
//! - `<F>` / `filtered_except_<F>`: for every facet whose filter is active in
//!   the statement, a global aggregation over the query with that filter's
//!   values cleared, so a facet never narrows its own buckets.
//!
//! [`flatten_facet_results`] folds the three families of a response back
//! into one map keyed by aggregation name.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::SchemaError;
use crate::placeholder::IDENTITY_PLACEHOLDER;
use crate::schema::{NestedScope, ResolvedFilter, SchemaIndex};
use crate::statement::{Group, Instruction};

use super::assembler::QueryAssembler;
use super::translator::Translator;

const FILTERED: &str = "filtered";
const NESTED_PREFIX: &str = "nested_";
const EXCEPT_PREFIX: &str = "filtered_except_";

/// Builds the facet document body for a denormalized root group.
pub fn build_facet_body(
    schema: &SchemaIndex,
    assembler: &QueryAssembler<'_>,
    root: &Group,
) -> Result<Value, SchemaError> {
    let translator = Translator::new(schema);
    let base = assembler.base_query(&translator.translate(root)?);

    let mut global = Map::new();
    let mut nested: Vec<(&NestedScope, Map<String, Value>)> = Vec::new();

    for filter in schema.facet_filters() {
        match &filter.nested {
            None => global.extend(named_aggregations(filter)),
            Some(scope) => match nested.iter_mut().find(|(s, _)| s.path == scope.path) {
                Some((_, aggs)) => aggs.extend(named_aggregations(filter)),
                None => nested.push((scope, named_aggregations(filter))),
            },
        }
    }

    let mut aggs = Map::new();
    if !global.is_empty() {
        aggs.insert(
            FILTERED.to_string(),
            json!({ "filter": base, "aggs": global }),
        );
    }
    for (scope, scoped) in nested {
        aggs.insert(nested_key(scope), nested_aggregation(scope, scoped));
    }

    let tree = Instruction::Group(root.clone());
    for filter in schema.facet_filters() {
        if !tree.has_active_filter(&filter.id) {
            continue;
        }

        let cleared = match tree.without_filter_values(&filter.id) {
            Instruction::Group(group) => group,
            _ => Group::default(),
        };
        let except_query = assembler.base_query(&translator.translate(&cleared)?);

        let inner = match &filter.nested {
            Some(scope) => {
                let mut wrapped = Map::new();
                wrapped.insert(
                    nested_key(scope),
                    nested_aggregation(scope, named_aggregations(filter)),
                );
                wrapped
            }
            None => named_aggregations(filter),
        };

        debug!(facet = %filter.id, "adding self-excluding facet");
        let except_key = format!("{EXCEPT_PREFIX}{}", filter.id);
        aggs.insert(
            filter.id.clone(),
            json!({
                "global": {},
                "aggs": { except_key: { "filter": except_query, "aggs": inner } }
            }),
        );
    }

    Ok(json!({ "size": 0, "query": base, "aggs": aggs }))
}

/// Folds a facet response's aggregations into one map keyed by aggregation name.
///
/// Results from `filtered_except_<F>` override the global ones.
pub fn flatten_facet_results(aggregations: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(top) = aggregations.as_object() else {
        return out;
    };

    for (key, value) in top {
        if key == FILTERED || key.starts_with(NESTED_PREFIX) {
            hoist(value, &mut out);
        }
    }

    for (key, value) in top {
        if let Some(except) = value.get(format!("{EXCEPT_PREFIX}{key}")) {
            hoist(except, &mut out);
        }
    }

    out
}

fn hoist(container: &Value, out: &mut Map<String, Value>) {
    let Some(entries) = container.as_object() else {
        return;
    };

    for (key, value) in entries {
        match key.as_str() {
            "doc_count" | "meta" => {}
            FILTERED => hoist(value, out),
            _ if key.starts_with(NESTED_PREFIX) => hoist(value, out),
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
}

fn named_aggregations(filter: &ResolvedFilter) -> Map<String, Value> {
    filter
        .facets
        .iter()
        .map(|facet| (facet.id.clone(), facet.to_value()))
        .collect()
}

fn nested_key(scope: &NestedScope) -> String {
    format!("{NESTED_PREFIX}{}", scope.path)
}

fn nested_aggregation(scope: &NestedScope, aggs: Map<String, Value>) -> Value {
    let inner = match scope.scoped_field() {
        Some(field) => json!({
            FILTERED: {
                "filter": { "term": { field: IDENTITY_PLACEHOLDER } },
                "aggs": aggs
            }
        }),
        None => Value::Object(aggs),
    };

    json!({ "nested": { "path": scope.path }, "aggs": inner })
}
