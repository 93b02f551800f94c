//! Instruction tree translator.
//!
//! Walks a denormalized instruction tree and produces the Elasticsearch
//! query for it:
//!
//! ```json
//! { "query": { "bool": { "filter": [ { "bool": <tree> } ] } } }
//! ```
//!
//! Every node yields the body of a `bool` query or nothing. Empty nodes are
//! dropped from their group, and a tree that is empty as a whole yields the
//! empty translation.

use serde_json::{Value, json};
use tracing::trace;

use crate::error::SchemaError;
use crate::schema::SchemaIndex;
use crate::statement::{Filter, Group, Instruction};

use super::filter_handlers::{self, BoolBody, verb_body};

/// Returns the translation of a statement that selects nothing.
pub fn empty_translation() -> Value {
    json!({ "query": { "bool": {} } })
}

/// Translates instruction trees against one schema.
pub struct Translator<'a> {
    schema: &'a SchemaIndex,
}

impl<'a> Translator<'a> {
    /// Creates a translator.
    pub fn new(schema: &'a SchemaIndex) -> Self {
        Self { schema }
    }

    /// Translates a root group into a complete query document.
    pub fn translate(&self, root: &Group) -> Result<Value, SchemaError> {
        match self.translate_tree(root)? {
            Some(tree) => Ok(json!({
                "query": { "bool": { "filter": [{ "bool": tree }] } }
            })),
            None => Ok(empty_translation()),
        }
    }

    /// Translates a root group into its bool body, or `None` if it is empty.
    ///
    /// `minimum_should_match: 1` is set on every body carrying a `should`.
    pub fn translate_tree(&self, root: &Group) -> Result<Option<BoolBody>, SchemaError> {
        let Some(tree) = self.group(root)? else {
            return Ok(None);
        };

        let mut wrapped = json!({ "bool": tree });
        apply_minimum_should_match(&mut wrapped);

        match wrapped {
            Value::Object(mut outer) => match outer.remove("bool") {
                Some(Value::Object(tree)) => Ok(Some(tree)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn node(&self, node: &Instruction) -> Result<Option<BoolBody>, SchemaError> {
        match node {
            Instruction::Filter(filter) => self.filter(filter),
            Instruction::Group(group) => self.group(group),
            // denormalized trees carry no subqueries
            Instruction::Subquery(subquery) => {
                trace!(key = %subquery.key, "skipping unexpanded subquery");
                Ok(None)
            }
        }
    }

    fn group(&self, group: &Group) -> Result<Option<BoolBody>, SchemaError> {
        let Some(operator) = group.operator else {
            return match group.children.as_slice() {
                [Instruction::Filter(filter)] => self.filter(filter),
                _ => Ok(None),
            };
        };

        let mut clauses = Vec::with_capacity(group.children.len());
        for child in &group.children {
            if let Some(body) = self.node(child)? {
                clauses.push(json!({ "bool": body }));
            }
        }

        Ok(verb_body(operator.verb(), clauses))
    }

    fn filter(&self, filter: &Filter) -> Result<Option<BoolBody>, SchemaError> {
        let definition = self.schema.lookup(&filter.id)?;
        filter_handlers::build_clause(filter, definition, self.schema.version())
    }
}

/// Sets `minimum_should_match: 1` on every `bool` body holding a `should`.
pub fn apply_minimum_should_match(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(body)) = map.get_mut("bool") {
                if body.contains_key("should") {
                    body.insert("minimum_should_match".to_string(), json!(1));
                }
            }
            for child in map.values_mut() {
                apply_minimum_should_match(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_minimum_should_match),
        _ => {}
    }
}
