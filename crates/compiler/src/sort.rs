//! Sort group postprocessing.
//!
//! A schema sort group may name a postprocess strategy that rewrites its sort
//! criteria per request. Strategies form a closed set resolved by name through
//! [`SortStrategy::from_name`]; schemas naming anything else are rejected at
//! load time.

use serde_json::{Map, Value, json};

use crate::acl::Acl;

/// Name-to-strategy dispatch table.
const STRATEGIES: &[(&str, SortStrategy)] = &[
    ("none", SortStrategy::None),
    ("nested_identity", SortStrategy::NestedIdentity),
    ("score_first", SortStrategy::ScoreFirst),
];

/// Per-request inputs available to a sort strategy.
#[derive(Debug, Clone)]
pub struct SortContext<'a> {
    /// The sort criteria declared by the resolved group.
    pub sort: &'a Value,
    /// Access tuple of the requester.
    pub acl: &'a Acl,
    /// Identity the request is scoped to (e.g. the patient id).
    pub identity: &'a str,
    /// Schema field holding the identity, if declared.
    pub identity_field: Option<&'a str>,
    /// Offset of the requested page.
    pub from: usize,
    /// Size of the requested page.
    pub size: usize,
}

/// A named sort postprocess strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortStrategy {
    /// Leaves the sort criteria untouched.
    #[default]
    None,
    /// Scopes nested sort criteria to the identity's own sub-document.
    NestedIdentity,
    /// Ranks by relevance before the declared criteria.
    ScoreFirst,
}

impl SortStrategy {
    /// Resolves a strategy by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        STRATEGIES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, strategy)| *strategy)
    }

    /// Returns the schema name of this strategy.
    pub fn name(&self) -> &'static str {
        STRATEGIES
            .iter()
            .find(|(_, strategy)| strategy == self)
            .map(|(name, _)| *name)
            .unwrap_or("none")
    }

    /// Returns every known strategy name.
    pub fn known_names() -> Vec<&'static str> {
        STRATEGIES.iter().map(|(name, _)| *name).collect()
    }

    /// Applies the strategy, producing fresh sort criteria.
    pub fn apply(&self, ctx: &SortContext<'_>) -> Value {
        let criteria = match ctx.sort {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        };

        let criteria = match self {
            SortStrategy::None => criteria,
            SortStrategy::NestedIdentity => scope_nested_criteria(criteria, ctx),
            SortStrategy::ScoreFirst => prepend_score(criteria),
        };

        Value::Array(criteria)
    }
}

/// Adds an identity filter to every nested criterion whose path owns the identity field.
fn scope_nested_criteria(criteria: Vec<Value>, ctx: &SortContext<'_>) -> Vec<Value> {
    let Some(identity_field) = ctx.identity_field else {
        return criteria;
    };

    criteria
        .into_iter()
        .map(|mut criterion| {
            if let Some(fields) = criterion.as_object_mut() {
                for options in fields.values_mut() {
                    scope_nested_options(options, identity_field, ctx.identity);
                }
            }
            criterion
        })
        .collect()
}

fn scope_nested_options(options: &mut Value, identity_field: &str, identity: &str) {
    let Some(nested) = options.get_mut("nested").and_then(Value::as_object_mut) else {
        return;
    };
    let owns_identity = nested
        .get("path")
        .and_then(Value::as_str)
        .is_some_and(|path| identity_field.starts_with(&format!("{path}.")));

    if owns_identity {
        nested.insert(
            "filter".to_string(),
            json!({ "term": { identity_field: identity } }),
        );
    }
}

fn prepend_score(mut criteria: Vec<Value>) -> Vec<Value> {
    let has_score = criteria
        .iter()
        .any(|c| c.as_object().is_some_and(|m| m.contains_key("_score")) || c == "_score");

    if !has_score {
        let mut score = Map::new();
        score.insert("_score".to_string(), json!({ "order": "desc" }));
        criteria.insert(0, Value::Object(score));
    }

    criteria
}
