//! Filter type handlers for Elasticsearch query building.
//!
//! Each module translates one family of filter types into the body of a
//! `bool` query. Handlers return `None` for a filter that selects nothing,
//! so the caller can drop it from its group.

pub mod boolean;
pub mod composite;
pub mod range;
pub mod term;

use serde_json::{Map, Value, json};

use crate::error::SchemaError;
use crate::placeholder::IDENTITY_PLACEHOLDER;
use crate::schema::{NestedScope, ResolvedFilter};
use crate::statement::{BoolVerb, Filter, FilterType};

/// Body of an Elasticsearch `bool` query (`{must|should|must_not: [...]}`).
pub type BoolBody = Map<String, Value>;

/// Builds the bool body for `filter`, wrapped in a nested query when the
/// schema places its field in a nested subtype.
pub fn build_clause(
    filter: &Filter,
    definition: &ResolvedFilter,
    version: &str,
) -> Result<Option<BoolBody>, SchemaError> {
    if !filter.is_active() {
        return Ok(None);
    }

    let field = || {
        definition
            .search_field(&filter.id)
            .ok_or_else(|| SchemaError::UnknownFilter {
                id: filter.id.clone(),
                version: version.to_string(),
            })
    };

    let body = match filter.filter_type {
        FilterType::Generic | FilterType::Specific | FilterType::Autocomplete => {
            term::build_clause(filter, field()?)
        }
        FilterType::NumericComparison => range::build_clause(filter, field()?),
        FilterType::GenericBoolean => boolean::build_clause(filter, &definition.search),
        FilterType::Composite => composite::build_clause(filter, field()?),
    };

    Ok(body.map(|body| match &definition.nested {
        Some(scope) => wrap_nested(body, scope),
        None => body,
    }))
}

/// Puts `clauses` under `verb`, or returns `None` when there are none.
pub fn verb_body(verb: BoolVerb, clauses: Vec<Value>) -> Option<BoolBody> {
    if clauses.is_empty() {
        return None;
    }
    let mut body = Map::new();
    body.insert(verb.as_str().to_string(), Value::Array(clauses));
    Some(body)
}

/// Wraps a bool body in a `nested` query on the scope's path.
///
/// When the scope declares an identity field, the nested query is further
/// restricted to entries owned by the identity placeholder.
pub fn wrap_nested(mut body: BoolBody, scope: &NestedScope) -> BoolBody {
    if let Some(field) = scope.scoped_field() {
        body.insert(
            "filter".to_string(),
            json!([{ "term": { field: IDENTITY_PLACEHOLDER } }]),
        );
    }

    let nested = json!({
        "nested": {
            "path": scope.path,
            "query": { "bool": body }
        }
    });

    let mut wrapped = Map::new();
    wrapped.insert("must".to_string(), json!([nested]));
    wrapped
}
