//! Final request documents.
//!
//! Combines a translated query with ACL scoping, the mandatory identity
//! filter, pagination and sort, then substitutes the identity placeholder.

use serde::Serialize;
use serde_json::{Value, json};

use crate::acl::{Acl, ResourceKind, generate_acl_filters};
use crate::error::SchemaError;
use crate::pagination::Pagination;
use crate::placeholder::{IDENTITY_PLACEHOLDER, substitute_identity};
use crate::schema::SchemaIndex;
use crate::sort::SortContext;
use crate::statement::Group;

use super::aggregations::build_facet_body;

/// Kind of request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Paginated, sorted hits.
    Search,
    /// Hit count.
    Count,
    /// Facet aggregations.
    Facets,
}

impl QueryKind {
    /// Returns the Elasticsearch endpoint the document is sent to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryKind::Search | QueryKind::Facets => "_search",
            QueryKind::Count => "_count",
        }
    }
}

/// A complete Elasticsearch request document ready to be sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsQuery {
    /// The index (or alias) to query.
    pub index: String,
    /// The kind of document.
    pub kind: QueryKind,
    /// The request body.
    pub body: Value,
}

/// Assembles request documents for one requester.
pub struct QueryAssembler<'a> {
    schema: &'a SchemaIndex,
    acl: &'a Acl,
    identity: &'a str,
}

impl<'a> QueryAssembler<'a> {
    /// Creates an assembler.
    pub fn new(schema: &'a SchemaIndex, acl: &'a Acl, identity: &'a str) -> Self {
        Self {
            schema,
            acl,
            identity,
        }
    }

    /// Builds the scoped base query around a translation.
    ///
    /// The result still carries the identity placeholder.
    pub fn base_query(&self, translation: &Value) -> Value {
        let mut filters: Vec<Value> = translation
            .pointer("/query/bool/filter")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let fields = self.schema.fields();
        filters.extend(generate_acl_filters(
            self.acl,
            ResourceKind::Variant,
            Some(fields),
        ));

        if let Some(patient) = fields.patient.as_deref() {
            filters.push(json!({ "term": { patient: IDENTITY_PLACEHOLDER } }));
        }

        json!({ "bool": { "filter": filters } })
    }

    /// Builds a paginated, sorted search document.
    pub fn search(
        &self,
        translation: &Value,
        pagination: &Pagination,
        sort_group: Option<&str>,
    ) -> EsQuery {
        let from = pagination.from();
        let size = pagination.size();
        let body = json!({
            "from": from,
            "size": size,
            "query": self.base_query(translation),
            "sort": self.sort(sort_group, from, size),
        });
        self.finish(QueryKind::Search, body)
    }

    /// Builds a count document.
    pub fn count(&self, translation: &Value) -> EsQuery {
        let body = json!({ "query": self.base_query(translation) });
        self.finish(QueryKind::Count, body)
    }

    /// Builds a facet document for a denormalized root group.
    pub fn facets(&self, root: &Group) -> Result<EsQuery, SchemaError> {
        let body = build_facet_body(self.schema, self, root)?;
        Ok(self.finish(QueryKind::Facets, body))
    }

    fn sort(&self, group: Option<&str>, from: usize, size: usize) -> Value {
        let Some(group) = self.schema.sort_group(group) else {
            return json!([]);
        };

        let ctx = SortContext {
            sort: &group.sort,
            acl: self.acl,
            identity: self.identity,
            identity_field: self.schema.fields().patient.as_deref(),
            from,
            size,
        };
        group.strategy.apply(&ctx)
    }

    fn finish(&self, kind: QueryKind, body: Value) -> EsQuery {
        EsQuery {
            index: self.schema.path().to_string(),
            kind,
            body: substitute_identity(&body, self.identity),
        }
    }
}
