//! Statement compiler facade.
//!
//! Ties the pipeline together: the target query is expanded, translated by
//! the selected dialect, then assembled into a scoped request document.
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use vista_compiler::{DialectKind, SchemaLoader, StatementCompiler};
//!
//! let schema = SchemaLoader::new()
//!     .load_value(json!({
//!         "version": "1",
//!         "path": "variants",
//!         "defaultGroup": "impact",
//!         "groups": { "impact": { "sort": [] } },
//!         "categories": [{ "filters": [{ "id": "gene", "search": "donors.gene_symbol" }] }]
//!     }))
//!     .unwrap();
//! let compiler = StatementCompiler::new(Arc::new(schema), DialectKind::Elasticsearch);
//!
//! let statement = json!([{
//!     "key": "q1",
//!     "instructions": [{ "type": "filter", "data": { "id": "gene", "values": ["BRCA1"] } }]
//! }]);
//! let query = compiler.translate_value(&statement, "q1").unwrap();
//! assert_eq!(
//!     query,
//!     json!({ "query": { "bool": { "filter": [
//!         { "bool": { "must": [{ "term": { "donors.gene_symbol": "BRCA1" } }] } }
//!     ] } } })
//! );
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::acl::Acl;
use crate::dialect::DialectKind;
use crate::dialect::elasticsearch::{EsQuery, QueryAssembler};
use crate::error::{CompileError, CompileResult, StatementError};
use crate::pagination::Pagination;
use crate::schema::SchemaIndex;
use crate::statement::{Group, Statement, expand_query, parse_statement};

/// Per-request inputs of an assembled document.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    /// Key of the query to compile.
    pub query_key: &'a str,
    /// Access tuple of the requester.
    pub acl: &'a Acl,
    /// Identity the request is scoped to.
    pub identity: &'a str,
    /// Requested page.
    pub pagination: Pagination,
    /// Sort group name; the schema default applies when absent or unknown.
    pub sort_group: Option<&'a str>,
}

impl<'a> CompileRequest<'a> {
    /// Creates a request with default pagination and sort group.
    pub fn new(query_key: &'a str, acl: &'a Acl, identity: &'a str) -> Self {
        Self {
            query_key,
            acl,
            identity,
            pagination: Pagination::default(),
            sort_group: None,
        }
    }

    /// Sets the pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets the sort group.
    pub fn with_sort_group(mut self, sort_group: Option<&'a str>) -> Self {
        self.sort_group = sort_group;
        self
    }
}

/// Compiles statements against one schema version.
///
/// Holds an `Arc` snapshot of the schema, so a registry swap never affects a
/// compiler that is already in use.
#[derive(Debug, Clone)]
pub struct StatementCompiler {
    schema: Arc<SchemaIndex>,
    dialect: DialectKind,
}

impl StatementCompiler {
    /// Creates a compiler.
    pub fn new(schema: Arc<SchemaIndex>, dialect: DialectKind) -> Self {
        Self { schema, dialect }
    }

    /// Returns the schema the compiler uses.
    pub fn schema(&self) -> &Arc<SchemaIndex> {
        &self.schema
    }

    /// Returns the target dialect.
    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// Translates query `query_key` of `statement`.
    ///
    /// A key the statement does not contain yields the empty translation.
    #[instrument(
        name = "statement.compile",
        skip(self, statement),
        fields(version = %self.schema.version(), dialect = %self.dialect)
    )]
    pub fn translate(&self, statement: &Statement, query_key: &str) -> CompileResult<Value> {
        let dialect = self.dialect.dialect();
        let Some(root) = self.expand(statement, query_key)? else {
            debug!("query key not in statement, returning empty translation");
            return dialect.empty_translation();
        };

        dialect
            .translate(&root, &self.schema)
            .inspect_err(log_failure)
    }

    /// Translates a statement given in its nested-array wire form.
    ///
    /// A statement failing the shape check yields the empty translation.
    pub fn translate_value(&self, raw: &Value, query_key: &str) -> CompileResult<Value> {
        match parse_statement(raw) {
            Ok(statement) => self.translate(&statement, query_key),
            Err(StatementError::Malformed { reason }) => {
                debug!(%reason, "malformed statement, returning empty translation");
                self.dialect.dialect().empty_translation()
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Builds a paginated, sorted search document.
    #[instrument(
        name = "statement.compile",
        skip(self, statement, request),
        fields(query = %request.query_key, kind = "search")
    )]
    pub fn search(
        &self,
        statement: &Statement,
        request: &CompileRequest<'_>,
    ) -> CompileResult<EsQuery> {
        self.ensure_elasticsearch()?;
        let translation = self.translate(statement, request.query_key)?;
        let query = self.assembler(request).search(
            &translation,
            &request.pagination,
            request.sort_group,
        );
        debug!(
            from = request.pagination.from(),
            size = request.pagination.size(),
            "search document assembled"
        );
        Ok(query)
    }

    /// Builds a count document.
    #[instrument(
        name = "statement.compile",
        skip(self, statement, request),
        fields(query = %request.query_key, kind = "count")
    )]
    pub fn count(
        &self,
        statement: &Statement,
        request: &CompileRequest<'_>,
    ) -> CompileResult<EsQuery> {
        self.ensure_elasticsearch()?;
        let translation = self.translate(statement, request.query_key)?;
        Ok(self.assembler(request).count(&translation))
    }

    /// Builds a facet document with self-excluding facets.
    #[instrument(
        name = "statement.compile",
        skip(self, statement, request),
        fields(query = %request.query_key, kind = "facets")
    )]
    pub fn facets(
        &self,
        statement: &Statement,
        request: &CompileRequest<'_>,
    ) -> CompileResult<EsQuery> {
        self.ensure_elasticsearch()?;
        let root = self
            .expand(statement, request.query_key)?
            .unwrap_or_default();

        self.assembler(request)
            .facets(&root)
            .map_err(CompileError::from)
            .inspect_err(log_failure)
    }

    fn expand(&self, statement: &Statement, query_key: &str) -> CompileResult<Option<Group>> {
        expand_query(statement, query_key)
            .map_err(CompileError::from)
            .inspect_err(log_failure)
    }

    fn assembler<'a>(&'a self, request: &CompileRequest<'a>) -> QueryAssembler<'a> {
        QueryAssembler::new(&self.schema, request.acl, request.identity)
    }

    fn ensure_elasticsearch(&self) -> CompileResult<()> {
        match self.dialect {
            DialectKind::Elasticsearch => Ok(()),
            other => Err(CompileError::NotImplemented {
                dialect: other.name().to_string(),
            }),
        }
    }
}

fn log_failure(err: &CompileError) {
    error!(error = %err, "statement compilation failed");
}
