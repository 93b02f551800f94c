//! Vista statement compiler
//!
//! Turns a client's tree-shaped filter statement into Elasticsearch query
//! and aggregation documents, scoped to the requester's access rights and to
//! a single identity (e.g. a patient), against a versioned field schema.
//!
//! # Pipeline
//!
//! 1. A statement arrives in its nested-array wire form and is adapted into
//!    an explicit instruction tree ([`statement::parse_statement`]).
//! 2. Subquery references are expanded ([`statement::expand_query`]).
//! 3. The selected dialect translates the tree against a [`SchemaIndex`].
//! 4. The assembler adds ACL and identity scoping, pagination and sort, or
//!    builds self-excluding facet aggregations, then substitutes the identity
//!    placeholder.
//!
//! # Architecture
//!
//! - [`error`] - error types for all operations
//! - [`schema`] - schema model, index, loader and registry
//! - [`statement`] - instruction tree, wire adapter and subquery expansion
//! - [`dialect`] - query dialects; [`dialect::elasticsearch`] is the only one implemented
//! - [`acl`] - access scoping clauses
//! - [`sort`] - sort group postprocess strategies
//! - [`pagination`] - page bounds
//! - [`placeholder`] - identity placeholder substitution
//! - [`compiler`] - the [`StatementCompiler`] facade
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use vista_compiler::acl::{Acl, Role};
//! use vista_compiler::statement::{Filter, FilterType, Group, Query, Statement};
//! use vista_compiler::{CompileRequest, DialectKind, SchemaLoader, StatementCompiler};
//!
//! let schema = SchemaLoader::new()
//!     .load_value(json!({
//!         "version": "1",
//!         "path": "variants",
//!         "defaultGroup": "impact",
//!         "groups": { "impact": { "sort": [{ "impact_score": "desc" }] } },
//!         "fields": {
//!             "patient": "donors.patient_id",
//!             "practitioner": "donors.practitioner_id"
//!         },
//!         "categories": [{ "filters": [{ "id": "gene", "search": "donors.gene_symbol" }] }]
//!     }))
//!     .unwrap();
//! let compiler = StatementCompiler::new(Arc::new(schema), DialectKind::Elasticsearch);
//!
//! let statement = Statement::new(vec![Query::new(
//!     "q1",
//!     Group::single(Filter::new(FilterType::Generic, "gene").with_value("BRCA1")),
//! )]);
//! let acl = Acl::new(Role::User, "PR001", "OR001");
//! let request = CompileRequest::new("q1", &acl, "PA001");
//!
//! let search = compiler.search(&statement, &request).unwrap();
//! assert_eq!(search.index, "variants");
//! assert_eq!(search.body["size"], 25);
//! assert_eq!(
//!     search.body["query"]["bool"]["filter"][2],
//!     json!({ "term": { "donors.patient_id": "PA001" } })
//! );
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod acl;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod pagination;
pub mod placeholder;
pub mod schema;
pub mod sort;
pub mod statement;

pub use compiler::{CompileRequest, StatementCompiler};
pub use dialect::elasticsearch::{EsQuery, QueryKind, flatten_facet_results};
pub use dialect::{DialectKind, QueryDialect};
pub use error::{CompileError, CompileResult, LoaderError, SchemaError, StatementError};
pub use schema::{SchemaIndex, SchemaLoader, SchemaRegistry};
