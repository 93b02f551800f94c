//! Elasticsearch query dialect.
//!
//! - [`translator`] - instruction tree to Query DSL
//! - [`filter_handlers`] - per filter type clause builders
//! - [`assembler`] - search and count documents with scoping, paging and sort
//! - [`aggregations`] - facet documents and response flattening

pub mod aggregations;
pub mod assembler;
pub mod filter_handlers;
pub mod translator;

use serde_json::Value;

use crate::error::CompileResult;
use crate::schema::SchemaIndex;
use crate::statement::Group;

use super::QueryDialect;

pub use aggregations::flatten_facet_results;
pub use assembler::{EsQuery, QueryAssembler, QueryKind};
pub use translator::{Translator, empty_translation};

/// The Elasticsearch dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticsearchDialect;

impl QueryDialect for ElasticsearchDialect {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    fn empty_translation(&self) -> CompileResult<Value> {
        Ok(empty_translation())
    }

    fn translate(&self, root: &Group, schema: &SchemaIndex) -> CompileResult<Value> {
        Ok(Translator::new(schema).translate(root)?)
    }
}
