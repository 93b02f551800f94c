//! Query dialects.
//!
//! A dialect turns a denormalized instruction tree into a query document for
//! one search backend. Dialects are selected by name through [`DialectKind`].

pub mod elasticsearch;
pub mod graphql;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{CompileError, CompileResult};
use crate::schema::SchemaIndex;
use crate::statement::Group;

use elasticsearch::ElasticsearchDialect;
use graphql::GraphQlDialect;

/// A query language the compiler can target.
pub trait QueryDialect: Send + Sync {
    /// Returns the dialect's name.
    fn name(&self) -> &'static str;

    /// Returns the translation of a statement that selects nothing.
    fn empty_translation(&self) -> CompileResult<Value>;

    /// Translates a denormalized root group.
    fn translate(&self, root: &Group, schema: &SchemaIndex) -> CompileResult<Value>;
}

/// Known dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialectKind {
    /// Elasticsearch Query DSL.
    #[default]
    Elasticsearch,
    /// GraphQL; not implemented.
    GraphQl,
}

impl DialectKind {
    /// Returns the dialect implementation.
    pub fn dialect(&self) -> &'static dyn QueryDialect {
        match self {
            DialectKind::Elasticsearch => &ElasticsearchDialect,
            DialectKind::GraphQl => &GraphQlDialect,
        }
    }

    /// Returns the dialect's name.
    pub fn name(&self) -> &'static str {
        self.dialect().name()
    }
}

impl FromStr for DialectKind {
    type Err = CompileError;

    /// Parses a dialect name; unknown names are reported as not implemented.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elasticsearch" | "es" => Ok(DialectKind::Elasticsearch),
            "graphql" | "gql" => Ok(DialectKind::GraphQl),
            _ => Err(CompileError::NotImplemented {
                dialect: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
