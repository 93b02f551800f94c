//! GraphQL dialect.
//!
//! Selectable by name so configurations can reference it, but every
//! compilation fails with [`CompileError::NotImplemented`].

use serde_json::Value;

use crate::error::{CompileError, CompileResult};
use crate::schema::SchemaIndex;
use crate::statement::Group;

use super::QueryDialect;

/// The GraphQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphQlDialect;

impl GraphQlDialect {
    fn not_implemented(&self) -> CompileError {
        CompileError::NotImplemented {
            dialect: self.name().to_string(),
        }
    }
}

impl QueryDialect for GraphQlDialect {
    fn name(&self) -> &'static str {
        "graphql"
    }

    fn empty_translation(&self) -> CompileResult<Value> {
        Err(self.not_implemented())
    }

    fn translate(&self, _root: &Group, _schema: &SchemaIndex) -> CompileResult<Value> {
        Err(self.not_implemented())
    }
}
