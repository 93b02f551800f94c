//! Error types for the statement compiler.
//!
//! Errors are grouped by the stage that raises them: schema loading and
//! lookup, statement parsing and expansion, and dialect selection. Every
//! error path returns without touching shared schema state.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all compiler operations.
#[derive(Error, Debug)]
pub enum CompileError {
    /// Schema lookup errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Statement parsing and expansion errors
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Schema loading errors
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// The requested dialect has no compiler.
    #[error("dialect not implemented: {dialect}")]
    NotImplemented { dialect: String },
}

/// Errors raised while resolving filters, groups, or versions against a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A filter id did not resolve, even after stripping `_min`/`_max`.
    #[error("unknown filter id '{id}' in schema {version}")]
    UnknownFilter { id: String, version: String },

    /// No schema is registered under the requested version.
    #[error("unknown schema version '{version}'")]
    UnknownVersion { version: String },

    /// The registry holds no schema at all.
    #[error("no schema registered")]
    NoSchema,
}

/// Errors raised while parsing or expanding a statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// A subquery points back into its own expansion chain.
    #[error("cyclic subquery reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// A subquery names a query key the statement does not contain.
    #[error("subquery references unknown query '{key}'")]
    UnknownSubquery { key: String },

    /// An instruction object could not be interpreted.
    #[error("invalid instruction at {path}: {message}")]
    InvalidInstruction { path: String, message: String },

    /// The statement fails the basic shape check.
    ///
    /// Compiling such a statement yields the dialect's empty translation.
    #[error("malformed statement: {reason}")]
    Malformed { reason: String },
}

/// Errors raised while loading a schema resource.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The schema file could not be read.
    #[error("failed to read schema from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema document is not valid JSON for the schema model.
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    /// The schema parsed but violates a structural rule.
    #[error(
        "invalid schema{}: {message}",
        version.as_deref().map(|v| format!(" {v}")).unwrap_or_default()
    )]
    Invalid {
        version: Option<String>,
        message: String,
    },
}

/// Result type for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;
