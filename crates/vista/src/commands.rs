//! Command execution.
//!
//! Every command loads the schema directory, compiles the requested document
//! and returns it as JSON for the caller to print.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::Value;
use tracing::{debug, info};
use vista_compiler::acl::{Acl, Role};
use vista_compiler::pagination::Pagination;
use vista_compiler::statement::{Statement, parse_statement};
use vista_compiler::{
    CompileRequest, DialectKind, EsQuery, SchemaIndex, SchemaRegistry, StatementCompiler,
    StatementError, flatten_facet_results,
};

use crate::config::{CliConfig, Command, RequestArgs};

/// Runs `command` and returns the document to print.
pub fn run(config: &CliConfig, command: &Command) -> anyhow::Result<Value> {
    match command {
        Command::Translate(args) => {
            let compiler = compiler(config)?;
            let raw = read_json(&args.statement)?;
            Ok(compiler.translate_value(&raw, &args.query)?)
        }
        Command::Search(args) => request(config, args, |compiler, statement, request| {
            compiler.search(statement, request)
        }),
        Command::Count(args) => request(config, args, |compiler, statement, request| {
            compiler.count(statement, request)
        }),
        Command::Facets(args) => request(config, args, |compiler, statement, request| {
            compiler.facets(statement, request)
        }),
        Command::Flatten { response } => {
            let raw = read_json(response)?;
            let aggregations = raw.get("aggregations").unwrap_or(&raw);
            Ok(Value::Object(flatten_facet_results(aggregations)))
        }
    }
}

fn request<F>(config: &CliConfig, args: &RequestArgs, build: F) -> anyhow::Result<Value>
where
    F: FnOnce(
        &StatementCompiler,
        &Statement,
        &CompileRequest<'_>,
    ) -> vista_compiler::CompileResult<EsQuery>,
{
    let compiler = compiler(config)?;
    let statement = read_statement(&args.statement.statement)?;

    let acl = Acl::new(
        Role::from(args.role.clone()),
        args.practitioner.as_str(),
        args.organization.as_str(),
    );
    let pagination = Pagination::new(
        args.page,
        Some(args.size.unwrap_or(config.default_page_size)),
    );
    let request = CompileRequest::new(&args.statement.query, &acl, &args.patient)
        .with_pagination(pagination)
        .with_sort_group(args.sort_group.as_deref());

    let query = build(&compiler, &statement, &request)?;
    info!(index = %query.index, kind = ?query.kind, "Compiled document");
    Ok(serde_json::to_value(&query)?)
}

/// Loads the schema directory and builds a compiler for the configured version.
pub fn compiler(config: &CliConfig) -> anyhow::Result<StatementCompiler> {
    let dialect: DialectKind = config.dialect.parse()?;
    let schema = load_schema(config)?;
    info!(version = %schema.version(), dialect = %dialect, "Using schema");
    Ok(StatementCompiler::new(schema, dialect))
}

fn load_schema(config: &CliConfig) -> anyhow::Result<Arc<SchemaIndex>> {
    let registry = SchemaRegistry::new();
    let loaded = registry.load_dir(&config.schema_dir).with_context(|| {
        format!(
            "failed to load schemas from {}",
            config.schema_dir.display()
        )
    })?;
    if loaded == 0 {
        bail!("no schema found in {}", config.schema_dir.display());
    }

    let schema = match &config.schema_version {
        Some(version) => registry.get(version)?,
        None => registry.default_index()?,
    };
    Ok(schema)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads a wire statement; a statement failing the shape check compiles as empty.
fn read_statement(path: &Path) -> anyhow::Result<Statement> {
    match parse_statement(&read_json(path)?) {
        Ok(statement) => Ok(statement),
        Err(StatementError::Malformed { reason }) => {
            debug!(%reason, "malformed statement, compiling as empty");
            Ok(Statement::default())
        }
        Err(err) => Err(err.into()),
    }
}
