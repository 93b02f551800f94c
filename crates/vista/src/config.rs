//! Command-line configuration.
//!
//! Global options fall back to environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VISTA_SCHEMA_DIR` | schemas | Directory of `*.json` schema resources |
//! | `VISTA_SCHEMA_VERSION` | (first loaded) | Schema version to compile against |
//! | `VISTA_DIALECT` | elasticsearch | Target query dialect |
//! | `VISTA_LOG_LEVEL` | warn | Log level |
//! | `VISTA_DEFAULT_PAGE_SIZE` | 25 | Page size when `--size` is not given |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vista_compiler::DialectKind;
use vista_compiler::pagination::MAX_PAGE_SIZE;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Top-level command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "vista")]
#[command(about = "Compile filter statements into Elasticsearch request documents")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: CliConfig,

    #[command(subcommand)]
    pub command: Command,
}

/// Global options.
#[derive(Debug, Clone, Args)]
pub struct CliConfig {
    /// Directory holding the schema resources.
    #[arg(long, env = "VISTA_SCHEMA_DIR", default_value = "schemas", global = true)]
    pub schema_dir: PathBuf,

    /// Schema version to compile against; defaults to the first one loaded.
    #[arg(long, env = "VISTA_SCHEMA_VERSION", global = true)]
    pub schema_version: Option<String>,

    /// Target query dialect (elasticsearch, graphql).
    #[arg(long, env = "VISTA_DIALECT", default_value = "elasticsearch", global = true)]
    pub dialect: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "VISTA_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Page size used when a request gives none.
    #[arg(long, env = "VISTA_DEFAULT_PAGE_SIZE", default_value = "25", global = true)]
    pub default_page_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            schema_version: None,
            dialect: "elasticsearch".to_string(),
            log_level: "warn".to_string(),
            default_page_size: 25,
        }
    }
}

impl CliConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.schema_dir.as_os_str().is_empty() {
            errors.push("Schema directory cannot be empty".to_string());
        }

        if self.schema_version.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push("Schema version cannot be blank".to_string());
        }

        if let Err(e) = self.dialect.parse::<DialectKind>() {
            errors.push(format!("Unsupported dialect: {}", e));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log level '{}' (expected one of: {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > MAX_PAGE_SIZE {
            errors.push(format!(
                "Default page size cannot exceed {}",
                MAX_PAGE_SIZE
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the bare translation of one query.
    Translate(StatementArgs),
    /// Print a paginated, sorted search document.
    Search(RequestArgs),
    /// Print a count document.
    Count(RequestArgs),
    /// Print a facet document.
    Facets(RequestArgs),
    /// Flatten the aggregations of a facet search response.
    Flatten {
        /// Elasticsearch response (or its `aggregations` object) as JSON.
        #[arg(long)]
        response: PathBuf,
    },
}

/// Statement selection.
#[derive(Debug, Clone, Args)]
pub struct StatementArgs {
    /// Statement file in the nested-array wire format.
    #[arg(long)]
    pub statement: PathBuf,

    /// Key of the query to compile.
    #[arg(long)]
    pub query: String,
}

/// Statement selection plus requester scoping.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    #[command(flatten)]
    pub statement: StatementArgs,

    /// Identity (patient id) the documents are scoped to.
    #[arg(long)]
    pub patient: String,

    /// Requester role (user, group, admin).
    #[arg(long, default_value = "user")]
    pub role: String,

    /// Requester practitioner id.
    #[arg(long, default_value = "")]
    pub practitioner: String,

    /// Requester organization id.
    #[arg(long, default_value = "")]
    pub organization: String,

    /// Page number, starting at 1.
    #[arg(long)]
    pub page: Option<usize>,

    /// Page size.
    #[arg(long)]
    pub size: Option<usize>,

    /// Sort group name.
    #[arg(long)]
    pub sort_group: Option<String>,
}
