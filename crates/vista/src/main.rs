//! Vista command-line front end.
//!
//! Compiles filter statements into Elasticsearch request documents and
//! prints them as pretty JSON.

mod commands;
mod config;

use clap::Parser;
use tracing::debug;

use config::Cli;

/// Initializes the logging subsystem.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vista={},vista_compiler={}", level, level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    debug!(command = ?cli.command, "Running command");
    let output = commands::run(&cli.config, &cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
