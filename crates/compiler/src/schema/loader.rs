//! Schema loader.
//!
//! Loads schema resources from strings, JSON values, or files on disk and
//! turns them into a validated [`SchemaIndex`].

use std::path::Path;

use serde_json::Value;

use crate::error::LoaderError;

use super::index::SchemaIndex;
use super::model::Schema;

/// Loader for schema resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaLoader;

impl SchemaLoader {
    /// Creates a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Loads a schema from a JSON string.
    pub fn load_str(&self, content: &str) -> Result<SchemaIndex, LoaderError> {
        let schema: Schema = serde_json::from_str(content)?;
        SchemaIndex::build(schema)
    }

    /// Loads a schema from an already-parsed JSON value.
    pub fn load_value(&self, value: Value) -> Result<SchemaIndex, LoaderError> {
        let schema: Schema = serde_json::from_value(value)?;
        SchemaIndex::build(schema)
    }

    /// Loads a schema from a file.
    pub fn load_file(&self, path: &Path) -> Result<SchemaIndex, LoaderError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let index = self.load_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            version = %index.version(),
            filters = index.len(),
            "Loaded schema"
        );

        Ok(index)
    }
}
