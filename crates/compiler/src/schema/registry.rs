//! Versioned schema registry.
//!
//! Holds every loaded schema version behind `Arc` snapshots. Swapping a
//! version replaces the `Arc` under a write lock; compilations already
//! holding the previous snapshot keep using it untouched.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{LoaderError, SchemaError};

use super::index::SchemaIndex;
use super::loader::SchemaLoader;

/// Registry of schema versions.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<SchemaIndex>>>,
    default_version: RwLock<Option<String>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered versions.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns true if no version is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Registers a schema, replacing any schema with the same version.
    ///
    /// The first registered version becomes the default.
    pub fn register(&self, index: SchemaIndex) -> Arc<SchemaIndex> {
        let version = index.version().to_string();
        let index = Arc::new(index);

        let replaced = self
            .schemas
            .write()
            .insert(version.clone(), Arc::clone(&index))
            .is_some();

        let mut default_version = self.default_version.write();
        if default_version.is_none() {
            *default_version = Some(version.clone());
        }

        tracing::info!(version = %version, replaced, "Registered schema");
        index
    }

    /// Removes a version. Removing the default clears it.
    pub fn unregister(&self, version: &str) -> Result<Arc<SchemaIndex>, SchemaError> {
        let removed = self
            .schemas
            .write()
            .remove(version)
            .ok_or_else(|| SchemaError::UnknownVersion {
                version: version.to_string(),
            })?;

        let mut default_version = self.default_version.write();
        if default_version.as_deref() == Some(version) {
            *default_version = None;
        }

        Ok(removed)
    }

    /// Returns a snapshot of the given version.
    pub fn get(&self, version: &str) -> Result<Arc<SchemaIndex>, SchemaError> {
        self.schemas
            .read()
            .get(version)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownVersion {
                version: version.to_string(),
            })
    }

    /// Returns a snapshot of the default version.
    pub fn default_index(&self) -> Result<Arc<SchemaIndex>, SchemaError> {
        let version = self
            .default_version
            .read()
            .clone()
            .ok_or(SchemaError::NoSchema)?;
        self.get(&version)
    }

    /// Makes `version` the default.
    pub fn set_default(&self, version: &str) -> Result<(), SchemaError> {
        if !self.schemas.read().contains_key(version) {
            return Err(SchemaError::UnknownVersion {
                version: version.to_string(),
            });
        }
        *self.default_version.write() = Some(version.to_string());
        Ok(())
    }

    /// Returns every registered version, sorted.
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.schemas.read().keys().cloned().collect();
        versions.sort();
        versions
    }

    /// Loads and registers every `*.json` file in `dir`.
    ///
    /// Files are loaded in name order. Nothing is registered unless every file
    /// loads. Returns the number registered.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, LoaderError> {
        let io_error = |source| LoaderError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let loader = SchemaLoader::new();
        let indexes = paths
            .iter()
            .map(|path| loader.load_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        let count = indexes.len();
        for index in indexes {
            self.register(index);
        }
        Ok(count)
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("versions", &self.versions())
            .field("default_version", &*self.default_version.read())
            .finish()
    }
}
