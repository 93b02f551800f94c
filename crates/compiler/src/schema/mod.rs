//! Schema resources and the lookup structures built from them.
//!
//! - [`model`] - serde model of the versioned schema resource
//! - [`index`] - immutable, per-version lookup index
//! - [`loader`] - parsing and validation
//! - [`registry`] - hot-swappable store of schema versions

pub mod index;
pub mod loader;
pub mod model;
pub mod registry;

pub use index::{NestedScope, ResolvedFilter, ResolvedSortGroup, SchemaIndex};
pub use loader::SchemaLoader;
pub use model::{
    Category, FacetDefinition, FacetRef, FieldRef, FilterDefinition, Schema, SchemaFields,
    SortGroup, Subtype, SubtypeConfig,
};
pub use registry::SchemaRegistry;

/// Strips a trailing `_min` or `_max` from a filter id.
pub fn normalize_filter_id(id: &str) -> &str {
    id.strip_suffix("_min")
        .or_else(|| id.strip_suffix("_max"))
        .unwrap_or(id)
}
