//! Immutable schema index.
//!
//! Built once per schema load and shared by `Arc` across requests. Lookups
//! are O(1) on the normalized filter id and never mutate the index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{LoaderError, SchemaError};
use crate::sort::SortStrategy;

use super::model::{FacetDefinition, FieldRef, Schema, SchemaFields};
use super::normalize_filter_id;

/// Nested scope of a filter's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedScope {
    /// Nested path, e.g. `donors`.
    pub path: String,
    /// Identity field inside the path, e.g. `patient_id`.
    pub field: Option<String>,
}

impl NestedScope {
    /// Returns the fully qualified identity field (`path.field`), if declared.
    pub fn scoped_field(&self) -> Option<String> {
        self.field
            .as_ref()
            .map(|field| format!("{}.{}", self.path, field))
    }
}

/// A schema filter with everything the compiler needs resolved up front.
#[derive(Debug, Clone)]
pub struct ResolvedFilter {
    /// Filter id as declared in the schema.
    pub id: String,
    /// Search field(s).
    pub search: FieldRef,
    /// Facet aggregations; empty when the filter has no facet.
    pub facets: Vec<FacetDefinition>,
    /// Nested scope, when the subtype is `nested`.
    pub nested: Option<NestedScope>,
    /// Id of the category declaring the filter.
    pub category: Option<String>,
}

impl ResolvedFilter {
    /// Returns the search field for a (possibly suffixed) filter id.
    pub fn search_field(&self, id: &str) -> Option<&str> {
        self.search.resolve(id)
    }

    /// Returns true if the filter backs a facet.
    pub fn has_facet(&self) -> bool {
        !self.facets.is_empty()
    }
}

/// A sort group with its strategy resolved.
#[derive(Debug, Clone)]
pub struct ResolvedSortGroup {
    /// Elasticsearch sort criteria.
    pub sort: Value,
    /// Postprocess strategy.
    pub strategy: SortStrategy,
}

/// Immutable lookup structure over one schema version.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    version: String,
    path: String,
    default_group: String,
    groups: HashMap<String, ResolvedSortGroup>,
    fields: SchemaFields,
    filters: HashMap<String, Arc<ResolvedFilter>>,
    order: Vec<String>,
}

impl SchemaIndex {
    /// Validates `schema` and builds its index.
    pub fn build(schema: Schema) -> Result<Self, LoaderError> {
        let invalid = |message: String| LoaderError::Invalid {
            version: Some(schema.version.clone()).filter(|v| !v.is_empty()),
            message,
        };

        if schema.version.trim().is_empty() {
            return Err(invalid("version must not be empty".to_string()));
        }
        if !schema.groups.contains_key(&schema.default_group) {
            return Err(invalid(format!(
                "defaultGroup '{}' is not declared in groups",
                schema.default_group
            )));
        }

        let mut groups = HashMap::with_capacity(schema.groups.len());
        for (name, group) in &schema.groups {
            let strategy = match group.postprocess.as_deref() {
                None => SortStrategy::None,
                Some(strategy_name) => SortStrategy::from_name(strategy_name).ok_or_else(|| {
                    invalid(format!(
                        "group '{}' names unknown postprocess '{}' (known: {})",
                        name,
                        strategy_name,
                        SortStrategy::known_names().join(", ")
                    ))
                })?,
            };
            groups.insert(
                name.clone(),
                ResolvedSortGroup {
                    sort: group.sort.clone(),
                    strategy,
                },
            );
        }

        let mut filters = HashMap::new();
        let mut order = Vec::new();
        let mut seen = HashSet::new();

        for category in &schema.categories {
            for def in &category.filters {
                if !seen.insert(def.id.clone()) {
                    return Err(invalid(format!("duplicate filter id '{}'", def.id)));
                }

                let nested = match &def.subtype {
                    Some(subtype) if subtype.kind == "nested" => {
                        let config = subtype
                            .config
                            .as_ref()
                            .filter(|c| !c.path.trim().is_empty())
                            .ok_or_else(|| {
                                invalid(format!(
                                    "filter '{}' is nested but declares no path",
                                    def.id
                                ))
                            })?;
                        Some(NestedScope {
                            path: config.path.clone(),
                            field: config.field.clone(),
                        })
                    }
                    _ => None,
                };

                let resolved = ResolvedFilter {
                    id: def.id.clone(),
                    search: def.search.clone(),
                    facets: def
                        .facet
                        .as_ref()
                        .map(|facet| facet.definitions(&def.id))
                        .unwrap_or_default(),
                    nested,
                    category: category.id.clone(),
                };

                order.push(def.id.clone());
                filters.insert(def.id.clone(), Arc::new(resolved));
            }
        }

        Ok(Self {
            version: schema.version,
            path: schema.path,
            default_group: schema.default_group,
            groups,
            fields: schema.fields,
            filters,
            order,
        })
    }

    /// Returns the schema version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the index path searched with this schema.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the identity and ACL fields.
    pub fn fields(&self) -> &SchemaFields {
        &self.fields
    }

    /// Returns the number of indexed filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the schema declares no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Looks up a filter, stripping a trailing `_min`/`_max` first.
    pub fn lookup(&self, id: &str) -> Result<&ResolvedFilter, SchemaError> {
        self.filters
            .get(id)
            .or_else(|| self.filters.get(normalize_filter_id(id)))
            .map(Arc::as_ref)
            .ok_or_else(|| SchemaError::UnknownFilter {
                id: id.to_string(),
                version: self.version.clone(),
            })
    }

    /// Returns the facet-capable filters in schema order.
    pub fn facet_filters(&self) -> impl Iterator<Item = &ResolvedFilter> {
        self.order
            .iter()
            .filter_map(|id| self.filters.get(id))
            .map(Arc::as_ref)
            .filter(|f| f.has_facet())
    }

    /// Resolves a sort group by name, falling back to the default group.
    pub fn sort_group(&self, name: Option<&str>) -> Option<&ResolvedSortGroup> {
        name.and_then(|n| self.groups.get(n))
            .or_else(|| self.groups.get(&self.default_group))
    }
}
