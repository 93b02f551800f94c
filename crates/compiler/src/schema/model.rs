//! Schema resource model.
//!
//! Mirrors the versioned JSON resource the service is configured with:
//!
//! ```json
//! {
//!   "version": "1",
//!   "path": "variants",
//!   "defaultGroup": "impact",
//!   "groups": { "impact": { "sort": [...], "postprocess": "nested_identity" } },
//!   "fields": { "patient": "donors.patient_id", "practitioner": "...", "organization": "..." },
//!   "categories": [ { "id": "genomic", "filters": [ { "id": "gene", "search": "...", "facet": [...] } ] } ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Bucket count requested for facets declared by a bare field name.
pub const DEFAULT_FACET_SIZE: u32 = 1000;

/// A complete schema resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Version identifier, used as the registry key.
    pub version: String,

    /// Index (or alias) the schema describes.
    pub path: String,

    /// Sort group used when a request names none or an unknown one.
    #[serde(rename = "defaultGroup")]
    pub default_group: String,

    /// Named sort groups.
    #[serde(default)]
    pub groups: BTreeMap<String, SortGroup>,

    /// Fields used for identity and ACL scoping.
    #[serde(default)]
    pub fields: SchemaFields,

    /// Filter categories, in display order.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// A named sort group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortGroup {
    /// Elasticsearch sort criteria.
    #[serde(default)]
    pub sort: Value,

    /// Name of the postprocess strategy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postprocess: Option<String>,
}

/// Fields used for identity and ACL scoping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFields {
    /// Field holding the patient (identity) id.
    #[serde(default)]
    pub patient: Option<String>,
    /// Field holding the practitioner id.
    #[serde(default)]
    pub practitioner: Option<String>,
    /// Field holding the organization id.
    #[serde(default)]
    pub organization: Option<String>,
}

/// A group of filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    #[serde(default)]
    pub id: Option<String>,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Filters declared by the category.
    #[serde(default)]
    pub filters: Vec<FilterDefinition>,
}

/// Schema definition of one filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Filter id referenced by statements.
    pub id: String,

    /// Search field(s) the filter applies to.
    pub search: FieldRef,

    /// Aggregations backing the filter's facet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<FacetRef>,

    /// Document subtype the fields live in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
}

/// A single search field or an id-keyed map of fields.
///
/// The keyed form disambiguates range pairs (`af_min` / `af_max`) and maps
/// facet ids to fields for boolean filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    /// One field for every id.
    Single(String),
    /// Fields keyed by (possibly suffixed) id.
    Keyed(BTreeMap<String, String>),
}

impl FieldRef {
    /// Returns the field name for `id`.
    ///
    /// Keyed maps are probed with the exact id, then the id without its
    /// `_min`/`_max` suffix, then fall back to their only entry.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        match self {
            FieldRef::Single(field) => Some(field),
            FieldRef::Keyed(fields) => fields
                .get(id)
                .or_else(|| fields.get(super::normalize_filter_id(id)))
                .or_else(|| {
                    if fields.len() == 1 {
                        fields.values().next()
                    } else {
                        None
                    }
                })
                .map(String::as_str),
        }
    }
}

/// Facet declaration of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetRef {
    /// A field name, aggregated with a default `terms` aggregation.
    Field(String),
    /// Explicit named aggregations.
    Aggregations(Vec<FacetDefinition>),
}

impl FacetRef {
    /// Expands the declaration into named aggregations.
    pub fn definitions(&self, filter_id: &str) -> Vec<FacetDefinition> {
        match self {
            FacetRef::Field(field) => vec![FacetDefinition::terms(filter_id, field)],
            FacetRef::Aggregations(defs) => defs.clone(),
        }
    }
}

/// A named aggregation, e.g. `{"id": "af_min", "min": {"field": "frequencies.af"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetDefinition {
    /// Aggregation name, also the key of the facet result.
    pub id: String,

    /// The aggregation body, keyed by aggregation kind.
    #[serde(flatten)]
    pub aggregation: Map<String, Value>,
}

impl FacetDefinition {
    /// Builds a default `terms` aggregation on `field`.
    pub fn terms(id: impl Into<String>, field: &str) -> Self {
        let mut aggregation = Map::new();
        aggregation.insert(
            "terms".to_string(),
            json!({ "field": field, "size": DEFAULT_FACET_SIZE }),
        );
        Self {
            id: id.into(),
            aggregation,
        }
    }

    /// Returns the aggregation body as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.aggregation.clone())
    }
}

/// Subtype of the document a filter's fields live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtype {
    /// Subtype kind; only `nested` changes query construction.
    #[serde(rename = "type")]
    pub kind: String,

    /// Nested configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SubtypeConfig>,
}

/// Nested-document configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeConfig {
    /// Nested path, e.g. `donors`.
    pub path: String,

    /// Field inside the path identifying the owning identity, e.g. `patient_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
