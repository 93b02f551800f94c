//! Access-control scoping.
//!
//! The [`Acl`] tuple is built per request by the authentication layer and is
//! read-only here. [`generate_acl_filters`] turns it into the extra filter
//! clauses that scope a search to what the requester may see.
//!
//! | role  | patient                         | variant                          | meta                   |
//! |-------|---------------------------------|----------------------------------|------------------------|
//! | user  | match `practitioners.id`        | term on schema practitioner field | match `practitionerId` |
//! | group | match `organization.id`         | term on schema organization field | match `practitionerId` |
//! | admin | -                               | -                                | match `practitionerId` |
//!
//! An unrecognized role adds no clause at all. That leaves patient and
//! variant searches unscoped; the behavior is kept as-is and logged until
//! the product owner decides between deny and allow.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::schema::SchemaFields;

/// Patient record field holding the treating practitioner.
pub const PATIENT_PRACTITIONER_FIELD: &str = "practitioners.id";

/// Patient record field holding the owning organization.
pub const PATIENT_ORGANIZATION_FIELD: &str = "organization.id";

/// Meta record field holding the author.
pub const META_PRACTITIONER_FIELD: &str = "practitionerId";

/// Role of the requester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Sees what their own practitioner id owns.
    User,
    /// Sees what their organization owns.
    Group,
    /// Sees everything except other practitioners' meta records.
    Admin,
    /// Any other role string, kept verbatim.
    Unrecognized(String),
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Group => "group",
            Role::Admin => "admin",
            Role::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "user" => Role::User,
            "group" => Role::Group,
            "admin" => Role::Admin,
            _ => Role::Unrecognized(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of document being searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Patient records.
    Patient,
    /// Variant records, scoped through schema-declared fields.
    Variant,
    /// Meta records such as saved statements.
    Meta,
}

/// Access tuple of a requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    /// Role of the requester.
    pub role: Role,
    /// Practitioner id of the requester.
    pub practitioner_id: String,
    /// Organization id of the requester.
    pub organization_id: String,
}

impl Acl {
    /// Creates an access tuple.
    pub fn new(
        role: Role,
        practitioner_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            role,
            practitioner_id: practitioner_id.into(),
            organization_id: organization_id.into(),
        }
    }
}

/// Builds the scoping clauses for `acl` on `resource`.
///
/// Variant scoping reads its field names from the schema; without them no
/// variant clause can be produced.
pub fn generate_acl_filters(
    acl: &Acl,
    resource: ResourceKind,
    fields: Option<&SchemaFields>,
) -> Vec<Value> {
    if let Role::Unrecognized(raw) = &acl.role {
        tracing::warn!(
            role = %raw,
            resource = ?resource,
            "unrecognized ACL role, no scoping clauses added"
        );
        return Vec::new();
    }

    match resource {
        ResourceKind::Patient => match acl.role {
            Role::User => {
                vec![json!({ "match": { PATIENT_PRACTITIONER_FIELD: acl.practitioner_id } })]
            }
            Role::Group => {
                vec![json!({ "match": { PATIENT_ORGANIZATION_FIELD: acl.organization_id } })]
            }
            _ => Vec::new(),
        },
        ResourceKind::Variant => {
            let field = match acl.role {
                Role::User => fields.and_then(|f| f.practitioner.as_deref()),
                Role::Group => fields.and_then(|f| f.organization.as_deref()),
                _ => None,
            };
            let value = match acl.role {
                Role::Group => &acl.organization_id,
                _ => &acl.practitioner_id,
            };

            field
                .map(|field| vec![json!({ "term": { field: value } })])
                .unwrap_or_default()
        }
        ResourceKind::Meta => {
            vec![json!({ "match": { META_PRACTITIONER_FIELD: acl.practitioner_id } })]
        }
    }
}
