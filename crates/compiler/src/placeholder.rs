//! Identity placeholder substitution.
//!
//! Schema-driven fragments (nested scoping filters, identity filters) are
//! built with [`IDENTITY_PLACEHOLDER`] in place of the identity value. The
//! assembler substitutes the real value as the very last step, so every
//! fragment of a document is scoped to the same identity.
//!
//! Every full occurrence of the token inside a string literal or object key
//! is replaced, including tokens embedded in longer strings. The document is
//! walked as a tree, so the replacement never needs JSON escaping.

use serde_json::{Map, Value};

/// Token standing in for the request identity.
pub const IDENTITY_PLACEHOLDER: &str = "%%identity%%";

/// Returns a copy of `document` with every occurrence of `token` replaced by `replacement`.
pub fn substitute(document: &Value, token: &str, replacement: &str) -> Value {
    match document {
        Value::String(s) => Value::String(s.replace(token, replacement)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute(item, token, replacement))
                .collect(),
        ),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(
                    key.replace(token, replacement),
                    substitute(value, token, replacement),
                );
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Substitutes the identity placeholder.
pub fn substitute_identity(document: &Value, identity: &str) -> Value {
    substitute(document, IDENTITY_PLACEHOLDER, identity)
}
