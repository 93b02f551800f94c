//! Shared fixtures for compiler integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use vista_compiler::acl::{Acl, Role};
use vista_compiler::statement::{Filter, FilterType, Instruction};
use vista_compiler::{DialectKind, SchemaIndex, SchemaLoader, StatementCompiler};

/// Variant schema used across the integration tests.
pub const VARIANT_SCHEMA: &str = include_str!("../fixtures/variant_schema.json");

/// Identity every fixture request is scoped to.
pub const PATIENT: &str = "PA000001";

/// Loads the variant schema fixture.
pub fn variant_schema() -> Arc<SchemaIndex> {
    Arc::new(
        SchemaLoader::new()
            .load_str(VARIANT_SCHEMA)
            .expect("fixture schema is valid"),
    )
}

/// Returns an Elasticsearch compiler over the fixture schema.
pub fn compiler() -> StatementCompiler {
    StatementCompiler::new(variant_schema(), DialectKind::Elasticsearch)
}

/// Returns a practitioner-scoped access tuple.
pub fn user_acl() -> Acl {
    Acl::new(Role::User, "PR000001", "OR000001")
}

/// Returns an organization-scoped access tuple.
pub fn group_acl() -> Acl {
    Acl::new(Role::Group, "PR000001", "OR000001")
}

/// Builds a generic filter instruction.
pub fn generic(id: &str, values: &[&str]) -> Instruction {
    let filter = values
        .iter()
        .fold(Filter::new(FilterType::Generic, id), |f, v| f.with_value(*v));
    Instruction::Filter(filter)
}

/// Legacy wire form of a filter instruction.
pub fn wire_filter(id: &str, values: Value) -> Value {
    json!({ "type": "filter", "data": { "id": id, "values": values } })
}

/// Legacy wire form of an operator instruction.
pub fn wire_operator(op: &str) -> Value {
    json!({ "type": "operator", "data": { "type": op } })
}

/// Legacy wire form of a subquery instruction.
pub fn wire_subquery(key: &str) -> Value {
    json!({ "type": "subquery", "data": { "query": key } })
}

/// Returns the clauses of `body.query.bool.filter`.
pub fn filter_clauses(body: &Value) -> &Vec<Value> {
    body.pointer("/query/bool/filter")
        .and_then(Value::as_array)
        .expect("document has a bool filter")
}

/// Asserts that no identity placeholder survived assembly.
pub fn assert_no_placeholder(body: &Value) {
    let text = body.to_string();
    assert!(
        !text.contains("%%identity%%"),
        "placeholder left in document: {}",
        text
    );
}
