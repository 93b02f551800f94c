//! Adapter for the legacy nested-array statement format.
//!
//! Clients send statements as JSON arrays of queries whose `instructions`
//! are arrays mixing filter, operator and subquery objects with nested
//! arrays for sub-groups:
//!
//! ```json
//! [{ "key": "q1", "instructions": [
//!     { "type": "filter", "data": { "id": "gene", "operand": "all", "values": ["BRCA1"] } },
//!     { "type": "operator", "data": { "type": "and" } },
//!     [ { "type": "subquery", "data": { "query": "q0" } } ]
//! ] }]
//! ```
//!
//! Operator objects are sibling markers: the first one found in an array
//! becomes the operator of the whole group and any later ones are ignored.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::StatementError;

use super::model::{
    Comparator, Filter, FilterType, FilterValue, Group, Instruction, Operand, Operator, Query,
    Statement, SubqueryRef,
};

/// Parses a legacy statement.
///
/// Fails with [`StatementError::Malformed`] when the statement is not an
/// array, or its first query lacks instructions or has none; callers treat
/// that case as an empty translation rather than a hard error.
pub fn parse_statement(raw: &Value) -> Result<Statement, StatementError> {
    let items = raw.as_array().ok_or_else(|| malformed("statement is not an array"))?;
    let first = items
        .first()
        .ok_or_else(|| malformed("statement has no queries"))?;
    let first_instructions = first
        .get("instructions")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("first query has no instructions"))?;
    if first_instructions.is_empty() {
        return Err(malformed("first query has empty instructions"));
    }

    let mut keys = HashSet::with_capacity(items.len());
    let mut queries = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let path = format!("$[{i}]");
        let query = parse_query(item, &path)?;
        if !keys.insert(query.key.clone()) {
            return Err(invalid(
                format!("{path}.key"),
                format!("duplicate query key '{}'", query.key),
            ));
        }
        queries.push(query);
    }

    Ok(Statement::new(queries))
}

fn parse_query(raw: &Value, path: &str) -> Result<Query, StatementError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| invalid(path.to_string(), "query must be an object"))?;
    let key = obj
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{path}.key"), "query key is required"))?
        .to_string();
    let title = obj.get("title").and_then(Value::as_str).map(String::from);

    let instructions = match obj.get("instructions") {
        None | Some(Value::Null) => Group::default(),
        Some(Value::Array(items)) => parse_group(items, &format!("{path}.instructions"))?,
        Some(_) => {
            return Err(invalid(
                format!("{path}.instructions"),
                "instructions must be an array",
            ));
        }
    };

    Ok(Query {
        key,
        title,
        instructions,
    })
}

fn parse_group(items: &[Value], path: &str) -> Result<Group, StatementError> {
    let mut operator = None;
    let mut children = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");

        if let Value::Array(nested) = item {
            children.push(Instruction::Group(parse_group(nested, &item_path)?));
            continue;
        }

        let obj = item
            .as_object()
            .ok_or_else(|| invalid(item_path.clone(), "instruction must be an object or array"))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{item_path}.type"), "instruction type is required"))?;
        let data = obj.get("data").and_then(Value::as_object);

        match kind {
            "operator" => {
                let parsed = parse_operator(data, &item_path)?;
                if operator.is_none() {
                    operator = Some(parsed);
                }
            }
            "filter" => {
                let data = data.ok_or_else(|| {
                    invalid(format!("{item_path}.data"), "filter data is required")
                })?;
                children.push(Instruction::Filter(parse_filter(data, &item_path)?));
            }
            "subquery" => {
                children.push(Instruction::Subquery(parse_subquery(data, &item_path)?));
            }
            other => {
                return Err(invalid(
                    format!("{item_path}.type"),
                    format!("unknown instruction type '{other}'"),
                ));
            }
        }
    }

    Ok(Group { operator, children })
}

fn parse_operator(
    data: Option<&Map<String, Value>>,
    path: &str,
) -> Result<Operator, StatementError> {
    let raw = data
        .and_then(|d| d.get("type"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{path}.data.type"), "operator type is required"))?;

    Operator::from_wire(raw)
        .ok_or_else(|| invalid(format!("{path}.data.type"), format!("unknown operator '{raw}'")))
}

fn parse_subquery(
    data: Option<&Map<String, Value>>,
    path: &str,
) -> Result<SubqueryRef, StatementError> {
    let key = data
        .and_then(|d| d.get("query").or_else(|| d.get("key")))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{path}.data.query"), "subquery key is required"))?;

    Ok(SubqueryRef {
        key: key.to_string(),
    })
}

fn parse_filter(data: &Map<String, Value>, path: &str) -> Result<Filter, StatementError> {
    let id = data
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid(format!("{path}.data.id"), "filter id is required"))?;

    let filter_type = match data.get("type").and_then(Value::as_str) {
        None => FilterType::Generic,
        Some(raw) => FilterType::from_wire(raw).ok_or_else(|| {
            invalid(format!("{path}.data.type"), format!("unknown filter type '{raw}'"))
        })?,
    };

    let operand = match data.get("operand").and_then(Value::as_str) {
        None => Operand::All,
        Some(raw) => Operand::from_wire(raw).ok_or_else(|| {
            invalid(format!("{path}.data.operand"), format!("unknown operand '{raw}'"))
        })?,
    };

    let default_comparator = match data.get("comparator").and_then(Value::as_str) {
        None => None,
        Some(raw) => Some(parse_comparator(raw, &format!("{path}.data.comparator"))?),
    };

    let values = match data.get("values") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                parse_value(item, default_comparator, &format!("{path}.data.values[{i}]"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(invalid(
                format!("{path}.data.values"),
                "values must be an array",
            ));
        }
    };

    Ok(Filter {
        filter_type,
        id: id.to_string(),
        operand,
        values,
    })
}

fn parse_value(
    raw: &Value,
    default_comparator: Option<Comparator>,
    path: &str,
) -> Result<FilterValue, StatementError> {
    if let Some(obj) = raw.as_object() {
        let comparator = obj
            .get("comparator")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{path}.comparator"), "comparator is required"))?;
        let comparator = parse_comparator(comparator, &format!("{path}.comparator"))?;
        let value = obj
            .get("value")
            .cloned()
            .ok_or_else(|| invalid(format!("{path}.value"), "comparison value is required"))?;

        return Ok(FilterValue::Comparison { comparator, value });
    }

    Ok(match default_comparator {
        Some(comparator) => FilterValue::Comparison {
            comparator,
            value: raw.clone(),
        },
        None => FilterValue::Literal(raw.clone()),
    })
}

fn parse_comparator(raw: &str, path: &str) -> Result<Comparator, StatementError> {
    Comparator::from_wire(raw)
        .ok_or_else(|| invalid(path.to_string(), format!("unknown comparator '{raw}'")))
}

fn malformed(reason: &str) -> StatementError {
    StatementError::Malformed {
        reason: reason.to_string(),
    }
}

fn invalid(path: String, message: impl Into<String>) -> StatementError {
    StatementError::InvalidInstruction {
        path,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_filter() {
        let statement = parse_statement(&json!([{
            "key": "q1",
            "instructions": [
                { "type": "filter", "data": { "id": "gene", "operand": "all", "values": ["BRCA1"] } }
            ]
        }]))
        .unwrap();

        let query = statement.get("q1").unwrap();
        assert_eq!(query.instructions.operator, None);
        assert_eq!(
            query.instructions.children,
            vec![Instruction::Filter(
                Filter::new(FilterType::Generic, "gene").with_value("BRCA1")
            )]
        );
    }

    #[test]
    fn test_first_operator_wins() {
        let statement = parse_statement(&json!([{
            "key": "q1",
            "instructions": [
                { "type": "filter", "data": { "id": "gene", "values": ["BRCA1"] } },
                { "type": "operator", "data": { "type": "or" } },
                { "type": "filter", "data": { "id": "gene", "values": ["TP53"] } },
                { "type": "operator", "data": { "type": "and" } },
                [ { "type": "subquery", "data": { "query": "q0" } } ]
            ]
        }]))
        .unwrap();

        let root = &statement.queries[0].instructions;
        assert_eq!(root.operator, Some(Operator::Or));
        assert_eq!(root.children.len(), 3);
        assert!(matches!(root.children[2], Instruction::Group(_)));
    }

    #[test]
    fn test_comparison_values() {
        let statement = parse_statement(&json!([{
            "key": "q1",
            "instructions": [{
                "type": "filter",
                "data": {
                    "id": "phylop",
                    "type": "numcomparison",
                    "values": [ { "comparator": ">=", "value": 0 }, { "comparator": "<", "value": 10 } ]
                }
            }]
        }]))
        .unwrap();

        let Instruction::Filter(filter) = &statement.queries[0].instructions.children[0] else {
            panic!("expected a filter");
        };
        assert_eq!(filter.filter_type, FilterType::NumericComparison);
        assert_eq!(filter.values[0].comparator(), Some(Comparator::Gte));
        assert_eq!(filter.values[1].value(), &json!(10));
    }

    #[test]
    fn test_filter_level_comparator() {
        let statement = parse_statement(&json!([{
            "key": "q1",
            "instructions": [{
                "type": "filter",
                "data": { "id": "af_max", "type": "numcomparison", "comparator": "<=", "values": [0.01] }
            }]
        }]))
        .unwrap();

        let Instruction::Filter(filter) = &statement.queries[0].instructions.children[0] else {
            panic!("expected a filter");
        };
        assert_eq!(filter.values[0].comparator(), Some(Comparator::Lte));
    }

    #[test]
    fn test_malformed_shapes() {
        for raw in [
            json!({ "key": "q1" }),
            json!([]),
            json!([{ "key": "q1" }]),
            json!([{ "key": "q1", "instructions": [] }]),
        ] {
            assert!(matches!(
                parse_statement(&raw),
                Err(StatementError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_instruction_path() {
        let err = parse_statement(&json!([{
            "key": "q1",
            "instructions": [
                { "type": "filter", "data": { "id": "gene", "values": ["BRCA1"] } },
                { "type": "operator", "data": { "type": "xor" } }
            ]
        }]))
        .unwrap_err();

        assert_eq!(
            err,
            StatementError::InvalidInstruction {
                path: "$[0].instructions[1].data.type".to_string(),
                message: "unknown operator 'xor'".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_keys() {
        let err = parse_statement(&json!([
            { "key": "q1", "instructions": [ { "type": "filter", "data": { "id": "gene" } } ] },
            { "key": "q1", "instructions": [] }
        ]))
        .unwrap_err();
        assert!(matches!(err, StatementError::InvalidInstruction { .. }));
    }
}
