//! Subquery expansion.
//!
//! Replaces every [`SubqueryRef`](super::SubqueryRef) with the referenced
//! query's instruction tree, recursively, so the translator only ever sees
//! filters and groups.

use crate::error::StatementError;

use super::model::{Group, Instruction, Query, Statement};

/// Returns a copy of `statement` with every subquery inlined.
///
/// A reference back into its own expansion chain fails with
/// [`StatementError::CyclicReference`]; a reference to a missing key fails
/// with [`StatementError::UnknownSubquery`].
pub fn denormalize(statement: &Statement) -> Result<Statement, StatementError> {
    let queries = statement
        .queries
        .iter()
        .map(|query| {
            let mut chain = vec![query.key.clone()];
            Ok(Query {
                key: query.key.clone(),
                title: query.title.clone(),
                instructions: expand_group(&query.instructions, statement, &mut chain)?,
            })
        })
        .collect::<Result<Vec<_>, StatementError>>()?;

    Ok(Statement::new(queries))
}

/// Expands a single query of `statement`, returning `None` if `key` is absent.
///
/// Only the subqueries reachable from `key` are visited.
pub fn expand_query(statement: &Statement, key: &str) -> Result<Option<Group>, StatementError> {
    let Some(query) = statement.get(key) else {
        return Ok(None);
    };

    let mut chain = vec![query.key.clone()];
    expand_group(&query.instructions, statement, &mut chain).map(Some)
}

fn expand_group(
    group: &Group,
    statement: &Statement,
    chain: &mut Vec<String>,
) -> Result<Group, StatementError> {
    let children = group
        .children
        .iter()
        .map(|child| expand(child, statement, chain))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Group {
        operator: group.operator,
        children,
    })
}

fn expand(
    node: &Instruction,
    statement: &Statement,
    chain: &mut Vec<String>,
) -> Result<Instruction, StatementError> {
    match node {
        Instruction::Filter(filter) => Ok(Instruction::Filter(filter.clone())),
        Instruction::Group(group) => Ok(Instruction::Group(expand_group(group, statement, chain)?)),
        Instruction::Subquery(subquery) => {
            if chain.contains(&subquery.key) {
                let mut cycle = chain.clone();
                cycle.push(subquery.key.clone());
                return Err(StatementError::CyclicReference { chain: cycle });
            }

            let target = statement
                .get(&subquery.key)
                .ok_or_else(|| StatementError::UnknownSubquery {
                    key: subquery.key.clone(),
                })?;

            chain.push(subquery.key.clone());
            let expanded = expand_group(&target.instructions, statement, chain);
            chain.pop();

            Ok(Instruction::Group(expanded?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::model::{Filter, FilterType, Operator, SubqueryRef};

    fn gene(value: &str) -> Instruction {
        Instruction::Filter(Filter::new(FilterType::Generic, "gene").with_value(value))
    }

    fn subquery(key: &str) -> Instruction {
        Instruction::Subquery(SubqueryRef {
            key: key.to_string(),
        })
    }

    #[test]
    fn test_inlines_subquery() {
        let statement = Statement::new(vec![
            Query::new(
                "q1",
                Group::single(Filter::new(FilterType::Generic, "gene").with_value("BRCA1")),
            ),
            Query::new(
                "q2",
                Group::new(Operator::And, vec![subquery("q1"), gene("TP53")]),
            ),
        ]);

        let expanded = denormalize(&statement).unwrap();
        assert!(!expanded.contains_subquery());

        let q2 = expanded.get("q2").unwrap();
        assert_eq!(
            q2.instructions.children[0],
            Instruction::Group(Group {
                operator: None,
                children: vec![gene("BRCA1")],
            })
        );
        // input is not modified
        assert!(statement.contains_subquery());
    }

    #[test]
    fn test_transitive_expansion() {
        let statement = Statement::new(vec![
            Query::new("q1", Group::new(Operator::Or, vec![gene("BRCA1"), gene("BRCA2")])),
            Query::new("q2", Group::new(Operator::And, vec![subquery("q1"), gene("TP53")])),
            Query::new("q3", Group::new(Operator::AndNot, vec![gene("ATM"), subquery("q2")])),
        ]);

        let expanded = denormalize(&statement).unwrap();
        assert!(!expanded.contains_subquery());
        assert!(expanded.get("q3").unwrap().root().has_active_filter("gene"));
    }

    #[test]
    fn test_direct_cycle() {
        let statement = Statement::new(vec![Query::new(
            "q1",
            Group::new(Operator::And, vec![gene("BRCA1"), subquery("q1")]),
        )]);

        let err = denormalize(&statement).unwrap_err();
        assert_eq!(
            err,
            StatementError::CyclicReference {
                chain: vec!["q1".to_string(), "q1".to_string()],
            }
        );
    }

    #[test]
    fn test_transitive_cycle() {
        let statement = Statement::new(vec![
            Query::new("q1", Group::new(Operator::And, vec![subquery("q2")])),
            Query::new("q2", Group::new(Operator::And, vec![subquery("q3")])),
            Query::new("q3", Group::new(Operator::And, vec![subquery("q1")])),
        ]);

        let err = denormalize(&statement).unwrap_err();
        assert_eq!(
            err,
            StatementError::CyclicReference {
                chain: vec![
                    "q1".to_string(),
                    "q2".to_string(),
                    "q3".to_string(),
                    "q1".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_shared_reference_is_not_a_cycle() {
        let statement = Statement::new(vec![
            Query::new(
                "q1",
                Group::single(Filter::new(FilterType::Generic, "gene").with_value("BRCA1")),
            ),
            Query::new("q2", Group::new(Operator::Or, vec![subquery("q1"), subquery("q1")])),
        ]);

        assert!(denormalize(&statement).is_ok());
    }

    #[test]
    fn test_unknown_subquery() {
        let statement = Statement::new(vec![Query::new(
            "q1",
            Group::new(Operator::And, vec![subquery("missing")]),
        )]);

        assert_eq!(
            denormalize(&statement).unwrap_err(),
            StatementError::UnknownSubquery {
                key: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_expand_query_ignores_unrelated_cycles() {
        let statement = Statement::new(vec![
            Query::new("q1", Group::new(Operator::And, vec![subquery("q1")])),
            Query::new("q2", Group::new(Operator::Or, vec![gene("BRCA1")])),
        ]);

        let root = expand_query(&statement, "q2").unwrap().unwrap();
        assert_eq!(root.children, vec![gene("BRCA1")]);
        assert!(expand_query(&statement, "q1").is_err());
        assert_eq!(expand_query(&statement, "q9").unwrap(), None);
    }

    #[test]
    fn test_idempotent_without_subqueries() {
        let statement = Statement::new(vec![Query::new(
            "q1",
            Group::new(Operator::Or, vec![gene("BRCA1"), gene("TP53")]),
        )]);

        let once = denormalize(&statement).unwrap();
        let twice = denormalize(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, statement);
    }
}
