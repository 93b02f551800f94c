//! Composite handler: equality values or one merged range, never both.

use crate::statement::Filter;

use super::{BoolBody, range, term};

/// Builds a range clause if any value carries a comparator, otherwise
/// equality clauses.
pub fn build_clause(filter: &Filter, field: &str) -> Option<BoolBody> {
    if filter.values.iter().any(|value| value.comparator().is_some()) {
        range::build_clause(filter, field)
    } else {
        term::build_clause(filter, field)
    }
}
