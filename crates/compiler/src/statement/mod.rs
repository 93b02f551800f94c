//! Statements: the client's tree-shaped filter descriptions.
//!
//! - [`model`] - explicit instruction tree
//! - [`legacy`] - adapter for the nested-array wire format
//! - [`denormalize`](mod@denormalize) - subquery expansion

pub mod denormalize;
pub mod legacy;
pub mod model;

pub use denormalize::{denormalize, expand_query};
pub use legacy::parse_statement;
pub use model::{
    BoolVerb, Comparator, Filter, FilterType, FilterValue, Group, Instruction, Operand, Operator,
    Query, Statement, SubqueryRef,
};
