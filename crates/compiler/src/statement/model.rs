//! Statement and instruction tree types.
//!
//! Instructions form an explicit tree: a [`Group`] carries its boolean
//! operator and children, a [`Filter`] is a leaf, and a [`SubqueryRef`]
//! points at another query of the same statement until the denormalizer
//! inlines it.

use std::fmt;

use serde_json::Value;

/// Boolean verb of an Elasticsearch `bool` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolVerb {
    /// `must`
    Must,
    /// `should`
    Should,
    /// `must_not`
    MustNot,
}

impl BoolVerb {
    /// Returns the Elasticsearch key for the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolVerb::Must => "must",
            BoolVerb::Should => "should",
            BoolVerb::MustNot => "must_not",
        }
    }
}

/// Operator combining the children of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Every child must match.
    And,
    /// At least one child must match.
    Or,
    /// No child may match.
    AndNot,
}

impl Operator {
    /// Parses a wire operator name (`and`, `or`, `and not`, `and_not`).
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "and" => Some(Operator::And),
            "or" => Some(Operator::Or),
            "and not" | "and_not" | "andnot" => Some(Operator::AndNot),
            _ => None,
        }
    }

    /// Returns the verb the operator compiles to.
    pub fn verb(&self) -> BoolVerb {
        match self {
            Operator::And => BoolVerb::Must,
            Operator::Or => BoolVerb::Should,
            Operator::AndNot => BoolVerb::MustNot,
        }
    }
}

/// How the values of a filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operand {
    /// Every value must match.
    #[default]
    All,
    /// At least one value must match.
    One,
    /// No value may match.
    None,
}

impl Operand {
    /// Parses a wire operand name.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Operand::All),
            "one" => Some(Operand::One),
            "none" => Some(Operand::None),
            _ => None,
        }
    }

    /// Returns the verb the operand compiles to.
    pub fn verb(&self) -> BoolVerb {
        match self {
            Operand::All => BoolVerb::Must,
            Operand::One => BoolVerb::Should,
            Operand::None => BoolVerb::MustNot,
        }
    }
}

/// Range comparator of a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl Comparator {
    /// Parses a wire comparator (`>`, `>=`, `<`, `<=`).
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim() {
            ">" => Some(Comparator::Gt),
            ">=" => Some(Comparator::Gte),
            "<" => Some(Comparator::Lt),
            "<=" => Some(Comparator::Lte),
            _ => None,
        }
    }

    /// Returns the Elasticsearch `range` boundary key.
    pub fn boundary(&self) -> &'static str {
        match self {
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }
}

/// Kind of a filter, selecting how it compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    /// Equality on selected values.
    #[default]
    Generic,
    /// Equality on selected values of a dedicated field.
    Specific,
    /// Numeric comparisons merged into one range.
    NumericComparison,
    /// Boolean flags selected by facet id.
    GenericBoolean,
    /// Either equality values or numeric comparisons.
    Composite,
    /// Equality on values picked through autocompletion.
    Autocomplete,
}

impl FilterType {
    /// Parses a wire filter type.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "generic" => Some(FilterType::Generic),
            "specific" => Some(FilterType::Specific),
            "numcomparison" | "numeric-comparison" => Some(FilterType::NumericComparison),
            "genericbool" | "generic-boolean" => Some(FilterType::GenericBoolean),
            "composite" => Some(FilterType::Composite),
            "autocomplete" => Some(FilterType::Autocomplete),
            _ => None,
        }
    }

    /// Returns the canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Generic => "generic",
            FilterType::Specific => "specific",
            FilterType::NumericComparison => "numcomparison",
            FilterType::GenericBoolean => "genericbool",
            FilterType::Composite => "composite",
            FilterType::Autocomplete => "autocomplete",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selected value of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A literal matched by equality.
    Literal(Value),
    /// A numeric comparison.
    Comparison {
        /// Boundary the value is compared with.
        comparator: Comparator,
        /// Operand of the comparison.
        value: Value,
    },
}

impl FilterValue {
    /// Returns the comparator, if any.
    pub fn comparator(&self) -> Option<Comparator> {
        match self {
            FilterValue::Literal(_) => None,
            FilterValue::Comparison { comparator, .. } => Some(*comparator),
        }
    }

    /// Returns the raw value.
    pub fn value(&self) -> &Value {
        match self {
            FilterValue::Literal(value) => value,
            FilterValue::Comparison { value, .. } => value,
        }
    }
}

/// A filter leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// How the filter compiles.
    pub filter_type: FilterType,
    /// Schema filter id, possibly suffixed with `_min`/`_max`.
    pub id: String,
    /// How the values combine.
    pub operand: Operand,
    /// Selected values; none means the filter is inactive.
    pub values: Vec<FilterValue>,
}

impl Filter {
    /// Creates a filter without values.
    pub fn new(filter_type: FilterType, id: impl Into<String>) -> Self {
        Self {
            filter_type,
            id: id.into(),
            operand: Operand::All,
            values: Vec::new(),
        }
    }

    /// Sets the operand.
    pub fn with_operand(mut self, operand: Operand) -> Self {
        self.operand = operand;
        self
    }

    /// Adds a literal value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(FilterValue::Literal(value.into()));
        self
    }

    /// Adds a comparison value.
    pub fn with_comparison(mut self, comparator: Comparator, value: impl Into<Value>) -> Self {
        self.values.push(FilterValue::Comparison {
            comparator,
            value: value.into(),
        });
        self
    }

    /// Returns the id without its `_min`/`_max` suffix.
    pub fn normalized_id(&self) -> &str {
        crate::schema::normalize_filter_id(&self.id)
    }

    /// Returns true if the filter selects at least one value.
    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }
}

/// A group of instructions combined by an operator.
///
/// A group without operator only compiles when its single child is a filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    /// Combining operator, if the group declares one.
    pub operator: Option<Operator>,
    /// Child instructions, in order.
    pub children: Vec<Instruction>,
}

impl Group {
    /// Creates a group combining `children` with `operator`.
    pub fn new(operator: Operator, children: Vec<Instruction>) -> Self {
        Self {
            operator: Some(operator),
            children,
        }
    }

    /// Creates an operator-less group holding one filter.
    pub fn single(filter: Filter) -> Self {
        Self {
            operator: None,
            children: vec![Instruction::Filter(filter)],
        }
    }

    /// Returns true if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Reference to another query of the same statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubqueryRef {
    /// Key of the referenced query.
    pub key: String,
}

/// One node of the instruction tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// A filter leaf.
    Filter(Filter),
    /// A sub-group.
    Group(Group),
    /// A reference to another query.
    Subquery(SubqueryRef),
}

impl Instruction {
    /// Returns true if a subquery reference remains anywhere in the tree.
    pub fn contains_subquery(&self) -> bool {
        match self {
            Instruction::Filter(_) => false,
            Instruction::Subquery(_) => true,
            Instruction::Group(group) => group.children.iter().any(Instruction::contains_subquery),
        }
    }

    /// Returns true if a filter on `filter_id` selects values anywhere in the tree.
    ///
    /// Ids are compared after `_min`/`_max` normalization.
    pub fn has_active_filter(&self, filter_id: &str) -> bool {
        match self {
            Instruction::Filter(filter) => {
                filter.is_active() && filter.normalized_id() == filter_id
            }
            Instruction::Subquery(_) => false,
            Instruction::Group(group) => group
                .children
                .iter()
                .any(|child| child.has_active_filter(filter_id)),
        }
    }

    /// Returns a copy of the tree with the values of every filter on `filter_id` cleared.
    pub fn without_filter_values(&self, filter_id: &str) -> Instruction {
        match self {
            Instruction::Filter(filter) if filter.normalized_id() == filter_id => {
                Instruction::Filter(Filter {
                    values: Vec::new(),
                    ..filter.clone()
                })
            }
            Instruction::Group(group) => Instruction::Group(Group {
                operator: group.operator,
                children: group
                    .children
                    .iter()
                    .map(|child| child.without_filter_values(filter_id))
                    .collect(),
            }),
            other => other.clone(),
        }
    }
}

/// A named query of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Unique, stable key.
    pub key: String,
    /// Display title.
    pub title: Option<String>,
    /// Root group of the instruction tree.
    pub instructions: Group,
}

impl Query {
    /// Creates a query.
    pub fn new(key: impl Into<String>, instructions: Group) -> Self {
        Self {
            key: key.into(),
            title: None,
            instructions,
        }
    }

    /// Returns the root as an instruction node.
    pub fn root(&self) -> Instruction {
        Instruction::Group(self.instructions.clone())
    }
}

/// An ordered collection of queries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// Queries, in client order.
    pub queries: Vec<Query>,
}

impl Statement {
    /// Creates a statement.
    pub fn new(queries: Vec<Query>) -> Self {
        Self { queries }
    }

    /// Finds a query by key.
    pub fn get(&self, key: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.key == key)
    }

    /// Returns true if any query still references a subquery.
    pub fn contains_subquery(&self) -> bool {
        self.queries
            .iter()
            .any(|q| q.instructions.children.iter().any(Instruction::contains_subquery))
    }
}
