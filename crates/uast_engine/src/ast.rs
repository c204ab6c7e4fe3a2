//! Syntax tree of the supported path-query language.

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Union,
}

/// A location path such as `/Module//Identifier[@token = 'x']`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// True if the path starts at the document node.
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// One step of a location path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// The implicit step `//` stands for.
    pub fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Matches nodes of the axis' principal type with this name.
    Name(String),
    /// `*`: any node of the axis' principal type.
    Wildcard,
    /// `node()`: any node at all.
    AnyNode,
}
