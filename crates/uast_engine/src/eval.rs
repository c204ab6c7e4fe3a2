//! Evaluation of a parsed query against a [`Document`].

use std::fmt;

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
use crate::document::{DOCUMENT, Document, NodeRef};
use crate::error::XPathError;
use crate::functions;

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    NodeSet(Vec<NodeRef>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::NodeSet(_) => "node-set",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }

    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            other => parse_number(&other.to_string_value(doc)),
        }
    }

    pub fn to_string_value(&self, doc: &Document) -> String {
        match self {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|n| doc.string_value(*n).to_string())
                .unwrap_or_default(),
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NodeSet(nodes) => write!(f, "node-set of {}", nodes.len()),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

pub fn parse_number(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Evaluation state for one expression.
pub struct Context<'d> {
    pub doc: &'d Document,
    pub node: NodeRef,
    /// 1-based.
    pub position: usize,
    pub size: usize,
}

impl<'d> Context<'d> {
    /// A context at the document node.
    pub fn root(doc: &'d Document) -> Self {
        Self {
            doc,
            node: NodeRef::Node(DOCUMENT),
            position: 1,
            size: 1,
        }
    }

    fn at(&self, node: NodeRef, position: usize, size: usize) -> Self {
        Self {
            doc: self.doc,
            node,
            position,
            size,
        }
    }
}

pub fn evaluate(expr: &Expression, ctx: &Context<'_>) -> Result<Value, XPathError> {
    match expr {
        Expression::Literal(s) => Ok(Value::String(s.clone())),
        Expression::Number(n) => Ok(Value::Number(*n)),
        Expression::LocationPath(path) => Ok(Value::NodeSet(evaluate_location_path(path, ctx)?)),
        Expression::FunctionCall { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, ctx)?);
            }
            functions::call(name, evaluated, ctx)
        }
        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::Or => Ok(Value::Boolean(
                evaluate(left, ctx)?.to_bool() || evaluate(right, ctx)?.to_bool(),
            )),
            BinaryOperator::And => Ok(Value::Boolean(
                evaluate(left, ctx)?.to_bool() && evaluate(right, ctx)?.to_bool(),
            )),
            BinaryOperator::Union => {
                let (Value::NodeSet(mut l), Value::NodeSet(r)) =
                    (evaluate(left, ctx)?, evaluate(right, ctx)?)
                else {
                    return Err(XPathError::type_error("union operands must be node-sets"));
                };
                l.extend(r);
                Ok(Value::NodeSet(document_order(l)))
            }
            cmp => {
                let l = evaluate(left, ctx)?;
                let r = evaluate(right, ctx)?;
                Ok(Value::Boolean(compare(*cmp, &l, &r, ctx.doc)))
            }
        },
    }
}

/// Sorts into document order and removes duplicates.
pub fn document_order(mut nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    nodes.sort_by_key(|n| n.order_key());
    nodes.dedup();
    nodes
}

fn evaluate_location_path(
    path: &LocationPath,
    ctx: &Context<'_>,
) -> Result<Vec<NodeRef>, XPathError> {
    let mut current = if path.is_absolute {
        vec![NodeRef::Node(DOCUMENT)]
    } else {
        vec![ctx.node]
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for node in &current {
            next.extend(evaluate_step(step, *node, ctx)?);
        }
        current = document_order(next);
    }
    Ok(current)
}

fn evaluate_step(step: &Step, node: NodeRef, ctx: &Context<'_>) -> Result<Vec<NodeRef>, XPathError> {
    let doc = ctx.doc;
    let mut selected: Vec<NodeRef> = axis_nodes(doc, step.axis, node)
        .into_iter()
        .filter(|candidate| matches_test(doc, step.axis, &step.node_test, *candidate))
        .collect();

    for predicate in &step.predicates {
        let size = selected.len();
        let mut kept = Vec::with_capacity(size);
        for (index, candidate) in selected.into_iter().enumerate() {
            let inner = ctx.at(candidate, index + 1, size);
            let keep = match evaluate(predicate, &inner)? {
                Value::Number(n) => n == (index + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(candidate);
            }
        }
        selected = kept;
    }
    Ok(selected)
}

/// Nodes on `axis` from `node`, in axis order.
fn axis_nodes(doc: &Document, axis: Axis, node: NodeRef) -> Vec<NodeRef> {
    match (axis, node) {
        (Axis::SelfAxis, _) => vec![node],
        (Axis::Child, NodeRef::Node(id)) => {
            doc.node(id).children.iter().map(|c| NodeRef::Node(*c)).collect()
        }
        (Axis::Descendant, NodeRef::Node(id)) => {
            doc.descendants(id).into_iter().map(NodeRef::Node).collect()
        }
        (Axis::DescendantOrSelf, NodeRef::Node(id)) => std::iter::once(id)
            .chain(doc.descendants(id))
            .map(NodeRef::Node)
            .collect(),
        (Axis::DescendantOrSelf, NodeRef::Attribute(..)) => vec![node],
        (Axis::Attribute, NodeRef::Node(id)) => (0..doc.node(id).attributes.len())
            .map(|index| NodeRef::Attribute(id, index))
            .collect(),
        (Axis::Parent, NodeRef::Node(id)) => doc.node(id).parent.map(NodeRef::Node).into_iter().collect(),
        (Axis::Parent, NodeRef::Attribute(owner, _)) => vec![NodeRef::Node(owner)],
        (Axis::Ancestor, NodeRef::Node(id)) => {
            doc.ancestors(id).into_iter().map(NodeRef::Node).collect()
        }
        (Axis::Ancestor, NodeRef::Attribute(owner, _)) => std::iter::once(owner)
            .chain(doc.ancestors(owner))
            .map(NodeRef::Node)
            .collect(),
        (Axis::Child | Axis::Descendant | Axis::Attribute, NodeRef::Attribute(..)) => Vec::new(),
    }
}

fn matches_test(doc: &Document, axis: Axis, test: &NodeTest, node: NodeRef) -> bool {
    let principal = match (axis, node) {
        (Axis::Attribute, NodeRef::Attribute(..)) => true,
        (Axis::Attribute, NodeRef::Node(_)) => false,
        (_, NodeRef::Node(id)) => id != DOCUMENT,
        (_, NodeRef::Attribute(..)) => false,
    };
    match test {
        NodeTest::AnyNode => true,
        NodeTest::Wildcard => principal,
        NodeTest::Name(name) => principal && doc.name(node) == name,
    }
}

fn compare(op: BinaryOperator, left: &Value, right: &Value, doc: &Document) -> bool {
    match (left, right) {
        (Value::NodeSet(l), Value::NodeSet(r)) => l.iter().any(|a| {
            r.iter().any(|b| {
                compare_atoms(
                    op,
                    &Value::String(doc.string_value(*a).to_string()),
                    &Value::String(doc.string_value(*b).to_string()),
                    doc,
                )
            })
        }),
        (Value::NodeSet(nodes), Value::Boolean(_)) => {
            compare_atoms(op, &Value::Boolean(!nodes.is_empty()), right, doc)
        }
        (Value::Boolean(_), Value::NodeSet(nodes)) => {
            compare_atoms(op, left, &Value::Boolean(!nodes.is_empty()), doc)
        }
        (Value::NodeSet(nodes), other) => nodes.iter().any(|n| {
            compare_atoms(op, &Value::String(doc.string_value(*n).to_string()), other, doc)
        }),
        (other, Value::NodeSet(nodes)) => nodes.iter().any(|n| {
            compare_atoms(op, other, &Value::String(doc.string_value(*n).to_string()), doc)
        }),
        _ => compare_atoms(op, left, right, doc),
    }
}

fn compare_atoms(op: BinaryOperator, left: &Value, right: &Value, doc: &Document) -> bool {
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = match (left, right) {
                (Value::Boolean(_), _) | (_, Value::Boolean(_)) => left.to_bool() == right.to_bool(),
                (Value::Number(_), _) | (_, Value::Number(_)) => {
                    left.to_number(doc) == right.to_number(doc)
                }
                _ => left.to_string_value(doc) == right.to_string_value(doc),
            };
            (op == BinaryOperator::Equals) == equal
        }
        _ => {
            let (l, r) = (left.to_number(doc), right.to_number(doc));
            match op {
                BinaryOperator::LessThan => l < r,
                BinaryOperator::LessThanOrEqual => l <= r,
                BinaryOperator::GreaterThan => l > r,
                BinaryOperator::GreaterThanOrEqual => l >= r,
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3.0, "3")]
    #[case(-2.0, "-2")]
    #[case(2.5, "2.5")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    fn test_format_number(#[case] n: f64, #[case] expected: &str) {
        assert_eq!(format_number(n), expected);
    }

    #[test]
    fn test_parse_number_is_lenient_with_whitespace() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert!(parse_number("main").is_nan());
    }

    #[test]
    fn test_value_to_bool() {
        assert!(!Value::NodeSet(vec![]).to_bool());
        assert!(Value::String("x".to_string()).to_bool());
        assert!(!Value::Number(f64::NAN).to_bool());
        assert!(!Value::Number(0.0).to_bool());
    }

    #[test]
    fn test_document_order_dedups() {
        let nodes = vec![
            NodeRef::Node(3),
            NodeRef::Attribute(1, 0),
            NodeRef::Node(1),
            NodeRef::Node(3),
        ];
        assert_eq!(
            document_order(nodes),
            vec![NodeRef::Node(1), NodeRef::Attribute(1, 0), NodeRef::Node(3)]
        );
    }
}
