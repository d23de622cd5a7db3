//! Comparison, arithmetic and union operators with XPath 1.0 conversion rules.

use crate::ast::BinaryOperator;
use crate::datasource::DataSourceNode;
use crate::engine::{XPathValue, string_to_number};
use crate::error::XPathError;
use std::collections::HashSet;

pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus | Minus | Multiply | Divide | Modulo => {
            let (l, r) = (left.to_number(), right.to_number());
            Ok(XPathValue::Number(match op {
                Plus => l + r,
                Minus => l - r,
                Multiply => l * r,
                Divide => l / r,
                _ => l % r,
            }))
        }
        Union => match (left, right) {
            (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
                let mut seen: HashSet<N> = l.iter().copied().collect();
                l.extend(r.into_iter().filter(|n| seen.insert(*n)));
                l.sort();
                Ok(XPathValue::NodeSet(l))
            }
            (l, r) => Err(XPathError::TypeError(format!(
                "union operands must be node-sets, got {:?} and {:?}",
                l, r
            ))),
        },
    }
}

/// A single non-node-set operand.
#[derive(Debug, Clone)]
enum Atom {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Atom {
    fn from_value<'a, N: DataSourceNode<'a>>(value: &XPathValue<N>) -> Self {
        match value {
            XPathValue::String(s) => Atom::Str(s.clone()),
            XPathValue::Number(n) => Atom::Num(*n),
            XPathValue::Boolean(b) => Atom::Bool(*b),
            XPathValue::NodeSet(_) => Atom::Str(value.to_string()),
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Atom::Str(s) => !s.is_empty(),
            Atom::Num(n) => *n != 0.0 && !n.is_nan(),
            Atom::Bool(b) => *b,
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Atom::Str(s) => string_to_number(s),
            Atom::Num(n) => *n,
            Atom::Bool(b) => f64::from(u8::from(*b)),
        }
    }
}

/// Node-set comparisons are existential: true if any member satisfies the
/// comparison against the other operand.
fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_strings: Vec<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|a| {
                let a = Atom::Str(a.string_value());
                right_strings
                    .iter()
                    .any(|b| compare_atoms(op, &a, &Atom::Str(b.clone())))
            })
        }
        (XPathValue::NodeSet(nodes), XPathValue::Boolean(b)) => {
            compare_atoms(op, &Atom::Bool(!nodes.is_empty()), &Atom::Bool(*b))
        }
        (XPathValue::Boolean(b), XPathValue::NodeSet(nodes)) => {
            compare_atoms(op, &Atom::Bool(*b), &Atom::Bool(!nodes.is_empty()))
        }
        (XPathValue::NodeSet(nodes), other) => {
            let other = Atom::from_value(other);
            nodes
                .iter()
                .any(|n| compare_atoms(op, &Atom::Str(n.string_value()), &other))
        }
        (other, XPathValue::NodeSet(nodes)) => {
            let other = Atom::from_value(other);
            nodes
                .iter()
                .any(|n| compare_atoms(op, &other, &Atom::Str(n.string_value())))
        }
        (l, r) => compare_atoms(op, &Atom::from_value(l), &Atom::from_value(r)),
    }
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let equal = match (left, right) {
                (Atom::Bool(_), _) | (_, Atom::Bool(_)) => left.to_bool() == right.to_bool(),
                (Atom::Num(_), _) | (_, Atom::Num(_)) => left.to_number() == right.to_number(),
                (Atom::Str(l), Atom::Str(r)) => l == r,
            };
            equal == (op == Equals)
        }
        LessThan => left.to_number() < right.to_number(),
        LessThanOrEqual => left.to_number() <= right.to_number(),
        GreaterThan => left.to_number() > right.to_number(),
        GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}
