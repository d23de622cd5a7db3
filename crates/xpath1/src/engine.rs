//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator};
use super::{axes, functions, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use crate::namespace::NamespaceBindings;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                string_to_number(&nodes.first().map(|n| n.string_value()).unwrap_or_default())
            }
        }
    }

    /// The first node in document order, if this is a non-empty node-set.
    pub fn first_node(&self) -> Option<N> {
        match self {
            XPathValue::NodeSet(nodes) => nodes.first().copied(),
            _ => None,
        }
    }
}

/// XPath's `number()` on a string: optional whitespace around an optionally
/// negative decimal. Anything else, including exponents and `inf`, is NaN.
pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let well_formed = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if well_formed {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the borrowed variables and namespace bindings.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'d HashMap<String, XPathValue<N>>,
    pub namespaces: &'d NamespaceBindings,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(
        context_node: N,
        variables: &'d HashMap<String, XPathValue<N>>,
        namespaces: &'d NamespaceBindings,
    ) -> Self {
        Self {
            context_node,
            root_node: context_node.root(),
            context_position: 1,
            context_size: 1,
            variables,
            namespaces,
            _marker: PhantomData,
        }
    }

    /// The context for one node of a node list being filtered by a predicate.
    fn focus(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            context_position: position,
            context_size: size,
            variables: self.variables,
            namespaces: self.namespaces,
            _marker: PhantomData,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            if !evaluate(left, e_ctx)?.to_bool() {
                return Ok(XPathValue::Boolean(false));
            }
            Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            if evaluate(left, e_ctx)?.to_bool() {
                return Ok(XPathValue::Boolean(true));
            }
            Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let initial_context = if let Some(start_expr) = &path.start_point {
        match evaluate(start_expr, e_ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            other => {
                return Err(XPathError::TypeError(format!(
                    "cannot apply a path step to a non-node-set value: {:?}",
                    other
                )));
            }
        }
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates one step from every context node and merges the per-node
/// results into a duplicate-free node-set in document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let matcher = NodeMatcher::compile(&step.node_test, step.axis, e_ctx.namespaces)?;
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for &context in context_nodes {
        let candidates: Vec<N> = axes::collect(step.axis, context)
            .into_iter()
            .filter(|node| matcher.matches(node))
            .collect();
        for node in apply_predicates(candidates, &step.predicates, e_ctx)? {
            if seen.insert(node) {
                merged.push(node);
            }
        }
    }

    merged.sort();
    Ok(merged)
}

/// A node test with its namespace prefix already resolved.
enum NodeMatcher<'b> {
    Name {
        principal: NodeType,
        namespace: Option<&'b str>,
        local_part: &'b str,
    },
    Principal(NodeType),
    Namespace {
        principal: NodeType,
        namespace: &'b str,
    },
    Kind(NodeTypeTest),
}

impl<'b> NodeMatcher<'b> {
    fn compile(
        test: &'b NodeTest,
        axis: Axis,
        namespaces: &'b NamespaceBindings,
    ) -> Result<Self, XPathError> {
        let principal = if axis == Axis::Attribute {
            NodeType::Attribute
        } else {
            NodeType::Element
        };
        let resolve = |prefix: &str| {
            namespaces
                .resolve(prefix)
                .ok_or_else(|| XPathError::UnboundPrefix(prefix.to_string()))
        };
        Ok(match test {
            NodeTest::Name(name) => NodeMatcher::Name {
                principal,
                namespace: name.prefix.as_deref().map(resolve).transpose()?,
                local_part: &name.local_part,
            },
            NodeTest::Wildcard => NodeMatcher::Principal(principal),
            NodeTest::NamespaceWildcard(prefix) => NodeMatcher::Namespace {
                principal,
                namespace: resolve(prefix)?,
            },
            NodeTest::NodeType(kind) => NodeMatcher::Kind(*kind),
        })
    }

    fn matches<'a, N: DataSourceNode<'a>>(&self, node: &N) -> bool {
        match self {
            NodeMatcher::Name {
                principal,
                namespace,
                local_part,
            } => {
                node.node_type() == *principal
                    && node.namespace_uri() == *namespace
                    && node.name().is_some_and(|q| q.local_part == *local_part)
            }
            NodeMatcher::Principal(principal) => node.node_type() == *principal,
            NodeMatcher::Namespace {
                principal,
                namespace,
            } => node.node_type() == *principal && node.namespace_uri() == Some(*namespace),
            NodeMatcher::Kind(kind) => match kind {
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    node.node_type() == NodeType::ProcessingInstruction
                }
                NodeTypeTest::Node => true,
            },
        }
    }
}

/// Filters an axis-ordered node list by each predicate in turn. Positions are
/// taken from the list order, so reverse axes count outwards from the context.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let mut kept = Vec::new();
        let context_size = final_nodes.len();
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_ctx = e_ctx.focus(*node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(*node);
            }
        }
        final_nodes = kept;
    }
    Ok(final_nodes)
}
