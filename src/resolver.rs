//! Single-result XPath lookups against a context node.

use schemamap_xpath1::{
    DataSourceNode, EvaluationContext, NamespaceBindings, XPathValue, evaluate, parse_expression,
};
use std::collections::HashMap;

/// The first result of an XPath lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathMatch<N> {
    Node(N),
    Text(String),
    Number(f64),
    Boolean(bool),
}

/// Evaluates `expr` with `context` as the context node and returns the first
/// match in document order.
///
/// `ns_prefix` is bound to the context node's namespace. When the context
/// node has no namespace, every `ns_prefix:` in the expression is stripped
/// instead, so that selectors written for a namespaced dialect still apply
/// to documents saved without one. The `xml` prefix is always bound.
///
/// Failures are local to the lookup: a malformed expression or an unbound
/// prefix is logged and yields `None`, as does an empty node-set.
pub fn evaluate_first<'a, N: DataSourceNode<'a> + 'a>(
    context: N,
    expr: &str,
    ns_prefix: &str,
) -> Option<XPathMatch<N>> {
    let mut bindings = NamespaceBindings::new();
    let expr = match context.namespace_uri() {
        None if !ns_prefix.is_empty() => expr.replace(&format!("{}:", ns_prefix), ""),
        Some(uri) if !ns_prefix.is_empty() => {
            bindings.bind(ns_prefix, uri);
            expr.to_string()
        }
        _ => expr.to_string(),
    };

    let parsed = match parse_expression(&expr) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Ignoring invalid XPath expression: {}", e);
            return None;
        }
    };

    let variables = HashMap::new();
    let e_ctx = EvaluationContext::new(context, &variables, &bindings);
    match evaluate(&parsed, &e_ctx) {
        Ok(XPathValue::NodeSet(nodes)) => nodes.first().copied().map(XPathMatch::Node),
        Ok(XPathValue::String(s)) => Some(XPathMatch::Text(s)),
        Ok(XPathValue::Number(n)) => Some(XPathMatch::Number(n)),
        Ok(XPathValue::Boolean(b)) => Some(XPathMatch::Boolean(b)),
        Err(e) => {
            log::debug!("XPath '{}' failed against {:?}: {}", expr, context.name(), e);
            None
        }
    }
}
