//! The XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use crate::namespace::XML_NAMESPACE;
use std::ops::RangeInclusive;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "last" => {
            arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_size as f64))
        }
        "position" => {
            arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_position as f64))
        }
        "count" => {
            arity(name, &args, 1..=1)?;
            Ok(XPathValue::Number(node_set(name, args)?.len() as f64))
        }
        "local-name" | "name" | "namespace-uri" => func_node_name(name, args, e_ctx),

        // String
        "string" => {
            arity(name, &args, 0..=1)?;
            Ok(XPathValue::String(string_or_context(args, e_ctx)))
        }
        "concat" => {
            arity(name, &args, 2..=usize::MAX)?;
            Ok(XPathValue::String(args.iter().map(|v| v.to_string()).collect()))
        }
        "starts-with" => {
            let [s1, s2] = strings::<2, N>(name, args)?;
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let [s1, s2] = strings::<2, N>(name, args)?;
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let [s1, s2] = strings::<2, N>(name, args)?;
            let before = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let [s1, s2] = strings::<2, N>(name, args)?;
            let after = s1.find(&s2).map(|i| &s1[i + s2.len()..]).unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(args),
        "string-length" => {
            arity(name, &args, 0..=1)?;
            let s = string_or_context(args, e_ctx);
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            arity(name, &args, 0..=1)?;
            let s = string_or_context(args, e_ctx);
            Ok(XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => {
            let [source, from, to] = strings::<3, N>(name, args)?;
            Ok(XPathValue::String(translate(&source, &from, &to)))
        }

        // Boolean
        "boolean" => {
            arity(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(args[0].to_bool()))
        }
        "not" => {
            arity(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(!args[0].to_bool()))
        }
        "true" | "false" => {
            arity(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(name == "true"))
        }
        "lang" => {
            let [wanted] = strings::<1, N>(name, args)?;
            Ok(XPathValue::Boolean(lang_matches(e_ctx.context_node, &wanted)))
        }

        // Number
        "number" => {
            arity(name, &args, 0..=1)?;
            let n = match args.first() {
                Some(value) => value.to_number(),
                None => string_to_number(&e_ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => {
            arity(name, &args, 1..=1)?;
            let total = node_set(name, args)?
                .iter()
                .map(|node| string_to_number(&node.string_value()))
                .sum();
            Ok(XPathValue::Number(total))
        }
        "floor" | "ceiling" | "round" => {
            arity(name, &args, 1..=1)?;
            let n = args[0].to_number();
            Ok(XPathValue::Number(match name {
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                _ => round(n),
            }))
        }

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        }),
    }
}

fn arity<N>(
    name: &str,
    args: &[XPathValue<N>],
    expected: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let message = match (*expected.start(), *expected.end()) {
        (lo, hi) if lo == hi => format!("Expected {} argument(s), got {}", lo, args.len()),
        (lo, usize::MAX) => format!("Expected at least {} arguments, got {}", lo, args.len()),
        (lo, hi) => format!("Expected {} to {} arguments, got {}", lo, hi, args.len()),
    };
    Err(XPathError::FunctionError {
        function: format!("{}()", name),
        message,
    })
}

/// Checks an exact arity and converts every argument to its string value.
fn strings<'a, const K: usize, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
) -> Result<[String; K], XPathError> {
    arity(name, &args, K..=K)?;
    let values: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    values.try_into().map_err(|_| XPathError::FunctionError {
        function: format!("{}()", name),
        message: "argument conversion failed".to_string(),
    })
}

fn node_set<N: std::fmt::Debug>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
) -> Result<Vec<N>, XPathError> {
    match args.remove(0) {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        v => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got {:?}",
            name, v
        ))),
    }
}

fn string_or_context<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> String {
    match args.first() {
        Some(value) => value.to_string(),
        None => e_ctx.context_node.string_value(),
    }
}

fn func_node_name<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError> {
    arity(name, &args, 0..=1)?;
    let node = if args.is_empty() {
        Some(e_ctx.context_node)
    } else {
        node_set(name, args)?.first().copied()
    };
    let value = node.map(|n| match name {
        "local-name" => n.name().map(|q| q.local_part.to_string()),
        "namespace-uri" => n.namespace_uri().map(str::to_string),
        _ => n.qualified_name(),
    });
    Ok(XPathValue::String(value.flatten().unwrap_or_default()))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    arity("substring", &args, 2..=3)?;
    let s = args[0].to_string();
    let first = round(args[1].to_number());
    let last = match args.get(2) {
        Some(length) => first + round(length.to_number()),
        None => f64::INFINITY,
    };
    // NaN bounds make every comparison false, which selects nothing.
    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (i + 1) as f64;
            pos >= first && pos < last
        })
        .map(|(_, c)| c)
        .collect();
    Ok(XPathValue::String(result))
}

fn translate(source: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect()
}

/// Rounds halves towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return n;
    }
    (n + 0.5).floor()
}

/// The nearest `xml:lang` on the context node or its ancestors decides.
fn lang_matches<'a, N: DataSourceNode<'a>>(context: N, wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    let mut current = Some(context);
    if context.node_type() != NodeType::Element {
        current = context.parent();
    }
    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.namespace_uri() == Some(XML_NAMESPACE)
                && attr.name().is_some_and(|q| q.local_part == "lang")
        });
        if let Some(attr) = declared {
            let lang = attr.string_value().to_lowercase();
            return lang == wanted || lang.starts_with(&format!("{}-", wanted));
        }
        current = node.parent();
    }
    false
}
