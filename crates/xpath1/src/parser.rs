//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Matches an operator name (`and`, `div`, ...) only when it is not the start
/// of a longer name such as `order` or `division`.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(word), not(peek(satisfy(is_name_char))))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (lowest precedence first) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(keyword("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(keyword("and"), |_| BinaryOperator::And).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(keyword("div"), |_| BinaryOperator::Divide),
        map(keyword("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, neg_op) = opt(ws(char('-'))).parse(input)?;
    let (i, expr) = union_expr(i)?;

    if neg_op.is_some() {
        Ok((
            i,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            },
        ))
    } else {
        Ok((i, expr))
    }
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// A primary expression optionally continued by `/step` or `//step`.
/// Primary expressions are tried first so that `position()` is read as a
/// function call and not as a step named `position`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    let (i, start_expr) =
        alt((primary_expr, map(ws(location_path), Expression::LocationPath))).parse(input)?;

    let (i, remainder_steps) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;

    if remainder_steps.is_empty() {
        return Ok((i, start_expr));
    }

    let (start_point, is_absolute, mut steps) = match start_expr {
        Expression::LocationPath(lp) => (lp.start_point, lp.is_absolute, lp.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };
    push_steps(&mut steps, remainder_steps);

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point,
            is_absolute,
            steps,
        }),
    ))
}

fn push_steps(steps: &mut Vec<Step>, remainder: Vec<(&str, Step)>) {
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        variable_reference,
        map(number_literal, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

/// `Digits ('.' Digits?)? | '.' Digits`, without exponents or `inf`/`nan`.
fn number_literal(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn variable_reference(input: &str) -> IResult<&str, Expression> {
    map(preceded(char('$'), q_name), Expression::Variable).parse(input)
}

// --- Name and NodeTest Parsers ---

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_name_char),
    ))
    .parse(input)
}

fn q_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(nc_name, opt(pair(tag(":"), nc_name)))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        terminated(
            alt((
                tag("text"),
                tag("node"),
                tag("comment"),
                tag("processing-instruction"),
            )),
            pair(ws(char('(')), ws(char(')'))),
        ),
        |node_type: &str| match node_type {
            "text" => NodeTest::NodeType(NodeTypeTest::Text),
            "comment" => NodeTest::NodeType(NodeTypeTest::Comment),
            "processing-instruction" => NodeTest::NodeType(NodeTypeTest::ProcessingInstruction),
            _ => NodeTest::NodeType(NodeTypeTest::Node),
        },
    )
    .parse(input)
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(tag("*"), |_| NodeTest::Wildcard),
        map(terminated(nc_name, tag(":*")), |prefix: &str| {
            NodeTest::NamespaceWildcard(prefix.to_string())
        }),
        node_type_test,
        map(q_name, |name| NodeTest::Name(NameTest::parse(&name))),
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis(input: &str) -> IResult<&str, Axis> {
    map(
        terminated(
            alt((
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("attribute"),
                tag("parent"),
                tag("ancestor-or-self"),
                tag("ancestor"),
                tag("self"),
                tag("following-sibling"),
                tag("preceding-sibling"),
                tag("following"),
                tag("preceding"),
            )),
            tag("::"),
        ),
        |axis_str: &str| match axis_str {
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "parent" => Axis::Parent,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "ancestor" => Axis::Ancestor,
            "self" => Axis::SelfAxis,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            _ => Axis::Child,
        },
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let (i, (axis, node_test)) = alt((
        map(tag(".."), |_| {
            (Axis::Parent, NodeTest::NodeType(NodeTypeTest::Node))
        }),
        map(tag("."), |_| {
            (Axis::SelfAxis, NodeTest::NodeType(NodeTypeTest::Node))
        }),
        map(preceded(char('@'), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

/// A path that does not start with a variable or function call.
fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, (is_absolute, mut steps)) = if let Some(rem) = input.strip_prefix("//") {
        let (rem, first) = step(rem)?;
        (rem, (true, vec![Step::descendant_or_self(), first]))
    } else if let Some(rem) = input.strip_prefix('/') {
        match step(rem) {
            Ok((rem, first)) => (rem, (true, vec![first])),
            // A lone "/" selects the root.
            Err(_) => (rem, (true, vec![])),
        }
    } else {
        let (rem, first) = step(input)?;
        (rem, (false, vec![first]))
    };

    let (i, remainder) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;
    push_steps(&mut steps, remainder);

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    // Lookahead for '(' so a step name like 'persName' in 'persName/@ref'
    // is not taken for a function.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    if matches!(
        name.as_str(),
        "text" | "node" | "comment" | "processing-instruction"
    ) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}
