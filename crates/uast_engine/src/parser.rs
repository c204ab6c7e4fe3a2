//! A `nom`-based parser for the path-query language.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

use crate::ast::*;
use crate::error::XPathError;

// --- Main Public Parser ---

/// Deepest `(`/`[` nesting a query may use. The parser recurses once per
/// level.
pub const MAX_NESTING: usize = 64;

/// Parses a complete query. Trailing input is an error, as is nesting deeper
/// than [`MAX_NESTING`].
pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    let depth = nesting_depth(input);
    if depth > MAX_NESTING {
        return Err(XPathError::parse(
            input,
            format!("nesting depth {depth} exceeds the limit of {MAX_NESTING}"),
        ));
    }

    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::parse(
            input,
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(XPathError::parse(input, e.to_string())),
    }
}

// --- Combinators & Helpers ---

/// Maximum bracket depth of `input`, ignoring brackets inside string literals.
fn nesting_depth(input: &str) -> usize {
    let mut quote = None;
    let mut depth = 0usize;
    let mut max = 0;
    for c in input.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[') => {
                depth += 1;
                max = max.max(depth);
            }
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

type Res<'a, O> = IResult<&'a str, O>;

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// A keyword operator that is not the prefix of a longer name.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

/// Left-associative chain of `operand (operator operand)*`.
fn binary_chain<'a>(
    input: &'a str,
    operand: fn(&'a str) -> Res<'a, Expression>,
    operator: fn(&'a str) -> Res<'a, BinaryOperator>,
) -> Res<'a, Expression> {
    let (input, mut left) = operand(input)?;
    let (input, remainder) = many0(pair(ws(operator), operand)).parse(input)?;

    for (op, right) in remainder {
        left = Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        };
    }
    Ok((input, left))
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> Res<'_, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> Res<'_, BinaryOperator> {
    map(keyword("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> Res<'_, BinaryOperator> {
    map(keyword("and"), |_| BinaryOperator::And).parse(input)
}

fn equality_op(input: &str) -> Res<'_, BinaryOperator> {
    alt((
        map(tag("="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> Res<'_, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn union_op(input: &str) -> Res<'_, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn or_expr(input: &str) -> Res<'_, Expression> {
    binary_chain(input, and_expr, or_op)
}

fn and_expr(input: &str) -> Res<'_, Expression> {
    binary_chain(input, equality_expr, and_op)
}

fn equality_expr(input: &str) -> Res<'_, Expression> {
    binary_chain(input, relational_expr, equality_op)
}

fn relational_expr(input: &str) -> Res<'_, Expression> {
    binary_chain(input, union_expr, relational_op)
}

fn union_expr(input: &str) -> Res<'_, Expression> {
    binary_chain(input, path_expr, union_op)
}

fn path_expr(input: &str) -> Res<'_, Expression> {
    // Primary expressions go first so `count(...)` is not read as a step
    // named `count`.
    ws(alt((primary_expr, map(location_path, Expression::LocationPath)))).parse(input)
}

fn primary_expr(input: &str) -> Res<'_, Expression> {
    alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    ))
    .parse(input)
}

// --- Literal Parsers ---

fn number(input: &str) -> Res<'_, f64> {
    map_res(
        alt((
            recognize(pair(
                digit1,
                opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
            )),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn string_literal(input: &str) -> Res<'_, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Name and NodeTest Parsers ---

fn nc_name(input: &str) -> Res<'_, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn q_name(input: &str) -> Res<'_, String> {
    map(
        recognize(pair(nc_name, opt(pair(char(':'), nc_name)))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn any_node_test(input: &str) -> Res<'_, NodeTest> {
    map(
        terminated(tag("node"), pair(ws(char('(')), char(')'))),
        |_| NodeTest::AnyNode,
    )
    .parse(input)
}

fn node_test(input: &str) -> Res<'_, NodeTest> {
    alt((
        map(char('*'), |_| NodeTest::Wildcard),
        any_node_test,
        map(q_name, NodeTest::Name),
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis(input: &str) -> Res<'_, Axis> {
    map(
        terminated(
            alt((
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("attribute"),
                tag("parent"),
                tag("ancestor"),
                tag("self"),
            )),
            tag("::"),
        ),
        |axis: &str| match axis {
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "self" => Axis::SelfAxis,
            _ => Axis::Child,
        },
    )
    .parse(input)
}

fn predicate(input: &str) -> Res<'_, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> Res<'_, Step> {
    let (i, (axis, node_test)) = alt((
        map(tag(".."), |_| (Axis::Parent, NodeTest::AnyNode)),
        map(tag("."), |_| (Axis::SelfAxis, NodeTest::AnyNode)),
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

fn separator(input: &str) -> Res<'_, &str> {
    alt((tag("//"), tag("/"))).parse(input)
}

fn location_path(input: &str) -> Res<'_, LocationPath> {
    let (i, root) = opt(separator).parse(input)?;

    let mut steps = Vec::new();
    let i = match root {
        Some("//") => {
            let (i, first) = step(i)?;
            steps.push(Step::descendant_or_self());
            steps.push(first);
            i
        }
        // A lone `/` selects the document node.
        Some(_) => {
            let (i, first) = opt(step).parse(i)?;
            steps.extend(first);
            i
        }
        None => {
            let (i, first) = step(i)?;
            steps.push(first);
            i
        }
    };

    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = many0(pair(separator, step)).parse(i)?;
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }

    Ok((
        i,
        LocationPath {
            is_absolute: root.is_some(),
            steps,
        },
    ))
}

// --- Function Call Parser ---

fn function_call(input: &str) -> Res<'_, Expression> {
    // A function call must be a QName followed by '('. The lookahead keeps a
    // plain step name from being read as a call.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // `node()` is a node test, handled by the step parser.
    if name == "node" {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), ws(expression)),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn name_step(axis: Axis, name: &str) -> Step {
        Step {
            axis,
            node_test: NodeTest::Name(name.to_string()),
            predicates: vec![],
        }
    }

    #[test]
    fn test_parse_simple_path() {
        let result = parse_expression("Module/FunctionDef").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: false,
                steps: vec![
                    name_step(Axis::Child, "Module"),
                    name_step(Axis::Child, "FunctionDef"),
                ]
            })
        );
    }

    #[test]
    fn test_parse_descendant_shorthand() {
        let result = parse_expression("//Identifier").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: true,
                steps: vec![
                    Step::descendant_or_self(),
                    name_step(Axis::Child, "Identifier"),
                ]
            })
        );
    }

    #[test]
    fn test_parse_lone_slash_is_document() {
        let result = parse_expression("/").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: true,
                steps: vec![]
            })
        );
    }

    #[rstest]
    #[case("child::a", Axis::Child)]
    #[case("descendant::a", Axis::Descendant)]
    #[case("descendant-or-self::a", Axis::DescendantOrSelf)]
    #[case("self::a", Axis::SelfAxis)]
    #[case("parent::a", Axis::Parent)]
    #[case("ancestor::a", Axis::Ancestor)]
    #[case("attribute::a", Axis::Attribute)]
    #[case("@a", Axis::Attribute)]
    fn test_parse_axes(#[case] query: &str, #[case] axis: Axis) {
        let Expression::LocationPath(lp) = parse_expression(query).unwrap() else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps[0].axis, axis);
    }

    #[test]
    fn test_parse_abbreviated_steps() {
        let Expression::LocationPath(lp) = parse_expression("./..").unwrap() else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps[0].axis, Axis::SelfAxis);
        assert_eq!(lp.steps[1].axis, Axis::Parent);
        assert_eq!(lp.steps[1].node_test, NodeTest::AnyNode);
    }

    #[test]
    fn test_parse_predicate() {
        let result = parse_expression("Identifier[@token = 'x']").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert_eq!(
            lp.steps[0].predicates,
            vec![Expression::BinaryOp {
                left: Box::new(Expression::LocationPath(LocationPath {
                    is_absolute: false,
                    steps: vec![name_step(Axis::Attribute, "token")],
                })),
                op: BinaryOperator::Equals,
                right: Box::new(Expression::Literal("x".to_string())),
            }]
        );
    }

    #[test]
    fn test_parse_function_in_predicate() {
        let Expression::LocationPath(lp) = parse_expression("a[position() <= 2]").unwrap() else {
            panic!("Expected location path");
        };
        assert!(matches!(
            &lp.steps[0].predicates[0],
            Expression::BinaryOp {
                op: BinaryOperator::LessThanOrEqual,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_function_with_arguments() {
        let result = parse_expression("contains( @token , \"ma\" )").unwrap();
        let Expression::FunctionCall { name, args } = result else {
            panic!("Expected function call");
        };
        assert_eq!(name, "contains");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_parse_node_type_test() {
        let Expression::LocationPath(lp) = parse_expression("a/node()").unwrap() else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps[1].node_test, NodeTest::AnyNode);
    }

    #[test]
    fn test_keyword_needs_boundary() {
        // `order` is a step name, not `or` followed by `der`.
        let result = parse_expression("a | order").unwrap();
        assert!(matches!(
            result,
            Expression::BinaryOp {
                op: BinaryOperator::Union,
                ..
            }
        ));

        let result = parse_expression("a or b and c").unwrap();
        let Expression::BinaryOp { op, right, .. } = result else {
            panic!("Expected binary op");
        };
        assert_eq!(op, BinaryOperator::Or);
        assert!(matches!(
            *right,
            Expression::BinaryOp {
                op: BinaryOperator::And,
                ..
            }
        ));
    }

    #[test]
    fn test_names_that_look_like_numbers_are_steps() {
        let result = parse_expression("Infinity").unwrap();
        assert!(matches!(result, Expression::LocationPath(_)));
    }

    #[rstest]
    #[case("3", 3.0)]
    #[case("2.5", 2.5)]
    #[case(".5", 0.5)]
    #[case("12.75", 12.75)]
    #[case("7.", 7.0)]
    fn test_parse_numbers(#[case] query: &str, #[case] value: f64) {
        assert_eq!(parse_expression(query).unwrap(), Expression::Number(value));
    }

    #[test]
    fn test_number_followed_by_text() {
        assert_eq!(number("2.5]"), Ok(("]", 2.5)));
        assert_eq!(number("3.75"), Ok(("", 3.75)));
    }

    #[test]
    fn test_nesting_within_limit_parses() {
        let depth = MAX_NESTING - 1;
        let query = format!("{}true(){}", "not(".repeat(depth), ")".repeat(depth));
        assert!(parse_expression(&query).is_ok());
    }

    #[rstest]
    #[case::calls("not(", ")")]
    #[case::groups("(", ")")]
    #[case::predicates("a[", "]")]
    fn test_deep_nesting_is_a_parse_error(#[case] open: &str, #[case] close: &str) {
        let query = format!("{}1{}", open.repeat(50_000), close.repeat(50_000));

        let err = parse_expression(&query).unwrap_err();

        let XPathError::Parse(_, detail) = err else {
            panic!("Expected parse error");
        };
        assert!(
            detail.contains(&format!("exceeds the limit of {MAX_NESTING}")),
            "{detail}"
        );
    }

    #[test]
    fn test_brackets_in_literals_do_not_count() {
        let literal = "(".repeat(MAX_NESTING + 1);
        let query = format!("a[@token = '{literal}']");
        assert!(parse_expression(&query).is_ok());
    }

    #[rstest]
    #[case("//")]
    #[case("a[")]
    #[case("a]")]
    #[case("'unterminated")]
    #[case("")]
    fn test_parse_errors(#[case] query: &str) {
        assert!(matches!(
            parse_expression(query),
            Err(XPathError::Parse(_, _))
        ));
    }
}
