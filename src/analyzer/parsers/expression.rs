//! Expression grammar.
//!
//! One function per precedence level, lowest first:
//!
//! ```text
//! assignment  := identifier assign_op assignment | conditional
//! conditional := nullish ( "?" assignment ":" assignment )?
//! nullish     := logical_or ( "??" logical_or )*
//! logical_or  := logical_and ( "||" logical_and )*
//! logical_and := equality ( "&&" equality )*
//! equality    := relational ( ("==" | "!=" | "===" | "!==") relational )*
//! relational  := additive ( ("<" | ">" | "<=" | ">=") additive )*
//! additive    := multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative := power ( ("*" | "/" | "%") power )*
//! power       := unary ( "**" power )?
//! unary       := ("!" | "-" | "+" | "typeof") unary | postfix
//! postfix     := primary ( "." name | "[" expression "]" | "(" arguments ")" )*
//! ```

use super::{
    super::{core::*, prelude::*},
    *,
};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    symbol::{Delimiter, Operator},
    token::Token,
};

/// Each precedence level is boxed so the recursive grammar stays a small type.
pub type ExpressionParser = Box<dyn Parser<Token, ast::Expression>>;

pub fn parse_expression() -> ExpressionParser {
    Box::new(with_context(lazy(parse_assignment), "expression"))
}

fn parse_assignment() -> ExpressionParser {
    Box::new(with_context(
        choice(vec![
            Box::new(map(
                tuple3(
                    parse_identifier(),
                    parse_assign_operator(),
                    lazy(parse_assignment),
                ),
                |(target, op, value)| ast::Expression::Assign {
                    target,
                    op,
                    value: Box::new(value),
                },
            )),
            parse_conditional(),
        ]),
        "assignment",
    ))
}

fn parse_assign_operator() -> impl Parser<Token, ast::AssignOperator> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Delimiter(Delimiter::Equal) => Some(ast::AssignOperator::Assign),
            Token::Operator(Operator::PlusAssign) => Some(ast::AssignOperator::Add),
            Token::Operator(Operator::MinusAssign) => Some(ast::AssignOperator::Subtract),
            Token::Operator(Operator::MultiplyAssign) => Some(ast::AssignOperator::Multiply),
            Token::Operator(Operator::DivideAssign) => Some(ast::AssignOperator::Divide),
            Token::Operator(Operator::ModuloAssign) => Some(ast::AssignOperator::Modulo),
            _ => None,
        }),
        "assignment operator",
    )
}

fn parse_conditional() -> ExpressionParser {
    Box::new(with_context(
        map(
            tuple2(
                parse_nullish(),
                optional(tuple4(
                    as_unit(parse_operator(Operator::Question)),
                    lazy(parse_assignment),
                    as_unit(parse_colon()),
                    lazy(parse_assignment),
                )),
            ),
            |(condition, branches)| match branches {
                Some((_, consequent, _, alternative)) => ast::Expression::Conditional {
                    condition: Box::new(condition),
                    consequent: Box::new(consequent),
                    alternative: Box::new(alternative),
                },
                None => condition,
            },
        ),
        "conditional",
    ))
}

/// Left-associative binary level: `operand (operator operand)*`.
fn left_associative<Q>(
    operand: fn() -> ExpressionParser,
    operator: Q,
    context: &'static str,
) -> impl Parser<Token, ast::Expression>
where
    Q: Parser<Token, ast::BinaryOperator>,
{
    with_context(
        map(
            tuple2(operand(), many(tuple2(operator, operand()))),
            |(first, rest): (ast::Expression, Vec<(ast::BinaryOperator, ast::Expression)>)| {
                rest.into_iter().fold(first, |left, (op, right)| {
                    ast::Expression::binary(op, left, right)
                })
            },
        ),
        context,
    )
}

fn binary_operator(
    table: &'static [(Operator, ast::BinaryOperator)],
) -> impl Parser<Token, ast::BinaryOperator> {
    satisfy(move |token: &Token| match token {
        Token::Operator(operator) => table
            .iter()
            .find(|(candidate, _)| candidate == operator)
            .map(|(_, op)| *op),
        _ => None,
    })
}

fn parse_nullish() -> ExpressionParser {
    Box::new(left_associative(
        parse_logical_or,
        binary_operator(&[(Operator::Nullish, ast::BinaryOperator::Nullish)]),
        "nullish coalescing",
    ))
}

fn parse_logical_or() -> ExpressionParser {
    Box::new(left_associative(
        parse_logical_and,
        binary_operator(&[(Operator::Or, ast::BinaryOperator::Or)]),
        "logical or",
    ))
}

fn parse_logical_and() -> ExpressionParser {
    Box::new(left_associative(
        parse_equality,
        binary_operator(&[(Operator::And, ast::BinaryOperator::And)]),
        "logical and",
    ))
}

fn parse_equality() -> ExpressionParser {
    Box::new(left_associative(
        parse_relational,
        binary_operator(&[
            (Operator::EqualEqual, ast::BinaryOperator::Equal),
            (Operator::NotEqual, ast::BinaryOperator::NotEqual),
            (Operator::StrictEqual, ast::BinaryOperator::StrictEqual),
            (Operator::StrictNotEqual, ast::BinaryOperator::StrictNotEqual),
        ]),
        "equality",
    ))
}

fn parse_relational() -> ExpressionParser {
    Box::new(left_associative(
        parse_additive,
        binary_operator(&[
            (Operator::Less, ast::BinaryOperator::LessThan),
            (Operator::Greater, ast::BinaryOperator::GreaterThan),
            (Operator::LessEqual, ast::BinaryOperator::LessThanEqual),
            (Operator::GreaterEqual, ast::BinaryOperator::GreaterThanEqual),
        ]),
        "comparison",
    ))
}

fn parse_additive() -> ExpressionParser {
    Box::new(left_associative(
        parse_multiplicative,
        binary_operator(&[
            (Operator::Plus, ast::BinaryOperator::Add),
            (Operator::Minus, ast::BinaryOperator::Subtract),
        ]),
        "additive",
    ))
}

fn parse_multiplicative() -> ExpressionParser {
    Box::new(left_associative(
        parse_power,
        binary_operator(&[
            (Operator::Multiply, ast::BinaryOperator::Multiply),
            (Operator::Divide, ast::BinaryOperator::Divide),
            (Operator::Modulo, ast::BinaryOperator::Modulo),
        ]),
        "multiplicative",
    ))
}

// right-associative: 2 ** 3 ** 2 == 2 ** 9
fn parse_power() -> ExpressionParser {
    Box::new(with_context(
        map(
            tuple2(
                parse_unary(),
                optional(preceded(
                    as_unit(parse_operator(Operator::Power)),
                    lazy(parse_power),
                )),
            ),
            |(base, exponent)| match exponent {
                Some(exponent) => ast::Expression::binary(ast::BinaryOperator::Power, base, exponent),
                None => base,
            },
        ),
        "exponent",
    ))
}

fn parse_unary() -> ExpressionParser {
    Box::new(with_context(
        choice(vec![
            Box::new(map(
                tuple2(parse_unary_operator(), lazy(parse_unary)),
                |(op, operand)| ast::Expression::Unary {
                    op,
                    operand: Box::new(operand),
                },
            )),
            parse_postfix(),
        ]),
        "unary",
    ))
}

fn parse_unary_operator() -> impl Parser<Token, ast::UnaryOperator> {
    satisfy(|token: &Token| match token {
        Token::Operator(Operator::Not) => Some(ast::UnaryOperator::Not),
        Token::Operator(Operator::Minus) => Some(ast::UnaryOperator::Negate),
        Token::Operator(Operator::Plus) => Some(ast::UnaryOperator::Plus),
        Token::Keyword(Keyword::Typeof) => Some(ast::UnaryOperator::Typeof),
        _ => None,
    })
}

enum Postfix {
    Member(String),
    Index(ast::Expression),
    Call(Vec<ast::Expression>),
}

fn parse_postfix() -> ExpressionParser {
    Box::new(with_context(
        map(
            tuple2(
                parse_primary(),
                many(choice(vec![
                    Box::new(map(
                        preceded(as_unit(parse_dot()), parse_property_name()),
                        Postfix::Member,
                    )),
                    Box::new(map(
                        delimited(
                            as_unit(parse_open_bracket()),
                            lazy(parse_expression),
                            as_unit(parse_close_bracket()),
                        ),
                        Postfix::Index,
                    )),
                    Box::new(map(parse_arguments(), Postfix::Call)),
                ])),
            ),
            |(primary, suffixes)| {
                suffixes
                    .into_iter()
                    .fold(primary, |object, suffix| match suffix {
                        Postfix::Member(property) => ast::Expression::Member {
                            object: Box::new(object),
                            property,
                        },
                        Postfix::Index(index) => ast::Expression::Index {
                            object: Box::new(object),
                            index: Box::new(index),
                        },
                        Postfix::Call(arguments) => ast::Expression::Call {
                            callee: Box::new(object),
                            arguments,
                        },
                    })
            },
        ),
        "postfix",
    ))
}

pub fn parse_arguments() -> impl Parser<Token, Vec<ast::Expression>> {
    with_context(
        delimited(
            as_unit(parse_open_paren()),
            separated_list(lazy(parse_assignment), as_unit(parse_comma())),
            as_unit(parse_close_paren()),
        ),
        "arguments",
    )
}

fn parse_primary() -> ExpressionParser {
    Box::new(with_context(
        choice(vec![
            Box::new(map(parse_literal(), ast::Expression::Literal)),
            Box::new(map(parse_identifier(), ast::Expression::Identifier)),
            Box::new(map(parse_keyword(Keyword::This), |_| ast::Expression::This)),
            parse_new(),
            parse_array(),
            parse_object(),
            Box::new(delimited(
                as_unit(parse_open_paren()),
                lazy(parse_expression),
                as_unit(parse_close_paren()),
            )),
        ]),
        "primary",
    ))
}

// new Date(...), new Date
fn parse_new() -> ExpressionParser {
    Box::new(with_context(
        map(
            tuple4(
                as_unit(parse_keyword(Keyword::New)),
                parse_identifier(),
                many(preceded(as_unit(parse_dot()), parse_property_name())),
                optional(parse_arguments()),
            ),
            |(_, first, path, arguments)| {
                let callee = path.into_iter().fold(
                    ast::Expression::Identifier(first),
                    |object, property| ast::Expression::Member {
                        object: Box::new(object),
                        property,
                    },
                );
                ast::Expression::New {
                    callee: Box::new(callee),
                    arguments: arguments.unwrap_or_default(),
                }
            },
        ),
        "new expression",
    ))
}

fn parse_array() -> ExpressionParser {
    Box::new(with_context(
        map(
            delimited(
                as_unit(parse_open_bracket()),
                separated_list(lazy(parse_assignment), as_unit(parse_comma())),
                as_unit(parse_close_bracket()),
            ),
            ast::Expression::Array,
        ),
        "array literal",
    ))
}

fn parse_object() -> ExpressionParser {
    Box::new(with_context(
        map(
            delimited(
                as_unit(parse_open_brace()),
                separated_list(parse_object_property(), as_unit(parse_comma())),
                as_unit(parse_close_brace()),
            ),
            ast::Expression::Object,
        ),
        "object literal",
    ))
}

fn parse_object_property() -> impl Parser<Token, (String, ast::Expression)> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple3(
                    parse_object_key(),
                    as_unit(parse_colon()),
                    lazy(parse_assignment),
                ),
                |(key, _, value)| (key, value),
            )),
            // shorthand `{ total }`
            Box::new(map(parse_identifier(), |name| {
                (name.clone(), ast::Expression::Identifier(name))
            })),
        ]),
        "object property",
    )
}

fn parse_object_key() -> impl Parser<Token, String> {
    choice(vec![
        Box::new(parse_property_name()),
        Box::new(map(parse_literal(), |literal| match literal {
            ast::Literal::String(s) => s,
            ast::Literal::Number(n) => crate::eval::value::number_to_string(n),
            ast::Literal::Boolean(b) => b.to_string(),
            ast::Literal::Null => "null".to_string(),
            ast::Literal::Undefined => "undefined".to_string(),
        })),
    ])
}
