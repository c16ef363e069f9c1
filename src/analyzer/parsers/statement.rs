use super::{
    super::{core::*, prelude::*},
    expression::*,
    *,
};
use crate::ast;
use crate::tokenizer::{keyword::Keyword, token::Token};

/// Parses a whole calculation body.
///
/// Stops at the first token that does not start a statement; the caller checks
/// that every token was consumed.
pub fn parse_function_body() -> impl Parser<Token, ast::FunctionBody> {
    with_context(
        map(many(parse_statement()), ast::FunctionBody::new),
        "function body",
    )
}

pub fn parse_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        lazy(|| {
            choice(vec![
                Box::new(parse_declaration()),
                Box::new(parse_return_statement()),
                Box::new(parse_if_statement()),
                Box::new(parse_throw_statement()),
                Box::new(parse_block_statement()),
                Box::new(parse_empty_statement()),
                Box::new(parse_expression_statement()),
            ])
        }),
        "statement",
    )
}

fn parse_statement_end() -> impl Parser<Token, ()> {
    map(optional(parse_semicolon()), |_| ())
}

fn parse_declaration() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            tuple4(
                parse_declaration_kind(),
                parse_declarator(),
                many(preceded(as_unit(parse_comma()), parse_declarator())),
                parse_statement_end(),
            ),
            |(kind, first, rest, _)| ast::Statement::Declaration {
                kind,
                declarators: std::iter::once(first).chain(rest).collect(),
            },
        ),
        "declaration",
    )
}

fn parse_declaration_kind() -> impl Parser<Token, ast::DeclarationKind> {
    satisfy(|token: &Token| match token {
        Token::Keyword(Keyword::Let) => Some(ast::DeclarationKind::Let),
        Token::Keyword(Keyword::Const) => Some(ast::DeclarationKind::Const),
        Token::Keyword(Keyword::Var) => Some(ast::DeclarationKind::Var),
        _ => None,
    })
}

fn parse_declarator() -> impl Parser<Token, ast::Declarator> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                optional(preceded(as_unit(parse_equal()), parse_expression())),
            ),
            |(name, init)| ast::Declarator { name, init },
        ),
        "declarator",
    )
}

fn parse_return_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            tuple3(
                as_unit(parse_keyword(Keyword::Return)),
                optional(parse_expression()),
                parse_statement_end(),
            ),
            |(_, value, _)| ast::Statement::Return(value),
        ),
        "return statement",
    )
}

fn parse_if_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            tuple3(
                preceded(
                    as_unit(parse_keyword(Keyword::If)),
                    delimited(
                        as_unit(parse_open_paren()),
                        parse_expression(),
                        as_unit(parse_close_paren()),
                    ),
                ),
                lazy(parse_statement),
                optional(preceded(
                    as_unit(parse_keyword(Keyword::Else)),
                    lazy(parse_statement),
                )),
            ),
            |(condition, then_branch, else_branch)| ast::Statement::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            },
        ),
        "if statement",
    )
}

fn parse_throw_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            tuple3(
                as_unit(parse_keyword(Keyword::Throw)),
                parse_expression(),
                parse_statement_end(),
            ),
            |(_, value, _)| ast::Statement::Throw(value),
        ),
        "throw statement",
    )
}

fn parse_block_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            delimited(
                as_unit(parse_open_brace()),
                many(lazy(parse_statement)),
                as_unit(parse_close_brace()),
            ),
            ast::Statement::Block,
        ),
        "block",
    )
}

fn parse_empty_statement() -> impl Parser<Token, ast::Statement> {
    map(parse_semicolon(), |_| ast::Statement::Empty)
}

fn parse_expression_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            tuple2(parse_expression(), parse_statement_end()),
            |(expression, _)| ast::Statement::Expression(expression),
        ),
        "expression statement",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parsers::tokens;
    use crate::ast::{Declarator, DeclarationKind, Expression, Literal, Statement};
    use pretty_assertions::assert_eq;

    fn parse_body(source: &str) -> Vec<Statement> {
        let input = tokens(source);
        let (pos, body) = parse_function_body().parse(&input, 0).unwrap();
        assert_eq!(pos, input.len(), "unconsumed input in `{}`", source);
        body.statements
    }

    #[test]
    fn test_return_statement() {
        assert_eq!(
            parse_body("return this.age >= 65;"),
            vec![Statement::Return(Some(Expression::binary(
                ast::BinaryOperator::GreaterThanEqual,
                Expression::Member {
                    object: Box::new(Expression::This),
                    property: "age".to_string(),
                },
                Expression::Literal(Literal::Number(65.0)),
            )))]
        );
        assert_eq!(parse_body("return"), vec![Statement::Return(None)]);
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            parse_body("const a = 1, b; let c"),
            vec![
                Statement::Declaration {
                    kind: DeclarationKind::Const,
                    declarators: vec![
                        Declarator {
                            name: "a".to_string(),
                            init: Some(Expression::Literal(Literal::Number(1.0))),
                        },
                        Declarator {
                            name: "b".to_string(),
                            init: None,
                        },
                    ],
                },
                Statement::Declaration {
                    kind: DeclarationKind::Let,
                    declarators: vec![Declarator {
                        name: "c".to_string(),
                        init: None,
                    }],
                },
            ]
        );
    }

    #[test]
    fn test_if_else_chain() {
        let statements =
            parse_body("if (age < 18) { return 'minor'; } else if (age < 65) return 'adult'; else { return 'senior' }");
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Statement::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                assert!(matches!(**then_branch, Statement::Block(_)));
                assert!(matches!(**else_branch, Statement::If { .. }));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_optional_semicolons_and_empty_statements() {
        let statements = parse_body("let x = 1\nx += 2;;\nthrow 'bad'");
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[2], Statement::Empty);
        assert!(matches!(statements[3], Statement::Throw(_)));
    }

    #[test]
    fn test_stops_at_invalid_token() {
        let input = tokens("let x = 1; )");
        let (pos, body) = parse_function_body().parse(&input, 0).unwrap();
        assert_eq!(body.statements.len(), 1);
        assert_eq!(pos, 5);
        assert!(parse_statement().parse(&input, pos).is_err());
    }
}
