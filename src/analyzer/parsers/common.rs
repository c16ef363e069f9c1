use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

// basic parsers
pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

/// Property names after `.` and object keys: identifiers and reserved words alike.
pub fn parse_property_name() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            Token::Keyword(keyword) => Some(keyword.to_string()),
            _ => None,
        }),
        "property name",
    )
}

pub fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::Number(n)) => Some(ast::Literal::Number(*n)),
            Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
            Token::Keyword(Keyword::True) => Some(ast::Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(ast::Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(ast::Literal::Null),
            Token::Keyword(Keyword::Undefined) => Some(ast::Literal::Undefined),
            _ => None,
        }),
        "literal",
    )
}

pub fn parse_keyword(keyword: Keyword) -> impl Parser<Token, Token> {
    equal(Token::Keyword(keyword))
}

pub fn parse_operator(operator: Operator) -> impl Parser<Token, Token> {
    equal(Token::Operator(operator))
}

// delimiters
pub fn parse_comma() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::Comma)), "comma")
}

pub fn parse_semicolon() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::Semicolon)), "semicolon")
}

pub fn parse_colon() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::Colon))
}

pub fn parse_equal() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::Equal))
}

pub fn parse_dot() -> impl Parser<Token, Token> {
    with_context(equal(Token::Operator(Operator::Dot)), "dot")
}

pub fn parse_open_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenParen))
}

pub fn parse_close_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseParen))
}

pub fn parse_open_bracket() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenBracket))
}

pub fn parse_close_bracket() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseBracket))
}

pub fn parse_open_brace() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::OpenBrace)), "open brace")
}

pub fn parse_close_brace() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseBrace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parsers::tokens;

    #[test]
    fn test_parse_literal() {
        let input = tokens("42 'x' true null undefined");
        let parser = parse_literal();

        assert_eq!(parser.parse(&input, 0), Ok((1, ast::Literal::Number(42.0))));
        assert_eq!(
            parser.parse(&input, 1),
            Ok((2, ast::Literal::String("x".to_string())))
        );
        assert_eq!(parser.parse(&input, 2), Ok((3, ast::Literal::Boolean(true))));
        assert_eq!(parser.parse(&input, 3), Ok((4, ast::Literal::Null)));
        assert_eq!(parser.parse(&input, 4), Ok((5, ast::Literal::Undefined)));
    }

    #[test]
    fn test_parse_identifier_rejects_keywords() {
        let input = tokens("age return");
        assert_eq!(
            parse_identifier().parse(&input, 0),
            Ok((1, "age".to_string()))
        );
        let err = parse_identifier().parse(&input, 1).unwrap_err();
        assert_eq!(err.get_context(), Some("identifier"));
        assert_eq!(
            parse_property_name().parse(&input, 1),
            Ok((2, "return".to_string()))
        );
    }
}
