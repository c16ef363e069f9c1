//! # Symbol Token Handling
//!
//! Operators and delimiters recognized in calculation bodies.
//!
//! Symbols are parsed with a longest-match strategy: `===` is tried before `==`,
//! which is tried before `=`, so multi-character operators are never split.
//! Precedence is the analyzer's concern, not the tokenizer's.

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Operators of the calculation language.
#[derive(Debug, Clone, PartialEq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Member access (`.`)
    #[strum(serialize = ".")]
    Dot,
    /// Conditional operator (`?`)
    #[strum(serialize = "?")]
    Question,
    /// Nullish coalescing (`??`)
    #[strum(serialize = "??")]
    Nullish,

    /// Loose equality (`==`)
    #[strum(serialize = "==")]
    EqualEqual,
    /// Loose inequality (`!=`)
    #[strum(serialize = "!=")]
    NotEqual,
    /// Strict equality (`===`)
    #[strum(serialize = "===")]
    StrictEqual,
    /// Strict inequality (`!==`)
    #[strum(serialize = "!==")]
    StrictNotEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,

    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    /// Exponentiation (`**`)
    #[strum(serialize = "**")]
    Power,

    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "!")]
    Not,

    /// Compound assignments
    #[strum(serialize = "+=")]
    PlusAssign,
    #[strum(serialize = "-=")]
    MinusAssign,
    #[strum(serialize = "*=")]
    MultiplyAssign,
    #[strum(serialize = "/=")]
    DivideAssign,
    #[strum(serialize = "%=")]
    ModuloAssign,
}

/// Constant for the close brace character, used because direct serialization in strum causes errors.
const CLOSE_BRACE: &str = "}";

/// Structural delimiters.
#[derive(Debug, Clone, PartialEq, EnumString, Display, AsRefStr)]
pub enum Delimiter {
    #[strum(serialize = "{")]
    OpenBrace,
    #[strum(serialize = "CLOSE_BRACE")]
    CloseBrace,
    #[strum(serialize = "(")]
    OpenParen,
    #[strum(serialize = ")")]
    CloseParen,
    #[strum(serialize = "[")]
    OpenBracket,
    #[strum(serialize = "]")]
    CloseBracket,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = ":")]
    Colon,
    /// Plain assignment (`=`)
    #[strum(serialize = "=")]
    Equal,
}

/// Parses an operator token.
///
/// ```
/// # use calc_engine::tokenizer::symbol::{parse_operator, Operator};
/// # use calc_engine::tokenizer::token::Token;
/// let (rest, token) = parse_operator("=== 1").unwrap();
/// assert_eq!(token, Token::Operator(Operator::StrictEqual));
/// assert_eq!(rest, " 1");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // three characters
                alt((
                    value(Operator::StrictEqual, tag("===")),
                    value(Operator::StrictNotEqual, tag("!==")),
                )),
                // two characters
                alt((
                    value(Operator::EqualEqual, tag("==")),
                    value(Operator::NotEqual, tag("!=")),
                    value(Operator::GreaterEqual, tag(">=")),
                    value(Operator::LessEqual, tag("<=")),
                    value(Operator::And, tag("&&")),
                    value(Operator::Or, tag("||")),
                    value(Operator::Nullish, tag("??")),
                    value(Operator::Power, tag("**")),
                    value(Operator::PlusAssign, tag("+=")),
                    value(Operator::MinusAssign, tag("-=")),
                    value(Operator::MultiplyAssign, tag("*=")),
                    value(Operator::DivideAssign, tag("/=")),
                    value(Operator::ModuloAssign, tag("%=")),
                )),
                // single character
                alt((
                    value(Operator::Dot, tag(".")),
                    value(Operator::Question, tag("?")),
                    value(Operator::Greater, tag(">")),
                    value(Operator::Less, tag("<")),
                    value(Operator::Plus, tag("+")),
                    value(Operator::Minus, tag("-")),
                    value(Operator::Multiply, tag("*")),
                    value(Operator::Divide, tag("/")),
                    value(Operator::Modulo, tag("%")),
                    value(Operator::Not, tag("!")),
                )),
            )),
            Token::Operator,
        ),
    )(input)
}

/// Parses a delimiter token.
///
/// Must run after [`parse_operator`] so that `==` is not read as two `=` delimiters.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag(CLOSE_BRACE)),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Semicolon, tag(";")),
                value(Delimiter::Colon, tag(":")),
                value(Delimiter::Equal, tag("=")),
            )),
            Token::Delimiter,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let test_cases = [
            ("===", Operator::StrictEqual),
            ("!==", Operator::StrictNotEqual),
            ("==", Operator::EqualEqual),
            ("!=", Operator::NotEqual),
            (">=", Operator::GreaterEqual),
            ("<=", Operator::LessEqual),
            ("??", Operator::Nullish),
            ("**", Operator::Power),
            ("+=", Operator::PlusAssign),
            ("%", Operator::Modulo),
            (".", Operator::Dot),
            ("?", Operator::Question),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_operator(input).unwrap();
            assert_eq!(token, Token::Operator(expected.clone()));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_delimiters() {
        let test_cases = [
            ("{", Delimiter::OpenBrace),
            ("}", Delimiter::CloseBrace),
            ("(", Delimiter::OpenParen),
            (")", Delimiter::CloseParen),
            ("[", Delimiter::OpenBracket),
            ("]", Delimiter::CloseBracket),
            (",", Delimiter::Comma),
            (";", Delimiter::Semicolon),
            (":", Delimiter::Colon),
            ("=", Delimiter::Equal),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_delimiter(input).unwrap();
            assert_eq!(token, Token::Delimiter(expected.clone()));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_operator_precedence() {
        let (rest, token) = parse_operator(">=").unwrap();
        assert_eq!(token, Token::Operator(Operator::GreaterEqual));
        assert_eq!(rest, "");

        let (rest, token) = parse_operator("**2").unwrap();
        assert_eq!(token, Token::Operator(Operator::Power));
        assert_eq!(rest, "2");
    }

    #[test]
    fn test_single_equal_is_not_operator() {
        assert!(parse_operator("= 1").is_err());
    }
}
