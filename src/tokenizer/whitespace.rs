//! # Whitespace Token Handling
//!
//! Whitespace and newlines are preserved as tokens so that token positions map back
//! onto the original `calculation_operation` text. They carry no meaning for the
//! grammar (semicolons are optional and newlines are not statement terminators),
//! and the [`preprocessor`](crate::preprocessor) drops them.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

/// Parses spaces and tabs.
///
/// ```
/// # use calc_engine::tokenizer::whitespace::parse_whitespace;
/// # use calc_engine::tokenizer::token::Token;
/// let (rest, token) = parse_whitespace("  \tage").unwrap();
/// assert_eq!(token, Token::Whitespace("  \t".to_string()));
/// assert_eq!(rest, "age");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace expected",
        map(take_while1(|c| c == ' ' || c == '\t'), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}

/// Parses `\n` and `\r\n` line endings. A lone `\r` is also accepted because
/// configurations authored on some editors carry them.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline expected",
        map(alt((tag("\r\n"), tag("\n"), tag("\r"))), |_| Token::Newline),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace() {
        let (rest, token) = parse_whitespace("   x").unwrap();
        assert_eq!(token, Token::Whitespace("   ".to_string()));
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_newline() {
        let (rest, token) = parse_newline("\r\nreturn").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "return");

        let (rest, token) = parse_newline("\rreturn").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "return");
    }

    #[test]
    fn test_error() {
        assert!(parse_whitespace("age").is_err());
        assert!(parse_newline("age").is_err());
    }
}
