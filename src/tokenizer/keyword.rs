use std::str::FromStr;

use nom::{
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::context,
    sequence::pair,
};

use super::token::{ParserResult, Token};

/// Reserved words of the calculation language.
///
/// `true`, `false`, `null` and `undefined` are keywords here; the analyzer turns
/// them into literals.
#[derive(
    Debug, Clone, PartialEq, strum::EnumString, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Let,
    Const,
    Var,
    If,
    Else,
    Return,
    Throw,
    New,
    Typeof,
    This,
    True,
    False,
    Null,
    Undefined,
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Parses a whole word and classifies it as keyword or identifier.
///
/// The word is recognized first so that identifiers such as `letter` or `newAge`
/// are never split into a keyword prefix.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_word(input: &str) -> ParserResult<Token> {
    let (input, word) = context(
        "identifier",
        recognize(pair(
            take_while1(is_identifier_start),
            take_while(is_identifier_continue),
        )),
    )(input)?;

    match Keyword::from_str(word) {
        Ok(keyword) => Ok((input, Token::Keyword(keyword))),
        Err(_) => Ok((input, Token::Identifier(word.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_all_keywords() {
        for keyword in Keyword::iter() {
            let text = keyword.to_string();
            let (rest, token) = parse_word(&text).unwrap();
            assert_eq!(token, Token::Keyword(keyword));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let (rest, token) = parse_word("letter = 1").unwrap();
        assert_eq!(token, Token::Identifier("letter".to_string()));
        assert_eq!(rest, " = 1");

        let (_, token) = parse_word("newAge").unwrap();
        assert_eq!(token, Token::Identifier("newAge".to_string()));
    }

    #[test]
    fn test_identifier_characters() {
        let (rest, token) = parse_word("$calc_number_1.x").unwrap();
        assert_eq!(token, Token::Identifier("$calc_number_1".to_string()));
        assert_eq!(rest, ".x");
    }

    #[test]
    fn test_digit_is_not_identifier() {
        assert!(parse_word("1abc").is_err());
    }
}
