use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    error::{context, ErrorKind, ParseError, VerboseError},
    sequence::{pair, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

fn parse_exponent(input: &str) -> ParserResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            recognize(pair(
                alt((
                    recognize(tuple((digit1, opt(pair(char('.'), digit0))))),
                    recognize(pair(char('.'), digit1)),
                )),
                opt(parse_exponent),
            )),
            |s: &str| s.parse::<f64>().map(Literal::Number),
        ),
    )(input)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        other => other,
    }
}

fn string_error(input: &str) -> nom::Err<VerboseError<&str>> {
    nom::Err::Error(VerboseError::from_error_kind(input, ErrorKind::Char))
}

/// Parses a single or double quoted string with backslash escapes.
/// `\uXXXX` escapes are decoded; an unterminated string is an error.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c)) if c == '"' || c == '\'' => c,
        _ => return Err(string_error(input)),
    };

    let mut content = String::new();
    while let Some((index, c)) = chars.next() {
        match c {
            c if c == quote => {
                let rest = &input[index + c.len_utf8()..];
                return Ok((rest, Literal::String(content)));
            }
            '\n' | '\r' => return Err(string_error(input)),
            '\\' => match chars.next() {
                Some((_, 'u')) => {
                    let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                    let decoded = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| string_error(input))?;
                    content.push(decoded);
                }
                Some((_, '\n')) => {}
                Some((_, escaped)) => content.push(unescape(escaped)),
                None => return Err(string_error(input)),
            },
            other => content.push(other),
        }
    }

    Err(string_error(input))
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((parse_string_literal, parse_number_literal)),
            Token::Literal,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted_string() {
        let (rest, result) = parse_string_literal("\"senior\" rest").unwrap();
        assert_eq!(rest, " rest");
        assert_eq!(result, Literal::String("senior".to_string()));
    }

    #[test]
    fn test_single_quoted_string_with_escapes() {
        let (rest, result) = parse_string_literal(r#"'it\'s a "tab"\tA'"#).unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            result,
            Literal::String("it's a \"tab\"\tA".to_string())
        );
    }

    #[test]
    fn test_empty_string() {
        let (rest, result) = parse_string_literal("''").unwrap();
        assert_eq!(rest, "");
        assert_eq!(result, Literal::String(String::new()));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse_string_literal("\"open").is_err());
        assert!(parse_string_literal("\"line\nbreak\"").is_err());
    }

    #[test]
    fn test_number_literals() {
        let cases = [
            ("4", 4.0),
            ("65", 65.0),
            ("4.5", 4.5),
            ("4.", 4.0),
            (".5", 0.5),
            ("1e3", 1000.0),
            ("2.5E-1", 0.25),
        ];
        for (input, expected) in cases {
            let (rest, result) = parse_number_literal(input).unwrap();
            assert_eq!(result, Literal::Number(expected), "input: {}", input);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_number_stops_at_operator() {
        let (rest, result) = parse_number_literal("79-age").unwrap();
        assert_eq!(result, Literal::Number(79.0));
        assert_eq!(rest, "-age");
    }
}
