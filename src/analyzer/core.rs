//! # Core Parser Definitions
//!
//! The fundamental parser interface and error types of the parser combinator
//! system that turns preprocessed tokens into calculation ASTs.

use thiserror::Error;

/// Parser trait defines the core parsing interface.
///
/// All parsers in the system implement this trait, which takes an input slice
/// and a position, and returns either a success result with a new position and
/// output value, or a parse error.
///
/// # Type Parameters
///
/// * `I` - The input token type
/// * `O` - The output value type
pub trait Parser<I, O> {
    /// Attempts to parse the input starting at the given position.
    ///
    /// * `Ok((new_pos, output))` - If parsing succeeds, returns the new position and the parsed value
    /// * `Err(error)` - If parsing fails, returns a ParseError
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

impl<I, O, P> Parser<I, O> for Box<P>
where
    P: Parser<I, O> + ?Sized,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (**self).parse(input, pos)
    }
}

/// Result type for parsing operations.
pub type ParseResult<O> = Result<(usize, O), ParseError>;

/// Error type for parsing operations.
///
/// Every variant carries the token position where parsing failed and the
/// innermost named context (e.g. `"expression"`, `"if statement"`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected end of input
    #[error("Unexpected end of input: {message}")]
    UnexpectedEOF {
        message: String,
        position: usize,
        context: Option<String>,
    },
    /// Unexpected token
    #[error("Unexpected token `{parsed}`, expected {expected}")]
    Unexpected {
        expected: String,
        parsed: String,
        position: usize,
        context: Option<String>,
    },
    /// No alternative matched
    #[error("Unexpected token, no alternative matched{}", context_suffix(.context))]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
    /// Explicit failure
    #[error("{message}")]
    Failure {
        message: String,
        position: usize,
        context: Option<String>,
    },
}

fn context_suffix(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" while parsing {}", c))
        .unwrap_or_default()
}

impl ParseError {
    /// Attaches a context name unless a more specific one is already present.
    pub fn with_context(self, ctx: &str) -> Self {
        let attach = |context: Option<String>| context.or_else(|| Some(ctx.to_string()));
        match self {
            ParseError::UnexpectedEOF {
                message,
                position,
                context,
            } => ParseError::UnexpectedEOF {
                message,
                position,
                context: attach(context),
            },
            ParseError::Unexpected {
                expected,
                parsed,
                position,
                context,
            } => ParseError::Unexpected {
                expected,
                parsed,
                position,
                context: attach(context),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: attach(context),
            },
            ParseError::Failure {
                message,
                position,
                context,
            } => ParseError::Failure {
                message,
                position,
                context: attach(context),
            },
        }
    }

    pub fn get_position(&self) -> usize {
        match self {
            ParseError::UnexpectedEOF { position, .. } => *position,
            ParseError::Unexpected { position, .. } => *position,
            ParseError::NoAlternative { position, .. } => *position,
            ParseError::Failure { position, .. } => *position,
        }
    }

    pub fn get_context(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedEOF { context, .. }
            | ParseError::Unexpected { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::Failure { context, .. } => context.as_deref(),
        }
    }
}
