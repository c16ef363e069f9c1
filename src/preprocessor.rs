//! # Preprocessor
//!
//! Bridge between tokenization and parsing. The tokenizer keeps formatting tokens
//! so spans stay faithful to the source; the analyzer only wants significant
//! tokens. [`TokenPreprocessor`] filters the stream while keeping each surviving
//! token's span, which the compiler uses to report error positions.
//!
//! ```text
//! calculation_operation → Tokenizer → Preprocessor → Analyzer → AST
//! ```

use crate::tokenizer::token::{Token, TokenSpan};

/// A trait for preprocessing different types of input
pub trait Preprocessor<T, U = T> {
    /// Process the input of type T and return the processed result
    fn process(&self, input: T) -> U;
}

/// Drops comments, whitespace and newlines from a token stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenPreprocessor;

impl TokenPreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Splits preprocessed spans into the bare tokens the parser consumes.
    pub fn tokens(spans: &[TokenSpan]) -> Vec<Token> {
        spans.iter().map(|span| span.token.clone()).collect()
    }
}

impl Preprocessor<Vec<TokenSpan>> for TokenPreprocessor {
    fn process(&self, input: Vec<TokenSpan>) -> Vec<TokenSpan> {
        input
            .into_iter()
            .filter(|span| {
                !span.token.is_comment() && !span.token.is_whitespace() && !span.token.is_newline()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{keyword::Keyword, token::Tokenizer};

    #[test]
    fn test_filters_formatting_tokens() {
        let spans = Tokenizer::new()
            .tokenize("// note\nreturn  /* inline */ age;\n")
            .unwrap();
        let processed = TokenPreprocessor::new().process(spans);
        let tokens = TokenPreprocessor::tokens(&processed);

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Keyword(Keyword::Return));
        assert_eq!(tokens[1], Token::Identifier("age".to_string()));
    }

    #[test]
    fn test_keeps_positions() {
        let spans = Tokenizer::new().tokenize("\n  return age").unwrap();
        let processed = TokenPreprocessor::new().process(spans);

        assert_eq!(processed[0].line, 2);
        assert_eq!(processed[0].column, 3);
        assert_eq!(processed[1].column, 10);
    }
}
