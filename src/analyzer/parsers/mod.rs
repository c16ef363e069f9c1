pub mod common;
pub use common::*;

pub mod expression;
pub mod statement;

pub use expression::parse_expression;
pub use statement::{parse_function_body, parse_statement};

#[cfg(test)]
pub(crate) fn tokens(source: &str) -> Vec<crate::tokenizer::token::Token> {
    use crate::preprocessor::{Preprocessor, TokenPreprocessor};

    let spans = crate::tokenizer::token::Tokenizer::new()
        .tokenize(source)
        .unwrap();
    TokenPreprocessor::tokens(&TokenPreprocessor::new().process(spans))
}
