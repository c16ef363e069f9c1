//! # Tokenizer Component
//!
//! Lexical analysis of calculation bodies. Raw source text is turned into a stream
//! of [`TokenSpan`](token::TokenSpan)s that the [`analyzer`](crate::analyzer) consumes.
//!
//! ## Design Principles
//!
//! * **Position Information**: Each token carries line, column and byte offsets so
//!   compile errors can point at the offending part of a `calculation_operation`.
//! * **Format Preservation**: Whitespace, comments and newlines are kept as tokens;
//!   the [`preprocessor`](crate::preprocessor) removes them before parsing.
//! * **Longest Match**: Multi-character operators (`===`, `**`, `??`, `+=`) are tried
//!   before their prefixes.
//!
//! ## Component Structure
//!
//! * [`token`]: Core token types and tokenizer implementation
//! * [`keyword`]: Reserved words of the calculation language
//! * [`symbol`]: Operators and delimiters parsing
//! * [`literal`]: String and number literal parsing
//! * [`whitespace`]: Whitespace and newline handling
//! * [`comment`]: Line and block comments
//!
//! ## Usage Example
//!
//! ```rust
//! use calc_engine::tokenizer::token::{Token, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new();
//! let tokens = tokenizer.tokenize("return this.age >= 65;").unwrap();
//! assert!(tokens.iter().any(|t| t.token == Token::Identifier("age".to_string())));
//! ```

pub mod comment;
pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
