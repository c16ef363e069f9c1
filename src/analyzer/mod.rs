//! # Analyzer
//!
//! Parser-combinator front end that turns preprocessed tokens into an
//! [`ast::FunctionBody`](crate::ast::FunctionBody).
//!
//! * [`core`]: the [`Parser`] trait and [`ParseError`]
//! * [`combinators`] / [`prelude`]: generic building blocks
//! * [`parsers`]: the expression and statement grammar

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
