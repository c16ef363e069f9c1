//! # calc-engine: declarative calculation modules
//!
//! A calculation module is a named list of `variable = expression` definitions.
//! calc-engine compiles the list once into a [`CalculationEvaluator`] and then
//! evaluates it against any number of input states, returning a
//! [`ResultRecord`] with every variable coerced to its declared type.
//!
//! ```rust
//! use calc_engine::{CalculationEvaluator, Configuration, VariableDefinition, VariableType};
//! use serde_json::json;
//!
//! let configuration = Configuration::new(
//!     "retirement",
//!     vec![VariableDefinition::new(
//!         "calc_number_one",
//!         "return this.age >= 65;",
//!         VariableType::Boolean,
//!     )],
//! );
//! let evaluator = CalculationEvaluator::create(&configuration, "1").unwrap();
//! let record = evaluator.evaluate_json(&json!({"age": 21}));
//! assert_eq!(
//!     serde_json::to_value(&record).unwrap(),
//!     json!({
//!         "type": "Calculations",
//!         "name": "1",
//!         "segment": "retirement",
//!         "calculations": {"calc_number_one": false}
//!     })
//! );
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! calculation_operation → Tokenizer → Preprocessor → Analyzer → AST ┐
//!                                                                    ├→ Compiler → CompiledScript
//! VariableDefinition[] ─────────────────────────→ ContextTemplate ──┘
//!
//! evaluate(state) → ExecutionContext → Evaluator → coerce → unflatten → ResultRecord
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] module turns each body into tokens with line and column
//! information. The [`preprocessor`] drops comments and whitespace.
//!
//! ### Stage 2: Parsing
//!
//! The [`analyzer`] module builds the [`ast`] with parser combinators. Syntax
//! errors surface here, when the evaluator is created.
//!
//! ### Stage 3: Compilation
//!
//! The [`compiler`] collects the distinct variable names and one step per
//! definition into a [`CompiledScript`].
//!
//! ### Stage 4: Evaluation
//!
//! The [`eval`] module walks the AST inside a fresh execution context per call.
//! Runtime failures never escape: the first one stops the run and its message
//! becomes the record's `error`. Results pass through [`coerce`] and
//! [`unflatten`](unflatten::unflatten) on the way out.

pub mod analyzer;
pub mod ast;
pub mod coerce;
pub mod compiler;
pub mod config;
pub mod error;
pub mod eval;
pub mod evaluator;
pub mod preprocessor;
pub mod tokenizer;
pub mod unflatten;

// Re-exports
pub use compiler::{CompileError, CompiledScript};
pub use config::{Configuration, EngineConfig, VariableDefinition, VariableType};
pub use error::*;
pub use eval::{context::State, value::Value, EvalError};
pub use evaluator::{CalculationEvaluator, CalculationFault, ResultRecord};
