//! Tree-walking evaluation of calculation bodies.
//!
//! [`context`] holds the per-invocation environment, [`expression`] and
//! [`statement`] walk the AST, [`builtins`] provides the shared library and
//! [`value`] the runtime values with their dynamic conversions.

pub mod builtins;
pub mod context;
pub mod evaluator;
pub mod expression;
pub mod statement;
pub mod value;

use thiserror::Error;

use self::value::Value;

/// A runtime failure inside a calculation body.
///
/// The evaluator never propagates these to callers; the [`message`](Self::message)
/// lands in the result's error slot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    /// Value of a `throw` statement.
    #[error("Uncaught {0}")]
    Thrown(Value),
}

impl EvalError {
    pub fn reference<S: Into<String>>(message: S) -> Self {
        EvalError::ReferenceError(message.into())
    }

    pub fn type_error<S: Into<String>>(message: S) -> Self {
        EvalError::TypeError(message.into())
    }

    pub fn range<S: Into<String>>(message: S) -> Self {
        EvalError::RangeError(message.into())
    }

    pub fn not_defined(name: &str) -> Self {
        EvalError::ReferenceError(format!("{} is not defined", name))
    }

    /// The message without the error name, as stored in the error slot.
    ///
    /// A thrown object contributes its `message` property, any other thrown
    /// value its string form.
    pub fn message(&self) -> String {
        match self {
            EvalError::ReferenceError(message)
            | EvalError::TypeError(message)
            | EvalError::RangeError(message) => message.clone(),
            EvalError::Thrown(Value::Object(fields)) => fields
                .get("message")
                .map(Value::to_js_string)
                .unwrap_or_else(|| Value::Object(fields.clone()).to_js_string()),
            EvalError::Thrown(value) => value.to_js_string(),
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_messages() {
        let error = EvalError::not_defined("predicted_life_span");
        assert_eq!(error.message(), "predicted_life_span is not defined");
        assert_eq!(
            error.to_string(),
            "ReferenceError: predicted_life_span is not defined"
        );

        let thrown = EvalError::Thrown(Value::string("age missing"));
        assert_eq!(thrown.message(), "age missing");

        let mut fields = BTreeMap::new();
        fields.insert("message".to_string(), Value::string("bad input"));
        assert_eq!(EvalError::Thrown(Value::Object(fields)).message(), "bad input");
    }
}
