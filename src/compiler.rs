//! # Script Compiler
//!
//! Turns an ordered list of [`VariableDefinition`]s into one [`CompiledScript`].
//!
//! Every `calculation_operation` is tokenized and parsed once, here. The script
//! then has one binding per distinct variable name and, per definition, a step
//! that runs the parsed body as a zero-argument function, assigns the binding
//! and stores the coerced value in the results map. A failing step ends the run;
//! the [`Evaluator`](crate::eval::evaluator::Evaluator) records its message in
//! the error slot.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analyzer::{
    parsers::{parse_function_body, parse_statement},
    Parser,
};
use crate::ast::FunctionBody;
use crate::config::{VariableDefinition, VariableType};
use crate::preprocessor::{Preprocessor, TokenPreprocessor};
use crate::tokenizer::{
    keyword::Keyword,
    token::{TokenSpan, Tokenizer, TokenizerError},
};

/// Declared name used when a configuration has no variables.
const PLACEHOLDER_DECLARATION: &str = "test";

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid");
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Malformed calculation for `{variable}`: {message} at line {line}, column {column}")]
    MalformedExpression {
        variable: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Invalid variable name `{0}`")]
    InvalidVariableName(String),

    #[error("Variable `{0}` is defined more than once")]
    DuplicateVariable(String),
}

/// One definition of the script: evaluate `body`, bind `name`, store the
/// result coerced to `variable_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub variable_type: VariableType,
    pub body: FunctionBody,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledScript {
    declarations: Vec<String>,
    steps: Vec<Step>,
}

impl CompiledScript {
    /// Distinct variable names in first-occurrence order.
    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declarations = if self.declarations.is_empty() {
            PLACEHOLDER_DECLARATION.to_string()
        } else {
            self.declarations.join(", ")
        };
        writeln!(f, "\"use strict\";")?;
        writeln!(f, "try {{")?;
        writeln!(f, "  let {};", declarations)?;
        for step in &self.steps {
            writeln!(f, "  {} = (function () {{", step.name)?;
            for line in step.source.lines() {
                writeln!(f, "    {}", line)?;
            }
            writeln!(f, "  }})();")?;
            writeln!(
                f,
                "  _global.calculations['{}'] = coerce({}, '{}');",
                step.name, step.name, step.variable_type
            )?;
        }
        writeln!(f, "}} catch (e) {{")?;
        writeln!(f, "  _global.error = e.message;")?;
        write!(f, "}}")
    }
}

/// Compiles variable definitions into a script.
///
/// Duplicate names are declared once and assigned in list order unless
/// `reject_duplicates` is set.
#[tracing::instrument(level = "debug", skip(variables), fields(count = variables.len()))]
pub fn compile(
    variables: &[VariableDefinition],
    reject_duplicates: bool,
) -> Result<CompiledScript, CompileError> {
    let mut seen = HashSet::new();
    let mut declarations = Vec::new();
    let mut steps = Vec::with_capacity(variables.len());

    for variable in variables {
        let name = &variable.variable_name;
        validate_name(name)?;
        if seen.insert(name.clone()) {
            declarations.push(name.clone());
        } else if reject_duplicates {
            return Err(CompileError::DuplicateVariable(name.clone()));
        } else {
            warn!(variable = %name, "variable defined more than once; the last definition wins");
        }

        let body = compile_body(name, &variable.calculation_operation)?;
        steps.push(Step {
            name: name.clone(),
            variable_type: variable.variable_type,
            body,
            source: variable.calculation_operation.clone(),
        });
    }

    debug!(declarations = declarations.len(), "compiled script");
    Ok(CompiledScript {
        declarations,
        steps,
    })
}

fn validate_name(name: &str) -> Result<(), CompileError> {
    if !IDENTIFIER.is_match(name) || Keyword::from_str(name).is_ok() {
        return Err(CompileError::InvalidVariableName(name.to_string()));
    }
    Ok(())
}

/// Parses one `calculation_operation` into a function body.
pub fn compile_body(variable: &str, source: &str) -> Result<FunctionBody, CompileError> {
    let spans = Tokenizer::new()
        .tokenize(source)
        .map_err(|e| tokenizer_error(variable, e))?;
    let spans = TokenPreprocessor::new().process(spans);
    let tokens = TokenPreprocessor::tokens(&spans);

    let (pos, body) = parse_function_body()
        .parse(&tokens, 0)
        .map_err(|e| malformed(variable, source, &spans, e.get_position()))?;
    if pos == tokens.len() {
        return Ok(body);
    }

    // the body stopped early; re-parse the offending statement for the failing token
    let position = match parse_statement().parse(&tokens, pos) {
        Err(e) => e.get_position(),
        Ok(_) => pos,
    };
    Err(malformed(variable, source, &spans, position))
}

fn tokenizer_error(variable: &str, error: TokenizerError) -> CompileError {
    match error {
        TokenizerError::ParseError {
            message,
            found,
            span,
        } => CompileError::MalformedExpression {
            variable: variable.to_string(),
            message: format!("{} `{}`", message, found),
            line: span.line,
            column: span.column,
        },
    }
}

fn malformed(variable: &str, source: &str, spans: &[TokenSpan], position: usize) -> CompileError {
    let (message, line, column) = match spans.get(position) {
        Some(span) => (
            format!("Unexpected token `{}`", span.token),
            span.line,
            span.column,
        ),
        None => {
            let (line, column) = end_of(source);
            ("Unexpected end of input".to_string(), line, column)
        }
    };
    CompileError::MalformedExpression {
        variable: variable.to_string(),
        message,
        line,
        column,
    }
}

/// 1-based line and column just past the last character.
fn end_of(source: &str) -> (usize, usize) {
    let line = source.matches('\n').count() + 1;
    let last_line = source.rsplit('\n').next().unwrap_or_default();
    (line, last_line.chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn variable(name: &str, operation: &str) -> VariableDefinition {
        VariableDefinition::new(name, operation, VariableType::Number)
    }

    #[test]
    fn test_declarations_are_distinct_and_ordered() {
        let script = compile(
            &[
                variable("b", "return 1;"),
                variable("a", "return b + 1;"),
                variable("b", "return a * 2;"),
            ],
            false,
        )
        .unwrap();

        assert_eq!(script.declarations(), &["b".to_string(), "a".to_string()]);
        let names: Vec<_> = script.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_rejects_duplicates_when_strict() {
        let result = compile(
            &[variable("a", "return 1;"), variable("a", "return 2;")],
            true,
        );
        assert_eq!(result, Err(CompileError::DuplicateVariable("a".to_string())));
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1abc", "a-b", "return", "this", "a b"] {
            let result = compile(&[variable(name, "return 1;")], false);
            assert_eq!(
                result,
                Err(CompileError::InvalidVariableName(name.to_string())),
                "name {:?}",
                name
            );
        }
        assert!(compile(&[variable("$total_2", "return 1;")], false).is_ok());
    }

    #[test]
    fn test_malformed_body_reports_position() {
        let result = compile(&[variable("x", "let a = 1;\nreturn a +* 2;")], false);
        assert_eq!(
            result,
            Err(CompileError::MalformedExpression {
                variable: "x".to_string(),
                message: "Unexpected token `*`".to_string(),
                line: 2,
                column: 11,
            })
        );
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let result = compile(&[variable("x", "return (1 + 2")], false);
        assert_eq!(
            result,
            Err(CompileError::MalformedExpression {
                variable: "x".to_string(),
                message: "Unexpected end of input".to_string(),
                line: 1,
                column: 14,
            })
        );
    }

    #[test]
    fn test_unrecognized_character() {
        let result = compile(&[variable("x", "return 1 # 2;")], false);
        match result {
            Err(CompileError::MalformedExpression { line, column, .. }) => {
                assert_eq!((line, column), (1, 10));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_display_renders_script() {
        let script = compile(&[variable("a", "return 4;")], false).unwrap();
        let text = script.to_string();
        assert!(text.starts_with("\"use strict\";\ntry {\n  let a;\n"));
        assert!(text.contains("  a = (function () {\n    return 4;\n  })();"));
        assert!(text.contains("_global.calculations['a'] = coerce(a, 'Number');"));
        assert!(text.ends_with("} catch (e) {\n  _global.error = e.message;\n}"));

        let empty = compile(&[], false).unwrap();
        assert!(empty.is_empty());
        assert!(empty.to_string().contains("let test;"));
    }
}
