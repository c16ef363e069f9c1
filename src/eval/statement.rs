use std::sync::Arc;

use super::{
    context::ExecutionContext,
    expression::ExpressionEvaluator,
    value::Value,
    EvalError, EvalResult,
};
use crate::ast::{DeclarationKind, Declarator, Expression, Statement};

/// Outcome of evaluating one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Completion value of a statement that did not transfer control.
    Value(Value),

    Control(ControlFlow),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Return(Value),
}

pub struct StatementEvaluator {
    pub expression_evaluator: Arc<ExpressionEvaluator>,
}

impl Default for StatementEvaluator {
    fn default() -> Self {
        Self {
            expression_evaluator: Arc::new(ExpressionEvaluator::new()),
        }
    }
}

impl StatementEvaluator {
    pub fn new(expression_evaluator: Arc<ExpressionEvaluator>) -> Self {
        Self {
            expression_evaluator,
        }
    }

    pub fn eval_statement(
        &self,
        statement: &Statement,
        context: &mut ExecutionContext,
    ) -> EvalResult<StatementResult> {
        match statement {
            Statement::Expression(expr) => Ok(StatementResult::Value(
                self.eval_expression(expr, context)?,
            )),
            Statement::Return(expr) => Ok(StatementResult::Control(ControlFlow::Return(
                self.eval_return(expr.as_ref(), context)?,
            ))),
            Statement::Declaration { kind, declarators } => {
                self.eval_declaration(*kind, declarators, context)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if(condition, then_branch, else_branch.as_deref(), context),
            Statement::Block(statements) => self.eval_block(statements, context),
            Statement::Throw(expr) => {
                let value = self.eval_expression(expr, context)?;
                Err(EvalError::Thrown(value))
            }
            Statement::Empty => Ok(StatementResult::Value(Value::Undefined)),
        }
    }

    pub fn eval_expression(
        &self,
        expr: &Expression,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        self.expression_evaluator.eval_expression(expr, context)
    }

    /// Runs statements in order until one returns.
    pub fn eval_statements(
        &self,
        statements: &[Statement],
        context: &mut ExecutionContext,
    ) -> EvalResult<StatementResult> {
        let mut last = StatementResult::Value(Value::Undefined);
        for statement in statements {
            last = self.eval_statement(statement, context)?;
            if let StatementResult::Control(_) = last {
                break;
            }
        }
        Ok(last)
    }

    fn eval_return(
        &self,
        expr: Option<&Expression>,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        match expr {
            Some(expr) => self.eval_expression(expr, context),
            None => Ok(Value::Undefined),
        }
    }

    fn eval_declaration(
        &self,
        kind: DeclarationKind,
        declarators: &[Declarator],
        context: &mut ExecutionContext,
    ) -> EvalResult<StatementResult> {
        for declarator in declarators {
            let value = match &declarator.init {
                Some(init) => Some(self.eval_expression(init, context)?),
                None => None,
            };
            context.declare(kind, &declarator.name, value);
        }
        Ok(StatementResult::Value(Value::Undefined))
    }

    fn eval_if(
        &self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        context: &mut ExecutionContext,
    ) -> EvalResult<StatementResult> {
        if self.eval_expression(condition, context)?.is_truthy() {
            self.eval_statement(then_branch, context)
        } else if let Some(else_branch) = else_branch {
            self.eval_statement(else_branch, context)
        } else {
            Ok(StatementResult::Value(Value::Undefined))
        }
    }

    fn eval_block(
        &self,
        statements: &[Statement],
        context: &mut ExecutionContext,
    ) -> EvalResult<StatementResult> {
        context.push_scope();
        let result = self.eval_statements(statements, context);
        context.pop_scope();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{parsers::parse_statement, parsers::tokens, Parser};
    use crate::eval::context::{ContextTemplate, State};
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (EvalResult<StatementResult>, ExecutionContext) {
        let tokens = tokens(source);
        let (pos, statement) = parse_statement().parse(&tokens, 0).unwrap();
        assert_eq!(pos, tokens.len());

        let mut context = ContextTemplate::default().instantiate(&[], State::new(), true);
        context.enter_function();
        let result = StatementEvaluator::default().eval_statement(&statement, &mut context);
        (result, context)
    }

    fn returned(value: Value) -> EvalResult<StatementResult> {
        Ok(StatementResult::Control(ControlFlow::Return(value)))
    }

    #[test]
    fn test_return() {
        assert_eq!(run("return 1 + 1;").0, returned(Value::Number(2.0)));
        assert_eq!(run("return;").0, returned(Value::Undefined));
    }

    #[test]
    fn test_block_stops_at_return() {
        let (result, _) = run("{ let a = 2; return a * 2; throw 'unreachable'; }");
        assert_eq!(result, returned(Value::Number(4.0)));
    }

    #[test]
    fn test_if_else_chain() {
        let source = "{ let age = 19; if (age > 20) { return 4; } else if (age > 18) return 92; else return 0; }";
        assert_eq!(run(source).0, returned(Value::Number(92.0)));
    }

    #[test]
    fn test_block_scope_is_dropped() {
        let (result, context) = run("{ let inner = 1; var outer = 2; }");
        assert_eq!(result, Ok(StatementResult::Value(Value::Undefined)));
        assert!(context.try_lookup("inner").is_none());
        assert_eq!(context.lookup("outer"), Ok(Value::Number(2.0)));
    }

    #[test]
    fn test_throw() {
        assert_eq!(
            run("throw 'too young';").0,
            Err(EvalError::Thrown(Value::string("too young")))
        );
        let (result, _) = run("{ const limit = 1; limit = 2; }");
        assert_eq!(
            result,
            Err(EvalError::type_error("Assignment to constant variable."))
        );
    }
}
