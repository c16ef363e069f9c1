use tracing::{trace, warn};

use super::{
    context::ExecutionContext,
    statement::{ControlFlow, StatementEvaluator, StatementResult},
    value::Value,
    EvalResult,
};
use crate::ast::FunctionBody;
use crate::coerce::coerce;
use crate::compiler::CompiledScript;

#[derive(Default)]
pub struct Evaluator {
    statement_evaluator: StatementEvaluator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes a body as a zero-argument function; its `return` value is the result.
    pub fn eval_function_body(
        &self,
        body: &FunctionBody,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        context.enter_function();
        let result = self
            .statement_evaluator
            .eval_statements(&body.statements, context);
        context.exit_function();

        match result? {
            StatementResult::Control(ControlFlow::Return(value)) => Ok(value),
            StatementResult::Value(_) => Ok(Value::Undefined),
        }
    }

    /// Top level entry point: runs every step of the script in order.
    ///
    /// The first failing step ends the run with its message in the error slot;
    /// results of later steps stay `null`.
    #[tracing::instrument(level = "debug", skip_all, fields(steps = script.steps().len()))]
    pub fn run_script(&self, script: &CompiledScript, context: &mut ExecutionContext) {
        for step in script.steps() {
            match self.eval_function_body(&step.body, context) {
                Ok(value) => {
                    trace!(variable = %step.name, %value, "calculated");
                    context.set_binding(&step.name, value.clone());
                    context.set_result(&step.name, coerce(value, &step.variable_type));
                }
                Err(error) => {
                    warn!(variable = %step.name, %error, "calculation failed");
                    context.set_error(error.message());
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::{VariableDefinition, VariableType};
    use crate::eval::context::{ContextTemplate, State};
    use pretty_assertions::assert_eq;

    fn run(variables: &[VariableDefinition], state: State) -> ExecutionContext {
        let script = compile(variables, false).unwrap();
        let template = ContextTemplate::build(variables);
        let mut context = template.instantiate(script.declarations(), state, true);
        Evaluator::new().run_script(&script, &mut context);
        context
    }

    #[test]
    fn test_sibling_bindings_hold_uncoerced_values() {
        let context = run(
            &[
                VariableDefinition::new("text", "return '4';", VariableType::String),
                VariableDefinition::new("twice", "return text + text;", VariableType::Number),
            ],
            State::new(),
        );
        assert_eq!(context.calculations()["text"], Value::string("4"));
        assert_eq!(context.calculations()["twice"], Value::Number(44.0));
        assert_eq!(context.error(), "");
    }

    #[test]
    fn test_failure_skips_remaining_steps() {
        let context = run(
            &[
                VariableDefinition::new("a", "return 1;", VariableType::Number),
                VariableDefinition::new("b", "return missing + 1;", VariableType::Number),
                VariableDefinition::new("c", "return 3;", VariableType::Number),
            ],
            State::new(),
        );
        assert_eq!(context.calculations()["a"], Value::Number(1.0));
        assert_eq!(context.calculations()["b"], Value::Null);
        assert_eq!(context.calculations()["c"], Value::Null);
        assert_eq!(context.error(), "missing is not defined");
    }

    #[test]
    fn test_body_without_return_is_undefined() {
        let context = run(
            &[VariableDefinition::new("a", "let x = 1;", VariableType::Untyped)],
            State::new(),
        );
        assert_eq!(context.calculations()["a"], Value::Undefined);
    }

    #[test]
    fn test_locals_do_not_leak_between_bodies() {
        let context = run(
            &[
                VariableDefinition::new("a", "let local = 1; return local;", VariableType::Number),
                VariableDefinition::new("b", "return typeof local;", VariableType::String),
            ],
            State::new(),
        );
        assert_eq!(context.calculations()["b"], Value::string("undefined"));
    }
}
