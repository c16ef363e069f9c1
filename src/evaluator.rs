//! # Evaluator Factory
//!
//! [`CalculationEvaluator`] is built once per configuration and evaluated any
//! number of times. Each call gets its own [`ExecutionContext`] cloned from the
//! template and seeded with a copy of the caller's state, so calls are
//! independent and the evaluator can be shared between threads.
//!
//! ```text
//! Initialized → Running → Completed
//!                      ↘ Faulted (error slot set, remaining results null)
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::compiler::{compile, CompileError, CompiledScript};
use crate::config::{Configuration, EngineConfig};
use crate::eval::{
    context::{ContextTemplate, ExecutionContext, State},
    evaluator::Evaluator,
    value::Value,
};
use crate::unflatten::unflatten;

/// `type` of every [`ResultRecord`].
pub const RECORD_TYPE: &str = "Calculations";

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    /// Module identifier.
    pub name: String,
    /// Configuration name.
    pub segment: String,
    pub calculations: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured form of a captured runtime failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationFault {
    pub code: String,
    pub message: String,
}

impl ResultRecord {
    pub fn is_faulted(&self) -> bool {
        self.error.is_some()
    }

    pub fn fault(&self) -> Option<CalculationFault> {
        self.error.as_ref().map(|message| CalculationFault {
            code: String::new(),
            message: message.clone(),
        })
    }

    /// Reads one computed value, `None` when the name is not a result key.
    pub fn calculation(&self, name: &str) -> Option<&Value> {
        match &self.calculations {
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }
}

pub struct CalculationEvaluator {
    module_name: String,
    segment: String,
    template: ContextTemplate,
    script: CompiledScript,
    builtins: bool,
    evaluator: Evaluator,
}

impl CalculationEvaluator {
    /// Compiles `configuration` with the default engine settings.
    pub fn create<S: Into<String>>(
        configuration: &Configuration,
        module_name: S,
    ) -> Result<Self, CompileError> {
        let config = EngineConfig::default().with_module_name(module_name);
        Self::create_with_config(configuration, &config)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(segment = %configuration.name))]
    pub fn create_with_config(
        configuration: &Configuration,
        config: &EngineConfig,
    ) -> Result<Self, CompileError> {
        let script = compile(&configuration.variables, config.reject_duplicate_variables)?;
        let template = ContextTemplate::build(&configuration.variables);
        debug!(
            module = %config.module_name,
            variables = script.declarations().len(),
            "evaluator created"
        );
        Ok(Self {
            module_name: config.module_name.clone(),
            segment: configuration.name.clone(),
            template,
            script,
            builtins: config.builtins,
            evaluator: Evaluator::new(),
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn script(&self) -> &CompiledScript {
        &self.script
    }

    /// Runs every calculation against a copy of `state`.
    #[tracing::instrument(level = "debug", skip_all, fields(segment = %self.segment))]
    pub fn evaluate(&self, state: &State) -> ResultRecord {
        let mut context = self.context(state.clone());
        self.evaluator.run_script(&self.script, &mut context);
        let (calculations, error) = context.into_results();

        ResultRecord {
            record_type: RECORD_TYPE.to_string(),
            name: self.module_name.clone(),
            segment: self.segment.clone(),
            calculations: unflatten(&calculations),
            error: (!error.is_empty()).then_some(error),
        }
    }

    /// [`evaluate`](Self::evaluate) for a JSON state. Anything but an object is
    /// treated as an empty state.
    pub fn evaluate_json(&self, state: &serde_json::Value) -> ResultRecord {
        let state = match Value::from_json(state) {
            Value::Object(fields) => fields,
            other => {
                warn!(state_type = other.type_of(), "state is not an object, using an empty state");
                State::new()
            }
        };
        self.evaluate(&state)
    }

    fn context(&self, state: State) -> ExecutionContext {
        self.template
            .instantiate(self.script.declarations(), state, self.builtins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VariableDefinition, VariableType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn configuration(variables: Vec<VariableDefinition>) -> Configuration {
        Configuration::new("retirement", variables)
    }

    #[test]
    fn test_empty_configuration() {
        let evaluator = CalculationEvaluator::create(&configuration(vec![]), "1").unwrap();
        let record = evaluator.evaluate_json(&json!({"age": 21}));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "Calculations", "name": "1", "segment": "retirement", "calculations": {}})
        );
        assert_eq!(record.fault(), None);
    }

    #[test]
    fn test_fault_is_captured() {
        let evaluator = CalculationEvaluator::create(
            &configuration(vec![VariableDefinition::new(
                "calc_number_four",
                "return predicted_life_span - age;",
                VariableType::Number,
            )]),
            "1",
        )
        .unwrap();

        let record = evaluator.evaluate_json(&json!({"age": 21, "predicted_life_span": 79}));
        assert_eq!(record.calculation("calc_number_four"), Some(&Value::Number(58.0)));

        let record = evaluator.evaluate_json(&json!({"age": 21}));
        assert_eq!(record.calculation("calc_number_four"), Some(&Value::Null));
        assert_eq!(
            record.fault(),
            Some(CalculationFault {
                code: String::new(),
                message: "predicted_life_span is not defined".to_string(),
            })
        );
    }

    #[test]
    fn test_state_is_not_mutated() {
        let evaluator = CalculationEvaluator::create(
            &configuration(vec![VariableDefinition::new(
                "older",
                "age += 1; return age;",
                VariableType::Number,
            )]),
            "1",
        )
        .unwrap();
        let mut state = State::new();
        state.insert("age".to_string(), Value::Number(21.0));

        let first = evaluator.evaluate(&state);
        let second = evaluator.evaluate(&state);
        assert_eq!(first, second);
        assert_eq!(first.calculation("older"), Some(&Value::Number(22.0)));
        assert_eq!(state["age"], Value::Number(21.0));
    }

    #[test]
    fn test_non_object_state() {
        let evaluator = CalculationEvaluator::create(
            &configuration(vec![VariableDefinition::new(
                "x",
                "return typeof age;",
                VariableType::Untyped,
            )]),
            "1",
        )
        .unwrap();
        let record = evaluator.evaluate_json(&json!([1, 2]));
        assert_eq!(record.calculation("x"), Some(&Value::string("undefined")));
    }

    #[test]
    fn test_builtins_can_be_disabled() {
        let config = EngineConfig {
            builtins: false,
            ..EngineConfig::default()
        };
        let evaluator = CalculationEvaluator::create_with_config(
            &configuration(vec![VariableDefinition::new(
                "x",
                "return Math.max(1, 2);",
                VariableType::Number,
            )]),
            &config,
        )
        .unwrap();
        let record = evaluator.evaluate(&State::new());
        assert_eq!(record.error.as_deref(), Some("Math is not defined"));
        assert_eq!(record.name, "calculations");
    }

    #[test]
    fn test_evaluator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CalculationEvaluator>();
    }
}
