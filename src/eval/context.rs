//! Execution environment of a calculation run.
//!
//! [`ContextTemplate`] is built once per configuration: the results map with
//! every variable name set to `null` and an empty error slot. Each invocation
//! turns it into a fresh [`ExecutionContext`] that also owns a copy of the
//! caller's state, so nothing leaks between invocations.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::builtins;
use super::value::Value;
use super::{EvalError, EvalResult};
use crate::ast::DeclarationKind;
use crate::config::VariableDefinition;

/// Caller-supplied input values, keyed by name.
pub type State = BTreeMap<String, Value>;

/// Name under which calculation bodies see the results map and error slot.
pub const GLOBAL_NAME: &str = "_global";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextTemplate {
    calculations: BTreeMap<String, Value>,
    error: String,
}

impl ContextTemplate {
    /// One `null` entry per distinct variable name.
    pub fn build(variables: &[VariableDefinition]) -> Self {
        let calculations = variables
            .iter()
            .map(|variable| (variable.variable_name.clone(), Value::Null))
            .collect();
        Self {
            calculations,
            error: String::new(),
        }
    }

    pub fn calculations(&self) -> &BTreeMap<String, Value> {
        &self.calculations
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// Creates the environment of one invocation.
    ///
    /// `declarations` become sibling bindings initialized to `undefined`.
    pub fn instantiate(&self, declarations: &[String], state: State, builtins: bool) -> ExecutionContext {
        ExecutionContext {
            bindings: declarations
                .iter()
                .map(|name| (name.clone(), Value::Undefined))
                .collect(),
            calculations: self.calculations.clone(),
            error: self.error.clone(),
            state,
            builtins,
            scopes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

type Scope = HashMap<String, Binding>;

/// Environment record of one invocation.
///
/// Names resolve innermost first: block and function scopes of the running
/// body, sibling variable bindings, `_global`, caller state, built-ins.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    bindings: BTreeMap<String, Value>,
    calculations: BTreeMap<String, Value>,
    error: String,
    state: State,
    builtins: bool,
    scopes: Vec<Scope>,
}

impl ExecutionContext {
    pub fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.try_lookup(name)
            .ok_or_else(|| EvalError::not_defined(name))
    }

    pub fn try_lookup(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Some(binding.value.clone());
        }
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        if name == GLOBAL_NAME {
            return Some(self.global_view());
        }
        self.lookup_global(name)
    }

    /// `this.<key>`: caller state, then built-ins.
    pub fn lookup_this(&self, key: &str) -> Value {
        self.lookup_global(key).unwrap_or_default()
    }

    fn lookup_global(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.state.get(name) {
            return Some(value.clone());
        }
        if self.builtins {
            return builtins::lookup(name).cloned();
        }
        None
    }

    /// The value of a bare `this`: the caller state as an object.
    pub fn this_value(&self) -> Value {
        Value::Object(self.state.clone())
    }

    /// `{ calculations, error }` as seen through `_global`.
    pub fn global_view(&self) -> Value {
        let mut view = BTreeMap::new();
        view.insert(
            "calculations".to_string(),
            Value::Object(self.calculations.clone()),
        );
        view.insert("error".to_string(), Value::String(self.error.clone()));
        Value::Object(view)
    }

    pub fn assign(&mut self, name: &str, value: Value) -> EvalResult<()> {
        if let Some(binding) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            if binding.constant {
                return Err(EvalError::type_error("Assignment to constant variable."));
            }
            binding.value = value;
            return Ok(());
        }
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        if let Some(slot) = self.state.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        if name == GLOBAL_NAME || (self.builtins && builtins::lookup(name).is_some()) {
            return Err(EvalError::type_error(format!(
                "Cannot assign to read only property '{}'",
                name
            )));
        }
        Err(EvalError::not_defined(name))
    }

    /// Declares a local. `var` is function scoped, `let` and `const` block scoped.
    pub fn declare(&mut self, kind: DeclarationKind, name: &str, value: Option<Value>) {
        trace!(%kind, variable = name, "declare");
        let scope = match kind {
            DeclarationKind::Var => self.scopes.first_mut(),
            DeclarationKind::Let | DeclarationKind::Const => self.scopes.last_mut(),
        };
        let Some(scope) = scope else {
            return;
        };
        if kind == DeclarationKind::Var && value.is_none() && scope.contains_key(name) {
            return;
        }
        scope.insert(
            name.to_string(),
            Binding {
                value: value.unwrap_or_default(),
                constant: kind == DeclarationKind::Const,
            },
        );
    }

    /// Starts a body invocation with its own empty function scope.
    pub fn enter_function(&mut self) {
        self.scopes = vec![Scope::new()];
    }

    pub fn exit_function(&mut self) {
        self.scopes.clear();
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        // the function scope is dropped by `exit_function`
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Assigns a sibling variable binding.
    pub fn set_binding(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn set_result(&mut self, name: &str, value: Value) {
        self.calculations.insert(name.to_string(), value);
    }

    pub fn set_error<S: Into<String>>(&mut self, message: S) {
        self.error = message.into();
    }

    pub fn calculations(&self) -> &BTreeMap<String, Value> {
        &self.calculations
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// Consumes the context, returning the results map and the error slot.
    pub fn into_results(self) -> (BTreeMap<String, Value>, String) {
        (self.calculations, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariableType;
    use pretty_assertions::assert_eq;

    fn template() -> ContextTemplate {
        ContextTemplate::build(&[
            VariableDefinition::new("a", "return 1;", VariableType::Number),
            VariableDefinition::new("b", "return 2;", VariableType::Untyped),
            VariableDefinition::new("a", "return 3;", VariableType::Number),
        ])
    }

    fn context(state: State) -> ExecutionContext {
        template().instantiate(&["a".to_string(), "b".to_string()], state, true)
    }

    #[test]
    fn test_template_initializes_results_to_null() {
        let template = template();
        assert_eq!(template.calculations().len(), 2);
        assert!(template.calculations().values().all(|v| *v == Value::Null));
        assert_eq!(template.error(), "");
    }

    #[test]
    fn test_resolution_order() {
        let mut state = State::new();
        state.insert("age".to_string(), Value::Number(21.0));
        state.insert("a".to_string(), Value::string("shadowed"));
        state.insert("Math".to_string(), Value::string("mine"));
        let mut ctx = context(state);

        // sibling bindings shadow state, state shadows built-ins
        assert_eq!(ctx.lookup("a"), Ok(Value::Undefined));
        assert_eq!(ctx.lookup("age"), Ok(Value::Number(21.0)));
        assert_eq!(ctx.lookup("Math"), Ok(Value::string("mine")));
        assert!(matches!(ctx.lookup("numeric"), Ok(Value::Namespace(_))));
        assert_eq!(
            ctx.lookup("missing"),
            Err(EvalError::not_defined("missing"))
        );

        ctx.enter_function();
        ctx.declare(DeclarationKind::Let, "age", Some(Value::Number(1.0)));
        assert_eq!(ctx.lookup("age"), Ok(Value::Number(1.0)));
        assert_eq!(ctx.lookup_this("age"), Value::Number(21.0));
        assert_eq!(ctx.lookup_this("missing"), Value::Undefined);
        ctx.exit_function();
        assert_eq!(ctx.lookup("age"), Ok(Value::Number(21.0)));
    }

    #[test]
    fn test_assignment_rules() {
        let mut ctx = context(State::new());
        ctx.enter_function();
        ctx.declare(DeclarationKind::Const, "limit", Some(Value::Number(65.0)));
        assert_eq!(
            ctx.assign("limit", Value::Number(1.0)),
            Err(EvalError::type_error("Assignment to constant variable."))
        );
        assert!(ctx.assign("b", Value::Number(2.0)).is_ok());
        assert_eq!(ctx.lookup("b"), Ok(Value::Number(2.0)));
        assert_eq!(
            ctx.assign("undeclared", Value::Null),
            Err(EvalError::not_defined("undeclared"))
        );
        assert!(matches!(
            ctx.assign("Math", Value::Null),
            Err(EvalError::TypeError(_))
        ));
    }

    #[test]
    fn test_block_scopes() {
        let mut ctx = context(State::new());
        ctx.enter_function();
        ctx.push_scope();
        ctx.declare(DeclarationKind::Let, "inner", Some(Value::Number(1.0)));
        ctx.declare(DeclarationKind::Var, "hoisted", Some(Value::Number(2.0)));
        ctx.pop_scope();
        assert!(ctx.try_lookup("inner").is_none());
        assert_eq!(ctx.lookup("hoisted"), Ok(Value::Number(2.0)));
    }

    #[test]
    fn test_global_view() {
        let mut ctx = context(State::new());
        ctx.set_result("a", Value::Number(4.0));
        ctx.set_error("boom");
        let view = ctx.lookup(GLOBAL_NAME).unwrap();
        match view {
            Value::Object(fields) => {
                assert_eq!(fields["error"], Value::string("boom"));
                match &fields["calculations"] {
                    Value::Object(calculations) => {
                        assert_eq!(calculations["a"], Value::Number(4.0));
                        assert_eq!(calculations["b"], Value::Null);
                    }
                    other => panic!("unexpected calculations {:?}", other),
                }
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_builtins_can_be_disabled() {
        let ctx = template().instantiate(&[], State::new(), false);
        assert!(ctx.lookup("Math").is_err());
    }
}
