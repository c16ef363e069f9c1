use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::builtins::{self, js_pow};
use super::context::ExecutionContext;
use super::value::{number_to_string, PreferredType, Value};
use super::{EvalError, EvalResult};
use crate::ast::{self, BinaryOperator, Expression, UnaryOperator};

#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_expression(
        &self,
        expression: &Expression,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        match expression {
            Expression::Literal(literal) => Ok(self.eval_literal(literal)),
            Expression::Identifier(name) => context.lookup(name),
            Expression::This => Ok(context.this_value()),
            Expression::Array(items) => items
                .iter()
                .map(|item| self.eval_expression(item, context))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            Expression::Object(properties) => {
                let mut fields = BTreeMap::new();
                for (key, value) in properties {
                    let value = self.eval_expression(value, context)?;
                    fields.insert(key.clone(), value);
                }
                Ok(Value::Object(fields))
            }
            Expression::Member { object, property } => {
                self.eval_property(object, property, context)
            }
            Expression::Index { object, index } => {
                let key = self.eval_property_key(index, context)?;
                self.eval_property(object, &key, context)
            }
            Expression::Call { callee, arguments } => self.eval_call(callee, arguments, context),
            Expression::New { callee, arguments } => self.eval_new(callee, arguments, context),
            Expression::Unary { op, operand } => self.eval_unary(*op, operand, context),
            Expression::BinaryOp { op, left, right } => self.eval_binary(*op, left, right, context),
            Expression::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                if self.eval_expression(condition, context)?.is_truthy() {
                    self.eval_expression(consequent, context)
                } else {
                    self.eval_expression(alternative, context)
                }
            }
            Expression::Assign { target, op, value } => {
                let value = match op.binary_operator() {
                    None => self.eval_expression(value, context)?,
                    Some(binary) => {
                        let current = context.lookup(target)?;
                        let right = self.eval_expression(value, context)?;
                        binary_operation(binary, &current, &right)?
                    }
                };
                context.assign(target, value.clone())?;
                Ok(value)
            }
        }
    }

    fn eval_literal(&self, literal: &ast::Literal) -> Value {
        match literal {
            ast::Literal::Number(n) => Value::Number(*n),
            ast::Literal::String(s) => Value::String(s.clone()),
            ast::Literal::Boolean(b) => Value::Boolean(*b),
            ast::Literal::Null => Value::Null,
            ast::Literal::Undefined => Value::Undefined,
        }
    }

    fn eval_property_key(
        &self,
        index: &Expression,
        context: &mut ExecutionContext,
    ) -> EvalResult<String> {
        Ok(match self.eval_expression(index, context)? {
            Value::Number(n) => number_to_string(n),
            other => other.to_js_string(),
        })
    }

    /// Reads `object.key`; `this.key` reads caller state and built-ins.
    fn eval_property(
        &self,
        object: &Expression,
        key: &str,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        if let Expression::This = object {
            return Ok(context.lookup_this(key));
        }
        let receiver = self.eval_expression(object, context)?;
        read_property(&receiver, key)
    }

    fn eval_arguments(
        &self,
        arguments: &[Expression],
        context: &mut ExecutionContext,
    ) -> EvalResult<Vec<Value>> {
        arguments
            .iter()
            .map(|argument| self.eval_expression(argument, context))
            .collect()
    }

    fn eval_call(
        &self,
        callee: &Expression,
        arguments: &[Expression],
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        let (receiver, key) = match callee {
            Expression::Member { object, property } if **object != Expression::This => {
                (self.eval_expression(object, context)?, property.clone())
            }
            Expression::Index { object, index } if **object != Expression::This => {
                let receiver = self.eval_expression(object, context)?;
                (receiver, self.eval_property_key(index, context)?)
            }
            _ => {
                let function = self.eval_expression(callee, context)?;
                let args = self.eval_arguments(arguments, context)?;
                return call_function(&function, &args, callee);
            }
        };

        if receiver.is_nullish() {
            return Err(cannot_read(&receiver, &key));
        }
        let args = self.eval_arguments(arguments, context)?;
        match &receiver {
            Value::Object(_) | Value::Namespace(_) | Value::Function(_) => {
                let function = builtins::get_property(&receiver, &key);
                call_function(&function, &args, callee)
            }
            primitive => builtins::call_method(primitive, &key, &args)
                .unwrap_or_else(|| Err(not_a_function(callee))),
        }
    }

    fn eval_new(
        &self,
        callee: &Expression,
        arguments: &[Expression],
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        let constructor = self.eval_expression(callee, context)?;
        let args = self.eval_arguments(arguments, context)?;
        match constructor {
            Value::Function(function) => match function.construct {
                Some(construct) => construct(&args),
                None => Err(EvalError::type_error(format!(
                    "{} is not a constructor",
                    callee.describe()
                ))),
            },
            _ => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                callee.describe()
            ))),
        }
    }

    fn eval_unary(
        &self,
        op: UnaryOperator,
        operand: &Expression,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        // typeof tolerates undeclared names
        if let (UnaryOperator::Typeof, Expression::Identifier(name)) = (op, operand) {
            let type_name = context
                .try_lookup(name)
                .map_or("undefined", |value| value.type_of());
            return Ok(Value::string(type_name));
        }
        let value = self.eval_expression(operand, context)?;
        Ok(match op {
            UnaryOperator::Not => Value::Boolean(!value.is_truthy()),
            UnaryOperator::Negate => Value::Number(-value.to_number()),
            UnaryOperator::Plus => Value::Number(value.to_number()),
            UnaryOperator::Typeof => Value::string(value.type_of()),
        })
    }

    fn eval_binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        context: &mut ExecutionContext,
    ) -> EvalResult<Value> {
        let left = self.eval_expression(left, context)?;
        match op {
            BinaryOperator::And if !left.is_truthy() => Ok(left),
            BinaryOperator::Or if left.is_truthy() => Ok(left),
            BinaryOperator::Nullish if !left.is_nullish() => Ok(left),
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Nullish => {
                self.eval_expression(right, context)
            }
            _ => {
                let right = self.eval_expression(right, context)?;
                binary_operation(op, &left, &right)
            }
        }
    }
}

/// Applies a non-short-circuit binary operator to two evaluated operands.
pub fn binary_operation(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    let number = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    Ok(match op {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => number(|a, b| a - b),
        BinaryOperator::Multiply => number(|a, b| a * b),
        BinaryOperator::Divide => number(|a, b| a / b),
        BinaryOperator::Modulo => number(|a, b| a % b),
        BinaryOperator::Power => number(js_pow),
        BinaryOperator::Equal => Value::Boolean(left.loose_equals(right)),
        BinaryOperator::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinaryOperator::StrictEqual => Value::Boolean(left.strict_equals(right)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!left.strict_equals(right)),
        BinaryOperator::LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOperator::GreaterThan => {
            Value::Boolean(compare(left, right) == Some(Ordering::Greater))
        }
        BinaryOperator::LessThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Nullish => {
            return Err(EvalError::type_error(format!(
                "operator {} cannot be applied to evaluated operands",
                op
            )))
        }
    })
}

/// `+`: string concatenation when either primitive operand is a string.
fn add(left: &Value, right: &Value) -> Value {
    let left = left.to_primitive(PreferredType::Default);
    let right = right.to_primitive(PreferredType::Default);
    match (&left, &right) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            Value::String(left.to_js_string() + &right.to_js_string())
        }
        _ => Value::Number(left.to_number() + right.to_number()),
    }
}

/// Relational comparison. `None` when either side is `NaN`.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    let left = left.to_primitive(PreferredType::Number);
    let right = right.to_primitive(PreferredType::Number);
    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn read_property(receiver: &Value, key: &str) -> EvalResult<Value> {
    if receiver.is_nullish() {
        return Err(cannot_read(receiver, key));
    }
    Ok(builtins::get_property(receiver, key))
}

fn call_function(function: &Value, args: &[Value], callee: &Expression) -> EvalResult<Value> {
    match function {
        Value::Function(function) => (function.call)(args),
        _ => Err(not_a_function(callee)),
    }
}

fn cannot_read(receiver: &Value, key: &str) -> EvalError {
    EvalError::type_error(format!(
        "Cannot read properties of {} (reading '{}')",
        receiver.to_js_string(),
        key
    ))
}

fn not_a_function(callee: &Expression) -> EvalError {
    EvalError::type_error(format!("{} is not a function", callee.describe()))
}
