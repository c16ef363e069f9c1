//! # Built-in Library
//!
//! Read-only values shared by every evaluation:
//!
//! * `numeric`: element-wise vector and matrix helpers
//! * `Math`: the usual mathematical functions and constants
//! * globals: `Number`, `String`, `Boolean`, `Date`, `Error`, `parseInt`, `parseFloat`,
//!   `isNaN`, `isFinite`, `NaN`, `Infinity`
//!
//! plus the methods available on primitive values (`"abc".toUpperCase()`,
//! `(1.5).toFixed(2)`, `[1, 2].join("-")`, `date.getFullYear()`).
//!
//! There is no clock and no randomness. `new Date()` needs an explicit time
//! value and `Math.random` does not exist.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use super::value::{
    date_from_millis, date_to_string, number_to_string, string_to_number, Namespace,
    NativeFunction, Value,
};
use super::{EvalError, EvalResult};
use crate::coerce::to_date;

static UNDEFINED: Value = Value::Undefined;

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&UNDEFINED)
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    arg(args, index).to_number()
}

/// Integer conversion used for indices and digit counts: `NaN` is `0`.
fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

fn function(name: &'static str, call: super::value::NativeFn) -> Value {
    Value::Function(NativeFunction::new(name, call))
}

/// `Math.round`: halves round towards positive infinity.
pub fn js_round(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Exponentiation as `**` defines it: `NaN` exponents and `(±1) ** ±Infinity`
/// are `NaN`.
pub fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn js_sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else {
        x.signum()
    }
}

// Math

macro_rules! math_unary {
    ($fname:ident, $op:expr) => {
        fn $fname(args: &[Value]) -> EvalResult<Value> {
            let op: fn(f64) -> f64 = $op;
            Ok(Value::Number(op(number_arg(args, 0))))
        }
    };
}

math_unary!(math_abs, f64::abs);
math_unary!(math_ceil, f64::ceil);
math_unary!(math_floor, f64::floor);
math_unary!(math_round, js_round);
math_unary!(math_trunc, f64::trunc);
math_unary!(math_sign, js_sign);
math_unary!(math_sqrt, f64::sqrt);
math_unary!(math_cbrt, f64::cbrt);
math_unary!(math_exp, f64::exp);
math_unary!(math_log, f64::ln);
math_unary!(math_log10, f64::log10);
math_unary!(math_log2, f64::log2);
math_unary!(math_sin, f64::sin);
math_unary!(math_cos, f64::cos);
math_unary!(math_tan, f64::tan);

fn math_pow(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(js_pow(number_arg(args, 0), number_arg(args, 1))))
}

fn math_min(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(args.iter().map(Value::to_number).fold(
        f64::INFINITY,
        |acc, n| if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.min(n) },
    )))
}

fn math_max(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(args.iter().map(Value::to_number).fold(
        f64::NEG_INFINITY,
        |acc, n| if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.max(n) },
    )))
}

fn math_hypot(args: &[Value]) -> EvalResult<Value> {
    let numbers: Vec<f64> = args.iter().map(Value::to_number).collect();
    if numbers.iter().any(|n| n.is_infinite()) {
        return Ok(Value::Number(f64::INFINITY));
    }
    Ok(Value::Number(numbers.iter().map(|n| n * n).sum::<f64>().sqrt()))
}

// numeric

fn numbers_of(value: &Value, out: &mut Vec<f64>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| numbers_of(item, out)),
        other => out.push(other.to_number()),
    }
}

fn flatten(value: &Value) -> Vec<f64> {
    let mut out = Vec::new();
    numbers_of(value, &mut out);
    out
}

fn map_elementwise(value: &Value, op: fn(f64) -> f64) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| map_elementwise(v, op)).collect()),
        other => Value::Number(op(other.to_number())),
    }
}

/// Applies `op` pairwise; a scalar on either side is broadcast.
fn zip_elementwise(left: &Value, right: &Value, op: fn(f64, f64) -> f64) -> EvalResult<Value> {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::range(format!(
                    "numeric: dimension mismatch ({} vs {})",
                    a.len(),
                    b.len()
                )));
            }
            a.iter()
                .zip(b)
                .map(|(x, y)| zip_elementwise(x, y, op))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array)
        }
        (Value::Array(a), scalar) => a
            .iter()
            .map(|x| zip_elementwise(x, scalar, op))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Array),
        (scalar, Value::Array(b)) => b
            .iter()
            .map(|y| zip_elementwise(scalar, y, op))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Array),
        (x, y) => Ok(Value::Number(op(x.to_number(), y.to_number()))),
    }
}

fn fold_elementwise(args: &[Value], op: fn(f64, f64) -> f64) -> EvalResult<Value> {
    let (first, rest) = match args.split_first() {
        Some(split) => split,
        None => return Ok(Value::Number(f64::NAN)),
    };
    rest.iter()
        .try_fold(first.clone(), |acc, next| zip_elementwise(&acc, next, op))
}

macro_rules! numeric_unary {
    ($fname:ident, $op:expr) => {
        fn $fname(args: &[Value]) -> EvalResult<Value> {
            Ok(map_elementwise(arg(args, 0), $op))
        }
    };
}

macro_rules! numeric_binary {
    ($fname:ident, $op:expr) => {
        fn $fname(args: &[Value]) -> EvalResult<Value> {
            fold_elementwise(args, $op)
        }
    };
}

numeric_unary!(numeric_abs, f64::abs);
numeric_unary!(numeric_round, js_round);
numeric_unary!(numeric_floor, f64::floor);
numeric_unary!(numeric_ceil, f64::ceil);
numeric_unary!(numeric_sqrt, f64::sqrt);
numeric_unary!(numeric_exp, f64::exp);
numeric_unary!(numeric_log, f64::ln);

numeric_binary!(numeric_add, |a, b| a + b);
numeric_binary!(numeric_sub, |a, b| a - b);
numeric_binary!(numeric_mul, |a, b| a * b);
numeric_binary!(numeric_div, |a, b| a / b);
numeric_binary!(numeric_pow, js_pow);

fn numeric_sum(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(flatten(arg(args, 0)).iter().sum()))
}

fn numeric_prod(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(flatten(arg(args, 0)).iter().product()))
}

fn numeric_norm2(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(
        flatten(arg(args, 0)).iter().map(|n| n * n).sum::<f64>().sqrt(),
    ))
}

fn numeric_sup(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(flatten(arg(args, 0)).into_iter().fold(
        f64::NEG_INFINITY,
        |acc, n| if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.max(n) },
    )))
}

fn numeric_inf(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(flatten(arg(args, 0)).into_iter().fold(
        f64::INFINITY,
        |acc, n| if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.min(n) },
    )))
}

fn rank(value: &Value) -> usize {
    match value {
        Value::Array(items) => match items.first() {
            Some(Value::Array(_)) => 2,
            _ => 1,
        },
        _ => 0,
    }
}

fn as_vector(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(items) => items.iter().map(Value::to_number).collect(),
        other => vec![other.to_number()],
    }
}

fn as_matrix(value: &Value) -> Vec<Vec<f64>> {
    match value {
        Value::Array(rows) => rows.iter().map(as_vector).collect(),
        other => vec![vec![other.to_number()]],
    }
}

fn dimension_mismatch(left: usize, right: usize) -> EvalError {
    EvalError::range(format!("numeric: dimension mismatch ({} vs {})", left, right))
}

fn dot_vectors(a: &[f64], b: &[f64]) -> EvalResult<f64> {
    if a.len() != b.len() {
        return Err(dimension_mismatch(a.len(), b.len()));
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

fn column(matrix: &[Vec<f64>], index: usize) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.get(index).copied().unwrap_or(f64::NAN))
        .collect()
}

fn numbers(values: Vec<f64>) -> Value {
    Value::Array(values.into_iter().map(Value::Number).collect())
}

/// Inner product: vector·vector, matrix·vector, vector·matrix, matrix·matrix.
fn numeric_dot(args: &[Value]) -> EvalResult<Value> {
    let (left, right) = (arg(args, 0), arg(args, 1));
    match (rank(left), rank(right)) {
        (0, _) | (_, 0) => zip_elementwise(left, right, |a, b| a * b),
        (1, 1) => Ok(Value::Number(dot_vectors(&as_vector(left), &as_vector(right))?)),
        (2, 1) => {
            let vector = as_vector(right);
            as_matrix(left)
                .iter()
                .map(|row| dot_vectors(row, &vector))
                .collect::<EvalResult<Vec<_>>>()
                .map(numbers)
        }
        (1, 2) => {
            let vector = as_vector(left);
            let matrix = as_matrix(right);
            if vector.len() != matrix.len() {
                return Err(dimension_mismatch(vector.len(), matrix.len()));
            }
            let columns = matrix.first().map_or(0, Vec::len);
            (0..columns)
                .map(|j| dot_vectors(&vector, &column(&matrix, j)))
                .collect::<EvalResult<Vec<_>>>()
                .map(numbers)
        }
        _ => {
            let a = as_matrix(left);
            let b = as_matrix(right);
            let columns = b.first().map_or(0, Vec::len);
            a.iter()
                .map(|row| {
                    (0..columns)
                        .map(|j| dot_vectors(row, &column(&b, j)))
                        .collect::<EvalResult<Vec<_>>>()
                        .map(numbers)
                })
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array)
        }
    }
}

/// `linspace(a, b, n)`: `n` evenly spaced points from `a` to `b` inclusive.
fn numeric_linspace(args: &[Value]) -> EvalResult<Value> {
    let (start, end) = (number_arg(args, 0), number_arg(args, 1));
    let count = match arg(args, 2) {
        Value::Undefined => (js_round(end - start) + 1.0).max(1.0),
        other => to_integer(other.to_number()),
    };
    if !count.is_finite() || count > 1e7 {
        return Err(EvalError::range("numeric.linspace: invalid point count"));
    }
    if count < 2.0 {
        return Ok(if count == 1.0 {
            numbers(vec![start])
        } else {
            Value::Array(vec![])
        });
    }
    let count = count as usize;
    let step = (end - start) / (count - 1) as f64;
    Ok(numbers(
        (0..count).map(|i| start + step * i as f64).collect(),
    ))
}

// globals

fn global_number(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(match args.first() {
        Some(value) => value.to_number(),
        None => 0.0,
    }))
}

fn global_string(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(
        args.first().map(Value::to_js_string).unwrap_or_default(),
    ))
}

fn global_boolean(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Boolean(arg(args, 0).is_truthy()))
}

fn global_is_nan(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Boolean(number_arg(args, 0).is_nan()))
}

fn global_is_finite(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Boolean(number_arg(args, 0).is_finite()))
}

/// `Error(message)` and `new Error(message)` build `{ message }`.
fn error_construct(args: &[Value]) -> EvalResult<Value> {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        value => value.to_js_string(),
    };
    let mut fields = BTreeMap::new();
    fields.insert("message".to_string(), Value::String(message));
    Ok(Value::Object(fields))
}

lazy_static! {
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^[+-]?(Infinity|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)")
            .expect("float prefix pattern is valid");
}

fn global_parse_float(args: &[Value]) -> EvalResult<Value> {
    let text = arg(args, 0).to_js_string();
    let text = text.trim_start();
    Ok(Value::Number(
        FLOAT_PREFIX
            .find(text)
            .map(|m| string_to_number(m.as_str()))
            .unwrap_or(f64::NAN),
    ))
}

fn global_parse_int(args: &[Value]) -> EvalResult<Value> {
    let text = arg(args, 0).to_js_string();
    let mut text = text.trim_start();
    let negative = text.starts_with('-');
    if negative || text.starts_with('+') {
        text = &text[1..];
    }

    let mut radix = to_integer(number_arg(args, 1)) as u32;
    if radix == 0 || radix == 16 {
        if let Some(stripped) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            text = stripped;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }

    let digits: Vec<u32> = text.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let magnitude = digits
        .iter()
        .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(*digit));
    Ok(Value::Number(if negative { -magnitude } else { magnitude }))
}

fn invalid_date() -> EvalError {
    EvalError::range("Invalid time value")
}

/// `new Date(value)` or `new Date(year, monthIndex[, day, hours, minutes, seconds, ms])`.
///
/// Component forms are interpreted in UTC.
fn date_construct(args: &[Value]) -> EvalResult<Value> {
    match args {
        [] => Err(EvalError::range("Date requires an explicit time value")),
        [value] => to_date(value).map(Value::Date).ok_or_else(invalid_date),
        components => {
            let part = |index: usize, default: f64| match components.get(index) {
                Some(value) => value.to_number(),
                None => default,
            };
            let fields = [
                part(0, f64::NAN),
                part(1, 0.0),
                part(2, 1.0),
                part(3, 0.0),
                part(4, 0.0),
                part(5, 0.0),
                part(6, 0.0),
            ];
            if fields.iter().any(|n| !n.is_finite()) {
                return Err(invalid_date());
            }
            let [year, month, day, hours, minutes, seconds, millis] = fields.map(f64::trunc);
            let year = if (0.0..=99.0).contains(&year) {
                1900.0 + year
            } else {
                year
            };
            let total_months = year * 12.0 + month;
            let first_of_month = NaiveDate::from_ymd_opt(
                (total_months / 12.0).floor() as i32,
                total_months.rem_euclid(12.0) as u32 + 1,
                1,
            )
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid_date)?;
            let ms = first_of_month.and_utc().timestamp_millis() as f64
                + (day - 1.0) * 86_400_000.0
                + hours * 3_600_000.0
                + minutes * 60_000.0
                + seconds * 1_000.0
                + millis;
            date_from_millis(ms).map(Value::Date).ok_or_else(invalid_date)
        }
    }
}

/// `Date(...)` without `new` renders the constructed date as a string.
fn date_call(args: &[Value]) -> EvalResult<Value> {
    date_construct(args).map(|date| Value::String(date.to_js_string()))
}

lazy_static! {
    static ref NUMERIC: Namespace = Namespace::new(
        "numeric",
        vec![
            ("sum", function("sum", numeric_sum)),
            ("prod", function("prod", numeric_prod)),
            ("add", function("add", numeric_add)),
            ("sub", function("sub", numeric_sub)),
            ("mul", function("mul", numeric_mul)),
            ("div", function("div", numeric_div)),
            ("abs", function("abs", numeric_abs)),
            ("round", function("round", numeric_round)),
            ("floor", function("floor", numeric_floor)),
            ("ceil", function("ceil", numeric_ceil)),
            ("sqrt", function("sqrt", numeric_sqrt)),
            ("exp", function("exp", numeric_exp)),
            ("log", function("log", numeric_log)),
            ("pow", function("pow", numeric_pow)),
            ("dot", function("dot", numeric_dot)),
            ("norm2", function("norm2", numeric_norm2)),
            ("sup", function("sup", numeric_sup)),
            ("inf", function("inf", numeric_inf)),
            ("linspace", function("linspace", numeric_linspace)),
        ],
    );
    static ref MATH: Namespace = Namespace::new(
        "Math",
        vec![
            ("abs", function("abs", math_abs)),
            ("ceil", function("ceil", math_ceil)),
            ("floor", function("floor", math_floor)),
            ("round", function("round", math_round)),
            ("trunc", function("trunc", math_trunc)),
            ("sign", function("sign", math_sign)),
            ("sqrt", function("sqrt", math_sqrt)),
            ("cbrt", function("cbrt", math_cbrt)),
            ("pow", function("pow", math_pow)),
            ("exp", function("exp", math_exp)),
            ("log", function("log", math_log)),
            ("log10", function("log10", math_log10)),
            ("log2", function("log2", math_log2)),
            ("min", function("min", math_min)),
            ("max", function("max", math_max)),
            ("hypot", function("hypot", math_hypot)),
            ("sin", function("sin", math_sin)),
            ("cos", function("cos", math_cos)),
            ("tan", function("tan", math_tan)),
            ("PI", Value::Number(std::f64::consts::PI)),
            ("E", Value::Number(std::f64::consts::E)),
        ],
    );
    static ref GLOBALS: BTreeMap<&'static str, Value> = {
        let mut globals = BTreeMap::new();
        globals.insert("numeric", Value::Namespace(&NUMERIC));
        globals.insert("Math", Value::Namespace(&MATH));
        globals.insert("Number", function("Number", global_number));
        globals.insert("String", function("String", global_string));
        globals.insert("Boolean", function("Boolean", global_boolean));
        globals.insert(
            "Date",
            Value::Function(NativeFunction::with_constructor("Date", date_call, date_construct)),
        );
        globals.insert(
            "Error",
            Value::Function(NativeFunction::with_constructor("Error", error_construct, error_construct)),
        );
        globals.insert("parseInt", function("parseInt", global_parse_int));
        globals.insert("parseFloat", function("parseFloat", global_parse_float));
        globals.insert("isNaN", function("isNaN", global_is_nan));
        globals.insert("isFinite", function("isFinite", global_is_finite));
        globals.insert("NaN", Value::Number(f64::NAN));
        globals.insert("Infinity", Value::Number(f64::INFINITY));
        globals
    };
}

/// Looks up a global built-in by name.
pub fn lookup(name: &str) -> Option<&'static Value> {
    GLOBALS.get(name)
}

/// Names of all global built-ins.
pub fn names() -> impl Iterator<Item = &'static str> {
    GLOBALS.keys().copied()
}

/// Reads a property of a value that is not `undefined` or `null`.
pub fn get_property(receiver: &Value, key: &str) -> Value {
    match receiver {
        Value::String(s) => match key {
            "length" => Value::Number(s.chars().count() as f64),
            _ => index_key(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
        },
        Value::Array(items) => match key {
            "length" => Value::Number(items.len() as f64),
            _ => index_key(key)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
        },
        Value::Object(fields) => fields.get(key).cloned().unwrap_or_default(),
        Value::Namespace(namespace) => namespace.get(key).cloned().unwrap_or_default(),
        Value::Function(function) if key == "name" => Value::string(function.name),
        _ => Value::Undefined,
    }
}

fn index_key(key: &str) -> Option<usize> {
    if key == "0" || (!key.starts_with('0') && key.chars().all(|c| c.is_ascii_digit())) {
        key.parse().ok()
    } else {
        None
    }
}

/// Calls a method of a primitive, array or date receiver.
///
/// Returns `None` when the receiver has no such method.
pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let result = match (receiver, name) {
        (Value::Number(n), "toFixed") => number_to_fixed(*n, args),
        (Value::Number(n), "toString") => number_to_radix_string(*n, args),
        (Value::String(s), _) => return string_method(s, name, args),
        (Value::Array(items), _) => return array_method(items, name, args),
        (Value::Date(date), _) => {
            let value = match name {
                "getTime" | "valueOf" => Value::Number(date.timestamp_millis() as f64),
                "getFullYear" => Value::Number(f64::from(date.year())),
                "getMonth" => Value::Number(f64::from(date.month0())),
                "getDate" => Value::Number(f64::from(date.day())),
                "getDay" => Value::Number(f64::from(date.weekday().num_days_from_sunday())),
                "toISOString" | "toJSON" | "toString" => Value::String(date_to_string(date)),
                _ => return None,
            };
            Ok(value)
        }
        (Value::Boolean(_), "toString") => Ok(Value::String(receiver.to_js_string())),
        _ => return None,
    };
    Some(result)
}

fn number_to_fixed(n: f64, args: &[Value]) -> EvalResult<Value> {
    let digits = to_integer(number_arg(args, 0));
    if !(0.0..=100.0).contains(&digits) {
        return Err(EvalError::range(
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(Value::String(number_to_string(n)));
    }
    // -0 prints as 0
    let n = if n == 0.0 { 0.0 } else { n };
    Ok(Value::String(format!("{:.*}", digits as usize, n)))
}

fn number_to_radix_string(n: f64, args: &[Value]) -> EvalResult<Value> {
    let radix = match arg(args, 0) {
        Value::Undefined => 10.0,
        other => to_integer(other.to_number()),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(EvalError::range(
            "toString() radix must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !n.is_finite() || n.fract() != 0.0 {
        return Ok(Value::String(number_to_string(n)));
    }
    let radix = radix as u32;
    let mut magnitude = n.abs();
    let mut digits = Vec::new();
    while magnitude >= 1.0 {
        let digit = (magnitude % f64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        magnitude = (magnitude / f64::from(radix)).floor();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    if n < 0.0 {
        digits.push('-');
    }
    Ok(Value::String(digits.into_iter().rev().collect()))
}

/// Resolves a relative `slice` bound: negative values count from the end.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    let n = match value {
        Value::Undefined => return default,
        other => to_integer(other.to_number()),
    };
    let len = len as f64;
    (if n < 0.0 { (len + n).max(0.0) } else { n.min(len) }) as usize
}

fn clamped_index(value: &Value, len: usize, default: usize) -> usize {
    match value {
        Value::Undefined => default,
        other => to_integer(other.to_number()).clamp(0.0, len as f64) as usize,
    }
}

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len())
        .take_while(|i| i + needle.len() <= haystack.len())
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let search = || -> Vec<char> { arg(args, 0).to_js_string().chars().collect() };

    let value = match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "toString" => Value::string(s),
        "includes" => {
            let from = clamped_index(arg(args, 1), len, 0);
            Value::Boolean(find_chars(&chars, &search(), from).is_some())
        }
        "startsWith" => {
            let from = clamped_index(arg(args, 1), len, 0);
            Value::Boolean(chars[from..].starts_with(&search()))
        }
        "endsWith" => {
            let end = clamped_index(arg(args, 1), len, len);
            Value::Boolean(chars[..end].ends_with(&search()))
        }
        "indexOf" => {
            let from = clamped_index(arg(args, 1), len, 0);
            Value::Number(
                find_chars(&chars, &search(), from).map_or(-1.0, |i| i as f64),
            )
        }
        "slice" => {
            let start = relative_index(arg(args, 0), len, 0);
            let end = relative_index(arg(args, 1), len, len);
            Value::String(chars[start..end.max(start)].iter().collect())
        }
        "substring" => {
            let a = clamped_index(arg(args, 0), len, 0);
            let b = clamped_index(arg(args, 1), len, len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::String(chars[start..end].iter().collect())
        }
        _ => return None,
    };
    Some(Ok(value))
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let len = items.len();
    let value = match name {
        "includes" => {
            let target = arg(args, 0);
            // NaN is found by includes but not by indexOf
            Value::Boolean(items.iter().any(|item| match (item, target) {
                (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
                _ => item.strict_equals(target),
            }))
        }
        "indexOf" => {
            let target = arg(args, 0);
            Value::Number(
                items
                    .iter()
                    .position(|item| item.strict_equals(target))
                    .map_or(-1.0, |i| i as f64),
            )
        }
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_js_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        "slice" => {
            let start = relative_index(arg(args, 0), len, 0);
            let end = relative_index(arg(args, 1), len, len);
            Value::Array(items[start..end.max(start)].to_vec())
        }
        "toString" => Value::String(Value::Array(items.to_vec()).to_js_string()),
        _ => return None,
    };
    Some(Ok(value))
}
