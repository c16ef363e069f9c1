//! Runtime values of the calculation language and their dynamic conversions.
//!
//! The conversions mirror the loose typing calculation authors expect:
//! `+` concatenates as soon as one side is a string, every other arithmetic
//! operator works on numbers, and failed numeric conversions produce `NaN`
//! instead of errors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::EvalResult;

pub type NativeFn = fn(&[Value]) -> EvalResult<Value>;

/// A built-in function. Functions with a `construct` entry can be used with `new`.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub call: NativeFn,
    pub construct: Option<NativeFn>,
}

impl NativeFunction {
    pub const fn new(name: &'static str, call: NativeFn) -> Self {
        Self {
            name,
            call,
            construct: None,
        }
    }

    pub const fn with_constructor(name: &'static str, call: NativeFn, construct: NativeFn) -> Self {
        Self {
            name,
            call,
            construct: Some(construct),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A read-only group of built-ins such as `Math` or `numeric`.
#[derive(Debug)]
pub struct Namespace {
    pub name: &'static str,
    pub members: BTreeMap<&'static str, Value>,
}

impl Namespace {
    pub fn new(name: &'static str, members: Vec<(&'static str, Value)>) -> Self {
        Self {
            name,
            members: members.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(NativeFunction),
    Namespace(&'static Namespace),
}

/// Conversion hint used when an object meets a primitive operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
}

impl Value {
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Null
            | Value::Date(_)
            | Value::Array(_)
            | Value::Object(_)
            | Value::Namespace(_) => "object",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !(n.is_nan() || *n == 0.0),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Date(date) => date.timestamp_millis() as f64,
            Value::Array(_) => string_to_number(&self.to_js_string()),
            Value::Object(_) | Value::Function(_) | Value::Namespace(_) => f64::NAN,
        }
    }

    /// The textual form `String(value)` produces.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Date(date) => date_to_string(date),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(function) => {
                format!("function {}() {{ [native code] }}", function.name)
            }
            Value::Namespace(namespace) => format!("[object {}]", namespace.name),
        }
    }

    pub fn to_primitive(&self, hint: PreferredType) -> Value {
        match self {
            Value::Date(date) if hint == PreferredType::Number => {
                Value::Number(date.timestamp_millis() as f64)
            }
            Value::Date(_)
            | Value::Array(_)
            | Value::Object(_)
            | Value::Function(_)
            | Value::Namespace(_) => Value::String(self.to_js_string()),
            primitive => primitive.clone(),
        }
    }

    /// `===`. Composite values compare structurally.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_equals(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.strict_equals(vb))
            }
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Namespace(a), Value::Namespace(b)) => a.name == b.name,
            _ => false,
        }
    }

    /// `==`.
    pub fn loose_equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(_), String(_)) | (String(_), Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Boolean(_), _) => Number(self.to_number()).loose_equals(other),
            (_, Boolean(_)) => self.loose_equals(&Number(other.to_number())),
            (Date(_) | Array(_) | Object(_) | Function(_) | Namespace(_), Number(_) | String(_)) => {
                self.to_primitive(PreferredType::Default).loose_equals(other)
            }
            (Number(_) | String(_), Date(_) | Array(_) | Object(_) | Function(_) | Namespace(_)) => {
                self.loose_equals(&other.to_primitive(PreferredType::Default))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Converts a JSON document into a runtime value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts into JSON the way it is serialized: non-finite numbers,
    /// `undefined` and functions become `null`, dates become ISO strings.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Structural equality where NaN equals NaN at any depth. `===` lives in
/// [`Value::strict_equals`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => serializer.serialize_none(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(date) => serializer.serialize_str(&date_to_string(date)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Namespace(namespace) => {
                let constants: Vec<_> = namespace
                    .members
                    .iter()
                    .filter(|(_, value)| !matches!(value, Value::Function(_)))
                    .collect();
                let mut out = serializer.serialize_map(Some(constants.len()))?;
                for (key, value) in constants {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

pub fn date_to_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn date_from_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64)
}

/// Numeric conversion of a string: surrounding whitespace is ignored, the empty
/// string is `0`, anything that is not a complete number literal is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix_digits = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in radix_digits {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // rejects Rust-only spellings such as "inf" or "nan"
    let literal_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !literal_chars {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Shortest round-trip rendering: `1e21`, `0.1`, `1.5e-7`, `100`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // position of the decimal point relative to the digit string
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let e_sign = if e >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    };
    format!("{}{}", sign, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nan_equality_is_structural() {
        let nan = Value::Number(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert!(!nan.strict_equals(&nan));

        let array = Value::Array(vec![Value::Number(1.0), nan.clone()]);
        assert_eq!(array, array.clone());
        assert!(!array.strict_equals(&array));

        let object = Value::Object(
            [
                ("decade".to_string(), nan.clone()),
                ("nested".to_string(), array.clone()),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(object, object.clone());
        assert_ne!(object, Value::Object(Default::default()));
        assert_ne!(array, Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]));
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(4.0), "4");
        assert_eq!(number_to_string(-50.0), "-50");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("4"), 4.0);
        assert_eq!(string_to_number("  4.5 "), 4.5);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Number(4.0).loose_equals(&Value::string("4")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(Value::Array(vec![Value::Number(1.0)]).loose_equals(&Value::string("1")));
        assert!(!Value::Number(f64::NAN).loose_equals(&Value::Number(f64::NAN)));
        assert!(!Value::Number(4.0).strict_equals(&Value::string("4")));
    }

    #[test]
    fn test_to_js_string() {
        let array = Value::Array(vec![Value::Number(1.0), Value::Null, Value::string("a")]);
        assert_eq!(array.to_js_string(), "1,,a");
        assert_eq!(Value::Object(BTreeMap::new()).to_js_string(), "[object Object]");
        let date = date_from_millis(0.0).map(Value::Date).unwrap_or_default();
        assert_eq!(date.to_js_string(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_json_bridge() {
        let json = serde_json::json!({"age": 21, "tags": ["a", null], "ratio": 0.5});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);

        let odd = Value::Array(vec![Value::Number(f64::NAN), Value::Undefined]);
        assert_eq!(odd.to_json(), serde_json::json!([null, null]));
    }
}
