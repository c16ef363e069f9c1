//! # Type Coercion
//!
//! Converts a computed value to the declared [`VariableType`] of its variable.
//! Coercion never fails: a value that cannot become a date is kept as is, and
//! a value that cannot become a number turns into `NaN`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::config::VariableType;
use crate::eval::value::{date_from_millis, Value};

/// Coerces `value` to `declared`. Untyped variables pass through unchanged.
pub fn coerce(value: Value, declared: &VariableType) -> Value {
    match declared {
        VariableType::Date => match to_date(&value) {
            Some(date) => Value::Date(date),
            None => {
                debug!(value = %value, "value is not a valid date, keeping it unchanged");
                value
            }
        },
        VariableType::String => Value::String(value.to_js_string()),
        VariableType::Number => Value::Number(value.to_number()),
        VariableType::Boolean => Value::Boolean(value.is_truthy()),
        VariableType::Untyped => value,
    }
}

/// Interprets a value as a point in time.
///
/// Numbers are milliseconds since the Unix epoch, `null` is the epoch itself and
/// booleans count as `0`/`1` milliseconds.
pub fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(*date),
        Value::Null | Value::Boolean(_) | Value::Number(_) => date_from_millis(value.to_number()),
        Value::String(s) => parse_date(s),
        Value::Array(_) | Value::Object(_) => parse_date(&value.to_js_string()),
        Value::Undefined | Value::Function(_) | Value::Namespace(_) => None,
    }
}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses the accepted date spellings. Times without an offset are UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(input) {
        return Some(date.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Some(date.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}
