//! Numeric value helpers and name validation.

use crate::error::{CoreError, CoreResult};
use serde_json::{Number, Value};

/// Longest store name, scope or key accepted, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Checks a store name, scope or key against the naming limits.
pub(crate) fn validate_name(what: &str, name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_argument(format!("{what} must not be empty")));
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(CoreError::invalid_argument(format!(
            "{what} {name:?} is {len} characters, limit is {MAX_NAME_LEN}"
        )));
    }
    Ok(())
}

/// Returns the sort key for a numeric value.
pub(crate) fn sort_value_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Adds two numbers, staying integral when both operands are integers.
///
/// Returns `None` on integer overflow or a non-finite float result.
pub(crate) fn add_numbers(current: &Number, delta: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (as_integer(current), as_integer(delta)) {
        let sum = a + b;
        return match u64::try_from(sum) {
            Ok(unsigned) => Some(Number::from(unsigned)),
            Err(_) => i64::try_from(sum).ok().map(Number::from),
        };
    }
    let (a, b) = (current.as_f64()?, delta.as_f64()?);
    Number::from_f64(a + b)
}

/// Widens any JSON integer; both u64 and i64 fit in i128 without loss.
fn as_integer(n: &Number) -> Option<i128> {
    n.as_u64()
        .map(i128::from)
        .or_else(|| n.as_i64().map(i128::from))
}

/// Short type name of a JSON value, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
