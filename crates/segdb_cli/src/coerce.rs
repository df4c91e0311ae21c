//! Coercion of untyped command-line text into attribute values.

use segdb_codec::Value;

/// Interprets `text` as an integer, then a float, then a boolean, and
/// falls back to a string.
///
/// Non-finite floats (`NaN`, `inf`) stay strings.
pub fn coerce(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return Value::from_f64(f);
        }
    }
    match text {
        "true" | "t" | "TRUE" | "True" => Value::Bool(true),
        "false" | "f" | "FALSE" | "False" => Value::Bool(false),
        _ => Value::Text(text.to_string()),
    }
}

/// Parses a `name=value` argument, coercing the value.
///
/// Used as a clap value parser.
pub fn parse_pair(arg: &str) -> Result<(String, Value), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {arg:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("attribute name is empty in {arg:?}"));
    }
    Ok((name.to_string(), coerce(value)))
}
