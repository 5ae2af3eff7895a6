//! Lenient field coercion for loosely-typed store documents.
//!
//! Every helper is total: malformed input degrades to a neutral value
//! (`0`, `""`, `[]`, `false`) instead of failing the whole record.

use serde_json::{Number, Value};

/// Coerces a raw value to a finite `f64`.
///
/// Numbers pass through, numeric strings are parsed after trimming, booleans
/// map to `1`/`0`. Everything else (including `NaN`/`Infinity`) becomes `0`.
pub(crate) fn to_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Coerces a raw value to a non-negative whole count.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn to_count(value: Option<&Value>) -> u64 {
    let n = to_number(value).max(0.0).floor();
    if n >= u64::MAX as f64 {
        u64::MAX
    } else {
        n as u64
    }
}

/// Coerces a raw value to display text.
///
/// Strings pass through untouched and finite numbers are rendered; any other
/// shape yields `None` so the caller can apply its own default.
pub(crate) fn to_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Keeps only the string elements of an array; any non-array yields `[]`.
pub(crate) fn to_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

/// Availability defaults to `true`; only an explicit `false` clears it.
pub(crate) fn to_in_stock(value: Option<&Value>) -> bool {
    !matches!(value, Some(Value::Bool(false)))
}

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Comparison price, present only when the raw value is truthy.
///
/// A stored `0` is therefore indistinguishable from an absent field.
pub(crate) fn to_original_price(value: Option<&Value>) -> Option<f64> {
    is_truthy(value).then(|| to_number(value))
}

/// Discount payloads are kept only when they are objects.
pub(crate) fn to_discount(value: Option<&Value>) -> Option<serde_json::Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Some(map.clone()),
        _ => None,
    }
}

/// Wraps a finite `f64` as a JSON number; non-finite input becomes `0`.
pub(crate) fn number_value(n: f64) -> Value {
    Number::from_f64(n).map_or_else(|| Value::from(0), Value::Number)
}
