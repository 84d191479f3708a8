//! Property Coercion - Raw JSON values into typed field values.
//!
//! | kind        | accepts                                  | absent          |
//! |-------------|------------------------------------------|-----------------|
//! | `text`      | anything (non-strings are stringified)   | `""`            |
//! | `integer`   | numbers, numeric strings                 | `0`             |
//! | `float`     | finite numbers, numeric strings          | `0.0`           |
//! | `timestamp` | epoch millis (number or string), RFC 3339| unset (`None`)  |
//! | `sequence`  | structural, handled by the entity        | empty sequence  |
//!
//! `null` counts as absent. Values that do not fit their kind become
//! [`FieldValue::Invalid`] under [`CoercionPolicy::Lenient`] and a
//! [`CoercionError`] under [`CoercionPolicy::Strict`]. Coercion is idempotent:
//! coercing `value.to_raw()` again with the same kind yields `value`.

use serde_json::Value;

use crate::error::CoercionError;
use crate::types::{CoercionPolicy, FieldKind, FieldValue, Timestamp};

/// Coerce one raw value to `kind`.
///
/// Returns `Ok(None)` for an absent timestamp and for `sequence` (which is
/// never a scalar value).
pub fn coerce(
    raw: Option<&Value>,
    kind: FieldKind,
    policy: CoercionPolicy,
) -> Result<Option<FieldValue>, CoercionError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(absent(kind)),
        Some(raw) => raw,
    };

    let coerced = match kind {
        FieldKind::Text => Some(FieldValue::Text(stringify(raw))),
        FieldKind::Integer => integer(raw).map(FieldValue::Integer),
        FieldKind::Float => float(raw).map(FieldValue::Float),
        FieldKind::Timestamp => timestamp(raw).map(FieldValue::Timestamp),
        FieldKind::Sequence => return Ok(None),
    };

    match coerced {
        Some(value) => Ok(Some(value)),
        None => {
            let raw = stringify(raw);
            match policy {
                CoercionPolicy::Lenient => Ok(Some(FieldValue::Invalid { kind, raw })),
                CoercionPolicy::Strict => Err(CoercionError::new(kind, raw)),
            }
        }
    }
}

/// Default for a field the raw record omits.
pub fn absent(kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => Some(FieldValue::Text(String::new())),
        FieldKind::Integer => Some(FieldValue::Integer(0)),
        FieldKind::Float => Some(FieldValue::Float(0.0)),
        FieldKind::Timestamp | FieldKind::Sequence => None,
    }
}

/// Text form of a raw value: strings verbatim, everything else as JSON.
fn stringify(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn float(raw: &Value) -> Option<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn timestamp(raw: &Value) -> Option<Timestamp> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(Timestamp::from_millis),
        Value::String(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(millis) => Timestamp::from_millis(millis),
                Err(_) => Timestamp::parse_rfc3339(text),
            }
        }
        _ => None,
    }
}
