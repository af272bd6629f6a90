//! Conversions between the neutral value tree and `serde_json` values.

use searchlayer_core::error::SerializeError;
use searchlayer_core::value::{ArrayValue, ObjectValue, Value};

/// Converts a neutral value into a `serde_json` value.
///
/// # Errors
///
/// JSON has no encoding for non-finite numbers, so NaN and the infinities
/// are a [`SerializeError::NonFiniteNumber`].
pub fn to_json(value: &Value) -> Result<serde_json::Value, SerializeError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I64(i) => serde_json::Value::Number((*i).into()),
        Value::F64(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or(SerializeError::NonFiniteNumber(*x))?,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(to_json).collect::<Result<Vec<_>, _>>()?)
        }
        Value::Object(obj) => serde_json::Value::Object(object_to_json(obj)?),
    })
}

/// Converts an object tree into a `serde_json` map, preserving field order.
pub fn object_to_json(
    obj: &ObjectValue,
) -> Result<serde_json::Map<String, serde_json::Value>, SerializeError> {
    let mut map = serde_json::Map::with_capacity(obj.len());
    for (key, value) in obj.iter() {
        map.insert(key.to_string(), to_json(value)?);
    }
    Ok(map)
}

/// Converts a `serde_json` value into a neutral value.
///
/// Integral JSON numbers stay integral; `u64` values above `i64::MAX` fall
/// back to the closest `f64`.
pub fn from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => number_from_json(n),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => {
            let mut arr = ArrayValue::new();
            for item in items {
                arr.push(from_json(item));
            }
            Value::Array(arr)
        }
        serde_json::Value::Object(map) => Value::Object(object_from_json(map)),
    }
}

/// Converts a `serde_json` map into an object tree, preserving field order.
pub fn object_from_json(map: &serde_json::Map<String, serde_json::Value>) -> ObjectValue {
    let mut obj = ObjectValue::new();
    for (key, value) in map {
        obj.insert(key.clone(), from_json(value));
    }
    obj
}

fn number_from_json(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::I64(i),
        // as_f64 is total for standard serde_json numbers
        None => n.as_f64().map_or(Value::Null, Value::F64),
    }
}
