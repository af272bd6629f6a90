//! Typed source conversion through `serde`.
//!
//! Index-time sources and search hits are plain structs on the application
//! side; these helpers move them across the neutral tree so the rest of the
//! layer never sees `serde` types directly.

use serde::Serialize;
use serde::de::DeserializeOwned;

use searchlayer_core::error::{DeserializeError, SerializeError};
use searchlayer_core::value::{ObjectValue, Value};

use crate::convert;

/// Converts a serializable source into an object tree.
///
/// # Errors
///
/// [`SerializeError::Conversion`] when the value fails to serialize or does
/// not serialize to an object.
pub fn object_from<T: Serialize>(source: &T) -> Result<ObjectValue, SerializeError> {
    let json =
        serde_json::to_value(source).map_err(|err| SerializeError::Conversion(err.to_string()))?;
    match json {
        serde_json::Value::Object(map) => Ok(convert::object_from_json(&map)),
        other => Err(SerializeError::Conversion(format!(
            "expected an object-shaped source, got {other}"
        ))),
    }
}

/// Converts an object tree into a deserializable type.
///
/// # Errors
///
/// [`DeserializeError::BadParse`] carrying the offending tree and the target
/// type name.
pub fn object_into<T: DeserializeOwned>(source: &ObjectValue) -> Result<T, DeserializeError> {
    let map = convert::object_to_json(source).map_err(|err| bad_parse::<T>(source, err))?;
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|err| bad_parse::<T>(source, err))
}

fn bad_parse<T>(source: &ObjectValue, cause: impl std::fmt::Display) -> DeserializeError {
    DeserializeError::BadParse {
        type_name: std::any::type_name::<T>(),
        value: Value::from(source.clone()).to_string(),
        cause: cause.to_string(),
    }
}
