//! The JSON wire backend.

use searchlayer_core::de::{Deserializer, NumberMode};
use searchlayer_core::error::{DeserializeError, SerializeError};
use searchlayer_core::ser::Serializer;
use searchlayer_core::value::ObjectValue;

use crate::convert;

/// Renders object trees as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact output, the wire default.
    pub fn new() -> Self {
        JsonSerializer::default()
    }

    /// Indented output for logs and fixtures.
    pub fn pretty() -> Self {
        JsonSerializer { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize_object(&self, body: &ObjectValue) -> Result<String, SerializeError> {
        let map = convert::object_to_json(body)?;
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&map)
        } else {
            serde_json::to_string(&map)
        };
        rendered.map_err(|err| SerializeError::Conversion(err.to_string()))
    }
}

/// Parses JSON text into object trees.
///
/// JSON distinguishes integral from floating point literals, so this backend
/// runs in [`NumberMode::Distinct`] and performs no number folding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeserializer;

impl JsonDeserializer {
    pub fn new() -> Self {
        JsonDeserializer
    }
}

impl Deserializer for JsonDeserializer {
    fn number_mode(&self) -> NumberMode {
        NumberMode::Distinct
    }

    fn parse_object(&self, raw: &str) -> Result<ObjectValue, DeserializeError> {
        let parsed: serde_json::Value =
            serde_json::from_str(raw).map_err(|err| DeserializeError::Parse(err.to_string()))?;
        match parsed {
            serde_json::Value::Object(map) => Ok(convert::object_from_json(&map)),
            other => Err(DeserializeError::unexpected(
                "an object",
                &convert::from_json(&other),
            )),
        }
    }
}
