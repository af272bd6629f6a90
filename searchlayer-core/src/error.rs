//! Error types and result types for mapping and query compilation.
//!
//! Each failure family gets its own enum so callers can match on exactly the
//! errors an operation can produce. Use [`SearchLayerResult<T>`] as the return
//! type for operations that can fail anywhere in the layer.

use thiserror::Error;

use crate::value::Value;

/// Errors raised when a value cannot reach its wire form.
///
/// The in-memory tree accepts any value; it is the wire format that has
/// restrictions. These errors surface at render time (for example JSON has no
/// representation for non-finite numbers) or when converting a typed source
/// object into the tree.
#[derive(Error, Debug)]
pub enum SerializeError {
    /// The number has no representation in the target wire format.
    #[error("Number {0} has no wire representation")]
    NonFiniteNumber(f64),
    /// A typed source object could not be converted into a wire tree.
    #[error("Conversion error: {0}")]
    Conversion(String),
}

/// Errors raised when wire data cannot be interpreted.
///
/// Carries the offending value rendered as text so error messages can be
/// logged without access to the original payload.
#[derive(Error, Debug)]
pub enum DeserializeError {
    /// The requested key is absent from the object.
    #[error("No such key: {0:?}")]
    MissingKey(String),
    /// The value has a different kind than the caller asked for.
    #[error("Expected {expected}, got {actual}")]
    UnexpectedKind {
        /// What the caller asked for, e.g. "an integer".
        expected: &'static str,
        /// The offending value with its kind.
        actual: String,
    },
    /// A numeric value does not fit the target type.
    #[error("Value {value} is out of range for {type_name}")]
    OutOfRange {
        /// The field type that rejected the value.
        type_name: &'static str,
        /// The offending value.
        value: String,
    },
    /// A string value could not be parsed into the target type.
    #[error("Cannot parse {value} as {type_name}: {cause}")]
    BadParse {
        /// The field type that rejected the value.
        type_name: &'static str,
        /// The offending value.
        value: String,
        /// The underlying parse failure.
        cause: String,
    },
    /// A wire value does not correspond to any declared enum variant.
    #[error("No variant of {type_name} matches {value}")]
    NoSuchVariant {
        /// The enum field type name.
        type_name: &'static str,
        /// The offending value.
        value: String,
    },
    /// A response is structurally different from what the engine contract
    /// promises. This is fatal for the request; retrying will not help.
    #[error("Malformed response: expected {expected} at {at}")]
    ResponseShape {
        /// What the response was supposed to contain, e.g. "a buckets array".
        expected: &'static str,
        /// Where in the response the mismatch was found.
        at: String,
    },
    /// The raw payload could not be parsed by the backend at all.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DeserializeError {
    /// Builds a [`DeserializeError::UnexpectedKind`] from the offending value.
    pub fn unexpected(expected: &'static str, actual: &Value) -> Self {
        DeserializeError::UnexpectedKind {
            expected,
            actual: format!("{} ({})", actual, actual.kind()),
        }
    }
}

/// Errors raised when two document schemas cannot be merged.
///
/// Every variant names the qualified field (or document-level option) that
/// conflicts and renders both sides, so the failing declaration can be found
/// without a debugger.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The same field name is mapped to two different field types.
    #[error("Field {field:?} has conflicting types: {left} vs {right}")]
    TypeConflict { field: String, left: String, right: String },
    /// The same field carries different values for a mapping parameter.
    #[error("Field {field:?} has conflicting values for mapping parameter {param:?}: {left} vs {right}")]
    ParamConflict {
        field: String,
        param: String,
        left: String,
        right: String,
    },
    /// The same field is an object sub-document in one schema and a nested
    /// sub-document in the other.
    #[error("Field {field:?} is declared {left} in one document and {right} in another")]
    SubDocumentKindConflict {
        field: String,
        left: &'static str,
        right: &'static str,
    },
    /// A document-level option (dynamic mode, meta fields) differs.
    #[error("Documents carry conflicting values for {option}: {left} vs {right}")]
    OptionConflict { option: String, left: String, right: String },
    /// Two same-named dynamic templates produce different mappings.
    #[error("Dynamic template {template:?} has conflicting definitions: {left} vs {right}")]
    TemplateConflict { template: String, left: String, right: String },
    /// Two same-named runtime fields carry different scripts or types.
    #[error("Runtime field {field:?} has conflicting definitions: {left} vs {right}")]
    RuntimeFieldConflict { field: String, left: String, right: String },
}

/// Errors raised while manipulating a search query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The node handle is not attached anywhere in this query, so there is
    /// nothing to rewrite. Cloned queries keep their markers; this fires when
    /// the node was never added or was replaced.
    #[error("No {kind} node bound to this handle in the query")]
    UnboundNode { kind: &'static str },
    /// A response was asked for an aggregation it does not carry.
    #[error("No aggregation named {name:?} in the response")]
    UnknownAggregation { name: String },
}

/// Represents all possible errors produced by this layer.
#[derive(Error, Debug)]
pub enum SearchLayerError {
    /// A value could not be rendered to the wire.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    /// Wire data could not be interpreted.
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
    /// Two document schemas could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// A search query was manipulated incorrectly.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// A specialized `Result` type for operations that can fail anywhere in the
/// mapping or query layer.
pub type SearchLayerResult<T> = Result<T, SearchLayerError>;
