//! The neutral wire tree shared by every backend.
//!
//! All serialization in this layer goes through one concrete in-memory
//! representation: [`Value`] and its composite forms [`ObjectValue`] and
//! [`ArrayValue`]. Compilers build this tree, backends render it to wire text
//! and parse wire text back into it. Nothing outside the backend crates knows
//! what the wire format looks like.
//!
//! Objects preserve insertion order. Search engines treat mapping bodies and
//! bulk metadata as ordered, and keeping declaration order makes compiled
//! requests reproducible byte for byte.

use std::fmt;

/// A single node in the wire tree.
///
/// Numbers are split into integral ([`Value::I64`]) and floating
/// ([`Value::F64`]) forms. Backends whose format does not distinguish the two
/// normalize integral floats at parse time, see [`Value::with_unified_numbers`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integral number.
    I64(i64),
    /// A floating point number.
    F64(f64),
    /// A string.
    Str(String),
    /// An ordered sequence of values.
    Array(ArrayValue),
    /// An insertion-ordered mapping of string keys to values.
    Object(ObjectValue),
}

impl Value {
    /// Returns a short name for the kind of this value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::I64(_) => "integer",
            Value::F64(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Returns `true` if this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integral payload, if this is an integral number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns this value as a float. Integral numbers widen losslessly
    /// enough for every use in this layer.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array payload, if this is an array.
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the object payload, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Rewrites every finite integral float in this tree into an integral
    /// number.
    ///
    /// Backends whose wire format carries a single number kind call this
    /// while building the tree, so `1.0` read back from such a format is
    /// indistinguishable from `1` and integer fields keep working.
    pub fn with_unified_numbers(self) -> Value {
        match self {
            Value::F64(x) if x.is_finite() && x.fract() == 0.0 && in_i64_range(x) => {
                Value::I64(x as i64)
            }
            Value::Array(items) => Value::Array(ArrayValue {
                items: items
                    .items
                    .into_iter()
                    .map(Value::with_unified_numbers)
                    .collect(),
            }),
            Value::Object(obj) => Value::Object(ObjectValue {
                entries: obj
                    .entries
                    .into_iter()
                    .map(|(k, v)| (k, v.with_unified_numbers()))
                    .collect(),
            }),
            other => other,
        }
    }
}

fn in_i64_range(x: f64) -> bool {
    // 2^63 is exactly representable; everything below it fits after trunc.
    x >= -9_223_372_036_854_775_808.0 && x < 9_223_372_036_854_775_808.0
}

/// Renders the value in a compact JSON-like form for error messages and
/// logging. This is not the wire format; backends own that.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I64(i) => write!(f, "{i}"),
            Value::F64(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => {
                f.write_str("{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I64(v as i64)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I64(v as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ArrayValue> for Value {
    fn from(v: ArrayValue) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Value::Object(v)
    }
}

/// An ordered sequence of [`Value`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    items: Vec<Value>,
}

impl ArrayValue {
    /// Creates an empty array.
    pub fn new() -> Self {
        ArrayValue { items: Vec::new() }
    }

    /// Appends a value.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the array has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Iterates the items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub(crate) fn items(&self) -> &[Value] {
        &self.items
    }
}

impl From<Vec<Value>> for ArrayValue {
    fn from(items: Vec<Value>) -> Self {
        ArrayValue { items }
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ArrayValue { items: iter.into_iter().collect() }
    }
}

impl IntoIterator for ArrayValue {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// An insertion-ordered mapping of string keys to [`Value`]s.
///
/// Inserting an existing key replaces its value in place, so an object never
/// carries duplicate keys and a replaced key keeps its original position.
/// Lookup is a linear scan; request bodies and mappings are small and are
/// built far more often than they are searched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    entries: Vec<(String, Value)>,
}

impl ObjectValue {
    /// Creates an empty object.
    pub fn new() -> Self {
        ObjectValue { entries: Vec::new() }
    }

    /// Inserts a key-value pair, replacing the value in place if the key is
    /// already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

impl FromIterator<(String, Value)> for ObjectValue {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut obj = ObjectValue::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut obj = ObjectValue::new();
        obj.insert("a", 1i64);
        obj.insert("b", 2i64);
        obj.insert("a", 3i64);
        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(obj.get("a"), Some(&Value::I64(3)));
    }

    #[test]
    fn unified_numbers_rewrite_integral_floats() {
        let mut obj = ObjectValue::new();
        obj.insert("int_like", 2.0f64);
        obj.insert("frac", 2.5f64);
        obj.insert("nested", Value::Array(vec![Value::F64(1.0)].into()));
        let unified = Value::Object(obj).with_unified_numbers();
        let obj = match unified {
            Value::Object(o) => o,
            other => panic!("expected object, got {other}"),
        };
        assert_eq!(obj.get("int_like"), Some(&Value::I64(2)));
        assert_eq!(obj.get("frac"), Some(&Value::F64(2.5)));
        let nested = obj.get("nested").and_then(Value::as_array).unwrap();
        assert_eq!(nested.get(0), Some(&Value::I64(1)));
    }

    #[test]
    fn unified_numbers_leave_huge_floats_alone() {
        let huge = 1.0e300f64;
        assert_eq!(Value::F64(huge).with_unified_numbers(), Value::F64(huge));
    }

    #[test]
    fn display_is_compact() {
        let mut obj = ObjectValue::new();
        obj.insert("name", "a");
        obj.insert("n", 1i64);
        assert_eq!(Value::Object(obj).to_string(), r#"{"name": "a", "n": 1}"#);
    }
}
