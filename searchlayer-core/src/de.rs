//! Read-side deserialization cursors.
//!
//! Response parsers walk wire trees through [`ObjectCtx`] and [`ArrayCtx`],
//! transient views with typed accessors in two flavors: the `_or_null`
//! variants answer `None` for anything that is absent, null, or of the wrong
//! kind, while the plain variants fail with a named error. The iterator
//! forms are single-pass and follow an explicit [`ObjectIter::advance`]
//! protocol; reading before the first `advance()` or after it has returned
//! `false` is a programming error and panics.
//!
//! A backend [`Deserializer`] produces the tree these cursors walk.

use crate::error::DeserializeError;
use crate::value::{ArrayValue, ObjectValue, Value};

/// How a wire format represents numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberMode {
    /// The format distinguishes integral from floating point numbers.
    Distinct,
    /// The format has a single number kind. Backends in this mode normalize
    /// integral floats into integral numbers while building the tree, see
    /// [`Value::with_unified_numbers`].
    Unified,
}

/// Parses wire text into the neutral tree.
pub trait Deserializer {
    /// How this backend's wire format represents numbers.
    fn number_mode(&self) -> NumberMode;

    /// Parses a wire payload whose top level must be an object.
    fn parse_object(&self, raw: &str) -> Result<ObjectValue, DeserializeError>;
}

/// A borrowed view of one value of any kind except null.
#[derive(Debug, Clone, Copy)]
pub enum AnyRef<'a> {
    /// A boolean.
    Bool(bool),
    /// An integral number.
    I64(i64),
    /// A floating point number.
    F64(f64),
    /// A string.
    Str(&'a str),
    /// An array, wrapped in a read cursor.
    Array(ArrayCtx<'a>),
    /// An object, wrapped in a read cursor.
    Object(ObjectCtx<'a>),
}

impl<'a> AnyRef<'a> {
    fn of(value: &'a Value) -> Option<AnyRef<'a>> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(AnyRef::Bool(*b)),
            Value::I64(i) => Some(AnyRef::I64(*i)),
            Value::F64(x) => Some(AnyRef::F64(*x)),
            Value::Str(s) => Some(AnyRef::Str(s)),
            Value::Array(a) => Some(AnyRef::Array(ArrayCtx::new(a))),
            Value::Object(o) => Some(AnyRef::Object(ObjectCtx::new(o))),
        }
    }
}

fn long_of(value: &Value) -> Result<i64, DeserializeError> {
    value
        .as_i64()
        .ok_or_else(|| DeserializeError::unexpected("an integer", value))
}

fn double_of(value: &Value) -> Result<f64, DeserializeError> {
    value
        .as_f64()
        .ok_or_else(|| DeserializeError::unexpected("a number", value))
}

fn boolean_of(value: &Value) -> Result<bool, DeserializeError> {
    value
        .as_bool()
        .ok_or_else(|| DeserializeError::unexpected("a boolean", value))
}

fn string_of(value: &Value) -> Result<&str, DeserializeError> {
    value
        .as_str()
        .ok_or_else(|| DeserializeError::unexpected("a string", value))
}

fn object_of(value: &Value) -> Result<&ObjectValue, DeserializeError> {
    value
        .as_object()
        .ok_or_else(|| DeserializeError::unexpected("an object", value))
}

fn array_of(value: &Value) -> Result<&ArrayValue, DeserializeError> {
    value
        .as_array()
        .ok_or_else(|| DeserializeError::unexpected("an array", value))
}

fn int_of(value: &Value) -> Result<i32, DeserializeError> {
    let wide = long_of(value)?;
    i32::try_from(wide).map_err(|_| DeserializeError::OutOfRange {
        type_name: "int",
        value: wide.to_string(),
    })
}

/// A read cursor over one object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectCtx<'a> {
    obj: &'a ObjectValue,
}

impl<'a> ObjectCtx<'a> {
    /// Wraps an object for reading.
    pub fn new(obj: &'a ObjectValue) -> Self {
        ObjectCtx { obj }
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.obj.len()
    }

    /// Returns `true` if the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.obj.is_empty()
    }

    /// Returns `true` if `name` is present (even if null).
    pub fn contains_key(&self, name: &str) -> bool {
        self.obj.contains_key(name)
    }

    /// Returns the raw value for `name`, if present.
    pub fn value(&self, name: &str) -> Option<&'a Value> {
        self.obj.get(name)
    }

    fn require(&self, name: &str) -> Result<&'a Value, DeserializeError> {
        self.obj
            .get(name)
            .ok_or_else(|| DeserializeError::MissingKey(name.to_string()))
    }

    /// Reads an integral number.
    pub fn long(&self, name: &str) -> Result<i64, DeserializeError> {
        long_of(self.require(name)?)
    }

    /// Reads an integral number, or `None` when absent, null, or not one.
    pub fn long_or_null(&self, name: &str) -> Option<i64> {
        self.obj.get(name).and_then(Value::as_i64)
    }

    /// Reads an integral number that must fit in 32 bits.
    pub fn int(&self, name: &str) -> Result<i32, DeserializeError> {
        int_of(self.require(name)?)
    }

    /// Reads a 32 bit integral number, or `None` when absent, null, or not
    /// one.
    pub fn int_or_null(&self, name: &str) -> Option<i32> {
        self.long_or_null(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Reads a number as a float. Integral numbers widen.
    pub fn double(&self, name: &str) -> Result<f64, DeserializeError> {
        double_of(self.require(name)?)
    }

    /// Reads a number as a float, or `None` when absent, null, or not one.
    pub fn double_or_null(&self, name: &str) -> Option<f64> {
        self.obj.get(name).and_then(Value::as_f64)
    }

    /// Reads a boolean.
    pub fn boolean(&self, name: &str) -> Result<bool, DeserializeError> {
        boolean_of(self.require(name)?)
    }

    /// Reads a boolean, or `None` when absent, null, or not one.
    pub fn boolean_or_null(&self, name: &str) -> Option<bool> {
        self.obj.get(name).and_then(Value::as_bool)
    }

    /// Reads a string.
    pub fn string(&self, name: &str) -> Result<&'a str, DeserializeError> {
        string_of(self.require(name)?)
    }

    /// Reads a string, or `None` when absent, null, or not one.
    pub fn string_or_null(&self, name: &str) -> Option<&'a str> {
        self.obj.get(name).and_then(Value::as_str)
    }

    /// Opens a nested object.
    pub fn obj(&self, name: &str) -> Result<ObjectCtx<'a>, DeserializeError> {
        object_of(self.require(name)?).map(ObjectCtx::new)
    }

    /// Opens a nested object, or `None` when absent, null, or not one.
    pub fn obj_or_null(&self, name: &str) -> Option<ObjectCtx<'a>> {
        self.obj.get(name).and_then(Value::as_object).map(ObjectCtx::new)
    }

    /// Opens a nested array.
    pub fn array(&self, name: &str) -> Result<ArrayCtx<'a>, DeserializeError> {
        array_of(self.require(name)?).map(ArrayCtx::new)
    }

    /// Opens a nested array, or `None` when absent, null, or not one.
    pub fn array_or_null(&self, name: &str) -> Option<ArrayCtx<'a>> {
        self.obj.get(name).and_then(Value::as_array).map(ArrayCtx::new)
    }

    /// Reads a value of any kind. Fails when absent or null.
    pub fn any(&self, name: &str) -> Result<AnyRef<'a>, DeserializeError> {
        let value = self.require(name)?;
        AnyRef::of(value).ok_or_else(|| DeserializeError::unexpected("a non-null value", value))
    }

    /// Reads a value of any kind, or `None` when absent or null.
    pub fn any_or_null(&self, name: &str) -> Option<AnyRef<'a>> {
        self.obj.get(name).and_then(AnyRef::of)
    }

    /// Starts a single-pass iteration over the entries.
    pub fn iter(&self) -> ObjectIter<'a> {
        ObjectIter { entries: self.obj.entries(), pos: None }
    }

    /// Clones the underlying object out of the cursor.
    pub fn to_object(&self) -> ObjectValue {
        self.obj.clone()
    }
}

/// A read cursor over one array.
#[derive(Debug, Clone, Copy)]
pub struct ArrayCtx<'a> {
    items: &'a [Value],
}

impl<'a> ArrayCtx<'a> {
    /// Wraps an array for reading.
    pub fn new(arr: &'a ArrayValue) -> Self {
        ArrayCtx { items: arr.items() }
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the array has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the raw item at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.items.get(index)
    }

    /// Starts a single-pass iteration over the items.
    pub fn iter(&self) -> ArrayIter<'a> {
        ArrayIter { items: self.items, pos: None }
    }

    /// Clones the underlying array out of the cursor.
    pub fn to_array(&self) -> ArrayValue {
        self.items.to_vec().into()
    }
}

/// A single-pass iterator over object entries.
///
/// Call [`ObjectIter::advance`] to move to the next entry; it returns `false`
/// once the entries are exhausted. The accessors read the current entry and
/// panic when the iterator is not positioned on one.
#[derive(Debug)]
pub struct ObjectIter<'a> {
    entries: &'a [(String, Value)],
    pos: Option<usize>,
}

impl<'a> ObjectIter<'a> {
    /// Moves to the next entry. Returns `false` when exhausted.
    pub fn advance(&mut self) -> bool {
        let next = match self.pos {
            None => 0,
            Some(i) => i.saturating_add(1).min(self.entries.len()),
        };
        self.pos = Some(next);
        next < self.entries.len()
    }

    fn current(&self) -> (&'a str, &'a Value) {
        match self.pos {
            None => panic!("object iterator read before advance()"),
            Some(i) if i >= self.entries.len() => panic!("object iterator read past the end"),
            Some(i) => {
                let (key, value) = &self.entries[i];
                (key, value)
            }
        }
    }

    /// The key of the current entry.
    pub fn key(&self) -> &'a str {
        self.current().0
    }

    /// The raw value of the current entry.
    pub fn value(&self) -> &'a Value {
        self.current().1
    }

    /// Reads the current value as an integral number.
    pub fn long(&self) -> Result<i64, DeserializeError> {
        long_of(self.value())
    }

    /// Reads the current value as an integral number, or `None` when null or
    /// not one.
    pub fn long_or_null(&self) -> Option<i64> {
        self.value().as_i64()
    }

    /// Reads the current value as a float. Integral numbers widen.
    pub fn double(&self) -> Result<f64, DeserializeError> {
        double_of(self.value())
    }

    /// Reads the current value as a float, or `None` when null or not one.
    pub fn double_or_null(&self) -> Option<f64> {
        self.value().as_f64()
    }

    /// Reads the current value as a boolean.
    pub fn boolean(&self) -> Result<bool, DeserializeError> {
        boolean_of(self.value())
    }

    /// Reads the current value as a boolean, or `None` when null or not one.
    pub fn boolean_or_null(&self) -> Option<bool> {
        self.value().as_bool()
    }

    /// Reads the current value as a string.
    pub fn string(&self) -> Result<&'a str, DeserializeError> {
        string_of(self.value())
    }

    /// Reads the current value as a string, or `None` when null or not one.
    pub fn string_or_null(&self) -> Option<&'a str> {
        self.value().as_str()
    }

    /// Opens the current value as an object.
    pub fn obj(&self) -> Result<ObjectCtx<'a>, DeserializeError> {
        object_of(self.value()).map(ObjectCtx::new)
    }

    /// Opens the current value as an object, or `None` when null or not one.
    pub fn obj_or_null(&self) -> Option<ObjectCtx<'a>> {
        self.value().as_object().map(ObjectCtx::new)
    }

    /// Opens the current value as an array.
    pub fn array(&self) -> Result<ArrayCtx<'a>, DeserializeError> {
        array_of(self.value()).map(ArrayCtx::new)
    }

    /// Opens the current value as an array, or `None` when null or not one.
    pub fn array_or_null(&self) -> Option<ArrayCtx<'a>> {
        self.value().as_array().map(ArrayCtx::new)
    }

    /// Reads the current value as any kind, or `None` when null.
    pub fn any_or_null(&self) -> Option<AnyRef<'a>> {
        AnyRef::of(self.value())
    }
}

/// A single-pass iterator over array items, with the same
/// [`ArrayIter::advance`] protocol as [`ObjectIter`].
#[derive(Debug)]
pub struct ArrayIter<'a> {
    items: &'a [Value],
    pos: Option<usize>,
}

impl<'a> ArrayIter<'a> {
    /// Moves to the next item. Returns `false` when exhausted.
    pub fn advance(&mut self) -> bool {
        let next = match self.pos {
            None => 0,
            Some(i) => i.saturating_add(1).min(self.items.len()),
        };
        self.pos = Some(next);
        next < self.items.len()
    }

    /// The raw current item.
    pub fn value(&self) -> &'a Value {
        match self.pos {
            None => panic!("array iterator read before advance()"),
            Some(i) if i >= self.items.len() => panic!("array iterator read past the end"),
            Some(i) => &self.items[i],
        }
    }

    /// Reads the current item as an integral number.
    pub fn long(&self) -> Result<i64, DeserializeError> {
        long_of(self.value())
    }

    /// Reads the current item as an integral number, or `None` when null or
    /// not one.
    pub fn long_or_null(&self) -> Option<i64> {
        self.value().as_i64()
    }

    /// Reads the current item as a float. Integral numbers widen.
    pub fn double(&self) -> Result<f64, DeserializeError> {
        double_of(self.value())
    }

    /// Reads the current item as a float, or `None` when null or not one.
    pub fn double_or_null(&self) -> Option<f64> {
        self.value().as_f64()
    }

    /// Reads the current item as a boolean.
    pub fn boolean(&self) -> Result<bool, DeserializeError> {
        boolean_of(self.value())
    }

    /// Reads the current item as a string.
    pub fn string(&self) -> Result<&'a str, DeserializeError> {
        string_of(self.value())
    }

    /// Reads the current item as a string, or `None` when null or not one.
    pub fn string_or_null(&self) -> Option<&'a str> {
        self.value().as_str()
    }

    /// Opens the current item as an object.
    pub fn obj(&self) -> Result<ObjectCtx<'a>, DeserializeError> {
        object_of(self.value()).map(ObjectCtx::new)
    }

    /// Opens the current item as an object, or `None` when null or not one.
    pub fn obj_or_null(&self) -> Option<ObjectCtx<'a>> {
        self.value().as_object().map(ObjectCtx::new)
    }

    /// Opens the current item as an array.
    pub fn array(&self) -> Result<ArrayCtx<'a>, DeserializeError> {
        array_of(self.value()).map(ArrayCtx::new)
    }

    /// Reads the current item as any kind, or `None` when null.
    pub fn any_or_null(&self) -> Option<AnyRef<'a>> {
        AnyRef::of(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectValue {
        let mut obj = ObjectValue::new();
        obj.insert("a", 1i64);
        obj.insert("b", "two");
        obj
    }

    #[test]
    fn iteration_follows_the_advance_protocol() {
        let obj = sample();
        let mut it = ObjectCtx::new(&obj).iter();
        assert!(it.advance());
        assert_eq!(it.key(), "a");
        assert_eq!(it.long().unwrap(), 1);
        assert!(it.advance());
        assert_eq!(it.key(), "b");
        assert!(!it.advance());
        assert!(!it.advance());
    }

    #[test]
    #[should_panic(expected = "before advance()")]
    fn reading_before_advance_panics() {
        let obj = sample();
        let it = ObjectCtx::new(&obj).iter();
        it.key();
    }

    #[test]
    #[should_panic(expected = "past the end")]
    fn reading_past_the_end_panics() {
        let obj = sample();
        let mut it = ObjectCtx::new(&obj).iter();
        while it.advance() {}
        it.value();
    }
}
