//! Write-side serialization contexts.
//!
//! Compilers never touch a wire format directly. They describe objects and
//! arrays through [`ObjectCtx`] and [`ArrayCtx`], which build the neutral
//! tree from [`crate::value`]; a backend [`Serializer`] turns the finished
//! tree into wire text.
//!
//! # Building a tree
//!
//! ```ignore
//! use searchlayer_core::ser;
//!
//! let body = ser::object(|b| {
//!     b.field_str("name", "kiwi");
//!     b.obj("price", |p| {
//!         p.field_f64("amount", 1.5);
//!         p.field_str("currency", "EUR");
//!     });
//! });
//! ```

use crate::error::SerializeError;
use crate::value::{ArrayValue, ObjectValue, Value};

/// Renders a finished wire tree into wire text.
///
/// Implementations own everything format-specific: escaping, number
/// formatting, and which values the format cannot express at all (JSON, for
/// example, rejects non-finite numbers here rather than in the tree).
pub trait Serializer {
    /// Renders an object tree to wire text.
    fn serialize_object(&self, body: &ObjectValue) -> Result<String, SerializeError>;
}

/// Builds an object through a closure and returns the finished tree.
pub fn object(f: impl FnOnce(&mut ObjectCtx)) -> ObjectValue {
    let mut obj = ObjectValue::new();
    f(&mut ObjectCtx::new(&mut obj));
    obj
}

/// Builds an array through a closure and returns the finished tree.
pub fn array(f: impl FnOnce(&mut ArrayCtx)) -> ArrayValue {
    let mut arr = ArrayValue::new();
    f(&mut ArrayCtx::new(&mut arr));
    arr
}

/// A write cursor over one object under construction.
///
/// Typed `field_*` writers cover the scalar kinds; [`ObjectCtx::obj`] and
/// [`ObjectCtx::array`] open nested scopes; [`ObjectCtx::field_value`] is the
/// single funnel through which an already-built [`Value`] of any kind enters
/// the tree.
pub struct ObjectCtx<'a> {
    obj: &'a mut ObjectValue,
}

impl<'a> ObjectCtx<'a> {
    /// Wraps an object for writing.
    pub fn new(obj: &'a mut ObjectValue) -> Self {
        ObjectCtx { obj }
    }

    /// Writes a boolean field.
    pub fn field_bool(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.obj.insert(name, value);
        self
    }

    /// Writes an integral field.
    pub fn field_i32(&mut self, name: impl Into<String>, value: i32) -> &mut Self {
        self.obj.insert(name, value as i64);
        self
    }

    /// Writes an integral field.
    pub fn field_i64(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.obj.insert(name, value);
        self
    }

    /// Writes a floating point field.
    pub fn field_f32(&mut self, name: impl Into<String>, value: f32) -> &mut Self {
        self.obj.insert(name, value as f64);
        self
    }

    /// Writes a floating point field.
    pub fn field_f64(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.obj.insert(name, value);
        self
    }

    /// Writes a string field.
    pub fn field_str(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.obj.insert(name, value.into());
        self
    }

    /// Writes an explicit null field.
    pub fn field_null(&mut self, name: impl Into<String>) -> &mut Self {
        self.obj.insert(name, Value::Null);
        self
    }

    /// Writes an already-built value of any kind.
    ///
    /// Every value enters the tree through one of the typed writers above or
    /// through this funnel; there is no other entry point, so a new [`Value`]
    /// kind cannot be forgotten here without the compiler noticing.
    pub fn field_value(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        match value {
            Value::Null => self.obj.insert(name, Value::Null),
            Value::Bool(b) => self.obj.insert(name, b),
            Value::I64(i) => self.obj.insert(name, i),
            Value::F64(x) => self.obj.insert(name, x),
            Value::Str(s) => self.obj.insert(name, s),
            Value::Array(a) => self.obj.insert(name, a),
            Value::Object(o) => self.obj.insert(name, o),
        }
        self
    }

    /// Opens a nested object scope under `name`.
    pub fn obj(&mut self, name: impl Into<String>, f: impl FnOnce(&mut ObjectCtx)) -> &mut Self {
        let mut nested = ObjectValue::new();
        f(&mut ObjectCtx::new(&mut nested));
        self.obj.insert(name, nested);
        self
    }

    /// Opens a nested array scope under `name`.
    pub fn array(&mut self, name: impl Into<String>, f: impl FnOnce(&mut ArrayCtx)) -> &mut Self {
        let mut nested = ArrayValue::new();
        f(&mut ArrayCtx::new(&mut nested));
        self.obj.insert(name, nested);
        self
    }
}

/// A write cursor over one array under construction.
pub struct ArrayCtx<'a> {
    arr: &'a mut ArrayValue,
}

impl<'a> ArrayCtx<'a> {
    /// Wraps an array for writing.
    pub fn new(arr: &'a mut ArrayValue) -> Self {
        ArrayCtx { arr }
    }

    /// Appends a boolean.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.arr.push(value);
        self
    }

    /// Appends an integral number.
    pub fn push_i64(&mut self, value: i64) -> &mut Self {
        self.arr.push(value);
        self
    }

    /// Appends a floating point number.
    pub fn push_f64(&mut self, value: f64) -> &mut Self {
        self.arr.push(value);
        self
    }

    /// Appends a string.
    pub fn push_str(&mut self, value: impl Into<String>) -> &mut Self {
        self.arr.push(value.into());
        self
    }

    /// Appends an explicit null.
    pub fn push_null(&mut self) -> &mut Self {
        self.arr.push(Value::Null);
        self
    }

    /// Appends an already-built value of any kind.
    pub fn push_value(&mut self, value: Value) -> &mut Self {
        self.arr.push(value);
        self
    }

    /// Appends a nested object built by the closure.
    pub fn obj(&mut self, f: impl FnOnce(&mut ObjectCtx)) -> &mut Self {
        let mut nested = ObjectValue::new();
        f(&mut ObjectCtx::new(&mut nested));
        self.arr.push(nested);
        self
    }

    /// Appends a nested array built by the closure.
    pub fn array(&mut self, f: impl FnOnce(&mut ArrayCtx)) -> &mut Self {
        let mut nested = ArrayValue::new();
        f(&mut ArrayCtx::new(&mut nested));
        self.arr.push(nested);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_build_ordered_trees() {
        let body = object(|b| {
            b.field_str("first", "1");
            b.obj("second", |o| {
                o.field_i64("n", 2);
            });
            b.array("third", |a| {
                a.push_str("x").push_i64(3);
            });
        });
        let keys: Vec<_> = body.keys().collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
        let third = body.get("third").and_then(Value::as_array).unwrap();
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn field_value_accepts_every_kind() {
        let body = object(|b| {
            b.field_value("null", Value::Null)
                .field_value("bool", Value::Bool(true))
                .field_value("int", Value::I64(1))
                .field_value("float", Value::F64(1.5))
                .field_value("str", Value::Str("s".into()))
                .field_value("arr", Value::Array(ArrayValue::new()))
                .field_value("obj", Value::Object(ObjectValue::new()));
        });
        assert_eq!(body.len(), 7);
    }
}
