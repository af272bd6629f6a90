//! Field types: the coercion layer between typed values and the wire tree.
//!
//! A [`FieldType`] owns both directions of a field's value traffic. On the
//! document side it turns typed values into wire values and back; on the
//! query side it does the same for terms (the values used by term queries,
//! range bounds, and aggregation keys). Writing is total: any in-range typed
//! value has a wire form. Reading is where data arrives from outside, so
//! every deserialization returns a named error instead of guessing.
//!
//! Field type instances are built once at declaration time and never mutated
//! afterwards, which is what lets documents share them freely across threads.

use std::any::Any;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DeserializeError;
use crate::value::{ObjectValue, Value};

/// A mapping field type: value and term coercion plus the engine type name.
///
/// `PartialEq` and `Debug` are supertraits because every field type must be
/// comparable for schema merging and printable for conflict messages; see
/// [`AnyFieldType`].
pub trait FieldType: PartialEq + fmt::Debug + Send + Sync + Sized + 'static {
    /// The typed document-side value.
    type Value: Clone + fmt::Debug;
    /// The typed query-side term.
    type Term: Clone + fmt::Debug;

    /// The engine mapping type name, e.g. `"integer"` or `"keyword"`.
    fn name(&self) -> &str;

    /// Turns a typed value into its wire form. Total by construction.
    fn serialize(&self, value: &Self::Value) -> Value;

    /// Interprets a wire value as a typed value.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializeError`] naming the offending value when it is
    /// of the wrong kind, out of range, or unparseable.
    fn deserialize(&self, value: Value) -> Result<Self::Value, DeserializeError>;

    /// Turns a typed term into its wire form. Total by construction; an
    /// undeclared enum variant reaching an enum field is a declaration bug
    /// and panics.
    fn serialize_term(&self, term: &Self::Term) -> Value;

    /// Interprets a wire value (a stored field, an aggregation key) as a
    /// typed term.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializeError`] naming the offending value.
    fn deserialize_term(&self, value: Value) -> Result<Self::Term, DeserializeError>;

    /// Extra mapping body entries this type contributes beyond `type` and
    /// the per-field parameters. Join fields use this for their relations.
    fn mapping_extras(&self) -> Option<ObjectValue> {
        None
    }
}

/// The type-erased face of [`FieldType`], held by bound fields.
///
/// Erasure keeps the document model non-generic; typed handles keep their
/// concrete type alongside. Structural equality goes through `as_any`
/// downcasting, so two independently built but identical field types compare
/// equal, which is what schema merging needs.
pub trait AnyFieldType: Send + Sync + fmt::Debug {
    /// The engine mapping type name.
    fn type_name(&self) -> &str;

    /// Extra mapping body entries, see [`FieldType::mapping_extras`].
    fn type_mapping_extras(&self) -> Option<ObjectValue>;

    /// Upcast for downcasting in [`AnyFieldType::eq_type`].
    fn as_any(&self) -> &dyn Any;

    /// Structural equality across erased field types.
    fn eq_type(&self, other: &dyn AnyFieldType) -> bool;
}

impl<T: FieldType> AnyFieldType for T {
    fn type_name(&self) -> &str {
        FieldType::name(self)
    }

    fn type_mapping_extras(&self) -> Option<ObjectValue> {
        FieldType::mapping_extras(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_type(&self, other: &dyn AnyFieldType) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }
}

fn integer_value(
    value: Value,
    type_name: &'static str,
    min: i64,
    max: i64,
) -> Result<i64, DeserializeError> {
    let wide = match value {
        Value::I64(i) => i,
        Value::Str(s) => s.parse::<i64>().map_err(|e| DeserializeError::BadParse {
            type_name,
            value: format!("{s:?}"),
            cause: e.to_string(),
        })?,
        other => return Err(DeserializeError::unexpected("an integer", &other)),
    };
    if wide < min || wide > max {
        return Err(DeserializeError::OutOfRange { type_name, value: wide.to_string() });
    }
    Ok(wide)
}

fn float_value(value: Value, type_name: &'static str) -> Result<f64, DeserializeError> {
    match value {
        Value::I64(i) => Ok(i as f64),
        Value::F64(x) => Ok(x),
        Value::Str(s) => s.parse::<f64>().map_err(|e| DeserializeError::BadParse {
            type_name,
            value: format!("{s:?}"),
            cause: e.to_string(),
        }),
        other => Err(DeserializeError::unexpected("a number", &other)),
    }
}

fn boolean_value(value: Value) -> Result<bool, DeserializeError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Str(s) if s == "true" => Ok(true),
        Value::Str(s) if s == "false" => Ok(false),
        other => Err(DeserializeError::unexpected("a boolean", &other)),
    }
}

fn string_value(value: Value) -> Result<String, DeserializeError> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::I64(i) => Ok(i.to_string()),
        Value::F64(x) => Ok(x.to_string()),
        other => Err(DeserializeError::unexpected("a string", &other)),
    }
}

/// A signed 8 bit integer field, engine type `byte`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteType;

impl FieldType for ByteType {
    type Value = i8;
    type Term = i8;

    fn name(&self) -> &str {
        "byte"
    }

    fn serialize(&self, value: &i8) -> Value {
        Value::I64(*value as i64)
    }

    fn deserialize(&self, value: Value) -> Result<i8, DeserializeError> {
        integer_value(value, "byte", i8::MIN as i64, i8::MAX as i64).map(|v| v as i8)
    }

    fn serialize_term(&self, term: &i8) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<i8, DeserializeError> {
        self.deserialize(value)
    }
}

/// A signed 16 bit integer field, engine type `short`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortType;

impl FieldType for ShortType {
    type Value = i16;
    type Term = i16;

    fn name(&self) -> &str {
        "short"
    }

    fn serialize(&self, value: &i16) -> Value {
        Value::I64(*value as i64)
    }

    fn deserialize(&self, value: Value) -> Result<i16, DeserializeError> {
        integer_value(value, "short", i16::MIN as i64, i16::MAX as i64).map(|v| v as i16)
    }

    fn serialize_term(&self, term: &i16) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<i16, DeserializeError> {
        self.deserialize(value)
    }
}

/// A signed 32 bit integer field, engine type `integer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntType;

impl FieldType for IntType {
    type Value = i32;
    type Term = i32;

    fn name(&self) -> &str {
        "integer"
    }

    fn serialize(&self, value: &i32) -> Value {
        Value::I64(*value as i64)
    }

    fn deserialize(&self, value: Value) -> Result<i32, DeserializeError> {
        integer_value(value, "integer", i32::MIN as i64, i32::MAX as i64).map(|v| v as i32)
    }

    fn serialize_term(&self, term: &i32) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<i32, DeserializeError> {
        self.deserialize(value)
    }
}

/// A signed 64 bit integer field, engine type `long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongType;

impl FieldType for LongType {
    type Value = i64;
    type Term = i64;

    fn name(&self) -> &str {
        "long"
    }

    fn serialize(&self, value: &i64) -> Value {
        Value::I64(*value)
    }

    fn deserialize(&self, value: Value) -> Result<i64, DeserializeError> {
        integer_value(value, "long", i64::MIN, i64::MAX)
    }

    fn serialize_term(&self, term: &i64) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<i64, DeserializeError> {
        self.deserialize(value)
    }
}

/// A 32 bit floating point field, engine type `float`.
///
/// Integral wire numbers are accepted; a finite value that overflows the 32
/// bit range is rejected as out of range rather than silently turned into an
/// infinity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatType;

impl FieldType for FloatType {
    type Value = f32;
    type Term = f32;

    fn name(&self) -> &str {
        "float"
    }

    fn serialize(&self, value: &f32) -> Value {
        Value::F64(*value as f64)
    }

    fn deserialize(&self, value: Value) -> Result<f32, DeserializeError> {
        let wide = float_value(value, "float")?;
        let narrow = wide as f32;
        if narrow.is_infinite() && wide.is_finite() {
            return Err(DeserializeError::OutOfRange {
                type_name: "float",
                value: wide.to_string(),
            });
        }
        Ok(narrow)
    }

    fn serialize_term(&self, term: &f32) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<f32, DeserializeError> {
        self.deserialize(value)
    }
}

/// A 64 bit floating point field, engine type `double`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoubleType;

impl FieldType for DoubleType {
    type Value = f64;
    type Term = f64;

    fn name(&self) -> &str {
        "double"
    }

    fn serialize(&self, value: &f64) -> Value {
        Value::F64(*value)
    }

    fn deserialize(&self, value: Value) -> Result<f64, DeserializeError> {
        float_value(value, "double")
    }

    fn serialize_term(&self, term: &f64) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<f64, DeserializeError> {
        self.deserialize(value)
    }
}

/// A boolean field. Accepts the strings `"true"` and `"false"` on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanType;

impl FieldType for BooleanType {
    type Value = bool;
    type Term = bool;

    fn name(&self) -> &str {
        "boolean"
    }

    fn serialize(&self, value: &bool) -> Value {
        Value::Bool(*value)
    }

    fn deserialize(&self, value: Value) -> Result<bool, DeserializeError> {
        boolean_value(value)
    }

    fn serialize_term(&self, term: &bool) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<bool, DeserializeError> {
        boolean_value(value)
    }
}

/// An exact-match string field, engine type `keyword`. Non-string scalars are
/// stringified on read; engines index numbers into keyword fields happily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordType;

impl FieldType for KeywordType {
    type Value = String;
    type Term = String;

    fn name(&self) -> &str {
        "keyword"
    }

    fn serialize(&self, value: &String) -> Value {
        Value::Str(value.clone())
    }

    fn deserialize(&self, value: Value) -> Result<String, DeserializeError> {
        string_value(value)
    }

    fn serialize_term(&self, term: &String) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<String, DeserializeError> {
        string_value(value)
    }
}

/// An analyzed full-text field, engine type `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextType;

impl FieldType for TextType {
    type Value = String;
    type Term = String;

    fn name(&self) -> &str {
        "text"
    }

    fn serialize(&self, value: &String) -> Value {
        Value::Str(value.clone())
    }

    fn deserialize(&self, value: Value) -> Result<String, DeserializeError> {
        string_value(value)
    }

    fn serialize_term(&self, term: &String) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<String, DeserializeError> {
        string_value(value)
    }
}

/// A date field, engine type `date`.
///
/// Writes RFC 3339 with millisecond precision; reads RFC 3339 strings and
/// epoch-millisecond numbers (the two forms engines hand back depending on
/// the context the date appears in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeType;

impl DateTimeType {
    fn from_millis(ms: i64) -> Result<DateTime<Utc>, DeserializeError> {
        DateTime::from_timestamp_millis(ms).ok_or(DeserializeError::OutOfRange {
            type_name: "date",
            value: ms.to_string(),
        })
    }
}

impl FieldType for DateTimeType {
    type Value = DateTime<Utc>;
    type Term = DateTime<Utc>;

    fn name(&self) -> &str {
        "date"
    }

    fn serialize(&self, value: &DateTime<Utc>) -> Value {
        Value::Str(value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn deserialize(&self, value: Value) -> Result<DateTime<Utc>, DeserializeError> {
        match value {
            Value::Str(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DeserializeError::BadParse {
                    type_name: "date",
                    value: format!("{s:?}"),
                    cause: e.to_string(),
                }),
            Value::I64(ms) => Self::from_millis(ms),
            Value::F64(x) if x.is_finite() && x.fract() == 0.0 => Self::from_millis(x as i64),
            other => Err(DeserializeError::unexpected("a date", &other)),
        }
    }

    fn serialize_term(&self, term: &DateTime<Utc>) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<DateTime<Utc>, DeserializeError> {
        self.deserialize(value)
    }
}

/// How an enum field is written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWire {
    /// Variants travel as their declared names; the field maps as `keyword`.
    Name,
    /// Variants travel as their declaration index; the field maps as
    /// `integer`.
    Ordinal,
}

/// An enum field over an application type `E`.
///
/// The variant table is built once at declaration time from the full list of
/// variants and is consulted in both directions. Serializing a variant that
/// was not declared is a bug in the declaration and panics; reading a wire
/// value that matches no declared variant is a data error and fails with
/// [`DeserializeError::NoSuchVariant`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType<E> {
    enum_name: &'static str,
    wire: EnumWire,
    variants: Vec<(E, &'static str)>,
}

impl<E> EnumType<E>
where
    E: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    /// Declares an enum field that travels by variant name.
    ///
    /// # Arguments
    ///
    /// * `enum_name` - The application-side enum name, used in error messages
    /// * `variants` - Every variant paired with its wire name
    pub fn by_name(
        enum_name: &'static str,
        variants: impl IntoIterator<Item = (E, &'static str)>,
    ) -> Self {
        EnumType { enum_name, wire: EnumWire::Name, variants: variants.into_iter().collect() }
    }

    /// Declares an enum field that travels by declaration index.
    pub fn by_ordinal(
        enum_name: &'static str,
        variants: impl IntoIterator<Item = (E, &'static str)>,
    ) -> Self {
        EnumType { enum_name, wire: EnumWire::Ordinal, variants: variants.into_iter().collect() }
    }

    fn position(&self, variant: &E) -> usize {
        match self.variants.iter().position(|(v, _)| v == variant) {
            Some(i) => i,
            None => panic!(
                "variant {:?} is not declared for enum field type {}",
                variant, self.enum_name
            ),
        }
    }
}

impl<E> FieldType for EnumType<E>
where
    E: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    type Value = E;
    type Term = E;

    fn name(&self) -> &str {
        match self.wire {
            EnumWire::Name => "keyword",
            EnumWire::Ordinal => "integer",
        }
    }

    fn serialize(&self, value: &E) -> Value {
        let pos = self.position(value);
        match self.wire {
            EnumWire::Name => Value::Str(self.variants[pos].1.to_string()),
            EnumWire::Ordinal => Value::I64(pos as i64),
        }
    }

    fn deserialize(&self, value: Value) -> Result<E, DeserializeError> {
        match (self.wire, &value) {
            (EnumWire::Name, Value::Str(s)) => self
                .variants
                .iter()
                .find(|(_, name)| name == s)
                .map(|(v, _)| v.clone())
                .ok_or_else(|| DeserializeError::NoSuchVariant {
                    type_name: self.enum_name,
                    value: format!("{s:?}"),
                }),
            (EnumWire::Ordinal, Value::I64(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| self.variants.get(i))
                .map(|(v, _)| v.clone())
                .ok_or_else(|| DeserializeError::NoSuchVariant {
                    type_name: self.enum_name,
                    value: i.to_string(),
                }),
            _ => Err(DeserializeError::unexpected(
                match self.wire {
                    EnumWire::Name => "a variant name",
                    EnumWire::Ordinal => "a variant ordinal",
                },
                &value,
            )),
        }
    }

    fn serialize_term(&self, term: &E) -> Value {
        self.serialize(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<E, DeserializeError> {
        self.deserialize(value)
    }
}

/// A typed range value: any subset of the four bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeValue<T> {
    /// Exclusive lower bound.
    pub gt: Option<T>,
    /// Inclusive lower bound.
    pub gte: Option<T>,
    /// Exclusive upper bound.
    pub lt: Option<T>,
    /// Inclusive upper bound.
    pub lte: Option<T>,
}

impl<T> RangeValue<T> {
    /// An empty range value with no bounds set.
    pub fn new() -> Self {
        RangeValue { gt: None, gte: None, lt: None, lte: None }
    }
}

/// A range field over a wrapped scalar type, engine type `<inner>_range`.
///
/// Each present bound is coerced through the wrapped type, so an
/// `integer_range` enforces integer semantics on every bound.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeType<F> {
    inner: F,
    name: String,
}

impl<F: FieldType> RangeType<F> {
    /// Declares a range field over `inner`.
    pub fn new(inner: F) -> Self {
        let name = format!("{}_range", inner.name());
        RangeType { inner, name }
    }

    /// The wrapped scalar type.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: FieldType> FieldType for RangeType<F> {
    type Value = RangeValue<F::Value>;
    type Term = F::Term;

    fn name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, value: &Self::Value) -> Value {
        let mut obj = ObjectValue::new();
        if let Some(gt) = &value.gt {
            obj.insert("gt", self.inner.serialize(gt));
        }
        if let Some(gte) = &value.gte {
            obj.insert("gte", self.inner.serialize(gte));
        }
        if let Some(lt) = &value.lt {
            obj.insert("lt", self.inner.serialize(lt));
        }
        if let Some(lte) = &value.lte {
            obj.insert("lte", self.inner.serialize(lte));
        }
        Value::Object(obj)
    }

    fn deserialize(&self, value: Value) -> Result<Self::Value, DeserializeError> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => return Err(DeserializeError::unexpected("a range object", &other)),
        };
        let mut range = RangeValue::new();
        for (key, bound) in obj.iter() {
            if bound.is_null() {
                continue;
            }
            match key {
                "gt" => range.gt = Some(self.inner.deserialize(bound.clone())?),
                "gte" => range.gte = Some(self.inner.deserialize(bound.clone())?),
                "lt" => range.lt = Some(self.inner.deserialize(bound.clone())?),
                "lte" => range.lte = Some(self.inner.deserialize(bound.clone())?),
                // Engines decorate stored ranges with extra keys; only the
                // bounds matter here.
                _ => {}
            }
        }
        Ok(range)
    }

    fn serialize_term(&self, term: &Self::Term) -> Value {
        self.inner.serialize_term(term)
    }

    fn deserialize_term(&self, value: Value) -> Result<Self::Term, DeserializeError> {
        self.inner.deserialize_term(value)
    }
}

/// A parent/child join value: the relation name, plus the parent id when the
/// document is on the child side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinValue {
    /// The relation name.
    pub name: String,
    /// The parent document id, for child documents.
    pub parent: Option<String>,
}

impl JoinValue {
    /// A parent-side join value.
    pub fn new(name: impl Into<String>) -> Self {
        JoinValue { name: name.into(), parent: None }
    }

    /// A child-side join value pointing at its parent document.
    pub fn child(name: impl Into<String>, parent: impl Into<String>) -> Self {
        JoinValue { name: name.into(), parent: Some(parent.into()) }
    }
}

/// A parent/child join field, engine type `join`.
///
/// The declared relations are carried into the mapping body. Terms are
/// relation names, which is what `has_parent`/`has_child` queries filter on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinType {
    relations: Vec<(String, Vec<String>)>,
}

impl JoinType {
    /// Declares a join field with no relations yet.
    pub fn new() -> Self {
        JoinType { relations: Vec::new() }
    }

    /// Adds a relation from `parent` to one or more child names.
    pub fn relation<S: Into<String>>(
        mut self,
        parent: impl Into<String>,
        children: impl IntoIterator<Item = S>,
    ) -> Self {
        self.relations
            .push((parent.into(), children.into_iter().map(Into::into).collect()));
        self
    }
}

impl FieldType for JoinType {
    type Value = JoinValue;
    type Term = String;

    fn name(&self) -> &str {
        "join"
    }

    fn serialize(&self, value: &JoinValue) -> Value {
        match &value.parent {
            None => Value::Str(value.name.clone()),
            Some(parent) => {
                let mut obj = ObjectValue::new();
                obj.insert("name", value.name.clone());
                obj.insert("parent", parent.clone());
                Value::Object(obj)
            }
        }
    }

    fn deserialize(&self, value: Value) -> Result<JoinValue, DeserializeError> {
        match &value {
            Value::Str(name) => Ok(JoinValue::new(name.clone())),
            Value::Object(obj) => {
                let name = obj
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| DeserializeError::unexpected("a join value", &value))?;
                let parent = obj.get("parent").and_then(Value::as_str).map(String::from);
                Ok(JoinValue { name: name.to_string(), parent })
            }
            other => Err(DeserializeError::unexpected("a join value", other)),
        }
    }

    fn serialize_term(&self, term: &String) -> Value {
        Value::Str(term.clone())
    }

    fn deserialize_term(&self, value: Value) -> Result<String, DeserializeError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(DeserializeError::unexpected("a relation name", &other)),
        }
    }

    fn mapping_extras(&self) -> Option<ObjectValue> {
        if self.relations.is_empty() {
            return None;
        }
        let mut relations = ObjectValue::new();
        for (parent, children) in &self.relations {
            if children.len() == 1 {
                relations.insert(parent.clone(), children[0].clone());
            } else {
                let children: crate::value::ArrayValue =
                    children.iter().map(|c| Value::Str(c.clone())).collect();
                relations.insert(parent.clone(), children);
            }
        }
        let mut extras = ObjectValue::new();
        extras.insert("relations", relations);
        Some(extras)
    }
}

/// The field type behind object sub-documents. Values pass through as wire
/// objects; typed access goes through the sub-document's own fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectType;

impl FieldType for ObjectType {
    type Value = ObjectValue;
    type Term = ObjectValue;

    fn name(&self) -> &str {
        "object"
    }

    fn serialize(&self, value: &ObjectValue) -> Value {
        Value::Object(value.clone())
    }

    fn deserialize(&self, value: Value) -> Result<ObjectValue, DeserializeError> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(DeserializeError::unexpected("an object", &other)),
        }
    }

    fn serialize_term(&self, term: &ObjectValue) -> Value {
        Value::Object(term.clone())
    }

    fn deserialize_term(&self, value: Value) -> Result<ObjectValue, DeserializeError> {
        self.deserialize(value)
    }
}

/// The field type behind nested sub-documents: like [`ObjectType`], but each
/// array element is indexed as its own hidden document and must be queried
/// through a nested query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NestedType;

impl FieldType for NestedType {
    type Value = ObjectValue;
    type Term = ObjectValue;

    fn name(&self) -> &str {
        "nested"
    }

    fn serialize(&self, value: &ObjectValue) -> Value {
        Value::Object(value.clone())
    }

    fn deserialize(&self, value: Value) -> Result<ObjectValue, DeserializeError> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(DeserializeError::unexpected("an object", &other)),
        }
    }

    fn serialize_term(&self, term: &ObjectValue) -> Value {
        Value::Object(term.clone())
    }

    fn deserialize_term(&self, value: Value) -> Result<ObjectValue, DeserializeError> {
        self.deserialize(value)
    }
}
