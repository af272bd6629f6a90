//! Document schemas: typed field handles, sub-documents, meta fields,
//! dynamic templates, and runtime fields.
//!
//! A [`Document`] is an immutable description of an index mapping. Fields
//! are declared through a builder and come back as typed [`Field`] handles
//! that the query layer consumes; the handles stay valid for the lifetime of
//! the schema and know their qualified dot-path from their position in the
//! tree.
//!
//! # Declaring a schema
//!
//! ```ignore
//! use searchlayer_core::document::{Document, SubDocument};
//! use searchlayer_core::types::{KeywordType, TextType};
//!
//! struct UserFields {
//!     name: searchlayer_core::document::Field<KeywordType>,
//! }
//!
//! let mut b = Document::builder();
//! let title = b.text("title");
//! let user = b.object("user", SubDocument::build(|u| UserFields {
//!     name: u.keyword("name"),
//! }));
//! let schema = b.finish();
//!
//! assert_eq!(user.fields().name.qualified_name(), "user.name");
//! ```
//!
//! Field handles are reference handles: cloning one is cheap and both clones
//! point at the same bound field. Schema merging relies on that identity to
//! share unchanged subtrees between schemas.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::types::{AnyFieldType, FieldType, NestedType, ObjectType};
use crate::value::{ObjectValue, Value};

/// Per-field mapping parameters (`store`, `analyzer`, `format`, ...).
///
/// An insertion-ordered name/value map with named setters for the common
/// parameters and [`MappingParams::set`] for everything else. Equality for
/// schema merging ignores declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingParams {
    entries: ObjectValue,
}

impl MappingParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        MappingParams { entries: ObjectValue::new() }
    }

    /// Sets an arbitrary parameter, replacing any previous value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name, value);
        self
    }

    /// Whether the field value is stored separately from `_source`.
    pub fn store(self, store: bool) -> Self {
        self.set("store", store)
    }

    /// Whether the field is indexed.
    pub fn index(self, index: bool) -> Self {
        self.set("index", index)
    }

    /// Whether doc values are built for the field.
    pub fn doc_values(self, doc_values: bool) -> Self {
        self.set("doc_values", doc_values)
    }

    /// The index-time analyzer.
    pub fn analyzer(self, analyzer: impl Into<String>) -> Self {
        self.set("analyzer", analyzer.into())
    }

    /// The search-time analyzer.
    pub fn search_analyzer(self, analyzer: impl Into<String>) -> Self {
        self.set("search_analyzer", analyzer.into())
    }

    /// The date format pattern.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.set("format", format.into())
    }

    /// The keyword length cutoff.
    pub fn ignore_above(self, limit: i64) -> Self {
        self.set("ignore_above", limit)
    }

    /// The value substituted for explicit nulls.
    pub fn null_value(self, value: impl Into<Value>) -> Self {
        self.set("null_value", value)
    }

    /// Returns the value for `name`, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter()
    }

    /// The first parameter that differs between the two sets, considering
    /// keys from both sides. `None` means the sets are equal regardless of
    /// declaration order.
    pub(crate) fn first_conflict<'a>(
        &'a self,
        other: &'a MappingParams,
    ) -> Option<(&'a str, Option<&'a Value>, Option<&'a Value>)> {
        for (key, left) in self.entries.iter() {
            match other.entries.get(key) {
                Some(right) if right == left => {}
                right => return Some((key, Some(left), right)),
            }
        }
        for (key, right) in other.entries.iter() {
            if !self.entries.contains_key(key) {
                return Some((key, None, Some(right)));
            }
        }
        None
    }
}

/// An inline script: a source string plus optional language and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    source: String,
    lang: Option<String>,
    params: ObjectValue,
}

impl Script {
    /// Creates a script from its source.
    pub fn new(source: impl Into<String>) -> Self {
        Script { source: source.into(), lang: None, params: ObjectValue::new() }
    }

    /// Sets the script language (engines default to painless).
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Adds a script parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// The script source.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn body(&self) -> ObjectValue {
        let mut body = ObjectValue::new();
        body.insert("source", self.source.clone());
        if let Some(lang) = &self.lang {
            body.insert("lang", lang.clone());
        }
        if !self.params.is_empty() {
            body.insert("params", self.params.clone());
        }
        body
    }
}

/// Whether a sub-document is flattened into its parent or indexed as hidden
/// child documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubDocumentKind {
    /// Flattened `object` mapping.
    Object,
    /// `nested` mapping; elements are queried through nested queries.
    Nested,
}

impl SubDocumentKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SubDocumentKind::Object => "object",
            SubDocumentKind::Nested => "nested",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Parent {
    Root,
    Field(Weak<BoundField>),
}

impl Parent {
    fn same_as(&self, other: &Parent) -> bool {
        match (self, other) {
            (Parent::Root, Parent::Root) => true,
            (Parent::Field(a), Parent::Field(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SubDocumentBinding {
    pub(crate) kind: SubDocumentKind,
    pub(crate) fields: Vec<Arc<BoundField>>,
}

/// The type-erased core of a declared field. Handles wrap an `Arc` of this;
/// pointer identity of the `Arc` is field identity.
#[derive(Debug)]
pub struct BoundField {
    name: String,
    ftype: Arc<dyn AnyFieldType>,
    params: MappingParams,
    sub_fields: Vec<Arc<BoundField>>,
    sub_document: Option<SubDocumentBinding>,
    parent: OnceLock<Parent>,
}

impl BoundField {
    pub(crate) fn new(
        name: impl Into<String>,
        ftype: Arc<dyn AnyFieldType>,
        params: MappingParams,
    ) -> Self {
        BoundField {
            name: name.into(),
            ftype,
            params,
            sub_fields: Vec::new(),
            sub_document: None,
            parent: OnceLock::new(),
        }
    }

    pub(crate) fn with_parts(
        name: impl Into<String>,
        ftype: Arc<dyn AnyFieldType>,
        params: MappingParams,
        sub_fields: Vec<Arc<BoundField>>,
        sub_document: Option<SubDocumentBinding>,
    ) -> Self {
        BoundField {
            name: name.into(),
            ftype,
            params,
            sub_fields,
            sub_document,
            parent: OnceLock::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn type_name(&self) -> &str {
        self.ftype.type_name()
    }

    pub(crate) fn ftype(&self) -> &Arc<dyn AnyFieldType> {
        &self.ftype
    }

    pub(crate) fn params(&self) -> &MappingParams {
        &self.params
    }

    pub(crate) fn sub_fields(&self) -> &[Arc<BoundField>] {
        &self.sub_fields
    }

    pub(crate) fn sub_document(&self) -> Option<&SubDocumentBinding> {
        self.sub_document.as_ref()
    }

    /// Registers this field under a parent. Fields register exactly once;
    /// registering under a second parent panics with the field named.
    pub(crate) fn attach(&self, parent: Parent) {
        if self.parent.set(parent.clone()).is_err()
            && let Some(existing) = self.parent.get()
            && !existing.same_as(&parent)
        {
            panic!("field {:?} already initialized", self.name);
        }
    }

    /// The dot-joined path from the schema root, computed by walking the
    /// parent chain. A field that was never attached reads as root-level.
    pub(crate) fn qualified_name(&self) -> String {
        let mut segments = vec![self.name.clone()];
        let mut parent = self.parent.get().cloned();
        while let Some(Parent::Field(weak)) = parent {
            match weak.upgrade() {
                Some(owner) => {
                    segments.push(owner.name.clone());
                    parent = owner.parent.get().cloned();
                }
                None => break,
            }
        }
        segments.reverse();
        segments.join(".")
    }

    pub(crate) fn child(&self, name: &str) -> Option<Arc<BoundField>> {
        if let Some(binding) = &self.sub_document
            && let Some(found) = binding.fields.iter().find(|f| f.name == name)
        {
            return Some(found.clone());
        }
        self.sub_fields.iter().find(|f| f.name == name).cloned()
    }

    /// The mapping body for this field: `type`, parameters, type extras,
    /// then `fields` (multi-fields) or `properties` (sub-documents).
    pub(crate) fn mapping_body(&self) -> ObjectValue {
        let mut body = ObjectValue::new();
        body.insert("type", self.type_name());
        for (key, value) in self.params.iter() {
            body.insert(key, value.clone());
        }
        if let Some(extras) = self.ftype.type_mapping_extras() {
            for (key, value) in extras.iter() {
                body.insert(key, value.clone());
            }
        }
        if !self.sub_fields.is_empty() {
            let mut fields = ObjectValue::new();
            for sub in &self.sub_fields {
                fields.insert(sub.name.clone(), sub.mapping_body());
            }
            body.insert("fields", fields);
        }
        if let Some(binding) = &self.sub_document {
            let mut props = ObjectValue::new();
            for child in &binding.fields {
                props.insert(child.name.clone(), child.mapping_body());
            }
            body.insert("properties", props);
        }
        body
    }
}

/// A typed handle to a declared field.
///
/// Cheap to clone; clones share identity. The handle carries its concrete
/// [`FieldType`] so term values stay typed all the way into query
/// construction.
pub struct Field<FT: FieldType> {
    bound: Arc<BoundField>,
    ftype: Arc<FT>,
}

impl<FT: FieldType> Field<FT> {
    pub(crate) fn from_parts(bound: Arc<BoundField>, ftype: Arc<FT>) -> Self {
        Field { bound, ftype }
    }

    /// The declared field name.
    pub fn name(&self) -> &str {
        self.bound.name()
    }

    /// The dot-joined path from the schema root.
    pub fn qualified_name(&self) -> String {
        self.bound.qualified_name()
    }

    /// The concrete field type.
    pub fn ftype(&self) -> &FT {
        &self.ftype
    }

    /// Whether two handles point at the same bound field.
    pub fn ptr_eq(&self, other: &Field<FT>) -> bool {
        Arc::ptr_eq(&self.bound, &other.bound)
    }

    /// Drops the typing, keeping the identity.
    pub fn erased(&self) -> DynField {
        DynField { bound: self.bound.clone() }
    }

    pub(crate) fn bound(&self) -> &Arc<BoundField> {
        &self.bound
    }
}

impl<FT: FieldType> Clone for Field<FT> {
    fn clone(&self) -> Self {
        Field { bound: self.bound.clone(), ftype: self.ftype.clone() }
    }
}

impl<FT: FieldType> fmt::Debug for Field<FT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.bound.qualified_name())
            .field("type", &self.bound.type_name())
            .finish()
    }
}

/// An untyped handle to a field, as returned by name and dynamic-template
/// lookups.
#[derive(Clone)]
pub struct DynField {
    bound: Arc<BoundField>,
}

impl DynField {
    /// The declared field name.
    pub fn name(&self) -> &str {
        self.bound.name()
    }

    /// The dot-joined path from the schema root.
    pub fn qualified_name(&self) -> String {
        self.bound.qualified_name()
    }

    /// The engine mapping type name.
    pub fn type_name(&self) -> &str {
        self.bound.type_name()
    }

    /// Whether two handles point at the same bound field.
    pub fn ptr_eq(&self, other: &DynField) -> bool {
        Arc::ptr_eq(&self.bound, &other.bound)
    }

    pub(crate) fn bound(&self) -> &Arc<BoundField> {
        &self.bound
    }
}

impl fmt::Debug for DynField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynField")
            .field("name", &self.bound.qualified_name())
            .field("type", &self.bound.type_name())
            .finish()
    }
}

/// The field declaration surface shared by document roots and sub-documents.
///
/// Declaring two fields with the same name in one scope is a bug in the
/// schema and panics.
#[derive(Debug, Default)]
pub struct FieldScope {
    fields: Vec<Arc<BoundField>>,
}

impl FieldScope {
    fn insert(&mut self, bound: Arc<BoundField>) {
        if self.fields.iter().any(|f| f.name() == bound.name()) {
            panic!("field {:?} already declared in this scope", bound.name());
        }
        self.fields.push(bound);
    }

    /// Declares a field with default parameters.
    pub fn field<FT: FieldType>(&mut self, name: &str, ftype: FT) -> Field<FT> {
        self.field_with(name, ftype, MappingParams::new())
    }

    /// Declares a field with explicit mapping parameters.
    pub fn field_with<FT: FieldType>(
        &mut self,
        name: &str,
        ftype: FT,
        params: MappingParams,
    ) -> Field<FT> {
        let ftype = Arc::new(ftype);
        let bound = Arc::new(BoundField::new(name, ftype.clone() as Arc<dyn AnyFieldType>, params));
        self.insert(bound.clone());
        Field::from_parts(bound, ftype)
    }

    /// Declares a field together with its multi-fields. The closure declares
    /// the sub-fields and its return value is handed back alongside the
    /// owning field's handle.
    pub fn field_with_subs<FT: FieldType, R>(
        &mut self,
        name: &str,
        ftype: FT,
        params: MappingParams,
        subs: impl FnOnce(&mut FieldScope) -> R,
    ) -> (Field<FT>, R) {
        let mut scope = FieldScope::default();
        let handles = subs(&mut scope);
        let ftype = Arc::new(ftype);
        let bound = Arc::new(BoundField::with_parts(
            name,
            ftype.clone() as Arc<dyn AnyFieldType>,
            params,
            scope.fields,
            None,
        ));
        for sub in bound.sub_fields() {
            sub.attach(Parent::Field(Arc::downgrade(&bound)));
        }
        self.insert(bound.clone());
        (Field::from_parts(bound, ftype), handles)
    }

    /// Declares a byte field.
    pub fn byte(&mut self, name: &str) -> Field<crate::types::ByteType> {
        self.field(name, crate::types::ByteType)
    }

    /// Declares a short field.
    pub fn short(&mut self, name: &str) -> Field<crate::types::ShortType> {
        self.field(name, crate::types::ShortType)
    }

    /// Declares an integer field.
    pub fn int(&mut self, name: &str) -> Field<crate::types::IntType> {
        self.field(name, crate::types::IntType)
    }

    /// Declares a long field.
    pub fn long(&mut self, name: &str) -> Field<crate::types::LongType> {
        self.field(name, crate::types::LongType)
    }

    /// Declares a float field.
    pub fn float(&mut self, name: &str) -> Field<crate::types::FloatType> {
        self.field(name, crate::types::FloatType)
    }

    /// Declares a double field.
    pub fn double(&mut self, name: &str) -> Field<crate::types::DoubleType> {
        self.field(name, crate::types::DoubleType)
    }

    /// Declares a boolean field.
    pub fn boolean(&mut self, name: &str) -> Field<crate::types::BooleanType> {
        self.field(name, crate::types::BooleanType)
    }

    /// Declares a keyword field.
    pub fn keyword(&mut self, name: &str) -> Field<crate::types::KeywordType> {
        self.field(name, crate::types::KeywordType)
    }

    /// Declares a text field.
    pub fn text(&mut self, name: &str) -> Field<crate::types::TextType> {
        self.field(name, crate::types::TextType)
    }

    /// Declares a date field.
    pub fn date(&mut self, name: &str) -> Field<crate::types::DateTimeType> {
        self.field(name, crate::types::DateTimeType)
    }

    /// Attaches a sub-document as a flattened object field.
    pub fn object<T>(&mut self, name: &str, sub: SubDocument<T>) -> SubDocumentField<T> {
        self.sub_doc(name, SubDocumentKind::Object, sub, MappingParams::new())
    }

    /// Attaches a sub-document as a flattened object field, with parameters.
    pub fn object_with<T>(
        &mut self,
        name: &str,
        sub: SubDocument<T>,
        params: MappingParams,
    ) -> SubDocumentField<T> {
        self.sub_doc(name, SubDocumentKind::Object, sub, params)
    }

    /// Attaches a sub-document as a nested field.
    pub fn nested<T>(&mut self, name: &str, sub: SubDocument<T>) -> SubDocumentField<T> {
        self.sub_doc(name, SubDocumentKind::Nested, sub, MappingParams::new())
    }

    /// Attaches a sub-document as a nested field, with parameters.
    pub fn nested_with<T>(
        &mut self,
        name: &str,
        sub: SubDocument<T>,
        params: MappingParams,
    ) -> SubDocumentField<T> {
        self.sub_doc(name, SubDocumentKind::Nested, sub, params)
    }

    fn sub_doc<T>(
        &mut self,
        name: &str,
        kind: SubDocumentKind,
        sub: SubDocument<T>,
        params: MappingParams,
    ) -> SubDocumentField<T> {
        let ftype: Arc<dyn AnyFieldType> = match kind {
            SubDocumentKind::Object => Arc::new(ObjectType),
            SubDocumentKind::Nested => Arc::new(NestedType),
        };
        let bound = Arc::new(BoundField::with_parts(
            name,
            ftype,
            params,
            Vec::new(),
            Some(SubDocumentBinding { kind, fields: sub.fields }),
        ));
        if let Some(binding) = bound.sub_document() {
            for child in &binding.fields {
                child.attach(Parent::Field(Arc::downgrade(&bound)));
            }
        }
        self.insert(bound.clone());
        SubDocumentField { bound, handles: Arc::new(sub.handles) }
    }

    pub(crate) fn into_fields(self) -> Vec<Arc<BoundField>> {
        self.fields
    }
}

/// A reusable sub-document definition: a set of fields plus whatever handle
/// struct the building closure returned.
///
/// A sub-document is consumed when attached, so it belongs to exactly one
/// parent field. The typed handles created inside stay usable after
/// attachment and resolve their qualified names through the parent.
pub struct SubDocument<T> {
    fields: Vec<Arc<BoundField>>,
    handles: T,
}

impl<T> SubDocument<T> {
    /// Builds a sub-document. The closure declares fields in the given scope
    /// and returns the handle struct to keep.
    pub fn build(f: impl FnOnce(&mut FieldScope) -> T) -> SubDocument<T> {
        let mut scope = FieldScope::default();
        let handles = f(&mut scope);
        SubDocument { fields: scope.into_fields(), handles }
    }

    /// The handle struct returned by the building closure.
    pub fn handles(&self) -> &T {
        &self.handles
    }
}

/// The field a sub-document was attached under.
pub struct SubDocumentField<T> {
    bound: Arc<BoundField>,
    handles: Arc<T>,
}

impl<T> SubDocumentField<T> {
    /// The declared field name.
    pub fn name(&self) -> &str {
        self.bound.name()
    }

    /// The dot-joined path from the schema root.
    pub fn qualified_name(&self) -> String {
        self.bound.qualified_name()
    }

    /// Whether this is an object or nested sub-document.
    pub fn kind(&self) -> SubDocumentKind {
        match self.bound.sub_document() {
            Some(binding) => binding.kind,
            None => SubDocumentKind::Object,
        }
    }

    /// The sub-document's handle struct.
    pub fn fields(&self) -> &T {
        &self.handles
    }

    /// Drops the typing, keeping the identity.
    pub fn erased(&self) -> DynField {
        DynField { bound: self.bound.clone() }
    }

    pub(crate) fn bound(&self) -> &Arc<BoundField> {
        &self.bound
    }
}

impl<T> Clone for SubDocumentField<T> {
    fn clone(&self) -> Self {
        SubDocumentField { bound: self.bound.clone(), handles: self.handles.clone() }
    }
}

impl<T> fmt::Debug for SubDocumentField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubDocumentField")
            .field("name", &self.bound.qualified_name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// `_routing` meta field options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingMeta {
    /// Whether every index request must carry a routing value.
    pub required: bool,
}

/// `_source` meta field options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceMeta {
    /// Whether the source is stored at all.
    pub enabled: Option<bool>,
    /// Source field include patterns.
    pub includes: Vec<String>,
    /// Source field exclude patterns.
    pub excludes: Vec<String>,
}

/// `_size` meta field options (requires the engine's size plugin).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SizeMeta {
    /// Whether the source size is indexed.
    pub enabled: bool,
}

/// The meta fields a document carries alongside its own fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetaFields {
    /// `_routing` options.
    pub routing: RoutingMeta,
    /// `_source` options.
    pub source: SourceMeta,
    /// `_size` options.
    pub size: SizeMeta,
}

/// The dynamic-mapping mode for fields not covered by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dynamic {
    /// Unknown fields are mapped on the fly.
    True,
    /// Unknown fields are stored but not indexed.
    False,
    /// Unknown fields are rejected.
    Strict,
}

impl Dynamic {
    pub(crate) fn as_value(&self) -> Value {
        match self {
            Dynamic::True => Value::Bool(true),
            Dynamic::False => Value::Bool(false),
            Dynamic::Strict => Value::Str("strict".to_string()),
        }
    }
}

/// Document-level mapping options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentOptions {
    /// The dynamic-mapping mode, when set explicitly.
    pub dynamic: Option<Dynamic>,
}

#[derive(Clone)]
pub(crate) struct TemplateDef {
    pub(crate) name: String,
    pub(crate) pattern: String,
    pub(crate) match_mapping_type: Option<String>,
    pub(crate) produce: Arc<dyn Fn(&str) -> Arc<BoundField> + Send + Sync>,
}

impl TemplateDef {
    /// The mapping this template produces, rendered for a probe name derived
    /// from the pattern. Producer closures cannot be compared; their output
    /// can, and this is what template equality during merging looks at.
    pub(crate) fn probe_mapping(&self) -> ObjectValue {
        let probe = self.pattern.replace('*', "probe");
        (self.produce)(&probe).mapping_body()
    }

    /// The `dynamic_templates` entry for this template.
    pub(crate) fn definition_body(&self) -> ObjectValue {
        let mut def = ObjectValue::new();
        def.insert("match", self.pattern.clone());
        if let Some(mmt) = &self.match_mapping_type {
            def.insert("match_mapping_type", mmt.clone());
        }
        def.insert("mapping", self.probe_mapping());
        def
    }
}

impl fmt::Debug for TemplateDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDef")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("match_mapping_type", &self.match_mapping_type)
            .finish()
    }
}

/// A typed handle to a declared dynamic template, used to resolve fields it
/// produces without losing their type.
pub struct TemplateHandle<FT> {
    name: String,
    produce: Arc<dyn Fn(&str) -> (FT, MappingParams) + Send + Sync>,
}

impl<FT> TemplateHandle<FT> {
    /// The template name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<FT> Clone for TemplateHandle<FT> {
    fn clone(&self) -> Self {
        TemplateHandle { name: self.name.clone(), produce: self.produce.clone() }
    }
}

impl<FT> fmt::Debug for TemplateHandle<FT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateHandle").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeBinding {
    pub(crate) field: Arc<BoundField>,
    pub(crate) script: Script,
}

impl RuntimeBinding {
    pub(crate) fn body(&self) -> ObjectValue {
        let mut body = ObjectValue::new();
        body.insert("type", self.field.type_name());
        body.insert("script", self.script.body());
        body
    }
}

/// A per-request runtime field for search queries, created together with its
/// typed handle.
#[derive(Debug, Clone)]
pub struct RuntimeMapping {
    pub(crate) binding: RuntimeBinding,
}

impl RuntimeMapping {
    /// Creates a runtime mapping and the typed handle to query it with.
    pub fn new<FT: FieldType>(
        name: &str,
        ftype: FT,
        script: Script,
    ) -> (RuntimeMapping, Field<FT>) {
        let ftype = Arc::new(ftype);
        let bound = Arc::new(BoundField::new(
            name,
            ftype.clone() as Arc<dyn AnyFieldType>,
            MappingParams::new(),
        ));
        bound.attach(Parent::Root);
        let field = Field::from_parts(bound.clone(), ftype);
        (RuntimeMapping { binding: RuntimeBinding { field: bound, script } }, field)
    }

    /// The runtime field name.
    pub fn name(&self) -> &str {
        self.binding.field.name()
    }
}

/// Builds a [`Document`]: fields, dynamic templates, runtime fields, meta
/// fields, and options.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    scope: FieldScope,
    templates: Vec<TemplateDef>,
    runtime: Vec<RuntimeBinding>,
    meta: MetaFields,
    options: DocumentOptions,
}

impl DocumentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        DocumentBuilder::default()
    }

    /// Declares a field with default parameters.
    pub fn field<FT: FieldType>(&mut self, name: &str, ftype: FT) -> Field<FT> {
        self.scope.field(name, ftype)
    }

    /// Declares a field with explicit mapping parameters.
    pub fn field_with<FT: FieldType>(
        &mut self,
        name: &str,
        ftype: FT,
        params: MappingParams,
    ) -> Field<FT> {
        self.scope.field_with(name, ftype, params)
    }

    /// Declares a field together with its multi-fields.
    pub fn field_with_subs<FT: FieldType, R>(
        &mut self,
        name: &str,
        ftype: FT,
        params: MappingParams,
        subs: impl FnOnce(&mut FieldScope) -> R,
    ) -> (Field<FT>, R) {
        self.scope.field_with_subs(name, ftype, params, subs)
    }

    /// Declares a byte field.
    pub fn byte(&mut self, name: &str) -> Field<crate::types::ByteType> {
        self.scope.byte(name)
    }

    /// Declares a short field.
    pub fn short(&mut self, name: &str) -> Field<crate::types::ShortType> {
        self.scope.short(name)
    }

    /// Declares an integer field.
    pub fn int(&mut self, name: &str) -> Field<crate::types::IntType> {
        self.scope.int(name)
    }

    /// Declares a long field.
    pub fn long(&mut self, name: &str) -> Field<crate::types::LongType> {
        self.scope.long(name)
    }

    /// Declares a float field.
    pub fn float(&mut self, name: &str) -> Field<crate::types::FloatType> {
        self.scope.float(name)
    }

    /// Declares a double field.
    pub fn double(&mut self, name: &str) -> Field<crate::types::DoubleType> {
        self.scope.double(name)
    }

    /// Declares a boolean field.
    pub fn boolean(&mut self, name: &str) -> Field<crate::types::BooleanType> {
        self.scope.boolean(name)
    }

    /// Declares a keyword field.
    pub fn keyword(&mut self, name: &str) -> Field<crate::types::KeywordType> {
        self.scope.keyword(name)
    }

    /// Declares a text field.
    pub fn text(&mut self, name: &str) -> Field<crate::types::TextType> {
        self.scope.text(name)
    }

    /// Declares a date field.
    pub fn date(&mut self, name: &str) -> Field<crate::types::DateTimeType> {
        self.scope.date(name)
    }

    /// Attaches a sub-document as a flattened object field.
    pub fn object<T>(&mut self, name: &str, sub: SubDocument<T>) -> SubDocumentField<T> {
        self.scope.object(name, sub)
    }

    /// Attaches a sub-document as a flattened object field, with parameters.
    pub fn object_with<T>(
        &mut self,
        name: &str,
        sub: SubDocument<T>,
        params: MappingParams,
    ) -> SubDocumentField<T> {
        self.scope.object_with(name, sub, params)
    }

    /// Attaches a sub-document as a nested field.
    pub fn nested<T>(&mut self, name: &str, sub: SubDocument<T>) -> SubDocumentField<T> {
        self.scope.nested(name, sub)
    }

    /// Attaches a sub-document as a nested field, with parameters.
    pub fn nested_with<T>(
        &mut self,
        name: &str,
        sub: SubDocument<T>,
        params: MappingParams,
    ) -> SubDocumentField<T> {
        self.scope.nested_with(name, sub, params)
    }

    /// Sets the dynamic-mapping mode.
    pub fn dynamic(&mut self, mode: Dynamic) -> &mut Self {
        self.options.dynamic = Some(mode);
        self
    }

    /// Requires a routing value on every index request.
    pub fn routing_required(&mut self, required: bool) -> &mut Self {
        self.meta.routing.required = required;
        self
    }

    /// Enables or disables `_source` storage.
    pub fn source_enabled(&mut self, enabled: bool) -> &mut Self {
        self.meta.source.enabled = Some(enabled);
        self
    }

    /// Restricts `_source` to the given include patterns.
    pub fn source_includes<S: Into<String>>(
        &mut self,
        includes: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.meta.source.includes = includes.into_iter().map(Into::into).collect();
        self
    }

    /// Excludes the given patterns from `_source`.
    pub fn source_excludes<S: Into<String>>(
        &mut self,
        excludes: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.meta.source.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }

    /// Enables `_size` indexing.
    pub fn size_enabled(&mut self, enabled: bool) -> &mut Self {
        self.meta.size.enabled = enabled;
        self
    }

    /// Declares a dynamic template with default parameters on the produced
    /// fields. The producer is applied to each concrete field name.
    pub fn dynamic_template<FT: FieldType>(
        &mut self,
        name: &str,
        pattern: &str,
        produce: impl Fn(&str) -> FT + Send + Sync + 'static,
    ) -> TemplateHandle<FT> {
        self.dynamic_template_with(name, pattern, None, move |field_name| {
            (produce(field_name), MappingParams::new())
        })
    }

    /// Declares a dynamic template with full control over the match
    /// conditions and the produced mapping parameters.
    pub fn dynamic_template_with<FT: FieldType>(
        &mut self,
        name: &str,
        pattern: &str,
        match_mapping_type: Option<&str>,
        produce: impl Fn(&str) -> (FT, MappingParams) + Send + Sync + 'static,
    ) -> TemplateHandle<FT> {
        if self.templates.iter().any(|t| t.name == name) {
            panic!("dynamic template {name:?} already declared");
        }
        let produce: Arc<dyn Fn(&str) -> (FT, MappingParams) + Send + Sync> = Arc::new(produce);
        let erased = {
            let produce = produce.clone();
            move |field_name: &str| {
                let (ftype, params) = produce(field_name);
                Arc::new(BoundField::new(
                    field_name,
                    Arc::new(ftype) as Arc<dyn AnyFieldType>,
                    params,
                ))
            }
        };
        self.templates.push(TemplateDef {
            name: name.to_string(),
            pattern: pattern.to_string(),
            match_mapping_type: match_mapping_type.map(String::from),
            produce: Arc::new(erased),
        });
        TemplateHandle { name: name.to_string(), produce }
    }

    /// Declares a runtime field computed by a script at search time.
    pub fn runtime_field<FT: FieldType>(
        &mut self,
        name: &str,
        ftype: FT,
        script: Script,
    ) -> Field<FT> {
        if self.runtime.iter().any(|r| r.field.name() == name) {
            panic!("runtime field {name:?} already declared");
        }
        let ftype = Arc::new(ftype);
        let bound = Arc::new(BoundField::new(
            name,
            ftype.clone() as Arc<dyn AnyFieldType>,
            MappingParams::new(),
        ));
        bound.attach(Parent::Root);
        self.runtime.push(RuntimeBinding { field: bound.clone(), script });
        Field::from_parts(bound, ftype)
    }

    /// Finishes the schema.
    pub fn finish(self) -> Document {
        let fields = self.scope.into_fields();
        for field in &fields {
            field.attach(Parent::Root);
        }
        Document {
            fields,
            templates: self.templates,
            runtime: self.runtime,
            meta: self.meta,
            options: self.options,
            resolved: RwLock::new(HashMap::new()),
        }
    }
}

/// An immutable document schema.
///
/// Shared freely across threads; the only interior state is the dynamic
/// template resolution cache, which memoizes produced fields per template
/// and name so repeated lookups return the identical handle.
#[derive(Debug)]
pub struct Document {
    fields: Vec<Arc<BoundField>>,
    templates: Vec<TemplateDef>,
    runtime: Vec<RuntimeBinding>,
    meta: MetaFields,
    options: DocumentOptions,
    resolved: RwLock<HashMap<(String, String), Arc<BoundField>>>,
}

impl Document {
    /// Creates a builder for a new schema.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    pub(crate) fn from_parts(
        fields: Vec<Arc<BoundField>>,
        templates: Vec<TemplateDef>,
        runtime: Vec<RuntimeBinding>,
        meta: MetaFields,
        options: DocumentOptions,
    ) -> Self {
        Document {
            fields,
            templates,
            runtime,
            meta,
            options,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up a field by its dot-joined path, descending through
    /// sub-documents and multi-fields. Runtime fields are found by their
    /// plain name.
    pub fn field(&self, path: &str) -> Option<DynField> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = match self.fields.iter().find(|f| f.name() == first) {
            Some(found) => found.clone(),
            None => self
                .runtime
                .iter()
                .find(|r| r.field.name() == first)
                .map(|r| r.field.clone())?,
        };
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(DynField { bound: current })
    }

    /// Iterates the root fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = DynField> + '_ {
        self.fields.iter().map(|bound| DynField { bound: bound.clone() })
    }

    /// Resolves a field name against the declared dynamic templates, in
    /// declaration order. The produced field is memoized per template and
    /// name, so resolving the same name twice returns the identical handle.
    pub fn dynamic_field(&self, name: &str) -> Option<DynField> {
        let template = self.templates.iter().find(|t| wildcard_match(&t.pattern, name))?;
        Some(DynField { bound: self.resolve(template, name) })
    }

    /// Resolves a field through a typed template handle, keeping the
    /// produced field typed. Returns `None` when this schema does not carry
    /// a template with the handle's name.
    pub fn template_field<FT: FieldType>(
        &self,
        handle: &TemplateHandle<FT>,
        name: &str,
    ) -> Option<Field<FT>> {
        let template = self.templates.iter().find(|t| t.name == handle.name)?;
        let bound = self.resolve(template, name);
        let (ftype, _) = (handle.produce)(name);
        Some(Field::from_parts(bound, Arc::new(ftype)))
    }

    fn resolve(&self, template: &TemplateDef, name: &str) -> Arc<BoundField> {
        let key = (template.name.clone(), name.to_string());
        if let Some(bound) = self.resolved.read().get(&key) {
            return bound.clone();
        }
        let mut cache = self.resolved.write();
        cache
            .entry(key)
            .or_insert_with(|| {
                trace!(template = %template.name, field = %name, "producing dynamic field");
                let bound = (template.produce)(name);
                bound.attach(Parent::Root);
                bound
            })
            .clone()
    }

    /// The meta field options.
    pub fn meta(&self) -> &MetaFields {
        &self.meta
    }

    /// The document-level options.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub(crate) fn root_fields(&self) -> &[Arc<BoundField>] {
        &self.fields
    }

    pub(crate) fn templates(&self) -> &[TemplateDef] {
        &self.templates
    }

    pub(crate) fn runtime(&self) -> &[RuntimeBinding] {
        &self.runtime
    }
}

/// Matches a `*`-wildcard pattern against a name. `*` matches any run of
/// characters, including an empty one.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p = pattern.as_bytes();
    let s = name.as_bytes();
    let (mut pi, mut si) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while si < s.len() {
        if pi < p.len() && p[pi] != b'*' && p[pi] == s[si] {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, si));
            pi += 1;
        } else if let Some((star_pi, star_si)) = star {
            pi = star_pi + 1;
            si = star_si + 1;
            star = Some((star_pi, star_si + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}
