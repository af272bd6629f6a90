//! Bulk actions as pure data.
//!
//! An action describes one line pair of a bulk payload: what to do, which
//! document, and (for writes) the source to carry. Rendering into the
//! newline-delimited wire form belongs to the compiler, which knows the
//! engine version.

use crate::value::ObjectValue;

/// One action of a bulk request.
#[derive(Debug, Clone)]
pub enum BulkAction {
    /// Index a document, replacing any previous version under the same id.
    Index(IndexAction),
    /// Index a document, failing when the id already exists.
    Create(IndexAction),
    /// Delete a document by id.
    Delete(DeleteAction),
    /// Partially update a document.
    Update(UpdateAction),
}

/// An index or create action.
#[derive(Debug, Clone)]
pub struct IndexAction {
    pub(crate) index: String,
    pub(crate) id: Option<String>,
    pub(crate) routing: Option<String>,
    pub(crate) source: ObjectValue,
}

impl IndexAction {
    pub fn new(index: impl Into<String>, source: ObjectValue) -> Self {
        IndexAction {
            index: index.into(),
            id: None,
            routing: None,
            source,
        }
    }

    /// The document id. Without one the engine assigns its own.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// A delete action.
#[derive(Debug, Clone)]
pub struct DeleteAction {
    pub(crate) index: String,
    pub(crate) id: String,
    pub(crate) routing: Option<String>,
}

impl DeleteAction {
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        DeleteAction {
            index: index.into(),
            id: id.into(),
            routing: None,
        }
    }

    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// A partial-update action.
#[derive(Debug, Clone)]
pub struct UpdateAction {
    pub(crate) index: String,
    pub(crate) id: String,
    pub(crate) routing: Option<String>,
    pub(crate) doc: ObjectValue,
    pub(crate) doc_as_upsert: bool,
}

impl UpdateAction {
    pub fn new(index: impl Into<String>, id: impl Into<String>, doc: ObjectValue) -> Self {
        UpdateAction {
            index: index.into(),
            id: id.into(),
            routing: None,
            doc,
            doc_as_upsert: false,
        }
    }

    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// Index the partial document as-is when the id does not exist yet.
    pub fn doc_as_upsert(mut self, doc_as_upsert: bool) -> Self {
        self.doc_as_upsert = doc_as_upsert;
        self
    }
}
