//! Main searchlayer crate: typed document mappings and query compilation for
//! document search engines.
//!
//! This crate is the primary entry point for users of searchlayer. It
//! re-exports the core modules and provides the JSON wire backend behind a
//! feature flag.
//!
//! # Features
//!
//! - **Typed schemas** - Declare a document once and get typed field handles back
//! - **Version-aware compilation** - One query value compiles for any engine version
//! - **Schema merging** - Documents sharing an index merge with conflict checking
//! - **Typed aggregation results** - Bucket keys come back as your term types
//!
//! # Quick Start
//!
//! ```ignore
//! use searchlayer::prelude::*;
//! use searchlayer::json::{JsonDeserializer, JsonSerializer};
//!
//! // Declare the schema once; the handles type every later reference.
//! let mut schema = Document::builder();
//! let title = schema.text("title");
//! let rating = schema.float("rating");
//! let genre = schema.keyword("genre");
//! let doc = schema.finish();
//!
//! // Build a request from the handles.
//! let query = SearchQuery::new()
//!     .query(title.matches("space opera"))
//!     .filter(rating.gte(4.0))
//!     .aggregation("genres", &TermsAgg::new(&genre).size(20))
//!     .size(10);
//!
//! // Compile for the engine actually running, render, send.
//! let compiler = Compiler::new("7.10.2".parse()?);
//! let request = compiler.compile_search(&query);
//! let body = JsonSerializer::new().serialize_object(&request.body.unwrap())?;
//!
//! // ... transport call ...
//!
//! let parsed = SearchResponse::parse(&JsonDeserializer::new(), &raw, compiler.features())?;
//! ```
//!
//! # Backends
//!
//! - [`json`] - `serde_json` wire backend (requires the default `json` feature)

pub mod prelude;

pub use searchlayer_core::{
    aggs, bulk, compile, de, document, error, merge, query, search, ser, types, value,
};

/// JSON wire backend.
///
/// This module is only available when the `json` feature is enabled; it is
/// part of the default feature set.
#[cfg(feature = "json")]
pub mod json {
    pub use searchlayer_json::{JsonDeserializer, JsonSerializer, convert, source};
}
