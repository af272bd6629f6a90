//! A typed document-mapping and query-compilation layer for document search engines.
//!
//! This crate is the core of the searchlayer project and provides:
//!
//! - **Neutral value tree** ([`value`]) - The wire-format-independent object model
//! - **Serialization seams** ([`ser`], [`de`]) - Backend traits plus builder and cursor helpers
//! - **Field types** ([`types`]) - Typed coercion between application values and wire values
//! - **Document model** ([`document`]) - Schema declaration with typed field handles
//! - **Schema merging** ([`merge`]) - Combining documents that share an index
//! - **Query expressions** ([`query`]) - Typed query value-objects and rewrite markers
//! - **Aggregations** ([`aggs`]) - Aggregation definitions and typed result parsing
//! - **Search requests** ([`search`]) - Request construction and response parsing
//! - **Compilation** ([`compile`]) - Version-gated rendering into transport payloads
//! - **Bulk actions** ([`bulk`]) - Pure-data bulk operations
//! - **Error handling** ([`error`]) - Error types and the crate result alias
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::compile::{Compiler, EngineVersion};
//! use searchlayer_core::document::Document;
//! use searchlayer_core::search::SearchQuery;
//!
//! let mut schema = Document::builder();
//! let title = schema.text("title");
//! let rating = schema.float("rating");
//! let doc = schema.finish();
//!
//! let query = SearchQuery::new()
//!     .query(title.matches("space opera"))
//!     .filter(rating.gte(4.0))
//!     .size(10);
//!
//! let compiler = Compiler::new(EngineVersion::new(7, 10, 2));
//! let request = compiler.compile_search(&query);
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_core;

pub mod aggs;
pub mod bulk;
pub mod compile;
pub mod de;
pub mod document;
pub mod error;
pub mod merge;
pub mod query;
pub mod search;
pub mod ser;
pub mod types;
pub mod value;
