//! JSON wire backend for searchlayer.
//!
//! This crate connects the neutral value tree from `searchlayer-core` to
//! `serde_json`:
//!
//! - **Wire backend** ([`backend`]) - [`JsonSerializer`] and [`JsonDeserializer`], the
//!   serializer/deserializer pair for JSON-speaking engines
//! - **Tree conversion** ([`convert`]) - mapping to and from `serde_json::Value`
//! - **Typed sources** ([`source`]) - `serde` structs in and out of object trees
//!
//! Field order survives the round trip through `serde_json`'s
//! `preserve_order` feature, so compiled bodies keep their declaration
//! order on the wire.
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_json::{JsonDeserializer, JsonSerializer};
//! use searchlayer_core::compile::{Compiler, EngineVersion};
//! use searchlayer_core::search::SearchResponse;
//!
//! let compiler = Compiler::new(EngineVersion::new(7, 10, 2));
//! let request = compiler.compile_search(&query);
//! let body = JsonSerializer::new().serialize_object(&request.body.unwrap())?;
//!
//! // ... transport call ...
//!
//! let response = SearchResponse::parse(&JsonDeserializer::new(), &raw, compiler.features())?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_json;

pub mod backend;
pub mod convert;
pub mod source;

pub use backend::{JsonDeserializer, JsonSerializer};
