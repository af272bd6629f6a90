//! Convenient re-exports of commonly used types from searchlayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without importing from multiple sub-modules:
//!
//! ```ignore
//! use searchlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document declaration and field handles
//! - Field types and mapping parameters
//! - Query and aggregation construction
//! - The compiler and its version descriptor
//! - Response types and error types

pub use searchlayer_core::{
    aggs::{
        AvgAgg, DateHistogramAgg, DateInterval, FilterAgg, HistogramAgg, MaxAgg, MinAgg,
        NestedAgg, SumAgg, TermsAgg, ValueCountAgg,
    },
    bulk::{BulkAction, DeleteAction, IndexAction, UpdateAction},
    compile::{CompiledRequest, Compiler, EngineVersion, Features},
    de::{Deserializer, NumberMode},
    document::{
        Document, DocumentOptions, DynField, Dynamic, Field, MappingParams, RuntimeMapping,
        Script, SubDocument, SubDocumentField,
    },
    error::{
        DeserializeError, MergeError, QueryError, SearchLayerError, SearchLayerResult,
        SerializeError,
    },
    merge::merge_documents,
    query::{BoolQuery, DisMaxQuery, FunctionScoreQuery, NodeHandle, QueryExpr, Sort},
    search::{
        CountResponse, ErrorBody, SearchHit, SearchQuery, SearchResponse, SourceFilter,
        TotalHits, TotalRelation,
    },
    ser::Serializer,
    types::{
        BooleanType, ByteType, DateTimeType, DoubleType, EnumType, FieldType, FloatType,
        IntType, KeywordType, LongType, ShortType, TextType,
    },
    value::{ArrayValue, ObjectValue, Value},
};
