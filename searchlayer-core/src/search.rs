//! Search requests and their responses.
//!
//! [`SearchQuery`] accumulates everything a search request can carry: the
//! scoring query, context filters, aggregations, sorts, source filtering and
//! the paging and routing knobs. It is engine-version agnostic; the compiler
//! decides how each part is rendered for a concrete version.
//!
//! ```ignore
//! let query = SearchQuery::new()
//!     .query(title.matches("space opera"))
//!     .filter(status.term(Status::Published))
//!     .aggregation("genres", &TermsAgg::new(&genre).size(20))
//!     .sort(rating.desc())
//!     .size(10);
//! ```
//!
//! Queries are plain values. Cloning one is the intended way to produce
//! request variants, and [`SearchQuery::query_node`] rewrites a marked
//! clause inside a clone without disturbing the original.
//!
//! The result side mirrors the request side: [`SearchResponse::parse`] reads
//! a raw response body through a [`Deserializer`], and the typed aggregation
//! definitions from [`crate::aggs`] pick their named slices out of it.

use std::time::Duration;

use tracing::debug;

use crate::aggs::AggExpr;
use crate::compile::Features;
use crate::de::{AnyRef, ArrayCtx, Deserializer, ObjectCtx};
use crate::document::RuntimeMapping;
use crate::error::{DeserializeError, QueryError};
use crate::query::{FieldRef, NodeHandle, QueryExpr, QueryNode, Sort};
use crate::value::{ObjectValue, Value};

/// Controls which parts of the stored source come back with each hit.
#[derive(Debug, Clone)]
pub enum SourceFilter {
    /// The whole source, or none of it.
    Enabled(bool),
    /// Selected source fields, by include and exclude patterns.
    Filter {
        includes: Vec<String>,
        excludes: Vec<String>,
    },
}

impl SourceFilter {
    /// Keeps only source fields matching the given patterns.
    pub fn includes<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceFilter::Filter {
            includes: patterns.into_iter().map(Into::into).collect(),
            excludes: Vec::new(),
        }
    }

    /// Drops source fields matching the given patterns.
    pub fn excludes<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceFilter::Filter {
            includes: Vec::new(),
            excludes: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<bool> for SourceFilter {
    fn from(enabled: bool) -> Self {
        SourceFilter::Enabled(enabled)
    }
}

/// A search request under construction.
///
/// Filters added with [`SearchQuery::filter`] run in filter context: the
/// compiler wraps them together with the scoring query into a `bool` clause,
/// so they constrain the hits without contributing to scores. Post filters
/// run after aggregations, which is what faceted interfaces want.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub(crate) query: Option<QueryExpr>,
    pub(crate) filters: Vec<QueryExpr>,
    pub(crate) post_filters: Vec<QueryExpr>,
    pub(crate) aggs: Vec<(String, AggExpr)>,
    pub(crate) sorts: Vec<Sort>,
    pub(crate) source: Option<SourceFilter>,
    pub(crate) docvalue_fields: Vec<FieldRef>,
    pub(crate) stored_fields: Vec<FieldRef>,
    pub(crate) runtime_mappings: Vec<RuntimeMapping>,
    pub(crate) from: Option<i64>,
    pub(crate) size: Option<i64>,
    pub(crate) track_total_hits: Option<bool>,
    pub(crate) terminate_after: Option<i64>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) request_cache: Option<bool>,
    pub(crate) routing: Option<String>,
    pub(crate) preference: Option<String>,
    pub(crate) stats: Vec<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        SearchQuery::default()
    }

    /// Sets the scoring query. A second call replaces the first.
    pub fn query(mut self, query: impl Into<QueryExpr>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a filter-context clause. Filters accumulate.
    pub fn filter(mut self, filter: impl Into<QueryExpr>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Adds a clause applied after aggregations are computed.
    pub fn post_filter(mut self, filter: impl Into<QueryExpr>) -> Self {
        self.post_filters.push(filter.into());
        self
    }

    /// Adds a named aggregation.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.aggs.push((name.into(), agg.into()));
        self
    }

    /// Adds a sort key. Sorts apply in the order they were added.
    pub fn sort(mut self, sort: impl Into<Sort>) -> Self {
        self.sorts.push(sort.into());
        self
    }

    /// Controls source return for hits.
    pub fn source(mut self, source: impl Into<SourceFilter>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Requests a field's doc values alongside each hit.
    pub fn docvalue_field(mut self, field: impl Into<FieldRef>) -> Self {
        self.docvalue_fields.push(field.into());
        self
    }

    /// Requests a stored field alongside each hit.
    pub fn stored_field(mut self, field: impl Into<FieldRef>) -> Self {
        self.stored_fields.push(field.into());
        self
    }

    /// Attaches a per-request runtime field.
    pub fn runtime_mapping(mut self, mapping: RuntimeMapping) -> Self {
        self.runtime_mappings.push(mapping);
        self
    }

    pub fn from(mut self, from: i64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Asks the engine for an exact hit total instead of a lower bound.
    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = Some(track);
        self
    }

    /// Stops collecting per shard after this many documents.
    pub fn terminate_after(mut self, terminate_after: i64) -> Self {
        self.terminate_after = Some(terminate_after);
        self
    }

    /// Bounds how long the engine spends on the request.
    ///
    /// Whole seconds render as seconds on the wire, anything finer as
    /// milliseconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn request_cache(mut self, cache: bool) -> Self {
        self.request_cache = Some(cache);
        self
    }

    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    pub fn preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    /// Tags the request with a statistics group.
    pub fn stat(mut self, group: impl Into<String>) -> Self {
        self.stats.push(group.into());
        self
    }

    /// Rewrites the node a handle was attached to, wherever it sits in the
    /// query, filters or post filters.
    ///
    /// The closure receives the node's current payload and mutates it; the
    /// result replaces the node in place. Handles survive cloning, so the
    /// usual shape is clone-then-rewrite:
    ///
    /// ```ignore
    /// let mut narrowed = base.clone();
    /// narrowed.query_node(facets, |node| {
    ///     node.push_filter(brand.term("acme"));
    /// })?;
    /// ```
    ///
    /// # Errors
    ///
    /// [`QueryError::UnboundNode`] when no node with this handle's marker is
    /// present, which happens when the node was never attached or was
    /// replaced wholesale.
    pub fn query_node<T: QueryNode>(
        &mut self,
        handle: NodeHandle<T>,
        f: impl FnOnce(&mut T),
    ) -> Result<(), QueryError> {
        let roots = self
            .query
            .iter_mut()
            .chain(self.filters.iter_mut())
            .chain(self.post_filters.iter_mut());
        for root in roots {
            if let Some(body) = root.find_node_mut(handle.id()) {
                let mut node =
                    T::from_body(body).ok_or(QueryError::UnboundNode { kind: T::KIND })?;
                f(&mut node);
                *body = node.into_body();
                return Ok(());
            }
        }
        Err(QueryError::UnboundNode { kind: T::KIND })
    }
}

/// How a response's hit total relates to the true number of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalRelation {
    /// The total is exact.
    Eq,
    /// The total is a lower bound.
    Gte,
}

/// The hit total of a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalHits {
    pub value: i64,
    pub relation: TotalRelation,
}

/// Per-shard accounting of a response.
#[derive(Debug, Clone)]
pub struct ShardStats {
    pub total: i64,
    pub successful: i64,
    /// Absent on engines that predate shard skipping.
    pub skipped: Option<i64>,
    pub failed: i64,
    pub failures: Vec<ShardFailure>,
}

/// One failed shard, as reported under `_shards.failures` or inside a
/// structured error.
#[derive(Debug, Clone)]
pub struct ShardFailure {
    pub shard: Option<i64>,
    pub index: Option<String>,
    pub node: Option<String>,
    pub reason: Option<ErrorCause>,
}

/// One hit of a search response.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub index: Option<String>,
    pub id: Option<String>,
    /// Absent when the engine does not score, e.g. under explicit sorts.
    pub score: Option<f64>,
    pub source: Option<ObjectValue>,
    /// The sort values this hit was ranked by, in sort order.
    pub sort: Vec<Value>,
    /// Docvalue and stored fields requested alongside the source.
    pub fields: ObjectValue,
}

/// A parsed search response.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub took: i64,
    pub timed_out: bool,
    pub shards: ShardStats,
    pub total: TotalHits,
    pub max_score: Option<f64>,
    pub hits: Vec<SearchHit>,
    pub terminated_early: Option<bool>,
    aggregations: ObjectValue,
}

impl SearchResponse {
    /// Parses a raw search response body.
    ///
    /// Engines changed the hit total from a bare integer to a
    /// `{value, relation}` object in major version 7; `features` selects
    /// which shape to expect.
    ///
    /// # Errors
    ///
    /// Any missing or mistyped required key is a [`DeserializeError`]. The
    /// failure is also emitted as a `tracing` debug event.
    pub fn parse<D: Deserializer>(
        backend: &D,
        raw: &str,
        features: &Features,
    ) -> Result<SearchResponse, DeserializeError> {
        Self::parse_inner(backend, raw, features).inspect_err(|error| {
            debug!(%error, "search response rejected");
        })
    }

    fn parse_inner<D: Deserializer>(
        backend: &D,
        raw: &str,
        features: &Features,
    ) -> Result<SearchResponse, DeserializeError> {
        let doc = backend.parse_object(raw)?;
        let root = ObjectCtx::new(&doc);
        let hits_obj = root.obj("hits")?;
        let total = if features.supports_track_total_hits() {
            let total = hits_obj.obj("total")?;
            TotalHits {
                value: total.long("value")?,
                relation: parse_relation(total.string("relation")?)?,
            }
        } else {
            TotalHits { value: hits_obj.long("total")?, relation: TotalRelation::Eq }
        };
        let mut hits = Vec::new();
        let mut iter = hits_obj.array("hits")?.iter();
        while iter.advance() {
            hits.push(parse_hit(&iter.obj()?));
        }
        Ok(SearchResponse {
            took: root.long("took")?,
            timed_out: root.boolean("timed_out")?,
            shards: parse_shards(&root.obj("_shards")?)?,
            total,
            max_score: hits_obj.double_or_null("max_score"),
            hits,
            terminated_early: root.boolean_or_null("terminated_early"),
            aggregations: root
                .obj_or_null("aggregations")
                .map(|ctx| ctx.to_object())
                .unwrap_or_default(),
        })
    }

    /// The raw result object of a named top-level aggregation, ready to be
    /// handed to the matching definition's `parse`.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownAggregation`] when the response carries no
    /// aggregation under this name.
    pub fn aggregation(&self, name: &str) -> Result<&ObjectValue, QueryError> {
        self.aggregations
            .get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| QueryError::UnknownAggregation { name: name.to_string() })
    }

    /// All raw aggregation results, keyed by name.
    pub fn aggregations(&self) -> &ObjectValue {
        &self.aggregations
    }
}

/// A parsed count response.
#[derive(Debug, Clone)]
pub struct CountResponse {
    pub count: i64,
    pub shards: ShardStats,
}

impl CountResponse {
    /// Parses a raw count response body.
    pub fn parse<D: Deserializer>(
        backend: &D,
        raw: &str,
    ) -> Result<CountResponse, DeserializeError> {
        let doc = backend.parse_object(raw)?;
        let root = ObjectCtx::new(&doc);
        Ok(CountResponse {
            count: root.long("count")?,
            shards: parse_shards(&root.obj("_shards")?)?,
        })
    }
}

/// A structured engine error, as carried in an error response body.
#[derive(Debug, Clone)]
pub struct ErrorCause {
    /// The engine's error type, e.g. `"search_phase_execution_exception"`.
    pub kind: Option<String>,
    pub reason: Option<String>,
    pub root_causes: Vec<ErrorCause>,
    pub failed_shards: Vec<ShardFailure>,
}

/// The body of a non-success transport response.
#[derive(Debug, Clone)]
pub enum ErrorBody {
    /// A structured error object with the echoed status code.
    Structured {
        status: Option<i64>,
        error: ErrorCause,
    },
    /// A bare-string error, as older engines emit for some failures.
    Simple(String),
}

impl ErrorBody {
    /// Parses a transport error body.
    ///
    /// Bodies that are not parseable objects at all come back as
    /// [`ErrorBody::Simple`] carrying the raw text, so the transport error
    /// path never loses the original payload.
    pub fn parse<D: Deserializer>(backend: &D, raw: &str) -> Result<ErrorBody, DeserializeError> {
        let Ok(doc) = backend.parse_object(raw) else {
            return Ok(ErrorBody::Simple(raw.to_string()));
        };
        let root = ObjectCtx::new(&doc);
        match root.any_or_null("error") {
            Some(AnyRef::Object(obj)) => Ok(ErrorBody::Structured {
                status: root.long_or_null("status"),
                error: parse_cause(&obj),
            }),
            Some(AnyRef::Str(message)) => Ok(ErrorBody::Simple(message.to_string())),
            _ => Err(DeserializeError::ResponseShape {
                expected: "an error object",
                at: "error body".to_string(),
            }),
        }
    }
}

fn parse_relation(relation: &str) -> Result<TotalRelation, DeserializeError> {
    match relation {
        "eq" => Ok(TotalRelation::Eq),
        "gte" => Ok(TotalRelation::Gte),
        other => Err(DeserializeError::NoSuchVariant {
            type_name: "total hits relation",
            value: other.to_string(),
        }),
    }
}

fn parse_hit(ctx: &ObjectCtx<'_>) -> SearchHit {
    let mut sort = Vec::new();
    if let Some(arr) = ctx.array_or_null("sort") {
        let mut iter = arr.iter();
        while iter.advance() {
            sort.push(iter.value().clone());
        }
    }
    SearchHit {
        index: ctx.string_or_null("_index").map(String::from),
        id: ctx.string_or_null("_id").map(String::from),
        score: ctx.double_or_null("_score"),
        source: ctx.obj_or_null("_source").map(|obj| obj.to_object()),
        sort,
        fields: ctx
            .obj_or_null("fields")
            .map(|obj| obj.to_object())
            .unwrap_or_default(),
    }
}

fn parse_shards(ctx: &ObjectCtx<'_>) -> Result<ShardStats, DeserializeError> {
    let mut failures = Vec::new();
    if let Some(arr) = ctx.array_or_null("failures") {
        collect_objects(arr, |obj| failures.push(parse_shard_failure(obj)));
    }
    Ok(ShardStats {
        total: ctx.long("total")?,
        successful: ctx.long("successful")?,
        skipped: ctx.long_or_null("skipped"),
        failed: ctx.long("failed")?,
        failures,
    })
}

fn parse_shard_failure(ctx: &ObjectCtx<'_>) -> ShardFailure {
    ShardFailure {
        shard: ctx.long_or_null("shard"),
        index: ctx.string_or_null("index").map(String::from),
        node: ctx.string_or_null("node").map(String::from),
        reason: ctx.obj_or_null("reason").map(|obj| parse_cause(&obj)),
    }
}

fn parse_cause(ctx: &ObjectCtx<'_>) -> ErrorCause {
    let mut root_causes = Vec::new();
    if let Some(arr) = ctx.array_or_null("root_cause") {
        collect_objects(arr, |obj| root_causes.push(parse_cause(obj)));
    }
    let mut failed_shards = Vec::new();
    if let Some(arr) = ctx.array_or_null("failed_shards") {
        collect_objects(arr, |obj| failed_shards.push(parse_shard_failure(obj)));
    }
    ErrorCause {
        kind: ctx.string_or_null("type").map(String::from),
        reason: ctx.string_or_null("reason").map(String::from),
        root_causes,
        failed_shards,
    }
}

fn collect_objects(arr: ArrayCtx<'_>, mut each: impl FnMut(&ObjectCtx<'_>)) {
    let mut iter = arr.iter();
    while iter.advance() {
        if let Some(obj) = iter.obj_or_null() {
            each(&obj);
        }
    }
}
