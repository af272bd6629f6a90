//! Version-aware compilation of requests into transport payloads.
//!
//! A [`Compiler`] is built once per target engine from its reported
//! [`EngineVersion`]. The same [`SearchQuery`] or [`Document`] compiles
//! differently across versions: the hit-total opt-in and runtime mappings
//! only exist on newer engines, while older ones still address everything
//! through a mapping type name. The compiler owns all wire rendering, so
//! expression types stay plain data.
//!
//! ```ignore
//! let compiler = Compiler::new("7.10.2".parse()?);
//! let request = compiler.compile_search(&query);
//! // request.body is the neutral tree; hand it to a Serializer backend.
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::aggs::{AggExpr, DateInterval};
use crate::bulk::BulkAction;
use crate::document::{Document, SourceMeta};
use crate::error::{DeserializeError, SerializeError};
use crate::query::{
    BoolQuery, DisMaxQuery, FieldRef, FunctionScoreQuery, MultiMatchQuery, NodeBody, QueryExpr,
    RangeQuery, ScoreFunction, ScoreFunctionKind, Sort,
};
use crate::search::{SearchQuery, SourceFilter};
use crate::ser::Serializer;
use crate::value::{ArrayValue, ObjectValue, Value};

/// An engine version as reported by the cluster info endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EngineVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl EngineVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        EngineVersion { major, minor, patch }
    }

    fn at_least(&self, major: u64, minor: u64) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for EngineVersion {
    type Err = DeserializeError;

    /// Parses dotted version strings like `"7.10.2"`. Missing segments
    /// default to zero and a pre-release tag after `-` is ignored, so both
    /// `"6.8"` and `"8.0.0-SNAPSHOT"` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = match s.split_once('-') {
            Some((head, _)) => head,
            None => s,
        };
        let mut segments = core.splitn(3, '.');
        Ok(EngineVersion {
            major: version_segment(s, segments.next())?,
            minor: version_segment(s, segments.next())?,
            patch: version_segment(s, segments.next())?,
        })
    }
}

fn version_segment(original: &str, segment: Option<&str>) -> Result<u64, DeserializeError> {
    match segment {
        None => Ok(0),
        Some(segment) => segment.parse().map_err(|err: std::num::ParseIntError| {
            DeserializeError::BadParse {
                type_name: "engine version",
                value: original.to_string(),
                cause: err.to_string(),
            }
        }),
    }
}

/// What an engine version supports, as far as compilation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    track_total_hits: bool,
    mapping_types: bool,
    runtime_mappings: bool,
}

impl Features {
    /// Derives the feature set of a concrete engine version.
    pub fn for_version(version: EngineVersion) -> Features {
        Features {
            track_total_hits: version.major >= 7,
            mapping_types: version.major < 7,
            runtime_mappings: version.at_least(7, 11),
        }
    }

    /// Whether the engine takes `track_total_hits` and answers the
    /// `{value, relation}` hit-total shape.
    pub fn supports_track_total_hits(&self) -> bool {
        self.track_total_hits
    }

    /// Whether mapping and bulk payloads still carry the `_doc` type name.
    pub fn requires_mapping_type(&self) -> bool {
        self.mapping_types
    }

    /// Whether search requests may carry `runtime_mappings`.
    pub fn supports_runtime_mappings(&self) -> bool {
        self.runtime_mappings
    }
}

/// A compiled request body plus its transport parameters.
///
/// This is the hand-off contract to a transport layer: the body is still the
/// neutral tree (render it with whichever [`Serializer`] backend the
/// transport speaks), the parameters map onto the query string.
#[derive(Debug, Clone, Default)]
pub struct CompiledRequest {
    /// The request body, absent for bodyless requests.
    pub body: Option<ObjectValue>,
    /// Query-string parameters, multi-valued.
    pub parameters: BTreeMap<String, Vec<String>>,
}

/// Compiles requests for one concrete engine version.
#[derive(Debug, Clone)]
pub struct Compiler {
    version: EngineVersion,
    features: Features,
}

impl Compiler {
    pub fn new(version: EngineVersion) -> Compiler {
        Compiler { version, features: Features::for_version(version) }
    }

    pub fn version(&self) -> EngineVersion {
        self.version
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Compiles a search request.
    ///
    /// Filters are folded into the scoring query as a `bool` clause in
    /// filter context. Fields the target engine does not understand are
    /// dropped, with a debug event each.
    pub fn compile_search(&self, query: &SearchQuery) -> CompiledRequest {
        let mut body = ObjectValue::new();
        if let Some(combined) = combine_query(query.query.as_ref(), &query.filters) {
            body.insert("query", combined);
        }
        if let Some(post) = combine_post_filter(&query.post_filters) {
            body.insert("post_filter", post);
        }
        if !query.aggs.is_empty() {
            body.insert("aggs", render_aggs(&query.aggs));
        }
        if !query.sorts.is_empty() {
            let mut sorts = ArrayValue::new();
            for sort in &query.sorts {
                sorts.push(render_sort(sort));
            }
            body.insert("sort", sorts);
        }
        if let Some(source) = &query.source {
            body.insert("_source", render_source(source));
        }
        if !query.docvalue_fields.is_empty() {
            body.insert("docvalue_fields", path_array(&query.docvalue_fields));
        }
        if !query.stored_fields.is_empty() {
            body.insert("stored_fields", path_array(&query.stored_fields));
        }
        if !query.runtime_mappings.is_empty() {
            if self.features.supports_runtime_mappings() {
                let mut runtime = ObjectValue::new();
                for mapping in &query.runtime_mappings {
                    runtime.insert(mapping.name(), mapping.binding.body());
                }
                body.insert("runtime_mappings", runtime);
            } else {
                debug!(version = %self.version, "engine takes no runtime_mappings, dropped");
            }
        }
        if let Some(from) = query.from {
            body.insert("from", from);
        }
        if let Some(size) = query.size {
            body.insert("size", size);
        }
        if let Some(track) = query.track_total_hits {
            if self.features.supports_track_total_hits() {
                body.insert("track_total_hits", track);
            } else {
                debug!(version = %self.version, "engine takes no track_total_hits, dropped");
            }
        }
        if let Some(terminate_after) = query.terminate_after {
            body.insert("terminate_after", terminate_after);
        }
        if let Some(timeout) = query.timeout {
            body.insert("timeout", render_timeout(timeout));
        }

        let parameters = request_parameters(query);
        debug!(
            version = %self.version,
            body_keys = body.len(),
            parameters = parameters.len(),
            "compiled search request"
        );
        CompiledRequest { body: Some(body), parameters }
    }

    /// Compiles a count request from the same query value.
    ///
    /// Only the query and filters matter for counting; both go into filter
    /// context since nothing is scored.
    pub fn compile_count(&self, query: &SearchQuery) -> CompiledRequest {
        let mut parameters = BTreeMap::new();
        if let Some(routing) = &query.routing {
            parameters.insert("routing".to_string(), vec![routing.clone()]);
        }
        if let Some(preference) = &query.preference {
            parameters.insert("preference".to_string(), vec![preference.clone()]);
        }
        CompiledRequest { body: count_body(query), parameters }
    }

    /// Renders a document's declared schema into a put-mapping body.
    ///
    /// Engines before major version 7 still address mappings through a type
    /// name, so the body is wrapped in a `_doc` object for them.
    pub fn compile_mapping(&self, document: &Document) -> ObjectValue {
        let mut inner = ObjectValue::new();
        if let Some(dynamic) = &document.options().dynamic {
            inner.insert("dynamic", dynamic.as_value());
        }
        let meta = document.meta();
        if meta.routing.required {
            inner.insert("_routing", single("required", true));
        }
        let source = render_source_meta(&meta.source);
        if !source.is_empty() {
            inner.insert("_source", source);
        }
        if meta.size.enabled {
            inner.insert("_size", single("enabled", true));
        }
        if !document.templates().is_empty() {
            let mut templates = ArrayValue::new();
            for def in document.templates() {
                templates.push(single(def.name.clone(), def.definition_body()));
            }
            inner.insert("dynamic_templates", templates);
        }
        if !document.runtime().is_empty() {
            if self.features.supports_runtime_mappings() {
                let mut runtime = ObjectValue::new();
                for binding in document.runtime() {
                    runtime.insert(binding.field.name(), binding.body());
                }
                inner.insert("runtime", runtime);
            } else {
                debug!(version = %self.version, "engine takes no runtime section, dropped");
            }
        }
        let mut properties = ObjectValue::new();
        for field in document.root_fields() {
            properties.insert(field.name(), field.mapping_body());
        }
        inner.insert("properties", properties);

        if self.features.requires_mapping_type() {
            single("_doc", inner)
        } else {
            inner
        }
    }

    /// Renders bulk actions as newline-delimited payload lines through a
    /// serializer backend.
    ///
    /// Every line, the last included, ends with a newline, which is what
    /// bulk endpoints require.
    pub fn compile_bulk<S: Serializer>(
        &self,
        actions: &[BulkAction],
        serializer: &S,
    ) -> Result<String, SerializeError> {
        let mut out = String::new();
        for action in actions {
            let (meta, body) = self.bulk_lines(action);
            out.push_str(&serializer.serialize_object(&meta)?);
            out.push('\n');
            if let Some(body) = body {
                out.push_str(&serializer.serialize_object(&body)?);
                out.push('\n');
            }
        }
        debug!(version = %self.version, actions = actions.len(), "compiled bulk request");
        Ok(out)
    }

    fn bulk_lines(&self, action: &BulkAction) -> (ObjectValue, Option<ObjectValue>) {
        match action {
            BulkAction::Index(a) => (
                self.bulk_meta("index", &a.index, a.id.as_deref(), a.routing.as_deref()),
                Some(a.source.clone()),
            ),
            BulkAction::Create(a) => (
                self.bulk_meta("create", &a.index, a.id.as_deref(), a.routing.as_deref()),
                Some(a.source.clone()),
            ),
            BulkAction::Delete(a) => (
                self.bulk_meta("delete", &a.index, Some(&a.id), a.routing.as_deref()),
                None,
            ),
            BulkAction::Update(a) => {
                let mut body = ObjectValue::new();
                body.insert("doc", a.doc.clone());
                if a.doc_as_upsert {
                    body.insert("doc_as_upsert", true);
                }
                (
                    self.bulk_meta("update", &a.index, Some(&a.id), a.routing.as_deref()),
                    Some(body),
                )
            }
        }
    }

    fn bulk_meta(
        &self,
        verb: &str,
        index: &str,
        id: Option<&str>,
        routing: Option<&str>,
    ) -> ObjectValue {
        let mut meta = ObjectValue::new();
        meta.insert("_index", index);
        if self.features.requires_mapping_type() {
            meta.insert("_type", "_doc");
        }
        if let Some(id) = id {
            meta.insert("_id", id);
        }
        if let Some(routing) = routing {
            meta.insert("_routing", routing);
        }
        single(verb, meta)
    }
}

fn request_parameters(query: &SearchQuery) -> BTreeMap<String, Vec<String>> {
    let mut parameters = BTreeMap::new();
    if let Some(routing) = &query.routing {
        parameters.insert("routing".to_string(), vec![routing.clone()]);
    }
    if let Some(preference) = &query.preference {
        parameters.insert("preference".to_string(), vec![preference.clone()]);
    }
    if let Some(cache) = query.request_cache {
        parameters.insert("request_cache".to_string(), vec![cache.to_string()]);
    }
    if !query.stats.is_empty() {
        parameters.insert("stats".to_string(), query.stats.clone());
    }
    parameters
}

fn combine_query(query: Option<&QueryExpr>, filters: &[QueryExpr]) -> Option<Value> {
    if filters.is_empty() {
        return query.map(render_query);
    }
    let mut bool_body = ObjectValue::new();
    if let Some(query) = query {
        let mut must = ArrayValue::new();
        must.push(render_query(query));
        bool_body.insert("must", must);
    }
    bool_body.insert("filter", render_queries(filters));
    Some(wrap("bool", bool_body))
}

fn combine_post_filter(post_filters: &[QueryExpr]) -> Option<Value> {
    match post_filters {
        [] => None,
        [one] => Some(render_query(one)),
        many => Some(wrap("bool", single("filter", render_queries(many)))),
    }
}

fn count_body(query: &SearchQuery) -> Option<ObjectValue> {
    let clauses: Vec<&QueryExpr> = query.query.iter().chain(query.filters.iter()).collect();
    match clauses.as_slice() {
        [] => None,
        [one] => Some(single("query", render_query(one))),
        many => {
            let mut filter = ArrayValue::new();
            for clause in many {
                filter.push(render_query(clause));
            }
            Some(single("query", wrap("bool", single("filter", filter))))
        }
    }
}

fn render_query(expr: &QueryExpr) -> Value {
    match expr {
        QueryExpr::MatchAll => wrap("match_all", ObjectValue::new()),
        QueryExpr::Match(m) => wrap("match", single(m.field.path(), m.query.clone())),
        QueryExpr::MatchPhrase(m) => {
            wrap("match_phrase", single(m.field.path(), m.query.clone()))
        }
        QueryExpr::MultiMatch(m) => wrap("multi_match", render_multi_match(m)),
        QueryExpr::Term(t) => wrap("term", single(t.field.path(), t.term.clone())),
        QueryExpr::Terms(t) => {
            let mut terms = ArrayValue::new();
            for term in &t.terms {
                terms.push(term.clone());
            }
            wrap("terms", single(t.field.path(), terms))
        }
        QueryExpr::Exists(e) => wrap("exists", single("field", e.field.path())),
        QueryExpr::Ids(i) => {
            let mut values = ArrayValue::new();
            for id in &i.values {
                values.push(id.clone());
            }
            wrap("ids", single("values", values))
        }
        QueryExpr::Range(r) => wrap("range", single(r.field.path(), render_bounds(r))),
        QueryExpr::Bool(b) => wrap("bool", render_bool(b)),
        QueryExpr::DisMax(d) => wrap("dis_max", render_dis_max(d)),
        QueryExpr::FunctionScore(f) => wrap("function_score", render_function_score(f)),
        QueryExpr::Nested(n) => {
            let mut body = ObjectValue::new();
            body.insert("path", n.path.path());
            body.insert("query", render_query(&n.query));
            wrap("nested", body)
        }
        QueryExpr::HasChild(h) => {
            let mut body = ObjectValue::new();
            body.insert("type", h.child_type.clone());
            body.insert("query", render_query(&h.query));
            wrap("has_child", body)
        }
        QueryExpr::HasParent(h) => {
            let mut body = ObjectValue::new();
            body.insert("parent_type", h.parent_type.clone());
            body.insert("query", render_query(&h.query));
            wrap("has_parent", body)
        }
        QueryExpr::Node(_, body) => render_node(body),
    }
}

fn render_node(body: &NodeBody) -> Value {
    match body {
        NodeBody::Bool(b) => wrap("bool", render_bool(b)),
        NodeBody::FunctionScore(f) => wrap("function_score", render_function_score(f)),
        NodeBody::DisMax(d) => wrap("dis_max", render_dis_max(d)),
    }
}

fn render_queries(queries: &[QueryExpr]) -> ArrayValue {
    let mut out = ArrayValue::new();
    for query in queries {
        out.push(render_query(query));
    }
    out
}

fn render_bool(query: &BoolQuery) -> ObjectValue {
    let mut body = ObjectValue::new();
    for (key, clauses) in [
        ("must", &query.must),
        ("filter", &query.filter),
        ("should", &query.should),
        ("must_not", &query.must_not),
    ] {
        if !clauses.is_empty() {
            body.insert(key, render_queries(clauses));
        }
    }
    if let Some(minimum) = &query.minimum_should_match {
        body.insert("minimum_should_match", minimum.as_value());
    }
    body
}

fn render_dis_max(query: &DisMaxQuery) -> ObjectValue {
    let mut body = ObjectValue::new();
    body.insert("queries", render_queries(&query.queries));
    if let Some(tie_breaker) = query.tie_breaker {
        body.insert("tie_breaker", tie_breaker);
    }
    body
}

fn render_function_score(query: &FunctionScoreQuery) -> ObjectValue {
    let mut body = ObjectValue::new();
    if let Some(inner) = &query.query {
        body.insert("query", render_query(inner));
    }
    let mut functions = ArrayValue::new();
    for function in &query.functions {
        functions.push(render_function(function));
    }
    body.insert("functions", functions);
    if let Some(mode) = &query.boost_mode {
        body.insert("boost_mode", mode.as_str());
    }
    if let Some(mode) = &query.score_mode {
        body.insert("score_mode", mode.as_str());
    }
    body
}

fn render_function(function: &ScoreFunction) -> Value {
    let mut body = ObjectValue::new();
    if let Some(filter) = &function.filter {
        body.insert("filter", render_query(filter));
    }
    match &function.kind {
        ScoreFunctionKind::Weight(weight) => body.insert("weight", *weight),
        ScoreFunctionKind::FieldValueFactor(fvf) => {
            let mut factor = ObjectValue::new();
            factor.insert("field", fvf.field.path());
            if let Some(f) = fvf.factor {
                factor.insert("factor", f);
            }
            if let Some(modifier) = &fvf.modifier {
                factor.insert("modifier", modifier.as_str());
            }
            if let Some(missing) = fvf.missing {
                factor.insert("missing", missing);
            }
            body.insert("field_value_factor", factor)
        }
        ScoreFunctionKind::RandomScore(rs) => {
            let mut random = ObjectValue::new();
            if let Some(seed) = rs.seed {
                random.insert("seed", seed);
            }
            if let Some(field) = &rs.field {
                random.insert("field", field.path());
            }
            body.insert("random_score", random)
        }
    }
    body.into()
}

fn render_multi_match(query: &MultiMatchQuery) -> ObjectValue {
    let mut body = ObjectValue::new();
    body.insert("query", query.query.clone());
    let mut fields = ArrayValue::new();
    for field in &query.fields {
        fields.push(field.path());
    }
    body.insert("fields", fields);
    if let Some(match_type) = &query.match_type {
        body.insert("type", match_type.as_str());
    }
    if let Some(boost) = query.boost {
        body.insert("boost", boost);
    }
    body
}

fn render_bounds(range: &RangeQuery) -> ObjectValue {
    let mut bounds = ObjectValue::new();
    for (key, bound) in [
        ("gt", &range.gt),
        ("gte", &range.gte),
        ("lt", &range.lt),
        ("lte", &range.lte),
    ] {
        if let Some(value) = bound {
            bounds.insert(key, value.clone());
        }
    }
    bounds
}

fn render_sort(sort: &Sort) -> Value {
    let path = sort.field.path();
    if sort.order.is_none() && sort.mode.is_none() && sort.missing.is_none() {
        return path.into();
    }
    let mut options = ObjectValue::new();
    if let Some(order) = &sort.order {
        options.insert("order", order.as_str());
    }
    if let Some(mode) = &sort.mode {
        options.insert("mode", mode.as_str());
    }
    if let Some(missing) = &sort.missing {
        options.insert("missing", missing.clone());
    }
    single(path, options).into()
}

fn render_aggs(aggs: &[(String, AggExpr)]) -> ObjectValue {
    let mut out = ObjectValue::new();
    for (name, agg) in aggs {
        out.insert(name.clone(), render_agg(agg));
    }
    out
}

fn render_agg(agg: &AggExpr) -> ObjectValue {
    match agg {
        AggExpr::Terms(t) => {
            let mut params = ObjectValue::new();
            params.insert("field", t.field.path());
            if let Some(size) = t.size {
                params.insert("size", size);
            }
            if let Some(missing) = &t.missing {
                params.insert("missing", missing.clone());
            }
            with_sub_aggs(single("terms", params), &t.sub)
        }
        AggExpr::Histogram(h) => {
            let mut params = ObjectValue::new();
            params.insert("field", h.field.path());
            params.insert("interval", h.interval);
            if let Some(min_doc_count) = h.min_doc_count {
                params.insert("min_doc_count", min_doc_count);
            }
            with_sub_aggs(single("histogram", params), &h.sub)
        }
        AggExpr::DateHistogram(d) => {
            let mut params = ObjectValue::new();
            params.insert("field", d.field.path());
            match &d.interval {
                DateInterval::Calendar(interval) => {
                    params.insert("calendar_interval", interval.clone());
                }
                DateInterval::Fixed(interval) => {
                    params.insert("fixed_interval", interval.clone());
                }
            }
            with_sub_aggs(single("date_histogram", params), &d.sub)
        }
        AggExpr::Metric(m) => {
            let mut params = ObjectValue::new();
            params.insert("field", m.field.path());
            if let Some(missing) = &m.missing {
                params.insert("missing", missing.clone());
            }
            single(m.kind.as_str(), params)
        }
        AggExpr::Filter(f) => with_sub_aggs(single("filter", render_query(&f.filter)), &f.sub),
        AggExpr::Nested(n) => {
            with_sub_aggs(single("nested", single("path", n.path.path())), &n.sub)
        }
    }
}

fn with_sub_aggs(mut rendered: ObjectValue, sub: &[(String, AggExpr)]) -> ObjectValue {
    if !sub.is_empty() {
        rendered.insert("aggs", render_aggs(sub));
    }
    rendered
}

fn render_source(source: &SourceFilter) -> Value {
    match source {
        SourceFilter::Enabled(enabled) => (*enabled).into(),
        SourceFilter::Filter { includes, excludes } => {
            let mut body = ObjectValue::new();
            if !includes.is_empty() {
                body.insert("includes", string_array(includes));
            }
            if !excludes.is_empty() {
                body.insert("excludes", string_array(excludes));
            }
            body.into()
        }
    }
}

fn render_source_meta(source: &SourceMeta) -> ObjectValue {
    let mut body = ObjectValue::new();
    if let Some(enabled) = source.enabled {
        body.insert("enabled", enabled);
    }
    if !source.includes.is_empty() {
        body.insert("includes", string_array(&source.includes));
    }
    if !source.excludes.is_empty() {
        body.insert("excludes", string_array(&source.excludes));
    }
    body
}

fn render_timeout(timeout: Duration) -> String {
    let millis = timeout.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

fn string_array(items: &[String]) -> ArrayValue {
    let mut out = ArrayValue::new();
    for item in items {
        out.push(item.clone());
    }
    out
}

fn path_array(fields: &[FieldRef]) -> ArrayValue {
    let mut out = ArrayValue::new();
    for field in fields {
        out.push(field.path());
    }
    out
}

fn wrap(kind: &str, body: impl Into<Value>) -> Value {
    single(kind, body).into()
}

fn single(key: impl Into<String>, value: impl Into<Value>) -> ObjectValue {
    let mut out = ObjectValue::new();
    out.insert(key, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_partial_and_tagged_forms() {
        let full: EngineVersion = "7.10.2".parse().unwrap();
        assert_eq!(full, EngineVersion::new(7, 10, 2));
        assert_eq!("6.8".parse::<EngineVersion>().unwrap(), EngineVersion::new(6, 8, 0));
        assert_eq!("8".parse::<EngineVersion>().unwrap(), EngineVersion::new(8, 0, 0));
        assert_eq!(
            "8.0.0-SNAPSHOT".parse::<EngineVersion>().unwrap(),
            EngineVersion::new(8, 0, 0),
        );
        assert!("seven".parse::<EngineVersion>().is_err());
        assert!("".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn features_follow_version_boundaries() {
        let old = Features::for_version(EngineVersion::new(6, 8, 23));
        assert!(!old.supports_track_total_hits());
        assert!(old.requires_mapping_type());
        assert!(!old.supports_runtime_mappings());

        let v7 = Features::for_version(EngineVersion::new(7, 10, 2));
        assert!(v7.supports_track_total_hits());
        assert!(!v7.requires_mapping_type());
        assert!(!v7.supports_runtime_mappings());

        assert!(Features::for_version(EngineVersion::new(7, 11, 0)).supports_runtime_mappings());
        assert!(Features::for_version(EngineVersion::new(8, 0, 0)).supports_runtime_mappings());
    }

    #[test]
    fn timeouts_render_in_the_coarsest_exact_unit() {
        assert_eq!(render_timeout(Duration::from_secs(3)), "3s");
        assert_eq!(render_timeout(Duration::from_millis(1500)), "1500ms");
        assert_eq!(render_timeout(Duration::from_millis(2000)), "2s");
        assert_eq!(render_timeout(Duration::from_millis(90)), "90ms");
    }
}
