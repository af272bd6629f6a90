//! The query expression tree and its typed constructors.
//!
//! Queries are immutable value objects: an enum tree of leaf conditions and
//! compound nodes, cheap to clone and free of backend types. Field handles
//! from the document model expose typed leaf constructors that push terms
//! through the field's type, so an integer field cannot be queried with a
//! string by accident.
//!
//! # Building queries
//!
//! ```ignore
//! use searchlayer_core::query::BoolQuery;
//!
//! let query = BoolQuery::new()
//!     .must(title.matches("northern lights"))
//!     .filter(rating.gt(6.0).lt(9.0))
//!     .filter(status.term(Status::Published));
//! ```
//!
//! # Rewriting through node handles
//!
//! A [`NodeHandle`] marks a compound node so it can be found and rewritten
//! later, even inside a clone of the tree. This is how shared base queries
//! are specialized per request without mutating the original:
//!
//! ```ignore
//! let facets = NodeHandle::new();
//! let base = SearchQuery::new().query(facets.attach(BoolQuery::new()));
//!
//! let mut narrowed = base.clone();
//! narrowed.query_node(facets, |node| {
//!     *node = node.clone().filter(color.term("red".to_string()));
//! })?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::{DynField, Field, SubDocumentField};
use crate::types::FieldType;
use crate::value::Value;

/// A reference to the field a condition applies to.
///
/// Conditions built from handles keep the bound field and resolve its
/// qualified path at compile time; conditions built from raw names carry the
/// name as given.
#[derive(Debug, Clone)]
pub enum FieldRef {
    /// A field bound in a document schema.
    Bound(std::sync::Arc<crate::document::BoundField>),
    /// A raw field path.
    Name(String),
}

impl FieldRef {
    pub(crate) fn path(&self) -> String {
        match self {
            FieldRef::Bound(bound) => bound.qualified_name(),
            FieldRef::Name(name) => name.clone(),
        }
    }
}

impl<FT: FieldType> From<&Field<FT>> for FieldRef {
    fn from(field: &Field<FT>) -> Self {
        FieldRef::Bound(field.bound().clone())
    }
}

impl From<&DynField> for FieldRef {
    fn from(field: &DynField) -> Self {
        FieldRef::Bound(field.bound().clone())
    }
}

impl<T> From<&SubDocumentField<T>> for FieldRef {
    fn from(field: &SubDocumentField<T>) -> Self {
        FieldRef::Bound(field.bound().clone())
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldRef::Name(name)
    }
}

/// A query expression.
///
/// Every condition the compiler can render is a variant here; compilation is
/// an exhaustive match, so adding a variant without teaching the compiler
/// about it does not build. [`QueryExpr::Node`] is a rewrite marker and
/// renders as its payload.
#[derive(Debug, Clone)]
pub enum QueryExpr {
    /// Matches every document.
    MatchAll,
    /// Full-text match on one field.
    Match(MatchQuery),
    /// Full-text phrase match on one field.
    MatchPhrase(MatchPhraseQuery),
    /// Full-text match across several fields.
    MultiMatch(MultiMatchQuery),
    /// Exact term on one field.
    Term(TermQuery),
    /// Any-of-terms on one field.
    Terms(TermsQuery),
    /// Field presence.
    Exists(ExistsQuery),
    /// Document id membership.
    Ids(IdsQuery),
    /// Ordered bounds on one field.
    Range(RangeQuery),
    /// Boolean combination of sub-queries.
    Bool(BoolQuery),
    /// Best-of-several scoring.
    DisMax(DisMaxQuery),
    /// Score rewriting over a wrapped query.
    FunctionScore(FunctionScoreQuery),
    /// Query against a nested sub-document.
    Nested(NestedQuery),
    /// Parent documents whose children match.
    HasChild(HasChildQuery),
    /// Child documents whose parent matches.
    HasParent(HasParentQuery),
    /// A rewrite marker carrying a compound node, see [`NodeHandle`].
    Node(u64, Box<NodeBody>),
}

impl QueryExpr {
    /// The match-all query.
    pub fn match_all() -> QueryExpr {
        QueryExpr::MatchAll
    }

    /// A document id membership query.
    pub fn ids<S: Into<String>>(values: impl IntoIterator<Item = S>) -> QueryExpr {
        QueryExpr::Ids(IdsQuery { values: values.into_iter().map(Into::into).collect() })
    }

    pub(crate) fn find_node_mut(&mut self, id: u64) -> Option<&mut NodeBody> {
        match self {
            QueryExpr::Node(node_id, body) => {
                if *node_id == id {
                    Some(body.as_mut())
                } else {
                    body.find_node_mut(id)
                }
            }
            QueryExpr::Bool(bool_query) => {
                bool_query.children_mut().find_map(|child| child.find_node_mut(id))
            }
            QueryExpr::DisMax(dis_max) => {
                dis_max.queries.iter_mut().find_map(|child| child.find_node_mut(id))
            }
            QueryExpr::FunctionScore(function_score) => function_score
                .children_mut()
                .find_map(|child| child.find_node_mut(id)),
            QueryExpr::Nested(nested) => nested.query.find_node_mut(id),
            QueryExpr::HasChild(has_child) => has_child.query.find_node_mut(id),
            QueryExpr::HasParent(has_parent) => has_parent.query.find_node_mut(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub(crate) field: FieldRef,
    pub(crate) query: String,
}

impl MatchQuery {
    pub fn new(field: impl Into<FieldRef>, query: impl Into<String>) -> Self {
        MatchQuery { field: field.into(), query: query.into() }
    }
}

#[derive(Debug, Clone)]
pub struct MatchPhraseQuery {
    pub(crate) field: FieldRef,
    pub(crate) query: String,
}

impl MatchPhraseQuery {
    pub fn new(field: impl Into<FieldRef>, query: impl Into<String>) -> Self {
        MatchPhraseQuery { field: field.into(), query: query.into() }
    }
}

/// How a multi-match distributes its query across fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiMatchType {
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
}

impl MultiMatchType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            MultiMatchType::BestFields => "best_fields",
            MultiMatchType::MostFields => "most_fields",
            MultiMatchType::CrossFields => "cross_fields",
            MultiMatchType::Phrase => "phrase",
            MultiMatchType::PhrasePrefix => "phrase_prefix",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiMatchQuery {
    pub(crate) query: String,
    pub(crate) fields: Vec<FieldRef>,
    pub(crate) match_type: Option<MultiMatchType>,
    pub(crate) boost: Option<f64>,
}

impl MultiMatchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        MultiMatchQuery {
            query: query.into(),
            fields: Vec::new(),
            match_type: None,
            boost: None,
        }
    }

    pub fn field(mut self, field: impl Into<FieldRef>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn match_type(mut self, match_type: MultiMatchType) -> Self {
        self.match_type = Some(match_type);
        self
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TermQuery {
    pub(crate) field: FieldRef,
    pub(crate) term: Value,
}

impl TermQuery {
    pub fn new(field: impl Into<FieldRef>, term: impl Into<Value>) -> Self {
        TermQuery { field: field.into(), term: term.into() }
    }
}

#[derive(Debug, Clone)]
pub struct TermsQuery {
    pub(crate) field: FieldRef,
    pub(crate) terms: Vec<Value>,
}

impl TermsQuery {
    pub fn new<V: Into<Value>>(
        field: impl Into<FieldRef>,
        terms: impl IntoIterator<Item = V>,
    ) -> Self {
        TermsQuery {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExistsQuery {
    pub(crate) field: FieldRef,
}

impl ExistsQuery {
    pub fn new(field: impl Into<FieldRef>) -> Self {
        ExistsQuery { field: field.into() }
    }
}

#[derive(Debug, Clone)]
pub struct IdsQuery {
    pub(crate) values: Vec<String>,
}

/// An untyped range condition. The typed counterpart is built through
/// [`Field::range`] and friends; this form serves dynamic fields and raw
/// field paths.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    pub(crate) field: FieldRef,
    pub(crate) gt: Option<Value>,
    pub(crate) gte: Option<Value>,
    pub(crate) lt: Option<Value>,
    pub(crate) lte: Option<Value>,
}

impl RangeQuery {
    pub fn new(field: impl Into<FieldRef>) -> Self {
        RangeQuery {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }
}

/// The minimum number of `should` clauses a boolean query requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumShouldMatch {
    /// An absolute clause count.
    Count(i64),
    /// A percentage of the clause count.
    Percent(i64),
}

impl MinimumShouldMatch {
    pub(crate) fn as_value(&self) -> Value {
        match self {
            MinimumShouldMatch::Count(count) => Value::I64(*count),
            MinimumShouldMatch::Percent(percent) => Value::Str(format!("{percent}%")),
        }
    }
}

impl From<i64> for MinimumShouldMatch {
    fn from(count: i64) -> Self {
        MinimumShouldMatch::Count(count)
    }
}

impl From<i32> for MinimumShouldMatch {
    fn from(count: i32) -> Self {
        MinimumShouldMatch::Count(count as i64)
    }
}

/// A boolean combination of sub-queries.
#[derive(Debug, Clone, Default)]
pub struct BoolQuery {
    pub(crate) must: Vec<QueryExpr>,
    pub(crate) filter: Vec<QueryExpr>,
    pub(crate) should: Vec<QueryExpr>,
    pub(crate) must_not: Vec<QueryExpr>,
    pub(crate) minimum_should_match: Option<MinimumShouldMatch>,
}

impl BoolQuery {
    pub fn new() -> Self {
        BoolQuery::default()
    }

    /// Adds a scoring clause that must match.
    pub fn must(mut self, query: impl Into<QueryExpr>) -> Self {
        self.must.push(query.into());
        self
    }

    /// Adds a non-scoring clause that must match.
    pub fn filter(mut self, query: impl Into<QueryExpr>) -> Self {
        self.filter.push(query.into());
        self
    }

    /// Adds an optional scoring clause.
    pub fn should(mut self, query: impl Into<QueryExpr>) -> Self {
        self.should.push(query.into());
        self
    }

    /// Adds a clause that must not match.
    pub fn must_not(mut self, query: impl Into<QueryExpr>) -> Self {
        self.must_not.push(query.into());
        self
    }

    pub fn minimum_should_match(mut self, minimum: impl Into<MinimumShouldMatch>) -> Self {
        self.minimum_should_match = Some(minimum.into());
        self
    }

    /// In-place counterpart of [`BoolQuery::must`], for node rewriting.
    pub fn push_must(&mut self, query: impl Into<QueryExpr>) {
        self.must.push(query.into());
    }

    /// In-place counterpart of [`BoolQuery::filter`], for node rewriting.
    pub fn push_filter(&mut self, query: impl Into<QueryExpr>) {
        self.filter.push(query.into());
    }

    /// In-place counterpart of [`BoolQuery::should`], for node rewriting.
    pub fn push_should(&mut self, query: impl Into<QueryExpr>) {
        self.should.push(query.into());
    }

    /// In-place counterpart of [`BoolQuery::must_not`], for node rewriting.
    pub fn push_must_not(&mut self, query: impl Into<QueryExpr>) {
        self.must_not.push(query.into());
    }

    /// Returns `true` if no clause was added.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.filter.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut QueryExpr> {
        self.must
            .iter_mut()
            .chain(self.filter.iter_mut())
            .chain(self.should.iter_mut())
            .chain(self.must_not.iter_mut())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisMaxQuery {
    pub(crate) queries: Vec<QueryExpr>,
    pub(crate) tie_breaker: Option<f64>,
}

impl DisMaxQuery {
    pub fn new() -> Self {
        DisMaxQuery::default()
    }

    pub fn query(mut self, query: impl Into<QueryExpr>) -> Self {
        self.queries.push(query.into());
        self
    }

    pub fn tie_breaker(mut self, tie_breaker: f64) -> Self {
        self.tie_breaker = Some(tie_breaker);
        self
    }

    /// In-place counterpart of [`DisMaxQuery::query`], for node rewriting.
    pub fn push_query(&mut self, query: impl Into<QueryExpr>) {
        self.queries.push(query.into());
    }
}

/// How function scores combine with the query score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostMode {
    Multiply,
    Replace,
    Sum,
    Avg,
    Max,
    Min,
}

impl BoostMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            BoostMode::Multiply => "multiply",
            BoostMode::Replace => "replace",
            BoostMode::Sum => "sum",
            BoostMode::Avg => "avg",
            BoostMode::Max => "max",
            BoostMode::Min => "min",
        }
    }
}

/// How the scores of several functions combine with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    Multiply,
    Sum,
    Avg,
    First,
    Max,
    Min,
}

impl ScoreMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ScoreMode::Multiply => "multiply",
            ScoreMode::Sum => "sum",
            ScoreMode::Avg => "avg",
            ScoreMode::First => "first",
            ScoreMode::Max => "max",
            ScoreMode::Min => "min",
        }
    }
}

/// The modifier applied to a field value before it contributes to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorModifier {
    Log,
    Log1p,
    Log2p,
    Ln,
    Ln1p,
    Ln2p,
    Square,
    Sqrt,
    Reciprocal,
}

impl FactorModifier {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            FactorModifier::Log => "log",
            FactorModifier::Log1p => "log1p",
            FactorModifier::Log2p => "log2p",
            FactorModifier::Ln => "ln",
            FactorModifier::Ln1p => "ln1p",
            FactorModifier::Ln2p => "ln2p",
            FactorModifier::Square => "square",
            FactorModifier::Sqrt => "sqrt",
            FactorModifier::Reciprocal => "reciprocal",
        }
    }
}

/// Scores documents by a numeric field value.
#[derive(Debug, Clone)]
pub struct FieldValueFactor {
    pub(crate) field: FieldRef,
    pub(crate) factor: Option<f64>,
    pub(crate) modifier: Option<FactorModifier>,
    pub(crate) missing: Option<f64>,
}

impl FieldValueFactor {
    pub fn new(field: impl Into<FieldRef>) -> Self {
        FieldValueFactor {
            field: field.into(),
            factor: None,
            modifier: None,
            missing: None,
        }
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn modifier(mut self, modifier: FactorModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn missing(mut self, missing: f64) -> Self {
        self.missing = Some(missing);
        self
    }
}

/// Scores documents pseudo-randomly but reproducibly for a given seed.
#[derive(Debug, Clone, Default)]
pub struct RandomScore {
    pub(crate) seed: Option<i64>,
    pub(crate) field: Option<FieldRef>,
}

impl RandomScore {
    pub fn new() -> Self {
        RandomScore::default()
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn field(mut self, field: impl Into<FieldRef>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ScoreFunctionKind {
    Weight(f64),
    FieldValueFactor(FieldValueFactor),
    RandomScore(RandomScore),
}

/// One scoring function of a function-score query, with an optional filter
/// restricting the documents it applies to.
#[derive(Debug, Clone)]
pub struct ScoreFunction {
    pub(crate) kind: ScoreFunctionKind,
    pub(crate) filter: Option<QueryExpr>,
}

impl ScoreFunction {
    /// A constant weight function.
    pub fn weight(weight: f64) -> Self {
        ScoreFunction { kind: ScoreFunctionKind::Weight(weight), filter: None }
    }

    /// Restricts this function to documents matching the filter.
    pub fn filter(mut self, filter: impl Into<QueryExpr>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl From<FieldValueFactor> for ScoreFunction {
    fn from(function: FieldValueFactor) -> Self {
        ScoreFunction { kind: ScoreFunctionKind::FieldValueFactor(function), filter: None }
    }
}

impl From<RandomScore> for ScoreFunction {
    fn from(function: RandomScore) -> Self {
        ScoreFunction { kind: ScoreFunctionKind::RandomScore(function), filter: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionScoreQuery {
    pub(crate) query: Option<Box<QueryExpr>>,
    pub(crate) functions: Vec<ScoreFunction>,
    pub(crate) boost_mode: Option<BoostMode>,
    pub(crate) score_mode: Option<ScoreMode>,
}

impl FunctionScoreQuery {
    pub fn new() -> Self {
        FunctionScoreQuery::default()
    }

    pub fn query(mut self, query: impl Into<QueryExpr>) -> Self {
        self.query = Some(Box::new(query.into()));
        self
    }

    pub fn function(mut self, function: impl Into<ScoreFunction>) -> Self {
        self.functions.push(function.into());
        self
    }

    pub fn boost_mode(mut self, boost_mode: BoostMode) -> Self {
        self.boost_mode = Some(boost_mode);
        self
    }

    pub fn score_mode(mut self, score_mode: ScoreMode) -> Self {
        self.score_mode = Some(score_mode);
        self
    }

    /// In-place counterpart of [`FunctionScoreQuery::function`], for node
    /// rewriting.
    pub fn push_function(&mut self, function: impl Into<ScoreFunction>) {
        self.functions.push(function.into());
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut QueryExpr> {
        self.query
            .iter_mut()
            .map(|boxed| boxed.as_mut())
            .chain(self.functions.iter_mut().filter_map(|f| f.filter.as_mut()))
    }
}

#[derive(Debug, Clone)]
pub struct NestedQuery {
    pub(crate) path: FieldRef,
    pub(crate) query: Box<QueryExpr>,
}

impl NestedQuery {
    pub fn new(path: impl Into<FieldRef>, query: impl Into<QueryExpr>) -> Self {
        NestedQuery { path: path.into(), query: Box::new(query.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct HasChildQuery {
    pub(crate) child_type: String,
    pub(crate) query: Box<QueryExpr>,
}

impl HasChildQuery {
    pub fn new(child_type: impl Into<String>, query: impl Into<QueryExpr>) -> Self {
        HasChildQuery { child_type: child_type.into(), query: Box::new(query.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct HasParentQuery {
    pub(crate) parent_type: String,
    pub(crate) query: Box<QueryExpr>,
}

impl HasParentQuery {
    pub fn new(parent_type: impl Into<String>, query: impl Into<QueryExpr>) -> Self {
        HasParentQuery { parent_type: parent_type.into(), query: Box::new(query.into()) }
    }
}

macro_rules! expr_from {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for QueryExpr {
                fn from(query: $payload) -> QueryExpr {
                    QueryExpr::$variant(query)
                }
            }
        )*
    };
}

expr_from! {
    MatchQuery => Match,
    MatchPhraseQuery => MatchPhrase,
    MultiMatchQuery => MultiMatch,
    TermQuery => Term,
    TermsQuery => Terms,
    ExistsQuery => Exists,
    IdsQuery => Ids,
    RangeQuery => Range,
    BoolQuery => Bool,
    DisMaxQuery => DisMax,
    FunctionScoreQuery => FunctionScore,
    NestedQuery => Nested,
    HasChildQuery => HasChild,
    HasParentQuery => HasParent,
}

/// The payload of a rewrite marker.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Bool(BoolQuery),
    FunctionScore(FunctionScoreQuery),
    DisMax(DisMaxQuery),
}

impl NodeBody {
    fn find_node_mut(&mut self, id: u64) -> Option<&mut NodeBody> {
        match self {
            NodeBody::Bool(bool_query) => {
                bool_query.children_mut().find_map(|child| child.find_node_mut(id))
            }
            NodeBody::FunctionScore(function_score) => function_score
                .children_mut()
                .find_map(|child| child.find_node_mut(id)),
            NodeBody::DisMax(dis_max) => {
                dis_max.queries.iter_mut().find_map(|child| child.find_node_mut(id))
            }
        }
    }
}

/// A compound query type that can sit behind a rewrite marker.
pub trait QueryNode: Sized {
    /// The node kind name used in error messages.
    const KIND: &'static str;

    fn into_body(self) -> NodeBody;
    fn from_body(body: &NodeBody) -> Option<Self>;
}

impl QueryNode for BoolQuery {
    const KIND: &'static str = "bool";

    fn into_body(self) -> NodeBody {
        NodeBody::Bool(self)
    }

    fn from_body(body: &NodeBody) -> Option<Self> {
        match body {
            NodeBody::Bool(query) => Some(query.clone()),
            _ => None,
        }
    }
}

impl QueryNode for FunctionScoreQuery {
    const KIND: &'static str = "function_score";

    fn into_body(self) -> NodeBody {
        NodeBody::FunctionScore(self)
    }

    fn from_body(body: &NodeBody) -> Option<Self> {
        match body {
            NodeBody::FunctionScore(query) => Some(query.clone()),
            _ => None,
        }
    }
}

impl QueryNode for DisMaxQuery {
    const KIND: &'static str = "dis_max";

    fn into_body(self) -> NodeBody {
        NodeBody::DisMax(self)
    }

    fn from_body(body: &NodeBody) -> Option<Self> {
        match body {
            NodeBody::DisMax(query) => Some(query.clone()),
            _ => None,
        }
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A handle to a compound node inside a query tree.
///
/// The handle itself carries only an id; attaching a node embeds the id in
/// the tree as a [`QueryExpr::Node`] marker. Because clones of the tree keep
/// their markers, the same handle later finds the corresponding node in any
/// clone, which is what makes the shared-base-query pattern work.
pub struct NodeHandle<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: QueryNode> NodeHandle<T> {
    /// Creates a handle with a fresh id.
    pub fn new() -> Self {
        NodeHandle {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }

    /// Wraps a node in a marker carrying this handle's id.
    pub fn attach(&self, node: T) -> QueryExpr {
        QueryExpr::Node(self.id, Box::new(node.into_body()))
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl<T: QueryNode> Default for NodeHandle<T> {
    fn default() -> Self {
        NodeHandle::new()
    }
}

impl<T> Clone for NodeHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeHandle<T> {}

impl<T> fmt::Debug for NodeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle").field("id", &self.id).finish()
    }
}

/// Sort order for one sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// How a multi-valued field collapses into one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Min,
    Max,
    Sum,
    Avg,
    Median,
}

impl SortMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SortMode::Min => "min",
            SortMode::Max => "max",
            SortMode::Sum => "sum",
            SortMode::Avg => "avg",
            SortMode::Median => "median",
        }
    }
}

/// One sort criterion of a search request.
#[derive(Debug, Clone)]
pub struct Sort {
    pub(crate) field: FieldRef,
    pub(crate) order: Option<SortOrder>,
    pub(crate) mode: Option<SortMode>,
    pub(crate) missing: Option<Value>,
}

impl Sort {
    /// Sorts by a field.
    pub fn new(field: impl Into<FieldRef>) -> Self {
        Sort { field: field.into(), order: None, mode: None, missing: None }
    }

    /// Sorts by relevance score.
    pub fn score() -> Self {
        Sort::new("_score")
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Shorthand for ascending order.
    pub fn asc(self) -> Self {
        self.order(SortOrder::Asc)
    }

    /// Shorthand for descending order.
    pub fn desc(self) -> Self {
        self.order(SortOrder::Desc)
    }

    pub fn mode(mut self, mode: SortMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// The sort key substituted for documents missing the field.
    pub fn missing(mut self, missing: impl Into<Value>) -> Self {
        self.missing = Some(missing.into());
        self
    }
}

impl<FT: FieldType> From<&Field<FT>> for Sort {
    fn from(field: &Field<FT>) -> Self {
        Sort::new(field)
    }
}

/// A typed range condition under construction. Bounds serialize through the
/// field's type as they are added.
#[derive(Debug, Clone)]
pub struct RangeBuilder<FT: FieldType> {
    field: Field<FT>,
    gt: Option<Value>,
    gte: Option<Value>,
    lt: Option<Value>,
    lte: Option<Value>,
}

impl<FT: FieldType> RangeBuilder<FT> {
    fn new(field: &Field<FT>) -> Self {
        RangeBuilder {
            field: field.clone(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn gt(mut self, term: FT::Term) -> Self {
        self.gt = Some(self.field.ftype().serialize_term(&term));
        self
    }

    pub fn gte(mut self, term: FT::Term) -> Self {
        self.gte = Some(self.field.ftype().serialize_term(&term));
        self
    }

    pub fn lt(mut self, term: FT::Term) -> Self {
        self.lt = Some(self.field.ftype().serialize_term(&term));
        self
    }

    pub fn lte(mut self, term: FT::Term) -> Self {
        self.lte = Some(self.field.ftype().serialize_term(&term));
        self
    }
}

impl<FT: FieldType> From<RangeBuilder<FT>> for QueryExpr {
    fn from(builder: RangeBuilder<FT>) -> QueryExpr {
        QueryExpr::Range(RangeQuery {
            field: (&builder.field).into(),
            gt: builder.gt,
            gte: builder.gte,
            lt: builder.lt,
            lte: builder.lte,
        })
    }
}

/// Typed query constructors on field handles. Terms are serialized through
/// the field's type at construction time, so an out-of-domain value cannot
/// make it into the tree.
impl<FT: FieldType> Field<FT> {
    /// An exact term condition.
    pub fn term(&self, term: FT::Term) -> QueryExpr {
        QueryExpr::Term(TermQuery {
            field: self.into(),
            term: self.ftype().serialize_term(&term),
        })
    }

    /// An any-of-terms condition.
    pub fn terms(&self, terms: impl IntoIterator<Item = FT::Term>) -> QueryExpr {
        QueryExpr::Terms(TermsQuery {
            field: self.into(),
            terms: terms
                .into_iter()
                .map(|term| self.ftype().serialize_term(&term))
                .collect(),
        })
    }

    /// A field presence condition.
    pub fn exists(&self) -> QueryExpr {
        QueryExpr::Exists(ExistsQuery { field: self.into() })
    }

    /// A full-text match condition.
    pub fn matches(&self, text: impl Into<String>) -> QueryExpr {
        QueryExpr::Match(MatchQuery { field: self.into(), query: text.into() })
    }

    /// A full-text phrase condition.
    pub fn match_phrase(&self, text: impl Into<String>) -> QueryExpr {
        QueryExpr::MatchPhrase(MatchPhraseQuery { field: self.into(), query: text.into() })
    }

    /// An empty range condition to add bounds to.
    pub fn range(&self) -> RangeBuilder<FT> {
        RangeBuilder::new(self)
    }

    /// A range condition with an exclusive lower bound.
    pub fn gt(&self, term: FT::Term) -> RangeBuilder<FT> {
        self.range().gt(term)
    }

    /// A range condition with an inclusive lower bound.
    pub fn gte(&self, term: FT::Term) -> RangeBuilder<FT> {
        self.range().gte(term)
    }

    /// A range condition with an exclusive upper bound.
    pub fn lt(&self, term: FT::Term) -> RangeBuilder<FT> {
        self.range().lt(term)
    }

    /// A range condition with an inclusive upper bound.
    pub fn lte(&self, term: FT::Term) -> RangeBuilder<FT> {
        self.range().lte(term)
    }
}

/// Untyped query constructors for fields resolved at runtime.
impl DynField {
    /// An exact term condition.
    pub fn term(&self, term: impl Into<Value>) -> QueryExpr {
        QueryExpr::Term(TermQuery { field: self.into(), term: term.into() })
    }

    /// An any-of-terms condition.
    pub fn terms<V: Into<Value>>(&self, terms: impl IntoIterator<Item = V>) -> QueryExpr {
        QueryExpr::Terms(TermsQuery {
            field: self.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        })
    }

    /// A field presence condition.
    pub fn exists(&self) -> QueryExpr {
        QueryExpr::Exists(ExistsQuery { field: self.into() })
    }

    /// A full-text match condition.
    pub fn matches(&self, text: impl Into<String>) -> QueryExpr {
        QueryExpr::Match(MatchQuery { field: self.into(), query: text.into() })
    }

    /// An empty range condition to add bounds to.
    pub fn range(&self) -> RangeQuery {
        RangeQuery::new(self)
    }
}
