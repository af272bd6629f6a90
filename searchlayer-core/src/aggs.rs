//! Aggregation definitions and result parsing.
//!
//! An aggregation is declared twice over: a typed definition (for example
//! [`TermsAgg`] over a keyword field) that knows how to parse its own slice
//! of the response, and the erased [`AggExpr`] form the compiler renders
//! into the request body. Keeping the typed definition around after the
//! request is what turns raw bucket keys back into typed terms.
//!
//! ```ignore
//! let genres = TermsAgg::new(&genre).size(10)
//!     .aggregation("max_rating", &MaxAgg::new(&rating));
//! let query = SearchQuery::new().aggregation("genres", &genres);
//!
//! // after the request:
//! let parsed = genres.parse(response.aggregation("genres")?)?;
//! for bucket in &parsed.buckets {
//!     println!("{:?}: {}", bucket.key, bucket.doc_count);
//! }
//! ```

use crate::document::Field;
use crate::error::DeserializeError;
use crate::query::{FieldRef, QueryExpr};
use crate::types::FieldType;
use crate::value::{ObjectValue, Value};

fn shape(expected: &'static str, at: &str) -> DeserializeError {
    DeserializeError::ResponseShape { expected, at: at.to_string() }
}

fn buckets_of<'a>(
    raw: &'a ObjectValue,
    at: &str,
) -> Result<&'a crate::value::ArrayValue, DeserializeError> {
    raw.get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| shape("a buckets array", at))
}

/// An erased aggregation, as the compiler renders it.
#[derive(Debug, Clone)]
pub enum AggExpr {
    Terms(TermsAggBody),
    Histogram(HistogramAggBody),
    DateHistogram(DateHistogramAggBody),
    Metric(MetricAggBody),
    Filter(FilterAggBody),
    Nested(NestedAggBody),
}

#[derive(Debug, Clone)]
pub struct TermsAggBody {
    pub(crate) field: FieldRef,
    pub(crate) size: Option<i64>,
    pub(crate) missing: Option<Value>,
    pub(crate) sub: Vec<(String, AggExpr)>,
}

#[derive(Debug, Clone)]
pub struct HistogramAggBody {
    pub(crate) field: FieldRef,
    pub(crate) interval: f64,
    pub(crate) min_doc_count: Option<i64>,
    pub(crate) sub: Vec<(String, AggExpr)>,
}

#[derive(Debug, Clone)]
pub struct DateHistogramAggBody {
    pub(crate) field: FieldRef,
    pub(crate) interval: DateInterval,
    pub(crate) sub: Vec<(String, AggExpr)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetricKind {
    Min,
    Max,
    Avg,
    Sum,
    ValueCount,
}

impl MetricKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Min => "min",
            MetricKind::Max => "max",
            MetricKind::Avg => "avg",
            MetricKind::Sum => "sum",
            MetricKind::ValueCount => "value_count",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricAggBody {
    pub(crate) kind: MetricKind,
    pub(crate) field: FieldRef,
    pub(crate) missing: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct FilterAggBody {
    pub(crate) filter: QueryExpr,
    pub(crate) sub: Vec<(String, AggExpr)>,
}

#[derive(Debug, Clone)]
pub struct NestedAggBody {
    pub(crate) path: FieldRef,
    pub(crate) sub: Vec<(String, AggExpr)>,
}

/// A date histogram bucket width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInterval {
    /// A calendar-aware interval like `"month"` or `"1w"`.
    Calendar(String),
    /// A fixed-length interval like `"30d"` or `"90s"`.
    Fixed(String),
}

impl DateInterval {
    pub fn calendar(interval: impl Into<String>) -> Self {
        DateInterval::Calendar(interval.into())
    }

    pub fn fixed(interval: impl Into<String>) -> Self {
        DateInterval::Fixed(interval.into())
    }
}

/// Buckets documents by the distinct terms of a field.
///
/// The definition keeps the typed field handle, so [`TermsAgg::parse`] turns
/// bucket keys back into the field's term type. For an enum field the keys
/// come back as enum variants.
#[derive(Debug)]
pub struct TermsAgg<FT: FieldType> {
    field: Field<FT>,
    size: Option<i64>,
    missing: Option<Value>,
    sub: Vec<(String, AggExpr)>,
}

impl<FT: FieldType> TermsAgg<FT> {
    pub fn new(field: &Field<FT>) -> Self {
        TermsAgg { field: field.clone(), size: None, missing: None, sub: Vec::new() }
    }

    /// The number of buckets to return.
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// The bucket key substituted for documents missing the field.
    pub fn missing(mut self, term: FT::Term) -> Self {
        self.missing = Some(self.field.ftype().serialize_term(&term));
        self
    }

    /// Adds a named sub-aggregation computed per bucket.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.sub.push((name.into(), agg.into()));
        self
    }

    /// Parses this aggregation's result object.
    ///
    /// # Errors
    ///
    /// A missing or malformed `buckets` array is a fatal
    /// [`DeserializeError::ResponseShape`]; a bucket key outside the field
    /// type's domain reports the underlying coercion error.
    pub fn parse(&self, raw: &ObjectValue) -> Result<TermsAggResult<FT::Term>, DeserializeError> {
        let buckets = buckets_of(raw, "terms aggregation")?;
        let mut out = Vec::with_capacity(buckets.len());
        for item in buckets.iter() {
            let bucket = item
                .as_object()
                .ok_or_else(|| shape("a bucket object", "terms aggregation buckets"))?;
            let key_raw = bucket
                .get("key")
                .cloned()
                .ok_or_else(|| shape("a bucket key", "terms aggregation buckets"))?;
            let key = self.field.ftype().deserialize_term(key_raw)?;
            let key_as_string = bucket
                .get("key_as_string")
                .and_then(Value::as_str)
                .map(String::from);
            let doc_count = bucket
                .get("doc_count")
                .and_then(Value::as_i64)
                .ok_or_else(|| shape("a doc_count", "terms aggregation buckets"))?;
            out.push(TermsBucket { key, key_as_string, doc_count, raw: bucket.clone() });
        }
        Ok(TermsAggResult { buckets: out })
    }
}

impl<FT: FieldType> Clone for TermsAgg<FT> {
    fn clone(&self) -> Self {
        TermsAgg {
            field: self.field.clone(),
            size: self.size,
            missing: self.missing.clone(),
            sub: self.sub.clone(),
        }
    }
}

impl<FT: FieldType> From<&TermsAgg<FT>> for AggExpr {
    fn from(agg: &TermsAgg<FT>) -> Self {
        AggExpr::Terms(TermsAggBody {
            field: (&agg.field).into(),
            size: agg.size,
            missing: agg.missing.clone(),
            sub: agg.sub.clone(),
        })
    }
}

/// The parsed result of a [`TermsAgg`].
#[derive(Debug, Clone)]
pub struct TermsAggResult<T> {
    pub buckets: Vec<TermsBucket<T>>,
}

/// One terms bucket with its key coerced back to the field's term type.
#[derive(Debug, Clone)]
pub struct TermsBucket<T> {
    pub key: T,
    pub key_as_string: Option<String>,
    pub doc_count: i64,
    raw: ObjectValue,
}

impl<T> TermsBucket<T> {
    /// The raw result of a named sub-aggregation in this bucket.
    pub fn aggregation(&self, name: &str) -> Option<&ObjectValue> {
        self.raw.get(name).and_then(Value::as_object)
    }
}

/// Buckets documents by fixed-width numeric intervals.
#[derive(Debug, Clone)]
pub struct HistogramAgg {
    field: FieldRef,
    interval: f64,
    min_doc_count: Option<i64>,
    sub: Vec<(String, AggExpr)>,
}

impl HistogramAgg {
    pub fn new(field: impl Into<FieldRef>, interval: f64) -> Self {
        HistogramAgg {
            field: field.into(),
            interval,
            min_doc_count: None,
            sub: Vec::new(),
        }
    }

    /// Drops buckets with fewer documents than this.
    pub fn min_doc_count(mut self, min_doc_count: i64) -> Self {
        self.min_doc_count = Some(min_doc_count);
        self
    }

    /// Adds a named sub-aggregation computed per bucket.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.sub.push((name.into(), agg.into()));
        self
    }

    /// Parses this aggregation's result object.
    pub fn parse(&self, raw: &ObjectValue) -> Result<HistogramAggResult, DeserializeError> {
        let buckets = buckets_of(raw, "histogram aggregation")?;
        let mut out = Vec::with_capacity(buckets.len());
        for item in buckets.iter() {
            let bucket = item
                .as_object()
                .ok_or_else(|| shape("a bucket object", "histogram aggregation buckets"))?;
            let key = bucket
                .get("key")
                .and_then(Value::as_f64)
                .ok_or_else(|| shape("a numeric bucket key", "histogram aggregation buckets"))?;
            let doc_count = bucket
                .get("doc_count")
                .and_then(Value::as_i64)
                .ok_or_else(|| shape("a doc_count", "histogram aggregation buckets"))?;
            out.push(HistogramBucket { key, doc_count, raw: bucket.clone() });
        }
        Ok(HistogramAggResult { buckets: out })
    }
}

impl From<&HistogramAgg> for AggExpr {
    fn from(agg: &HistogramAgg) -> Self {
        AggExpr::Histogram(HistogramAggBody {
            field: agg.field.clone(),
            interval: agg.interval,
            min_doc_count: agg.min_doc_count,
            sub: agg.sub.clone(),
        })
    }
}

/// The parsed result of a [`HistogramAgg`].
#[derive(Debug, Clone)]
pub struct HistogramAggResult {
    pub buckets: Vec<HistogramBucket>,
}

#[derive(Debug, Clone)]
pub struct HistogramBucket {
    pub key: f64,
    pub doc_count: i64,
    raw: ObjectValue,
}

impl HistogramBucket {
    /// The raw result of a named sub-aggregation in this bucket.
    pub fn aggregation(&self, name: &str) -> Option<&ObjectValue> {
        self.raw.get(name).and_then(Value::as_object)
    }
}

/// Buckets documents by date intervals.
#[derive(Debug, Clone)]
pub struct DateHistogramAgg {
    field: FieldRef,
    interval: DateInterval,
    sub: Vec<(String, AggExpr)>,
}

impl DateHistogramAgg {
    pub fn new(field: impl Into<FieldRef>, interval: DateInterval) -> Self {
        DateHistogramAgg { field: field.into(), interval, sub: Vec::new() }
    }

    /// Adds a named sub-aggregation computed per bucket.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.sub.push((name.into(), agg.into()));
        self
    }

    /// Parses this aggregation's result object. Bucket keys are epoch
    /// milliseconds; `key_as_string` carries the formatted form when the
    /// engine sends one.
    pub fn parse(&self, raw: &ObjectValue) -> Result<DateHistogramAggResult, DeserializeError> {
        let buckets = buckets_of(raw, "date_histogram aggregation")?;
        let mut out = Vec::with_capacity(buckets.len());
        for item in buckets.iter() {
            let bucket = item
                .as_object()
                .ok_or_else(|| shape("a bucket object", "date_histogram aggregation buckets"))?;
            let key = bucket.get("key").and_then(Value::as_i64).ok_or_else(|| {
                shape("an epoch-millis bucket key", "date_histogram aggregation buckets")
            })?;
            let key_as_string = bucket
                .get("key_as_string")
                .and_then(Value::as_str)
                .map(String::from);
            let doc_count = bucket
                .get("doc_count")
                .and_then(Value::as_i64)
                .ok_or_else(|| shape("a doc_count", "date_histogram aggregation buckets"))?;
            out.push(DateHistogramBucket { key, key_as_string, doc_count, raw: bucket.clone() });
        }
        Ok(DateHistogramAggResult { buckets: out })
    }
}

impl From<&DateHistogramAgg> for AggExpr {
    fn from(agg: &DateHistogramAgg) -> Self {
        AggExpr::DateHistogram(DateHistogramAggBody {
            field: agg.field.clone(),
            interval: agg.interval.clone(),
            sub: agg.sub.clone(),
        })
    }
}

/// The parsed result of a [`DateHistogramAgg`].
#[derive(Debug, Clone)]
pub struct DateHistogramAggResult {
    pub buckets: Vec<DateHistogramBucket>,
}

#[derive(Debug, Clone)]
pub struct DateHistogramBucket {
    /// The bucket start in epoch milliseconds.
    pub key: i64,
    pub key_as_string: Option<String>,
    pub doc_count: i64,
    raw: ObjectValue,
}

impl DateHistogramBucket {
    /// The raw result of a named sub-aggregation in this bucket.
    pub fn aggregation(&self, name: &str) -> Option<&ObjectValue> {
        self.raw.get(name).and_then(Value::as_object)
    }
}

/// The parsed result of a single-value metric aggregation.
///
/// `value` is `None` when no document carried the field (engines answer
/// null). Date-valued metrics return epoch milliseconds in `value` and the
/// formatted date in `value_as_string`.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleValueResult {
    pub value: Option<f64>,
    pub value_as_string: Option<String>,
}

fn parse_single_value(raw: &ObjectValue) -> SingleValueResult {
    SingleValueResult {
        value: raw.get("value").and_then(Value::as_f64),
        value_as_string: raw
            .get("value_as_string")
            .and_then(Value::as_str)
            .map(String::from),
    }
}

macro_rules! single_value_agg {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            field: FieldRef,
            missing: Option<Value>,
        }

        impl $name {
            pub fn new(field: impl Into<FieldRef>) -> Self {
                $name { field: field.into(), missing: None }
            }

            /// The value substituted for documents missing the field.
            pub fn missing(mut self, missing: impl Into<Value>) -> Self {
                self.missing = Some(missing.into());
                self
            }

            /// Parses this aggregation's result object.
            pub fn parse(&self, raw: &ObjectValue) -> SingleValueResult {
                parse_single_value(raw)
            }
        }

        impl From<&$name> for AggExpr {
            fn from(agg: &$name) -> Self {
                AggExpr::Metric(MetricAggBody {
                    kind: $kind,
                    field: agg.field.clone(),
                    missing: agg.missing.clone(),
                })
            }
        }
    };
}

single_value_agg! {
    /// The smallest value of a field.
    MinAgg, MetricKind::Min
}
single_value_agg! {
    /// The largest value of a field.
    MaxAgg, MetricKind::Max
}
single_value_agg! {
    /// The arithmetic mean of a field.
    AvgAgg, MetricKind::Avg
}
single_value_agg! {
    /// The sum of a field.
    SumAgg, MetricKind::Sum
}

/// The number of documents carrying a field.
#[derive(Debug, Clone)]
pub struct ValueCountAgg {
    field: FieldRef,
}

impl ValueCountAgg {
    pub fn new(field: impl Into<FieldRef>) -> Self {
        ValueCountAgg { field: field.into() }
    }

    /// Parses this aggregation's result object.
    pub fn parse(&self, raw: &ObjectValue) -> Result<ValueCountResult, DeserializeError> {
        let value = raw
            .get("value")
            .and_then(Value::as_i64)
            .ok_or_else(|| shape("a count value", "value_count aggregation"))?;
        Ok(ValueCountResult { value })
    }
}

impl From<&ValueCountAgg> for AggExpr {
    fn from(agg: &ValueCountAgg) -> Self {
        AggExpr::Metric(MetricAggBody {
            kind: MetricKind::ValueCount,
            field: agg.field.clone(),
            missing: None,
        })
    }
}

/// The parsed result of a [`ValueCountAgg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCountResult {
    pub value: i64,
}

/// A single bucket restricted to documents matching a filter.
#[derive(Debug, Clone)]
pub struct FilterAgg {
    filter: QueryExpr,
    sub: Vec<(String, AggExpr)>,
}

impl FilterAgg {
    pub fn new(filter: impl Into<QueryExpr>) -> Self {
        FilterAgg { filter: filter.into(), sub: Vec::new() }
    }

    /// Adds a named sub-aggregation computed inside the bucket.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.sub.push((name.into(), agg.into()));
        self
    }

    /// Parses this aggregation's result object.
    pub fn parse(&self, raw: &ObjectValue) -> Result<SingleBucketResult, DeserializeError> {
        parse_single_bucket(raw, "filter aggregation")
    }
}

impl From<&FilterAgg> for AggExpr {
    fn from(agg: &FilterAgg) -> Self {
        AggExpr::Filter(FilterAggBody { filter: agg.filter.clone(), sub: agg.sub.clone() })
    }
}

/// A single bucket over the elements of a nested field.
#[derive(Debug, Clone)]
pub struct NestedAgg {
    path: FieldRef,
    sub: Vec<(String, AggExpr)>,
}

impl NestedAgg {
    pub fn new(path: impl Into<FieldRef>) -> Self {
        NestedAgg { path: path.into(), sub: Vec::new() }
    }

    /// Adds a named sub-aggregation computed over the nested elements.
    pub fn aggregation(mut self, name: impl Into<String>, agg: impl Into<AggExpr>) -> Self {
        self.sub.push((name.into(), agg.into()));
        self
    }

    /// Parses this aggregation's result object.
    pub fn parse(&self, raw: &ObjectValue) -> Result<SingleBucketResult, DeserializeError> {
        parse_single_bucket(raw, "nested aggregation")
    }
}

impl From<&NestedAgg> for AggExpr {
    fn from(agg: &NestedAgg) -> Self {
        AggExpr::Nested(NestedAggBody { path: agg.path.clone(), sub: agg.sub.clone() })
    }
}

fn parse_single_bucket(raw: &ObjectValue, at: &str) -> Result<SingleBucketResult, DeserializeError> {
    let doc_count = raw
        .get("doc_count")
        .and_then(Value::as_i64)
        .ok_or_else(|| shape("a doc_count", at))?;
    Ok(SingleBucketResult { doc_count, raw: raw.clone() })
}

/// The parsed result of a single-bucket aggregation.
#[derive(Debug, Clone)]
pub struct SingleBucketResult {
    pub doc_count: i64,
    raw: ObjectValue,
}

impl SingleBucketResult {
    /// The raw result of a named sub-aggregation in this bucket.
    pub fn aggregation(&self, name: &str) -> Option<&ObjectValue> {
        self.raw.get(name).and_then(Value::as_object)
    }
}
