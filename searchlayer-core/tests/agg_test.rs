//! Aggregation Tests
//!
//! Covers both directions: rendering aggregation definitions into request
//! bodies, and parsing engine results back through the same definitions into
//! typed buckets.

use searchlayer_core::aggs::{
    AvgAgg, DateHistogramAgg, DateInterval, FilterAgg, HistogramAgg, MaxAgg, NestedAgg, TermsAgg,
    ValueCountAgg,
};
use searchlayer_core::compile::{Compiler, EngineVersion};
use searchlayer_core::document::{Document, Field};
use searchlayer_core::error::DeserializeError;
use searchlayer_core::search::SearchQuery;
use searchlayer_core::ser;
use searchlayer_core::types::{DateTimeType, FloatType, KeywordType};
use searchlayer_core::value::{ObjectValue, Value};

struct Catalog {
    genre: Field<KeywordType>,
    rating: Field<FloatType>,
    published: Field<DateTimeType>,
}

fn catalog() -> Catalog {
    let mut schema = Document::builder();
    let catalog = Catalog {
        genre: schema.keyword("genre"),
        rating: schema.float("rating"),
        published: schema.date("published"),
    };
    schema.finish();
    catalog
}

fn rendered_aggs(query: &SearchQuery) -> ObjectValue {
    let compiled = Compiler::new(EngineVersion::new(7, 10, 2)).compile_search(query);
    compiled
        .body
        .unwrap()
        .get("aggs")
        .and_then(Value::as_object)
        .cloned()
        .expect("aggs section")
}

#[test]
fn terms_definitions_render_with_their_options() {
    let c = catalog();
    let query = SearchQuery::new().aggregation(
        "genres",
        &TermsAgg::new(&c.genre)
            .size(20)
            .missing("unknown".to_string())
            .aggregation("top_rating", &MaxAgg::new(&c.rating)),
    );

    let aggs = rendered_aggs(&query);
    let genres = aggs.get("genres").and_then(Value::as_object).unwrap();
    let terms = genres.get("terms").and_then(Value::as_object).unwrap();
    assert_eq!(terms.get("field"), Some(&Value::Str("genre".into())));
    assert_eq!(terms.get("size"), Some(&Value::I64(20)));
    assert_eq!(terms.get("missing"), Some(&Value::Str("unknown".into())));

    let sub = genres
        .get("aggs")
        .and_then(Value::as_object)
        .and_then(|a| a.get("top_rating"))
        .and_then(Value::as_object)
        .unwrap();
    let max = sub.get("max").and_then(Value::as_object).unwrap();
    assert_eq!(max.get("field"), Some(&Value::Str("rating".into())));
}

#[test]
fn histogram_definitions_render_both_interval_kinds() {
    let c = catalog();
    let query = SearchQuery::new()
        .aggregation("by_rating", &HistogramAgg::new(&c.rating, 0.5).min_doc_count(1))
        .aggregation(
            "by_month",
            &DateHistogramAgg::new(&c.published, DateInterval::calendar("month")),
        )
        .aggregation(
            "by_hour",
            &DateHistogramAgg::new(&c.published, DateInterval::fixed("1h")),
        );

    let aggs = rendered_aggs(&query);
    let histogram = aggs
        .get("by_rating")
        .and_then(Value::as_object)
        .and_then(|a| a.get("histogram"))
        .and_then(Value::as_object)
        .unwrap();
    assert_eq!(histogram.get("interval"), Some(&Value::F64(0.5)));
    assert_eq!(histogram.get("min_doc_count"), Some(&Value::I64(1)));

    let monthly = aggs
        .get("by_month")
        .and_then(Value::as_object)
        .and_then(|a| a.get("date_histogram"))
        .and_then(Value::as_object)
        .unwrap();
    assert_eq!(monthly.get("calendar_interval"), Some(&Value::Str("month".into())));

    let hourly = aggs
        .get("by_hour")
        .and_then(Value::as_object)
        .and_then(|a| a.get("date_histogram"))
        .and_then(Value::as_object)
        .unwrap();
    assert_eq!(hourly.get("fixed_interval"), Some(&Value::Str("1h".into())));
}

#[test]
fn filter_and_nested_definitions_wrap_their_subs() {
    let c = catalog();
    let query = SearchQuery::new().aggregation(
        "well_rated",
        &FilterAgg::new(c.rating.gte(8.0)).aggregation("genres", &TermsAgg::new(&c.genre)),
    );

    let aggs = rendered_aggs(&query);
    let well_rated = aggs.get("well_rated").and_then(Value::as_object).unwrap();
    let filter = well_rated.get("filter").and_then(Value::as_object).unwrap();
    assert!(filter.get("range").is_some());
    assert!(well_rated.get("aggs").is_some());

    let nested_query = SearchQuery::new()
        .aggregation("chapters", &NestedAgg::new("chapters"));
    let aggs = rendered_aggs(&nested_query);
    let nested = aggs
        .get("chapters")
        .and_then(Value::as_object)
        .and_then(|a| a.get("nested"))
        .and_then(Value::as_object)
        .unwrap();
    assert_eq!(nested.get("path"), Some(&Value::Str("chapters".into())));
}

#[test]
fn terms_results_parse_into_typed_buckets() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.field_i64("doc_count_error_upper_bound", 0).array("buckets", |buckets| {
            buckets
                .obj(|b| {
                    b.field_str("key", "sci-fi").field_i64("doc_count", 41).obj(
                        "top_rating",
                        |m| {
                            m.field_f64("value", 9.4);
                        },
                    );
                })
                .obj(|b| {
                    b.field_str("key", "fantasy").field_i64("doc_count", 17);
                });
        });
    });

    let definition = TermsAgg::new(&c.genre).aggregation("top_rating", &MaxAgg::new(&c.rating));
    let result = definition.parse(&raw).unwrap();
    assert_eq!(result.buckets.len(), 2);
    assert_eq!(result.buckets[0].key, "sci-fi");
    assert_eq!(result.buckets[0].doc_count, 41);

    // Sub-aggregation results hang off their bucket.
    let top = result.buckets[0].aggregation("top_rating").expect("sub result");
    let top = MaxAgg::new(&c.rating).parse(top);
    assert_eq!(top.value, Some(9.4));
    assert!(result.buckets[1].aggregation("top_rating").is_none());
}

#[test]
fn terms_keys_go_through_the_field_type() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.array("buckets", |buckets| {
            buckets.obj(|b| {
                // A numeric key under a keyword field still coerces.
                b.field_i64("key", 7).field_i64("doc_count", 3);
            });
        });
    });
    let result = TermsAgg::new(&c.genre).parse(&raw).unwrap();
    assert_eq!(result.buckets[0].key, "7");
}

#[test]
fn missing_buckets_are_a_fatal_shape_error() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.field_i64("doc_count", 3);
    });
    match TermsAgg::new(&c.genre).parse(&raw) {
        Err(DeserializeError::ResponseShape { expected, .. }) => {
            assert_eq!(expected, "a buckets array");
        }
        other => panic!("expected ResponseShape, got {other:?}"),
    }
}

#[test]
fn histogram_results_carry_numeric_keys() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.array("buckets", |buckets| {
            buckets
                .obj(|b| {
                    b.field_f64("key", 7.5).field_i64("doc_count", 12);
                })
                .obj(|b| {
                    b.field_i64("key", 8).field_i64("doc_count", 4);
                });
        });
    });
    let result = HistogramAgg::new(&c.rating, 0.5).parse(&raw).unwrap();
    assert_eq!(result.buckets[0].key, 7.5);
    // Integral keys widen.
    assert_eq!(result.buckets[1].key, 8.0);
}

#[test]
fn date_histogram_results_keep_epoch_keys_and_labels() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.array("buckets", |buckets| {
            buckets.obj(|b| {
                b.field_str("key_as_string", "2021-03-01T00:00:00.000Z")
                    .field_i64("key", 1614556800000)
                    .field_i64("doc_count", 9);
            });
        });
    });
    let result = DateHistogramAgg::new(&c.published, DateInterval::calendar("month"))
        .parse(&raw)
        .unwrap();
    assert_eq!(result.buckets[0].key, 1614556800000);
    assert_eq!(result.buckets[0].key_as_string.as_deref(), Some("2021-03-01T00:00:00.000Z"));
}

#[test]
fn single_value_metrics_tolerate_null_values() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.field_f64("value", 6.8);
    });
    let result = AvgAgg::new(&c.rating).parse(&raw);
    assert_eq!(result.value, Some(6.8));

    let empty = ser::object(|w| {
        w.field_null("value");
    });
    let result = AvgAgg::new(&c.rating).parse(&empty);
    assert_eq!(result.value, None);

    let labeled = ser::object(|w| {
        w.field_i64("value", 1614556800000).field_str("value_as_string", "2021-03-01T00:00:00Z");
    });
    let result = MaxAgg::new(&c.published).parse(&labeled);
    assert_eq!(result.value, Some(1614556800000.0));
    assert_eq!(result.value_as_string.as_deref(), Some("2021-03-01T00:00:00Z"));
}

#[test]
fn value_counts_require_their_value() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.field_i64("value", 128);
    });
    assert_eq!(ValueCountAgg::new(&c.genre).parse(&raw).unwrap().value, 128);

    let empty = ObjectValue::new();
    assert!(ValueCountAgg::new(&c.genre).parse(&empty).is_err());
}

#[test]
fn single_bucket_results_expose_their_subs() {
    let c = catalog();
    let raw = ser::object(|w| {
        w.field_i64("doc_count", 23).obj("genres", |g| {
            g.array("buckets", |buckets| {
                buckets.obj(|b| {
                    b.field_str("key", "sci-fi").field_i64("doc_count", 23);
                });
            });
        });
    });

    let definition =
        FilterAgg::new(c.rating.gte(8.0)).aggregation("genres", &TermsAgg::new(&c.genre));
    let result = definition.parse(&raw).unwrap();
    assert_eq!(result.doc_count, 23);

    let genres = result.aggregation("genres").expect("sub result");
    let genres = TermsAgg::new(&c.genre).parse(genres).unwrap();
    assert_eq!(genres.buckets[0].key, "sci-fi");

    let missing_count = ObjectValue::new();
    assert!(NestedAgg::new("chapters").parse(&missing_count).is_err());
}
