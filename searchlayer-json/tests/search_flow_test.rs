//! Search Flow Tests
//!
//! Drives the whole path an application takes: declare a schema, build a
//! query, compile it for a concrete engine version, render it as JSON, and
//! parse engine responses back into typed results.

use searchlayer_core::aggs::TermsAgg;
use searchlayer_core::compile::{Compiler, EngineVersion, Features};
use searchlayer_core::document::{Document, Field};
use searchlayer_core::error::{DeserializeError, QueryError};
use searchlayer_core::search::{
    CountResponse, ErrorBody, SearchQuery, SearchResponse, TotalRelation,
};
use searchlayer_core::ser::Serializer;
use searchlayer_core::types::{FloatType, KeywordType, TextType};
use searchlayer_core::value::Value;
use searchlayer_json::{JsonDeserializer, JsonSerializer};

struct Catalog {
    title: Field<TextType>,
    genre: Field<KeywordType>,
    rating: Field<FloatType>,
}

fn catalog() -> Catalog {
    let mut schema = Document::builder();
    let catalog = Catalog {
        title: schema.text("title"),
        genre: schema.keyword("genre"),
        rating: schema.float("rating"),
    };
    schema.finish();
    catalog
}

fn search_query(c: &Catalog) -> SearchQuery {
    SearchQuery::new()
        .query(c.title.matches("dune"))
        .filter(c.rating.gte(8.0))
        .aggregation("genres", &TermsAgg::new(&c.genre).size(10))
        .size(5)
        .track_total_hits(true)
}

#[test]
fn compiled_requests_render_to_stable_json() {
    let c = catalog();
    let compiled = Compiler::new(EngineVersion::new(7, 10, 2)).compile_search(&search_query(&c));
    let rendered = JsonSerializer::new().serialize_object(&compiled.body.unwrap()).unwrap();
    assert_eq!(
        rendered,
        concat!(
            r#"{"query":{"bool":{"must":[{"match":{"title":"dune"}}],"#,
            r#""filter":[{"range":{"rating":{"gte":8.0}}}]}},"#,
            r#""aggs":{"genres":{"terms":{"field":"genre","size":10}}},"#,
            r#""size":5,"track_total_hits":true}"#
        )
    );
}

#[test]
fn old_engines_get_the_same_query_without_new_fields() {
    let c = catalog();
    let compiled = Compiler::new(EngineVersion::new(6, 8, 23)).compile_search(&search_query(&c));
    let rendered = JsonSerializer::new().serialize_object(&compiled.body.unwrap()).unwrap();
    assert!(!rendered.contains("track_total_hits"));
    assert!(rendered.contains(r#""match":{"title":"dune"}"#));
}

fn modern_response() -> &'static str {
    r#"{
        "took": 12,
        "timed_out": false,
        "_shards": {"total": 5, "successful": 5, "skipped": 0, "failed": 0},
        "hits": {
            "total": {"value": 2041, "relation": "gte"},
            "max_score": 3.2,
            "hits": [
                {
                    "_index": "books",
                    "_id": "b-1",
                    "_score": 3.2,
                    "_source": {"title": "Dune", "genre": "sci-fi", "rating": 9.4},
                    "sort": [9.4, "b-1"],
                    "fields": {"shelf_code": ["978"]}
                },
                {"_index": "books", "_id": "b-2", "_score": null}
            ]
        },
        "aggregations": {
            "genres": {
                "doc_count_error_upper_bound": 0,
                "buckets": [
                    {"key": "sci-fi", "doc_count": 1204},
                    {"key": "fantasy", "doc_count": 837}
                ]
            }
        }
    }"#
}

#[test]
fn modern_responses_parse_with_structured_totals() {
    let c = catalog();
    let features = Features::for_version(EngineVersion::new(7, 10, 2));
    let response =
        SearchResponse::parse(&JsonDeserializer::new(), modern_response(), &features).unwrap();

    assert_eq!(response.took, 12);
    assert!(!response.timed_out);
    assert_eq!(response.shards.total, 5);
    assert_eq!(response.shards.skipped, Some(0));
    assert_eq!(response.total.value, 2041);
    assert_eq!(response.total.relation, TotalRelation::Gte);
    assert_eq!(response.max_score, Some(3.2));

    assert_eq!(response.hits.len(), 2);
    let first = &response.hits[0];
    assert_eq!(first.id.as_deref(), Some("b-1"));
    assert_eq!(first.score, Some(3.2));
    let source = first.source.as_ref().unwrap();
    assert_eq!(source.get("title"), Some(&Value::Str("Dune".into())));
    assert_eq!(first.sort.len(), 2);
    assert!(first.fields.contains_key("shelf_code"));
    // Null scores happen under custom sorts.
    assert_eq!(response.hits[1].score, None);

    let genres = TermsAgg::new(&c.genre).parse(response.aggregation("genres").unwrap()).unwrap();
    assert_eq!(genres.buckets.len(), 2);
    assert_eq!(genres.buckets[0].key, "sci-fi");
    assert_eq!(genres.buckets[0].doc_count, 1204);

    match response.aggregation("missing") {
        Err(QueryError::UnknownAggregation { name }) => assert_eq!(name, "missing"),
        other => panic!("expected UnknownAggregation, got {other:?}"),
    }
}

#[test]
fn legacy_responses_parse_with_bare_totals() {
    let raw = r#"{
        "took": 3,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "failed": 0},
        "hits": {"total": 17, "max_score": 1.0, "hits": []}
    }"#;
    let features = Features::for_version(EngineVersion::new(6, 8, 23));
    let response = SearchResponse::parse(&JsonDeserializer::new(), raw, &features).unwrap();
    assert_eq!(response.total.value, 17);
    assert_eq!(response.total.relation, TotalRelation::Eq);
    assert!(response.hits.is_empty());
    assert!(response.aggregations().is_empty());
}

#[test]
fn total_shapes_are_strict_per_version() {
    let modern_features = Features::for_version(EngineVersion::new(7, 10, 2));
    let legacy_body = r#"{
        "took": 3,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "failed": 0},
        "hits": {"total": 17, "hits": []}
    }"#;
    // A modern parser handed a legacy body fails loudly instead of guessing.
    assert!(SearchResponse::parse(&JsonDeserializer::new(), legacy_body, &modern_features).is_err());
}

#[test]
fn unknown_total_relations_are_rejected() {
    let raw = r#"{
        "took": 3,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "failed": 0},
        "hits": {"total": {"value": 1, "relation": "approximately"}, "hits": []}
    }"#;
    let features = Features::for_version(EngineVersion::new(7, 10, 2));
    match SearchResponse::parse(&JsonDeserializer::new(), raw, &features) {
        Err(DeserializeError::NoSuchVariant { value, .. }) => {
            assert!(value.contains("approximately"));
        }
        other => panic!("expected NoSuchVariant, got {other:?}"),
    }
}

#[test]
fn shard_failures_surface_in_the_stats() {
    let raw = r#"{
        "took": 9,
        "timed_out": true,
        "_shards": {
            "total": 2,
            "successful": 1,
            "failed": 1,
            "failures": [
                {
                    "shard": 1,
                    "index": "books",
                    "node": "n1",
                    "reason": {"type": "exception", "reason": "broken"}
                }
            ]
        },
        "hits": {"total": {"value": 0, "relation": "eq"}, "hits": []}
    }"#;
    let features = Features::for_version(EngineVersion::new(7, 10, 2));
    let response = SearchResponse::parse(&JsonDeserializer::new(), raw, &features).unwrap();
    assert!(response.timed_out);
    assert_eq!(response.shards.failures.len(), 1);
    let failure = &response.shards.failures[0];
    assert_eq!(failure.shard, Some(1));
    assert_eq!(failure.index.as_deref(), Some("books"));
    let reason = failure.reason.as_ref().unwrap();
    assert_eq!(reason.kind.as_deref(), Some("exception"));
    assert_eq!(reason.reason.as_deref(), Some("broken"));
}

#[test]
fn count_responses_parse() {
    let raw = r#"{"count": 412, "_shards": {"total": 5, "successful": 5, "failed": 0}}"#;
    let response = CountResponse::parse(&JsonDeserializer::new(), raw).unwrap();
    assert_eq!(response.count, 412);
    assert_eq!(response.shards.successful, 5);
}

#[test]
fn structured_error_bodies_parse_with_root_causes() {
    let raw = r#"{
        "status": 400,
        "error": {
            "type": "search_phase_execution_exception",
            "reason": "all shards failed",
            "root_cause": [
                {"type": "query_shard_exception", "reason": "no mapping for field"}
            ],
            "failed_shards": [
                {"shard": 0, "index": "books", "reason": {"type": "query_shard_exception"}}
            ]
        }
    }"#;
    match ErrorBody::parse(&JsonDeserializer::new(), raw).unwrap() {
        ErrorBody::Structured { status, error } => {
            assert_eq!(status, Some(400));
            assert_eq!(error.kind.as_deref(), Some("search_phase_execution_exception"));
            assert_eq!(error.root_causes.len(), 1);
            assert_eq!(
                error.root_causes[0].reason.as_deref(),
                Some("no mapping for field")
            );
            assert_eq!(error.failed_shards.len(), 1);
            assert_eq!(error.failed_shards[0].index.as_deref(), Some("books"));
        }
        other => panic!("expected Structured, got {other:?}"),
    }
}

#[test]
fn string_and_unparseable_error_bodies_fall_back_to_simple() {
    let bare = r#"{"error": "IndexMissingException[[books] missing]", "status": 404}"#;
    match ErrorBody::parse(&JsonDeserializer::new(), bare).unwrap() {
        ErrorBody::Simple(message) => assert!(message.contains("IndexMissingException")),
        other => panic!("expected Simple, got {other:?}"),
    }

    let garbage = "upstream proxy error";
    match ErrorBody::parse(&JsonDeserializer::new(), garbage).unwrap() {
        ErrorBody::Simple(message) => assert_eq!(message, garbage),
        other => panic!("expected Simple, got {other:?}"),
    }
}

#[test]
fn error_objects_without_an_error_key_are_a_shape_error() {
    let raw = r#"{"status": 500}"#;
    match ErrorBody::parse(&JsonDeserializer::new(), raw) {
        Err(DeserializeError::ResponseShape { expected, .. }) => {
            assert_eq!(expected, "an error object");
        }
        other => panic!("expected ResponseShape, got {other:?}"),
    }
}

#[test]
fn bulk_payloads_render_as_ndjson() {
    use searchlayer_core::bulk::{BulkAction, IndexAction};
    use searchlayer_core::ser;

    let source = ser::object(|w| {
        w.field_str("title", "Dune");
    });
    let actions = vec![BulkAction::Index(IndexAction::new("books", source).id("b-1"))];

    let new = Compiler::new(EngineVersion::new(7, 10, 2))
        .compile_bulk(&actions, &JsonSerializer::new())
        .unwrap();
    assert_eq!(new, "{\"index\":{\"_index\":\"books\",\"_id\":\"b-1\"}}\n{\"title\":\"Dune\"}\n");

    let old = Compiler::new(EngineVersion::new(6, 8, 23))
        .compile_bulk(&actions, &JsonSerializer::new())
        .unwrap();
    assert_eq!(
        old,
        "{\"index\":{\"_index\":\"books\",\"_type\":\"_doc\",\"_id\":\"b-1\"}}\n{\"title\":\"Dune\"}\n"
    );
}
