//! JSON Backend Tests
//!
//! Round trips between neutral trees and JSON wire text, key-order
//! preservation, and the serializer's refusal of numbers JSON cannot carry.

use searchlayer_core::de::{Deserializer, NumberMode, ObjectCtx};
use searchlayer_core::error::{DeserializeError, SerializeError};
use searchlayer_core::ser::{self, Serializer};
use searchlayer_core::value::Value;
use searchlayer_json::{JsonDeserializer, JsonSerializer};

#[test]
fn objects_render_as_compact_json() {
    let body = ser::object(|w| {
        w.field_str("title", "Dune")
            .field_i64("year", 1965)
            .field_f64("rating", 9.25)
            .field_bool("read", true)
            .field_null("notes")
            .array("tags", |tags| {
                tags.push_str("sci-fi");
            });
    });
    let rendered = JsonSerializer::new().serialize_object(&body).unwrap();
    assert_eq!(
        rendered,
        r#"{"title":"Dune","year":1965,"rating":9.25,"read":true,"notes":null,"tags":["sci-fi"]}"#
    );
}

#[test]
fn key_order_survives_a_round_trip() {
    let body = ser::object(|w| {
        w.field_i64("zulu", 1).field_i64("alpha", 2).field_i64("mike", 3);
    });
    let rendered = JsonSerializer::new().serialize_object(&body).unwrap();
    let parsed = JsonDeserializer::new().parse_object(&rendered).unwrap();
    let keys: Vec<&str> = parsed.keys().collect();
    assert_eq!(keys, ["zulu", "alpha", "mike"]);
}

#[test]
fn pretty_output_is_indented_but_equivalent() {
    let body = ser::object(|w| {
        w.field_str("title", "Dune");
    });
    let pretty = JsonSerializer::pretty().serialize_object(&body).unwrap();
    assert!(pretty.contains('\n'));
    let reparsed = JsonDeserializer::new().parse_object(&pretty).unwrap();
    assert_eq!(reparsed, body);
}

#[test]
fn non_finite_numbers_are_refused() {
    let body = ser::object(|w| {
        w.field_f64("score", f64::NAN);
    });
    match JsonSerializer::new().serialize_object(&body) {
        Err(SerializeError::NonFiniteNumber(x)) => assert!(x.is_nan()),
        other => panic!("expected NonFiniteNumber, got {other:?}"),
    }

    let body = ser::object(|w| {
        w.array("scores", |scores| {
            scores.push_f64(f64::INFINITY);
        });
    });
    assert!(JsonSerializer::new().serialize_object(&body).is_err());
}

#[test]
fn parsing_distinguishes_number_kinds() {
    assert_eq!(JsonDeserializer::new().number_mode(), NumberMode::Distinct);

    let parsed = JsonDeserializer::new()
        .parse_object(r#"{"count": 3, "ratio": 3.0, "big": 1e300}"#)
        .unwrap();
    assert_eq!(parsed.get("count"), Some(&Value::I64(3)));
    // JSON's `3.0` is a float literal and stays one in distinct mode.
    assert_eq!(parsed.get("ratio"), Some(&Value::F64(3.0)));
    assert_eq!(parsed.get("big"), Some(&Value::F64(1e300)));
}

#[test]
fn malformed_payloads_fail_with_a_parse_error() {
    match JsonDeserializer::new().parse_object("{not json") {
        Err(DeserializeError::Parse(_)) => {}
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn non_object_top_levels_are_rejected() {
    match JsonDeserializer::new().parse_object("[1, 2, 3]") {
        Err(DeserializeError::UnexpectedKind { expected, actual }) => {
            assert_eq!(expected, "an object");
            assert_eq!(actual, "[1, 2, 3] (array)");
        }
        other => panic!("expected UnexpectedKind, got {other:?}"),
    }
    assert!(JsonDeserializer::new().parse_object("42").is_err());
}

#[test]
fn nested_structures_round_trip_exactly() {
    let body = ser::object(|w| {
        w.obj("hits", |hits| {
            hits.field_i64("total", 2).array("hits", |arr| {
                arr.obj(|h| {
                    h.field_str("_id", "a").field_f64("_score", 1.0);
                })
                .obj(|h| {
                    h.field_str("_id", "b").field_null("_score");
                });
            });
        });
    });
    let rendered = JsonSerializer::new().serialize_object(&body).unwrap();
    let parsed = JsonDeserializer::new().parse_object(&rendered).unwrap();
    assert_eq!(parsed, body);

    let root = ObjectCtx::new(&parsed);
    let hits = root.obj("hits").unwrap();
    assert_eq!(hits.long("total").unwrap(), 2);
    let mut iter = hits.array("hits").unwrap().iter();
    assert!(iter.advance());
    assert_eq!(iter.obj().unwrap().string("_id").unwrap(), "a");
}

#[test]
fn escaped_strings_survive_the_wire() {
    let body = ser::object(|w| {
        w.field_str("title", "a \"quoted\" name\nwith newline and \u{1F4D6}");
    });
    let rendered = JsonSerializer::new().serialize_object(&body).unwrap();
    let parsed = JsonDeserializer::new().parse_object(&rendered).unwrap();
    assert_eq!(parsed, body);
}

#[test]
fn large_integers_keep_full_precision() {
    let body = ser::object(|w| {
        w.field_i64("id", i64::MAX);
    });
    let rendered = JsonSerializer::new().serialize_object(&body).unwrap();
    let parsed = JsonDeserializer::new().parse_object(&rendered).unwrap();
    assert_eq!(parsed.get("id"), Some(&Value::I64(i64::MAX)));
}
