//! Wire Tree and Cursor Tests
//!
//! Builds neutral trees through the write-side closures and reads them back
//! through the cursor API, covering the strict and `_or_null` accessor
//! flavors and the single-pass iterator protocol.

use searchlayer_core::de::{AnyRef, ArrayCtx, ObjectCtx};
use searchlayer_core::error::DeserializeError;
use searchlayer_core::ser;
use searchlayer_core::value::{ObjectValue, Value};

fn sample_hit() -> ObjectValue {
    ser::object(|w| {
        w.field_str("_id", "doc-1")
            .field_f64("_score", 2.5)
            .obj("_source", |src| {
                src.field_str("title", "Dune").field_i64("year", 1965).field_bool("read", true);
            })
            .array("tags", |tags| {
                tags.push_str("sci-fi").push_str("classic");
            })
            .field_null("routing");
    })
}

#[test]
fn builders_produce_the_declared_shape() {
    let hit = sample_hit();
    assert_eq!(hit.len(), 5);
    // Insertion order is preserved.
    let keys: Vec<&str> = hit.keys().collect();
    assert_eq!(keys, ["_id", "_score", "_source", "tags", "routing"]);
    assert_eq!(hit.get("routing"), Some(&Value::Null));
}

#[test]
fn insert_replaces_in_place() {
    let mut obj = ObjectValue::new();
    obj.insert("a", 1i64);
    obj.insert("b", 2i64);
    obj.insert("a", 10i64);
    assert_eq!(obj.len(), 2);
    assert_eq!(obj.get("a"), Some(&Value::I64(10)));
    let keys: Vec<&str> = obj.keys().collect();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn strict_accessors_read_typed_values() {
    let hit = sample_hit();
    let root = ObjectCtx::new(&hit);
    assert_eq!(root.string("_id").unwrap(), "doc-1");
    assert_eq!(root.double("_score").unwrap(), 2.5);

    let source = root.obj("_source").unwrap();
    assert_eq!(source.string("title").unwrap(), "Dune");
    assert_eq!(source.long("year").unwrap(), 1965);
    assert_eq!(source.int("year").unwrap(), 1965);
    assert!(source.boolean("read").unwrap());

    let tags = root.array("tags").unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get(0), Some(&Value::Str("sci-fi".into())));
}

#[test]
fn strict_accessors_fail_with_named_errors() {
    let hit = sample_hit();
    let root = ObjectCtx::new(&hit);

    match root.long("missing") {
        Err(DeserializeError::MissingKey(key)) => assert_eq!(key, "missing"),
        other => panic!("expected MissingKey, got {other:?}"),
    }
    match root.long("_id") {
        Err(DeserializeError::UnexpectedKind { expected, actual }) => {
            assert_eq!(expected, "an integer");
            // The offending value is carried with its kind.
            assert_eq!(actual, r#""doc-1" (string)"#);
        }
        other => panic!("expected UnexpectedKind, got {other:?}"),
    }
    // Integral numbers widen to doubles but a float never narrows to a long.
    assert!(root.long("_score").is_err());
    match root.obj("tags") {
        Err(DeserializeError::UnexpectedKind { actual, .. }) => {
            assert_eq!(actual, r#"["sci-fi", "classic"] (array)"#);
        }
        other => panic!("expected UnexpectedKind, got {other:?}"),
    }
}

#[test]
fn int_accessor_checks_the_32_bit_range() {
    let obj = ser::object(|w| {
        w.field_i64("wide", i64::from(i32::MAX) + 1);
    });
    match ObjectCtx::new(&obj).int("wide") {
        Err(DeserializeError::OutOfRange { type_name, .. }) => assert_eq!(type_name, "int"),
        other => panic!("expected OutOfRange, got {other:?}"),
    }
}

#[test]
fn or_null_accessors_absorb_absent_null_and_mistyped() {
    let hit = sample_hit();
    let root = ObjectCtx::new(&hit);
    assert_eq!(root.string_or_null("missing"), None);
    assert_eq!(root.string_or_null("routing"), None);
    assert_eq!(root.string_or_null("_score"), None);
    assert_eq!(root.double_or_null("_score"), Some(2.5));
    assert!(root.obj_or_null("_source").is_some());
    assert!(root.any_or_null("routing").is_none());
}

#[test]
fn any_exposes_the_value_kind() {
    let hit = sample_hit();
    let root = ObjectCtx::new(&hit);
    match root.any("_score").unwrap() {
        AnyRef::F64(x) => assert_eq!(x, 2.5),
        other => panic!("expected F64, got {other:?}"),
    }
    match root.any("tags").unwrap() {
        AnyRef::Array(arr) => assert_eq!(arr.len(), 2),
        other => panic!("expected Array, got {other:?}"),
    }
    assert!(root.any("routing").is_err());
}

#[test]
fn object_iterator_walks_entries_in_order() {
    let hit = sample_hit();
    let source = ObjectCtx::new(&hit).obj("_source").unwrap();
    let mut iter = source.iter();
    let mut seen = Vec::new();
    while iter.advance() {
        seen.push(iter.key().to_string());
    }
    assert_eq!(seen, ["title", "year", "read"]);
}

#[test]
fn array_iterator_reads_typed_elements() {
    let hit = sample_hit();
    let tags = ObjectCtx::new(&hit).array("tags").unwrap();
    let mut iter = tags.iter();
    assert!(iter.advance());
    assert_eq!(iter.string().unwrap(), "sci-fi");
    assert!(iter.advance());
    assert_eq!(iter.string().unwrap(), "classic");
    assert!(!iter.advance());
}

#[test]
#[should_panic(expected = "read before advance()")]
fn object_iterator_panics_when_read_before_advance() {
    let hit = sample_hit();
    let source = ObjectCtx::new(&hit).obj("_source").unwrap();
    let iter = source.iter();
    let _ = iter.key();
}

#[test]
#[should_panic(expected = "read past the end")]
fn array_iterator_panics_when_read_past_the_end() {
    let hit = sample_hit();
    let tags = ObjectCtx::new(&hit).array("tags").unwrap();
    let mut iter = tags.iter();
    while iter.advance() {}
    let _ = iter.value();
}

#[test]
fn cursors_detach_into_owned_trees() {
    let hit = sample_hit();
    let root = ObjectCtx::new(&hit);
    let source = root.obj("_source").unwrap().to_object();
    assert_eq!(source.get("title"), Some(&Value::Str("Dune".into())));
    let tags = root.array("tags").unwrap().to_array();
    assert_eq!(tags.len(), 2);
}

#[test]
fn unified_numbers_make_integral_floats_readable_as_longs() {
    let obj = ser::object(|w| {
        w.field_f64("count", 3.0).field_f64("ratio", 0.5);
    });
    let unified = match Value::Object(obj).with_unified_numbers() {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other}"),
    };
    let root = ObjectCtx::new(&unified);
    assert_eq!(root.long("count").unwrap(), 3);
    assert!(root.long("ratio").is_err());
    assert_eq!(root.double("ratio").unwrap(), 0.5);
}

#[test]
fn array_cursor_over_a_standalone_array() {
    let arr = ser::array(|w| {
        w.push_i64(1).push_f64(2.5).push_null().obj(|o| {
            o.field_str("k", "v");
        });
    });
    let ctx = ArrayCtx::new(&arr);
    assert_eq!(ctx.len(), 4);
    let mut iter = ctx.iter();
    assert!(iter.advance());
    assert_eq!(iter.long().unwrap(), 1);
    assert!(iter.advance());
    assert_eq!(iter.double().unwrap(), 2.5);
    assert!(iter.advance());
    assert_eq!(iter.long_or_null(), None);
    assert!(iter.advance());
    assert_eq!(iter.obj().unwrap().string("k").unwrap(), "v");
    assert!(!iter.advance());
}
