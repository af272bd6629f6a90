//! Typed Source Tests
//!
//! Application structs cross the neutral tree through `serde`; these tests
//! cover both directions and the error shapes when they do not line up.

use serde::{Deserialize, Serialize};

use searchlayer_core::error::{DeserializeError, SerializeError};
use searchlayer_core::ser;
use searchlayer_core::value::Value;
use searchlayer_json::source::{object_from, object_into};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Book {
    title: String,
    year: i32,
    #[serde(default)]
    tags: Vec<String>,
    rating: Option<f64>,
}

fn sample_book() -> Book {
    Book {
        title: "Dune".to_string(),
        year: 1965,
        tags: vec!["sci-fi".to_string()],
        rating: Some(9.25),
    }
}

#[test]
fn structs_convert_to_object_trees() {
    let tree = object_from(&sample_book()).unwrap();
    assert_eq!(tree.get("title"), Some(&Value::Str("Dune".into())));
    assert_eq!(tree.get("year"), Some(&Value::I64(1965)));
    let tags = tree.get("tags").and_then(Value::as_array).unwrap();
    assert_eq!(tags.get(0), Some(&Value::Str("sci-fi".into())));
}

#[test]
fn object_trees_convert_back_to_structs() {
    let tree = object_from(&sample_book()).unwrap();
    let book: Book = object_into(&tree).unwrap();
    assert_eq!(book, sample_book());
}

#[test]
fn hand_built_trees_deserialize_with_defaults() {
    let tree = ser::object(|w| {
        w.field_str("title", "Messiah").field_i64("year", 1969).field_null("rating");
    });
    let book: Book = object_into(&tree).unwrap();
    assert_eq!(book.title, "Messiah");
    assert!(book.tags.is_empty());
    assert_eq!(book.rating, None);
}

#[test]
fn non_object_sources_are_refused() {
    match object_from(&42) {
        Err(SerializeError::Conversion(reason)) => {
            assert!(reason.contains("object-shaped"), "unexpected reason: {reason}");
        }
        other => panic!("expected Conversion, got {other:?}"),
    }
    assert!(object_from(&vec![1, 2, 3]).is_err());
}

#[test]
fn mismatched_trees_name_the_target_type() {
    let tree = ser::object(|w| {
        w.field_str("title", "Dune").field_str("year", "not a year");
    });
    match object_into::<Book>(&tree) {
        Err(DeserializeError::BadParse { type_name, value, .. }) => {
            assert!(type_name.ends_with("Book"), "unexpected type name: {type_name}");
            assert!(value.contains("not a year"));
        }
        other => panic!("expected BadParse, got {other:?}"),
    }
}

#[test]
fn nested_structs_pass_through() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Author {
        name: String,
    }
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        title: String,
        author: Author,
    }

    let entry = Entry {
        title: "Dune".to_string(),
        author: Author { name: "Frank Herbert".to_string() },
    };
    let tree = object_from(&entry).unwrap();
    let author = tree.get("author").and_then(Value::as_object).unwrap();
    assert_eq!(author.get("name"), Some(&Value::Str("Frank Herbert".into())));

    let back: Entry = object_into(&tree).unwrap();
    assert_eq!(back, entry);
}
