//! Schema Merge Tests
//!
//! Several logical documents sharing one physical index merge into a
//! combined schema. These tests cover structural sharing, the union of
//! disjoint fields, and every conflict class.

use searchlayer_core::document::{Document, Dynamic, MappingParams, Script, SubDocument};
use searchlayer_core::error::MergeError;
use searchlayer_core::merge::merge_documents;
use searchlayer_core::types::{IntType, KeywordType, TextType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn merging_nothing_yields_an_empty_schema() {
    let merged = merge_documents(&[]).unwrap();
    assert_eq!(merged.fields().count(), 0);
}

#[test]
fn a_single_document_shares_all_of_its_fields() {
    let mut schema = Document::builder();
    let title = schema.text("title");
    let doc = schema.finish();

    let merged = merge_documents(&[&doc]).unwrap();
    let field = merged.field("title").unwrap();
    assert!(field.ptr_eq(&title.erased()));
}

#[test]
fn identical_declarations_share_by_reference() {
    init_tracing();
    let mut first = Document::builder();
    let title = first.text("title");
    first.keyword("isbn");
    let first = first.finish();

    let mut second = Document::builder();
    second.text("title");
    second.keyword("isbn");
    let second = second.finish();

    let merged = merge_documents(&[&first, &second]).unwrap();
    // The first occurrence wins, so handles from the first document keep
    // their identity in the merged schema.
    assert!(merged.field("title").unwrap().ptr_eq(&title.erased()));
    assert_eq!(merged.fields().count(), 2);
}

#[test]
fn disjoint_fields_union_in_order() {
    let mut first = Document::builder();
    first.text("title");
    first.keyword("isbn");
    let first = first.finish();

    let mut second = Document::builder();
    second.keyword("isbn");
    second.int("pages");
    let second = second.finish();

    let merged = merge_documents(&[&first, &second]).unwrap();
    let names: Vec<String> = merged.fields().map(|f| f.name().to_string()).collect();
    assert_eq!(names, ["title", "isbn", "pages"]);
}

#[test]
fn sub_documents_merge_recursively() {
    let mut first = Document::builder();
    let left_author = first.object(
        "author",
        SubDocument::build(|scope| scope.text("name")),
    );
    let first = first.finish();

    let mut second = Document::builder();
    second.object(
        "author",
        SubDocument::build(|scope| (scope.text("name"), scope.keyword("email"))),
    );
    let second = second.finish();

    let merged = merge_documents(&[&first, &second]).unwrap();
    // The shared child keeps the first document's identity, the new child
    // comes over from the second.
    let name = merged.field("author.name").unwrap();
    assert!(name.ptr_eq(&left_author.fields().erased()));
    let email = merged.field("author.email").unwrap();
    assert_eq!(email.qualified_name(), "author.email");
    assert_eq!(email.type_name(), "keyword");
}

#[test]
fn conflicting_types_are_rejected_with_the_field_path() {
    let mut first = Document::builder();
    first.text("title");
    let first = first.finish();

    let mut second = Document::builder();
    second.keyword("title");
    let second = second.finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::TypeConflict { field, left, right }) => {
            assert_eq!(field, "title");
            assert_eq!(left, "text");
            assert_eq!(right, "keyword");
        }
        other => panic!("expected TypeConflict, got {other:?}"),
    }
}

#[test]
fn conflicting_nested_types_name_the_full_path() {
    let mut first = Document::builder();
    first.object("author", SubDocument::build(|scope| scope.int("age")));
    let first = first.finish();

    let mut second = Document::builder();
    second.object("author", SubDocument::build(|scope| scope.keyword("age")));
    let second = second.finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::TypeConflict { field, .. }) => assert_eq!(field, "author.age"),
        other => panic!("expected TypeConflict, got {other:?}"),
    }
}

#[test]
fn conflicting_mapping_parameters_are_rejected() {
    let mut first = Document::builder();
    first.field_with("title", TextType, MappingParams::new().analyzer("english"));
    let first = first.finish();

    let mut second = Document::builder();
    second.field_with("title", TextType, MappingParams::new().analyzer("german"));
    let second = second.finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::ParamConflict { field, param, .. }) => {
            assert_eq!(field, "title");
            assert_eq!(param, "analyzer");
        }
        other => panic!("expected ParamConflict, got {other:?}"),
    }
}

#[test]
fn object_versus_nested_is_rejected() {
    let mut first = Document::builder();
    first.object("tags", SubDocument::build(|scope| scope.keyword("value")));
    let first = first.finish();

    let mut second = Document::builder();
    second.nested("tags", SubDocument::build(|scope| scope.keyword("value")));
    let second = second.finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::SubDocumentKindConflict { field, left, right }) => {
            assert_eq!(field, "tags");
            assert_eq!(left, "object");
            assert_eq!(right, "nested");
        }
        other => panic!("expected SubDocumentKindConflict, got {other:?}"),
    }
}

#[test]
fn conflicting_document_options_are_rejected() {
    let mut first = Document::builder();
    first.dynamic(Dynamic::Strict);
    let first = first.finish();

    let mut second = Document::builder();
    second.dynamic(Dynamic::True);
    let second = second.finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::OptionConflict { option, .. }) => assert_eq!(option, "dynamic"),
        other => panic!("expected OptionConflict, got {other:?}"),
    }
}

#[test]
fn conflicting_routing_requirements_are_rejected() {
    let mut first = Document::builder();
    first.routing_required(true);
    let first = first.finish();
    let second = Document::builder().finish();

    match merge_documents(&[&first, &second]) {
        Err(MergeError::OptionConflict { option, .. }) => assert_eq!(option, "_routing.required"),
        other => panic!("expected OptionConflict, got {other:?}"),
    }
}

#[test]
fn same_templates_merge_and_different_ones_conflict() {
    let mut first = Document::builder();
    first.dynamic_template("labels", "label_*", |_| KeywordType);
    let first = first.finish();

    let mut same = Document::builder();
    same.dynamic_template("labels", "label_*", |_| KeywordType);
    let same = same.finish();

    let merged = merge_documents(&[&first, &same]).unwrap();
    assert!(merged.dynamic_field("label_color").is_some());

    let mut different = Document::builder();
    different.dynamic_template("labels", "label_*", |_| IntType);
    let different = different.finish();

    match merge_documents(&[&first, &different]) {
        Err(MergeError::TemplateConflict { template, .. }) => assert_eq!(template, "labels"),
        other => panic!("expected TemplateConflict, got {other:?}"),
    }
}

#[test]
fn same_runtime_fields_merge_and_different_scripts_conflict() {
    let script = || Script::new("emit(doc['isbn'].value)");

    let mut first = Document::builder();
    first.runtime_field("shelf", KeywordType, script());
    let first = first.finish();

    let mut same = Document::builder();
    same.runtime_field("shelf", KeywordType, script());
    let same = same.finish();

    let merged = merge_documents(&[&first, &same]).unwrap();
    assert!(merged.field("shelf").is_some());

    let mut different = Document::builder();
    different.runtime_field("shelf", KeywordType, Script::new("emit('other')"));
    let different = different.finish();

    match merge_documents(&[&first, &different]) {
        Err(MergeError::RuntimeFieldConflict { field, .. }) => assert_eq!(field, "shelf"),
        other => panic!("expected RuntimeFieldConflict, got {other:?}"),
    }
}

#[test]
fn three_way_merge_is_left_to_right() {
    let mut a = Document::builder();
    a.text("title");
    let a = a.finish();
    let mut b = Document::builder();
    b.keyword("isbn");
    let b = b.finish();
    let mut c = Document::builder();
    c.int("pages");
    c.text("title");
    let c = c.finish();

    let merged = merge_documents(&[&a, &b, &c]).unwrap();
    let names: Vec<String> = merged.fields().map(|f| f.name().to_string()).collect();
    assert_eq!(names, ["title", "isbn", "pages"]);
}
