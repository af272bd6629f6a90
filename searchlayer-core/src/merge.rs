//! Merging document schemas into a combined schema.
//!
//! Several logical documents often live in one physical index. Merging
//! combines their schemas into one: same-named fields must agree on type and
//! mapping parameters, sub-documents merge recursively, and anything that
//! cannot be reconciled is reported as a [`MergeError`] naming the exact
//! field, parameter, or option that disagrees.
//!
//! Merging prefers the first occurrence, so the result is deterministic in
//! the order the documents are given. Subtrees that are identical on both
//! sides are shared by reference with the source documents rather than
//! copied; field handles taken from a source document keep their identity in
//! the merged schema. Shared fields resolve their dot-paths through their
//! original parents, so keep the source documents around for as long as the
//! merged schema is in use.

use std::sync::Arc;

use tracing::debug;

use crate::document::{
    BoundField, Document, Dynamic, Parent, RuntimeBinding, SubDocumentBinding, SubDocumentKind,
    TemplateDef,
};
use crate::error::MergeError;
use crate::value::Value;

/// Merges document schemas into one, left to right.
///
/// An empty slice produces an empty schema; a single document produces a new
/// schema sharing all of its parts. The merged document starts with a fresh
/// dynamic-field cache.
///
/// # Errors
///
/// Returns the first conflict found: field type or parameter disagreements,
/// object-vs-nested mismatches, differing dynamic templates or runtime
/// fields, or differing document options.
pub fn merge_documents(documents: &[&Document]) -> Result<Document, MergeError> {
    debug!(count = documents.len(), "merging document schemas");
    let mut iter = documents.iter();
    let Some(first) = iter.next() else {
        return Ok(Document::builder().finish());
    };
    let mut merged = share_document(first);
    for document in iter {
        merged = merge_two(&merged, document)?;
    }
    Ok(merged)
}

/// A new document sharing every part of the source.
fn share_document(document: &Document) -> Document {
    Document::from_parts(
        document.root_fields().to_vec(),
        document.templates().to_vec(),
        document.runtime().to_vec(),
        document.meta().clone(),
        document.options().clone(),
    )
}

fn merge_two(first: &Document, second: &Document) -> Result<Document, MergeError> {
    check_options(first, second)?;
    let (roots, _) = merge_field_lists("", first.root_fields(), second.root_fields())?;
    let fields = roots
        .into_iter()
        .map(|merged| {
            if let Merged::Created(bound) = &merged {
                bound.attach(Parent::Root);
            }
            merged.into_arc()
        })
        .collect();
    let templates = merge_templates(first.templates(), second.templates())?;
    let runtime = merge_runtime(first.runtime(), second.runtime())?;
    Ok(Document::from_parts(
        fields,
        templates,
        runtime,
        first.meta().clone(),
        first.options().clone(),
    ))
}

/// The outcome of merging one field position.
///
/// `Shared` carries a field taken verbatim from one side; it keeps its
/// original parent and must not be re-attached. `Created` is a fresh node
/// whose parent is set by whoever places it.
enum Merged {
    Shared(Arc<BoundField>),
    Created(Arc<BoundField>),
}

impl Merged {
    fn arc(&self) -> &Arc<BoundField> {
        match self {
            Merged::Shared(bound) | Merged::Created(bound) => bound,
        }
    }

    fn into_arc(self) -> Arc<BoundField> {
        match self {
            Merged::Shared(bound) | Merged::Created(bound) => bound,
        }
    }

    fn is_created(&self) -> bool {
        matches!(self, Merged::Created(_))
    }
}

/// Merges two same-named fields at `path`.
fn merge_field(
    path: &str,
    left: &Arc<BoundField>,
    right: &Arc<BoundField>,
) -> Result<Merged, MergeError> {
    if Arc::ptr_eq(left, right) {
        return Ok(Merged::Shared(left.clone()));
    }
    let left_kind = left.sub_document().map(|b| b.kind);
    let right_kind = right.sub_document().map(|b| b.kind);
    if left_kind != right_kind {
        return Err(MergeError::SubDocumentKindConflict {
            field: path.to_string(),
            left: kind_label(left_kind),
            right: kind_label(right_kind),
        });
    }
    if !left.ftype().eq_type(right.ftype().as_ref()) {
        return Err(MergeError::TypeConflict {
            field: path.to_string(),
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
        });
    }
    if let Some((param, left_value, right_value)) = left.params().first_conflict(right.params()) {
        return Err(MergeError::ParamConflict {
            field: path.to_string(),
            param: param.to_string(),
            left: param_label(left_value),
            right: param_label(right_value),
        });
    }
    let (subs, subs_changed) = merge_field_lists(path, left.sub_fields(), right.sub_fields())?;
    let (children, children_changed) = match (left.sub_document(), right.sub_document()) {
        (Some(a), Some(b)) => {
            let (merged, changed) = merge_field_lists(path, &a.fields, &b.fields)?;
            (Some((a.kind, merged)), changed)
        }
        _ => (None, false),
    };
    if !subs_changed && !children_changed {
        return Ok(Merged::Shared(left.clone()));
    }

    let sub_fields = subs.iter().map(|m| m.arc().clone()).collect();
    let sub_document = children.as_ref().map(|(kind, merged)| SubDocumentBinding {
        kind: *kind,
        fields: merged.iter().map(|m| m.arc().clone()).collect(),
    });
    let bound = Arc::new(BoundField::with_parts(
        left.name(),
        left.ftype().clone(),
        left.params().clone(),
        sub_fields,
        sub_document,
    ));
    let created_children = subs
        .iter()
        .chain(children.iter().flat_map(|(_, merged)| merged.iter()));
    for child in created_children {
        if let Merged::Created(arc) = child {
            arc.attach(Parent::Field(Arc::downgrade(&bound)));
        }
    }
    Ok(Merged::Created(bound))
}

/// Merges two name-keyed field lists: left's fields in order, merged with
/// right's same-named fields, then right-only fields appended in their
/// order. The flag reports whether the result differs from the left list.
fn merge_field_lists(
    prefix: &str,
    left: &[Arc<BoundField>],
    right: &[Arc<BoundField>],
) -> Result<(Vec<Merged>, bool), MergeError> {
    let mut out = Vec::with_capacity(left.len());
    let mut changed = false;
    for field in left {
        match right.iter().find(|r| r.name() == field.name()) {
            Some(other) => {
                let path = child_path(prefix, field.name());
                let merged = merge_field(&path, field, other)?;
                changed |= merged.is_created();
                out.push(merged);
            }
            None => out.push(Merged::Shared(field.clone())),
        }
    }
    for field in right {
        if !left.iter().any(|l| l.name() == field.name()) {
            changed = true;
            out.push(Merged::Shared(field.clone()));
        }
    }
    Ok((out, changed))
}

fn merge_templates(
    first: &[TemplateDef],
    second: &[TemplateDef],
) -> Result<Vec<TemplateDef>, MergeError> {
    let mut out: Vec<TemplateDef> = first.to_vec();
    for template in second {
        match out.iter().find(|t| t.name == template.name) {
            Some(existing) => {
                if existing.pattern != template.pattern
                    || existing.match_mapping_type != template.match_mapping_type
                    || existing.probe_mapping() != template.probe_mapping()
                {
                    return Err(MergeError::TemplateConflict {
                        template: template.name.clone(),
                        left: Value::from(existing.definition_body()).to_string(),
                        right: Value::from(template.definition_body()).to_string(),
                    });
                }
            }
            None => out.push(template.clone()),
        }
    }
    Ok(out)
}

fn merge_runtime(
    first: &[RuntimeBinding],
    second: &[RuntimeBinding],
) -> Result<Vec<RuntimeBinding>, MergeError> {
    let mut out: Vec<RuntimeBinding> = first.to_vec();
    for binding in second {
        match out.iter().find(|b| b.field.name() == binding.field.name()) {
            Some(existing) => {
                let same_type = existing.field.ftype().eq_type(binding.field.ftype().as_ref());
                if !same_type || existing.script != binding.script {
                    return Err(MergeError::RuntimeFieldConflict {
                        field: binding.field.name().to_string(),
                        left: runtime_label(existing),
                        right: runtime_label(binding),
                    });
                }
            }
            None => out.push(binding.clone()),
        }
    }
    Ok(out)
}

fn check_options(first: &Document, second: &Document) -> Result<(), MergeError> {
    let conflict = |option: &str, left: String, right: String| MergeError::OptionConflict {
        option: option.to_string(),
        left,
        right,
    };
    if first.options().dynamic != second.options().dynamic {
        return Err(conflict(
            "dynamic",
            dynamic_label(first.options().dynamic),
            dynamic_label(second.options().dynamic),
        ));
    }
    let (a, b) = (first.meta(), second.meta());
    if a.routing.required != b.routing.required {
        return Err(conflict(
            "_routing.required",
            a.routing.required.to_string(),
            b.routing.required.to_string(),
        ));
    }
    if a.source.enabled != b.source.enabled {
        return Err(conflict(
            "_source.enabled",
            flag_label(a.source.enabled),
            flag_label(b.source.enabled),
        ));
    }
    if a.source.includes != b.source.includes {
        return Err(conflict(
            "_source.includes",
            format!("{:?}", a.source.includes),
            format!("{:?}", b.source.includes),
        ));
    }
    if a.source.excludes != b.source.excludes {
        return Err(conflict(
            "_source.excludes",
            format!("{:?}", a.source.excludes),
            format!("{:?}", b.source.excludes),
        ));
    }
    if a.size.enabled != b.size.enabled {
        return Err(conflict(
            "_size.enabled",
            a.size.enabled.to_string(),
            b.size.enabled.to_string(),
        ));
    }
    Ok(())
}

fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn kind_label(kind: Option<SubDocumentKind>) -> &'static str {
    match kind {
        Some(kind) => kind.as_str(),
        None => "a plain field",
    }
}

fn param_label(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "unset".to_string(),
    }
}

fn dynamic_label(dynamic: Option<Dynamic>) -> String {
    match dynamic {
        None => "unset".to_string(),
        Some(Dynamic::True) => "true".to_string(),
        Some(Dynamic::False) => "false".to_string(),
        Some(Dynamic::Strict) => "strict".to_string(),
    }
}

fn flag_label(flag: Option<bool>) -> String {
    match flag {
        None => "unset".to_string(),
        Some(flag) => flag.to_string(),
    }
}

fn runtime_label(binding: &RuntimeBinding) -> String {
    format!("{} via {:?}", binding.field.type_name(), binding.script.source())
}
