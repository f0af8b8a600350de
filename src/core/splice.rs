//! Weave envelope values back into the document tree.
//!
//! For every selected path the value produced by the envelope codec at that
//! same path replaces the field's value. Structs and lists whose shape did
//! not change are merged leaf by leaf so that comments, attributes and
//! layout inside them survive; scalars that are already equal keep their
//! source text, and replaced strings take their spelling from the
//! [`Literals`] handed back by the codec when one is recorded.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::core::document::visit::{self, Visit, VisitorMut};
use crate::core::document::{indent_of, Decl, DeclKind, Document, Literals, Scalar, Value};
use crate::core::path::{push_pointer, FieldPath, Selector};
use crate::error::{Result, SpliceError};

/// Replace the value of every selected field with the value at the same
/// path in `source`.
///
/// Returns the number of fields spliced.
///
/// # Errors
///
/// Returns `SpliceError::MissingInEnvelope` if a selected path has no value
/// in `source`, and `SpliceError::MissingInDocument` if a selected path
/// names no field of the document. Nothing is skipped silently.
pub fn splice(
    doc: &mut Document,
    source: &serde_json::Value,
    literals: &Literals,
    selector: &Selector,
) -> Result<usize> {
    let mut splicer = Splicer {
        source,
        literals,
        selector,
        visited: BTreeSet::new(),
    };
    visit::walk_mut(doc, &mut splicer)?;

    if let Some(missing) = selector.paths().find(|p| !splicer.visited.contains(*p)) {
        return Err(SpliceError::MissingInDocument(missing.to_string()).into());
    }
    debug!(fields = splicer.visited.len(), "spliced values");
    Ok(splicer.visited.len())
}

struct Splicer<'a> {
    source: &'a serde_json::Value,
    literals: &'a Literals,
    selector: &'a Selector,
    visited: BTreeSet<FieldPath>,
}

impl VisitorMut for Splicer<'_> {
    fn visit(&mut self, visit: &Visit<'_>) -> Result<Option<Value>> {
        if !self.selector.contains(visit.path) {
            return Ok(None);
        }
        let replacement = visit
            .path
            .lookup(self.source)
            .ok_or_else(|| SpliceError::MissingInEnvelope(visit.path.to_string()))?;
        trace!(path = %visit.path, "splicing value");
        self.visited.insert(visit.path.clone());
        let mut pointer = visit.path.pointer();
        Ok(Some(merge(
            &visit.field.value,
            replacement,
            visit.indent,
            &mut pointer,
            self.literals,
        )))
    }
}

/// `current` with its data replaced by `json`, keeping as much of its
/// formatting as the shapes allow. `pointer` locates `json` in the source.
fn merge(
    current: &Value,
    json: &serde_json::Value,
    indent: &str,
    pointer: &mut String,
    literals: &Literals,
) -> Value {
    match (current, json) {
        (Value::Scalar(s), _) if s.value == *json => current.clone(),
        (Value::Struct(s), serde_json::Value::Object(map)) if same_labels(&s.decls, map) => {
            let mut merged = s.clone();
            for decl in &mut merged.decls {
                let field_indent = indent_of(&decl.leading, indent);
                if let DeclKind::Field(field) = &mut decl.kind {
                    if let Some(v) = map.get(&field.label.name) {
                        let len = pointer.len();
                        push_pointer(pointer, &field.label.name);
                        field.value = merge(&field.value, v, &field_indent, pointer, literals);
                        pointer.truncate(len);
                    }
                }
            }
            Value::Struct(merged)
        }
        (Value::List(l), serde_json::Value::Array(items)) if l.elems.len() == items.len() => {
            let mut merged = l.clone();
            for (i, (elem, v)) in merged.elems.iter_mut().zip(items).enumerate() {
                let elem_indent = indent_of(&elem.leading, indent);
                let len = pointer.len();
                push_pointer(pointer, &i.to_string());
                elem.value = merge(&elem.value, v, &elem_indent, pointer, literals);
                pointer.truncate(len);
            }
            Value::List(merged)
        }
        (_, serde_json::Value::String(text)) => match literals.get(pointer.as_str()) {
            Some(raw) => Value::Scalar(Scalar {
                raw: raw.clone(),
                value: serde_json::Value::String(text.clone()),
            }),
            None => Value::from_json(json, indent),
        },
        _ => Value::from_json(json, indent),
    }
}

fn same_labels(decls: &[Decl], map: &serde_json::Map<String, serde_json::Value>) -> bool {
    let labels: Vec<&str> = decls
        .iter()
        .filter_map(|d| match &d.kind {
            DeclKind::Field(f) => Some(f.label.name.as_str()),
            _ => None,
        })
        .collect();
    labels.len() == map.len() && labels.iter().all(|l| map.contains_key(*l))
}
