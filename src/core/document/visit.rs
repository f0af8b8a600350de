//! Path-carrying traversal of a document.
//!
//! The traversal driver passes each field its [`FieldPath`] from the root,
//! so no node needs a reference to its parent. Mutation goes through
//! [`VisitorMut`]: the visitor inspects a field and may return a replacement
//! value, which the driver installs before descending into it.

use super::{indent_of, Decl, DeclKind, Document, Field, Value};
use crate::core::path::FieldPath;
use crate::error::Result;

/// What the traversal knows about the field being visited.
#[derive(Debug)]
pub struct Visit<'a> {
    pub path: &'a FieldPath,
    pub field: &'a Field,
    /// Indentation of the line holding the field.
    pub indent: &'a str,
    /// The field is nested inside a list element.
    pub in_list: bool,
}

/// Visitor that may replace field values.
pub trait VisitorMut {
    /// Return `Some(value)` to replace the field's value.
    fn visit(&mut self, visit: &Visit<'_>) -> Result<Option<Value>>;
}

/// Visit every field in document order.
///
/// # Errors
///
/// Stops at and returns the first error produced by `f`.
pub fn walk<F>(doc: &Document, mut f: F) -> Result<()>
where
    F: FnMut(&Visit<'_>) -> Result<()>,
{
    walk_decls(&doc.decls, &FieldPath::root(), "", false, &mut f)
}

/// Visit every field in document order, installing replacement values.
///
/// # Errors
///
/// Stops at and returns the first error produced by the visitor.
pub fn walk_mut<V: VisitorMut>(doc: &mut Document, visitor: &mut V) -> Result<()> {
    walk_decls_mut(&mut doc.decls, &FieldPath::root(), "", false, visitor)
}

fn walk_decls<F>(
    decls: &[Decl],
    parent: &FieldPath,
    indent: &str,
    in_list: bool,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&Visit<'_>) -> Result<()>,
{
    for decl in decls {
        let DeclKind::Field(field) = &decl.kind else {
            continue;
        };
        let path = parent.child(&field.label.name);
        let indent = indent_of(&decl.leading, indent);
        f(&Visit {
            path: &path,
            field,
            indent: &indent,
            in_list,
        })?;
        walk_value(&field.value, &path, &indent, in_list, f)?;
    }
    Ok(())
}

fn walk_value<F>(
    value: &Value,
    path: &FieldPath,
    indent: &str,
    in_list: bool,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&Visit<'_>) -> Result<()>,
{
    match value {
        Value::Scalar(_) => Ok(()),
        Value::Struct(s) => walk_decls(&s.decls, path, indent, in_list, f),
        Value::List(l) => {
            for elem in &l.elems {
                let indent = indent_of(&elem.leading, indent);
                walk_value(&elem.value, path, &indent, true, f)?;
            }
            Ok(())
        }
    }
}

fn walk_decls_mut<V: VisitorMut>(
    decls: &mut [Decl],
    parent: &FieldPath,
    indent: &str,
    in_list: bool,
    visitor: &mut V,
) -> Result<()> {
    for decl in decls {
        let indent = indent_of(&decl.leading, indent);
        let DeclKind::Field(field) = &mut decl.kind else {
            continue;
        };
        let path = parent.child(&field.label.name);
        let replacement = visitor.visit(&Visit {
            path: &path,
            field,
            indent: &indent,
            in_list,
        })?;
        if let Some(value) = replacement {
            field.value = value;
        }
        walk_value_mut(&mut field.value, &path, &indent, in_list, visitor)?;
    }
    Ok(())
}

fn walk_value_mut<V: VisitorMut>(
    value: &mut Value,
    path: &FieldPath,
    indent: &str,
    in_list: bool,
    visitor: &mut V,
) -> Result<()> {
    match value {
        Value::Scalar(_) => Ok(()),
        Value::Struct(s) => walk_decls_mut(&mut s.decls, path, indent, in_list, visitor),
        Value::List(l) => {
            for elem in &mut l.elems {
                let indent = indent_of(&elem.leading, indent);
                walk_value_mut(&mut elem.value, path, &indent, true, visitor)?;
            }
            Ok(())
        }
    }
}
