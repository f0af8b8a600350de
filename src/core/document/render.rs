//! Render a document tree back to source text.

use super::{Attribute, Decl, DeclKind, Document, Field, Value};

pub(super) fn document(doc: &Document, out: &mut String) {
    decls(&doc.decls, out);
    out.push_str(&doc.trailing);
}

fn decls(decls: &[Decl], out: &mut String) {
    for decl in decls {
        out.push_str(&decl.leading);
        match &decl.kind {
            DeclKind::Package(raw) => out.push_str(raw),
            DeclKind::Attribute(a) => attribute(a, out),
            DeclKind::Field(f) => field(f, out),
        }
    }
}

fn field(f: &Field, out: &mut String) {
    out.push_str(&f.label.raw);
    out.push_str(&f.colon);
    value(&f.value, out);
    for a in &f.attrs {
        out.push_str(&a.leading);
        attribute(&a.attr, out);
    }
}

fn attribute(a: &Attribute, out: &mut String) {
    out.push('@');
    out.push_str(&a.name);
    out.push('(');
    out.push_str(&a.body);
    out.push(')');
}

fn value(v: &Value, out: &mut String) {
    match v {
        Value::Scalar(s) => out.push_str(&s.raw),
        Value::Struct(s) => {
            if s.braced {
                out.push('{');
            }
            decls(&s.decls, out);
            out.push_str(&s.closing);
            if s.braced {
                out.push('}');
            }
        }
        Value::List(l) => {
            out.push('[');
            for e in &l.elems {
                out.push_str(&e.leading);
                value(&e.value, out);
            }
            out.push_str(&l.closing);
            out.push(']');
        }
    }
}
