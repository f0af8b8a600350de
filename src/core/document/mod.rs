//! Lossless model of a CUE document.
//!
//! The parser keeps every byte of whitespace and comments as `leading`
//! trivia on the node that follows it, so rendering an unmodified tree
//! reproduces the source exactly. Only nodes that are replaced get a fresh,
//! canonical rendering.
//!
//! Supported input is the concrete-data subset of CUE: fields, structs,
//! lists, strings, numbers, booleans, null, comments, attributes and an
//! optional package clause.

mod parser;
mod render;
pub mod visit;

use std::collections::BTreeMap;

use serde_json::{Map, Number};

use crate::core::path::push_pointer;
use crate::error::Result;

/// Source spelling of string literals whose text differs from the canonical
/// JSON encoding of their value, keyed by JSON pointer (`/db/key`, `/l/0`).
pub type Literals = BTreeMap<String, String>;

/// A parsed document: top-level declarations plus trailing trivia.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub decls: Vec<Decl>,
    /// Whitespace and comments after the last declaration.
    pub trailing: String,
}

/// A declaration with the trivia that precedes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub leading: String,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// `package name`, kept verbatim.
    Package(String),
    /// A declaration-level attribute such as `@extern(x)`.
    Attribute(Attribute),
    Field(Field),
}

/// `label: value @attr(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: Label,
    /// Raw text between the label and the value, including the colon.
    pub colon: String,
    pub value: Value,
    pub attrs: Vec<FieldAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Decoded label name.
    pub name: String,
    /// Source text (identifier or quoted string).
    pub raw: String,
}

/// An attribute attached to a field together with the whitespace before it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAttribute {
    pub leading: String,
    pub attr: Attribute,
}

/// `@name(body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// Raw text between the parentheses.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Struct(StructLit),
    List(ListLit),
}

/// A string, number, boolean or null literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub raw: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructLit {
    /// `false` for the shorthand form `a: b: 1`.
    pub braced: bool,
    pub decls: Vec<Decl>,
    /// Trivia before the closing brace.
    pub closing: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLit {
    pub elems: Vec<Element>,
    /// Trivia before the closing bracket.
    pub closing: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub leading: String,
    pub value: Value,
}

impl Document {
    /// Parse document source text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` on malformed or unsupported input.
    pub fn parse(src: &str) -> Result<Self> {
        Ok(parser::Parser::new(src).document()?)
    }

    /// Render the document back to source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render::document(self, &mut out);
        out
    }

    /// Top-level field with the given label.
    pub fn field(&self, label: &str) -> Option<&Field> {
        fields(&self.decls).find(|f| f.label.name == label)
    }

    /// Plain-data view of the document as a JSON object, in document order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(decls_to_json(&self.decls))
    }

    /// String literals that `to_json` alone could not reproduce.
    pub fn literals(&self) -> Literals {
        let mut out = Literals::new();
        decls_literals(&self.decls, &mut String::new(), &mut out);
        out
    }
}

impl Field {
    /// Create a field with canonical formatting.
    pub fn new(label: &str, value: Value) -> Self {
        Self {
            label: Label::new(label),
            colon: ": ".to_string(),
            value,
            attrs: Vec::new(),
        }
    }
}

impl Label {
    /// Bare identifier when possible, quoted string otherwise.
    pub fn new(name: &str) -> Self {
        let raw = if is_identifier(name) {
            name.to_string()
        } else {
            json_string(name)
        };
        Self {
            name: name.to_string(),
            raw,
        }
    }
}

impl Value {
    /// Build a freshly formatted value from plain data.
    ///
    /// `indent` is the indentation of the line holding the owning field;
    /// nested struct fields are indented one tab deeper.
    pub fn from_json(json: &serde_json::Value, indent: &str) -> Self {
        match json {
            serde_json::Value::Object(map) if !map.is_empty() => {
                let inner = format!("{indent}\t");
                let decls = map
                    .iter()
                    .map(|(k, v)| Decl {
                        leading: format!("\n{inner}"),
                        kind: DeclKind::Field(Field::new(k, Value::from_json(v, &inner))),
                    })
                    .collect();
                Value::Struct(StructLit {
                    braced: true,
                    decls,
                    closing: format!("\n{indent}"),
                })
            }
            serde_json::Value::Object(_) => Value::Struct(StructLit {
                braced: true,
                decls: Vec::new(),
                closing: String::new(),
            }),
            serde_json::Value::Array(items) => Value::List(ListLit {
                elems: items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Element {
                        leading: if i == 0 { String::new() } else { ", ".to_string() },
                        value: Value::from_json(v, indent),
                    })
                    .collect(),
                closing: String::new(),
            }),
            scalar => Value::Scalar(Scalar::from_json(scalar)),
        }
    }

    /// Plain-data view of this value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Scalar(s) => s.value.clone(),
            Value::Struct(s) => serde_json::Value::Object(decls_to_json(&s.decls)),
            Value::List(l) => {
                serde_json::Value::Array(l.elems.iter().map(|e| e.value.to_json()).collect())
            }
        }
    }
}

impl Scalar {
    pub fn from_json(json: &serde_json::Value) -> Self {
        let raw = match json {
            serde_json::Value::String(s) => json_string(s),
            other => other.to_string(),
        };
        Self {
            raw,
            value: json.clone(),
        }
    }

    /// Rebuild a string scalar from its source literal.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if `raw` is not a single string literal.
    pub fn string_literal(raw: &str) -> Result<Self> {
        let decoded = parser::Parser::new(raw).string_literal()?;
        Ok(Self {
            raw: raw.to_string(),
            value: serde_json::Value::String(decoded),
        })
    }

    /// A string whose source text is not its canonical encoding.
    pub fn is_spelled_differently(&self) -> bool {
        matches!(&self.value, serde_json::Value::String(s) if json_string(s) != self.raw)
    }

    pub(crate) fn number(raw: &str) -> Option<Self> {
        let number: Number = serde_json::from_str(raw).ok()?;
        Some(Self {
            raw: raw.to_string(),
            value: serde_json::Value::Number(number),
        })
    }
}

/// Iterate over the fields of a declaration list, skipping other declarations.
pub fn fields(decls: &[Decl]) -> impl Iterator<Item = &Field> {
    decls.iter().filter_map(|d| match &d.kind {
        DeclKind::Field(f) => Some(f),
        _ => None,
    })
}

/// Indentation of a node given the trivia before it.
///
/// A node on its own line uses the whitespace after the last newline; a node
/// on the same line as its container inherits the container's indentation.
pub fn indent_of(leading: &str, parent: &str) -> String {
    match leading.rfind('\n') {
        Some(i) => {
            let tail = &leading[i + 1..];
            if tail.chars().all(|c| c == ' ' || c == '\t') {
                tail.to_string()
            } else {
                format!("{parent}\t")
            }
        }
        None => parent.to_string(),
    }
}

fn decls_to_json(decls: &[Decl]) -> Map<String, serde_json::Value> {
    fields(decls)
        .map(|f| (f.label.name.clone(), f.value.to_json()))
        .collect()
}

fn decls_literals(decls: &[Decl], pointer: &mut String, out: &mut Literals) {
    for field in fields(decls) {
        let len = pointer.len();
        push_pointer(pointer, &field.label.name);
        value_literals(&field.value, pointer, out);
        pointer.truncate(len);
    }
}

fn value_literals(value: &Value, pointer: &mut String, out: &mut Literals) {
    match value {
        Value::Scalar(s) if s.is_spelled_differently() => {
            out.insert(pointer.clone(), s.raw.clone());
        }
        Value::Scalar(_) => {}
        Value::Struct(s) => decls_literals(&s.decls, pointer, out),
        Value::List(l) => {
            for (i, elem) in l.elems.iter().enumerate() {
                let len = pointer.len();
                push_pointer(pointer, &i.to_string());
                value_literals(&elem.value, pointer, out);
                pointer.truncate(len);
            }
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !matches!(s, "true" | "false" | "null" | "package" | "import")
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
