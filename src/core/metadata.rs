//! Metadata block management.
//!
//! On encrypt the non-secret half of the envelope is appended to the
//! document as a top-level `sops` field, preceded by a provenance comment.
//! On decrypt that field and its comment are removed again. The presence of
//! the field is what marks a document as encrypted.

use tracing::debug;

use crate::core::constants::{METADATA_LABEL, PROVENANCE_COMMENT};
use crate::core::document::{Decl, DeclKind, Document, Field, Value};

/// Whether the document carries a metadata block.
pub fn is_present(doc: &Document) -> bool {
    doc.field(METADATA_LABEL).is_some()
}

/// Append the metadata block and provenance comment.
///
/// Trivia after the last declaration moves ahead of the block so that
/// trailing comments stay where they were written.
pub fn attach(doc: &mut Document, metadata: &serde_json::Value) {
    let trailing = std::mem::replace(&mut doc.trailing, "\n".to_string());
    let leading = if doc.decls.is_empty() && trailing.is_empty() {
        format!("{PROVENANCE_COMMENT}\n")
    } else {
        format!("{trailing}\n{PROVENANCE_COMMENT}\n")
    };
    doc.decls.push(Decl {
        leading,
        kind: DeclKind::Field(Field::new(METADATA_LABEL, Value::from_json(metadata, ""))),
    });
    debug!("attached metadata block");
}

/// Remove the metadata block and its provenance comment.
///
/// Any other comments that preceded the block are kept. Returns the removed
/// field, or `None` if the document had no metadata block.
pub fn detach(doc: &mut Document) -> Option<Field> {
    let index = doc.decls.iter().position(
        |d| matches!(&d.kind, DeclKind::Field(f) if f.label.name == METADATA_LABEL),
    )?;
    let removed = doc.decls.remove(index);

    match doc.decls.get_mut(index) {
        Some(next) => {
            let rest = strip_provenance(&removed.leading, &format!("\n\n{PROVENANCE_COMMENT}\n"));
            next.leading.insert_str(0, &rest);
        }
        None => {
            // Last block: its leading trivia is the document's old trailing.
            let rest = strip_provenance(&removed.leading, &format!("\n{PROVENANCE_COMMENT}\n"));
            if doc.trailing == "\n" {
                doc.trailing = rest;
            } else {
                doc.trailing.insert_str(0, &rest);
            }
        }
    }
    debug!("detached metadata block");

    match removed.kind {
        DeclKind::Field(field) => Some(field),
        _ => None,
    }
}

fn strip_provenance(leading: &str, generated: &str) -> String {
    if let Some(rest) = leading.strip_suffix(generated) {
        return rest.to_string();
    }
    let rest = leading.replacen(&format!("{PROVENANCE_COMMENT}\n"), "", 1);
    if rest.trim().is_empty() {
        String::new()
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attach_appends_block_and_comment() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        assert!(!is_present(&doc));
        attach(&mut doc, &json!({"mac": "m", "version": "1"}));
        assert!(is_present(&doc));
        assert_eq!(
            doc.render(),
            "a: 1\n\n// DO NOT EDIT: auto-generated by cue-sops\nsops: {\n\tmac: \"m\"\n\tversion: \"1\"\n}\n"
        );
    }

    #[test]
    fn test_attach_detach_restores_source() {
        let sources = [
            "a: 1\n",
            "a: 1",
            "",
            "package x\n\n// doc\na: {\n\tb: 2\n}\n// trailing\n",
            "a: 1 // note\n",
            "// only a comment\n",
            "a: 1 // no newline",
        ];
        for src in sources {
            let mut doc = Document::parse(src).unwrap();
            attach(&mut doc, &json!({"version": "1"}));

            let mut reparsed = Document::parse(&doc.render()).unwrap();
            assert!(is_present(&reparsed));
            let removed = detach(&mut reparsed).unwrap();
            assert_eq!(removed.label.name, "sops");
            assert_eq!(reparsed.render(), src, "restoring {:?}", src);
        }
    }

    #[test]
    fn test_attach_keeps_trailing_comments_in_place() {
        let mut doc = Document::parse("a: 1 // note\n\n// end\n").unwrap();
        attach(&mut doc, &json!({"version": "1"}));
        assert_eq!(
            doc.render(),
            "a: 1 // note\n\n// end\n\n// DO NOT EDIT: auto-generated by cue-sops\nsops: {\n\tversion: \"1\"\n}\n"
        );
    }

    #[test]
    fn test_detach_keeps_user_comments() {
        let src = "a: 1\n// mine\n\n// DO NOT EDIT: auto-generated by cue-sops\nsops: {}\nz: 2\n";
        let mut doc = Document::parse(src).unwrap();
        detach(&mut doc).unwrap();
        assert_eq!(doc.render(), "a: 1\n// mine\nz: 2\n");
    }

    #[test]
    fn test_detach_without_block() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        assert!(detach(&mut doc).is_none());
        assert_eq!(doc.render(), "a: 1\n");
    }

    #[test]
    fn test_nested_sops_label_is_not_metadata() {
        let doc = Document::parse("x: {sops: 1}\n").unwrap();
        assert!(!is_present(&doc));
    }
}
