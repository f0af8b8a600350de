//! Secret field discovery.
//!
//! A field is secret when it carries the `@secret()` attribute (or its
//! explicit form `@secret(sops)`). Every field is examined, including the
//! descendants of fields that carry unrelated attributes.

use tracing::{debug, trace};

use crate::core::constants::{SECRET_ATTRIBUTE, SECRET_KINDS};
use crate::core::document::visit::{self, Visit};
use crate::core::document::{Attribute, Document};
use crate::core::path::{FieldPath, Selector};
use crate::error::{PathError, Result};

/// Attribute identifier and accepted bodies that mark a secret field.
#[derive(Debug, Clone, Copy)]
pub struct SecretMarker {
    pub name: &'static str,
    pub kinds: &'static [&'static str],
}

/// The marker recognized in documents.
pub const SECRET_MARKER: SecretMarker = SecretMarker {
    name: SECRET_ATTRIBUTE,
    kinds: SECRET_KINDS,
};

impl SecretMarker {
    pub fn matches(&self, attr: &Attribute) -> bool {
        attr.name == self.name && self.kinds.iter().any(|k| *k == attr.body.trim())
    }

    /// Whether any of the visited field's attributes is this marker.
    pub fn tags(&self, visit: &Visit<'_>) -> bool {
        visit.field.attrs.iter().any(|a| self.matches(&a.attr))
    }
}

/// Paths of all secret fields in document order.
///
/// # Errors
///
/// Returns `PathError::InsideList` if a secret field lives inside a list.
pub fn locate(doc: &Document) -> Result<Vec<FieldPath>> {
    let mut found = Vec::new();
    visit::walk(doc, |v| {
        if !SECRET_MARKER.tags(v) {
            return Ok(());
        }
        if v.in_list {
            return Err(PathError::InsideList(v.path.to_string()).into());
        }
        trace!(path = %v.path, "secret field");
        found.push(v.path.clone());
        Ok(())
    })?;
    debug!(fields = found.len(), "located secret fields");
    Ok(found)
}

/// Locate secret fields and build the selector for them.
///
/// # Errors
///
/// Returns `PathError` if a secret field cannot be addressed unambiguously.
pub fn selector(doc: &Document) -> Result<Selector> {
    Ok(Selector::new(locate(doc)?)?)
}
