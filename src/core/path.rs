//! Field paths and selectors.
//!
//! A [`FieldPath`] is the sequence of labels from the document root to a
//! field. It is the only key used to correlate fields of the document with
//! values of the envelope. A [`Selector`] is the set of paths chosen for
//! encryption; its text form (`b|db.password`) is what the metadata block
//! records.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::constants::{PATH_SEPARATOR, SELECTOR_SEPARATOR};
use crate::error::PathError;

/// Labels from the document root to a field, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a child field with the given label.
    pub fn child(&self, label: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(label.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this path equals or is an ancestor of `other`.
    pub fn is_prefix_of(&self, other: &[String]) -> bool {
        other.starts_with(&self.0)
    }

    /// Reject paths whose text form would be ambiguous.
    ///
    /// # Errors
    ///
    /// Returns `PathError::Empty` for the root path and
    /// `PathError::ReservedCharacter` for labels containing a separator.
    pub fn validate(&self) -> Result<(), PathError> {
        if self.0.is_empty() {
            return Err(PathError::Empty);
        }
        for label in &self.0 {
            for reserved in [PATH_SEPARATOR, SELECTOR_SEPARATOR] {
                if label.contains(reserved) {
                    return Err(PathError::ReservedCharacter {
                        label: label.clone(),
                        reserved,
                    });
                }
            }
        }
        Ok(())
    }

    /// Value at this path inside a plain-data tree.
    pub fn lookup<'v>(&self, tree: &'v serde_json::Value) -> Option<&'v serde_json::Value> {
        self.0
            .iter()
            .try_fold(tree, |node, label| node.as_object()?.get(label))
    }

    /// JSON pointer of the value at this path (`/db/password`).
    pub fn pointer(&self) -> String {
        self.0.iter().fold(String::new(), |mut out, label| {
            push_pointer(&mut out, label);
            out
        })
    }
}

/// Append one reference token to a JSON pointer, escaping `~` and `/`.
pub fn push_pointer(pointer: &mut String, token: &str) {
    pointer.push('/');
    pointer.push_str(&token.replace('~', "~0").replace('/', "~1"));
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let path = Self(s.split(PATH_SEPARATOR).map(str::to_string).collect());
        path.validate()?;
        Ok(path)
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The set of field paths whose values are encrypted.
///
/// Shared by the locator, the envelope codec and the splicer so that all
/// three agree on which values are secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    paths: BTreeSet<FieldPath>,
}

impl Selector {
    /// Build a selector from located paths.
    ///
    /// # Errors
    ///
    /// Returns `PathError` if any path cannot be represented unambiguously.
    pub fn new(paths: impl IntoIterator<Item = FieldPath>) -> Result<Self, PathError> {
        let paths: BTreeSet<FieldPath> = paths.into_iter().collect();
        for path in &paths {
            path.validate()?;
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    /// Whether a value at `segments` lies at or below a selected path.
    pub fn covers(&self, segments: &[String]) -> bool {
        self.paths.iter().any(|p| p.is_prefix_of(segments))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SELECTOR_SEPARATOR)?;
            }
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(SELECTOR_SEPARATOR)
            .map(str::parse::<FieldPath>)
            .collect::<Result<Vec<_>, _>>()
            .and_then(Self::new)
    }
}
