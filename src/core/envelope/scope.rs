//! Which leaves of a tree get encrypted.
//!
//! A leaf is in scope when it lies at or below a selected path and the
//! exclusion rule admits the labels on its path.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::path::Selector;
use crate::error::{PolicyError, Result};

/// Exclusion rules as configured and as recorded in the metadata block.
///
/// At most one may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unencrypted_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unencrypted_regex: Option<String>,
}

impl ScopeRules {
    /// Compile the rules against a selector.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::ConflictingRules` if more than one rule is set
    /// and `PolicyError::InvalidRegex` if the regex does not compile.
    pub fn compile<'s>(&self, selector: &'s Selector) -> Result<Scope<'s>> {
        let set = [
            self.unencrypted_suffix.is_some(),
            self.encrypted_suffix.is_some(),
            self.unencrypted_regex.is_some(),
        ];
        if set.iter().filter(|s| **s).count() > 1 {
            return Err(PolicyError::ConflictingRules.into());
        }

        let exclusion = match (
            &self.unencrypted_suffix,
            &self.encrypted_suffix,
            &self.unencrypted_regex,
        ) {
            (Some(suffix), _, _) => Exclusion::UnencryptedSuffix(suffix.clone()),
            (_, Some(suffix), _) => Exclusion::EncryptedSuffix(suffix.clone()),
            (_, _, Some(pattern)) => {
                Exclusion::UnencryptedRegex(Regex::new(pattern).map_err(|e| {
                    PolicyError::InvalidRegex {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    }
                })?)
            }
            _ => Exclusion::None,
        };
        Ok(Scope {
            selector,
            exclusion,
        })
    }
}

#[derive(Debug)]
enum Exclusion {
    None,
    UnencryptedSuffix(String),
    EncryptedSuffix(String),
    UnencryptedRegex(Regex),
}

/// Compiled scope of one encode or decode.
#[derive(Debug)]
pub struct Scope<'s> {
    selector: &'s Selector,
    exclusion: Exclusion,
}

impl Scope<'_> {
    /// Whether the leaf at `segments` is encrypted.
    pub fn admits(&self, segments: &[String]) -> bool {
        if !self.selector.covers(segments) {
            return false;
        }
        match &self.exclusion {
            Exclusion::None => true,
            Exclusion::UnencryptedSuffix(suffix) => !segments.iter().any(|s| s.ends_with(suffix.as_str())),
            Exclusion::EncryptedSuffix(suffix) => segments.iter().any(|s| s.ends_with(suffix.as_str())),
            Exclusion::UnencryptedRegex(re) => !segments.iter().any(|s| re.is_match(s)),
        }
    }
}
