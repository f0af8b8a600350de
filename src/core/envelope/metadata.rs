//! The `sops` metadata record carried next to the encrypted values.

use serde::{Deserialize, Serialize};

use super::scope::ScopeRules;
use crate::core::keyservice::KeyGroup;
use crate::error::{CipherError, Result};

/// Everything needed to decrypt the values again, minus the secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub key_groups: Vec<KeyGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shamir_threshold: Option<usize>,
    pub lastmodified: String,
    pub mac: String,
    #[serde(default)]
    pub mac_only_encrypted: bool,
    /// Selector text of the fields that were encrypted.
    pub encrypted_selector: String,
    #[serde(flatten)]
    pub rules: ScopeRules,
    pub version: String,
}

impl Metadata {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| CipherError::InvalidMetadata(format!("serialize: {}", e)).into())
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CipherError::InvalidMetadata(e.to_string()).into())
    }
}
