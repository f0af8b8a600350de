//! Envelope codec.
//!
//! Encodes a plain-data tree into its encrypted form: every leaf selected by
//! the [`Selector`] (and admitted by the exclusion rule) becomes an
//! `ENC[...]` string, and a `sops` entry holding the wrapped data key, the
//! MAC and the selector itself is added at the root. Decoding reverses this
//! and hands back the recorded selector.

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::core::cipher::{Aes, ValueType};
use crate::core::config::CreationRule;
use crate::core::constants::METADATA_LABEL;
use crate::core::document::Literals;
use crate::core::keyservice::{self, KeyService};
use crate::core::path::Selector;
use crate::error::{CipherError, PolicyError, Result};

mod metadata;
pub mod scope;
mod tree;

pub use self::metadata::Metadata;
pub use self::scope::ScopeRules;

use self::tree::Mac;

/// A plain-data tree with the selector of its secret values.
///
/// `literals` carries the source spelling of strings the tree alone would
/// render differently; they are sealed as written and handed back on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Plain {
    pub tree: serde_json::Value,
    pub selector: Selector,
    pub literals: Literals,
}

impl Plain {
    pub fn new(tree: serde_json::Value, selector: Selector) -> Self {
        Self {
            tree,
            selector,
            literals: Literals::new(),
        }
    }
}

/// Encrypts and decrypts trees using an ordered list of key services.
#[derive(Debug)]
pub struct Codec {
    services: Vec<Box<dyn KeyService>>,
}

impl Codec {
    pub fn new(services: Vec<Box<dyn KeyService>>) -> Self {
        Self { services }
    }

    /// Codec backed by the default key services.
    pub fn with_default_services() -> Self {
        Self::new(keyservice::default_services())
    }

    /// Encrypt the values of `plain` its selector names, under the creation
    /// rule.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::RootNotObject` if the tree is not an object,
    /// `PolicyError` if the rule is unusable, and `KeyError` if no master
    /// key could wrap the data key.
    pub fn encode(&self, plain: &Plain, rule: &CreationRule) -> Result<serde_json::Value> {
        let selector = &plain.selector;
        if !plain.tree.is_object() {
            return Err(CipherError::RootNotObject.into());
        }
        if rule.key_groups.len() > 1 {
            return Err(PolicyError::ShamirUnsupported(rule.key_groups.len()).into());
        }
        let scope = rule.rules.compile(selector)?;
        let (data_key, key_groups) = keyservice::generate(&rule.key_groups, &self.services)?;
        let aes = Aes::new(data_key.as_bytes())?;

        let mut tree = plain.tree.clone();
        let mut mac = Mac::new();
        let count = tree::encrypt(&mut tree, &plain.literals, &scope, &aes, &mut mac)?;

        let lastmodified = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mac = aes.encrypt(mac.finish().as_bytes(), ValueType::Str, &lastmodified)?;

        let metadata = Metadata {
            key_groups,
            shamir_threshold: rule.shamir_threshold,
            lastmodified,
            mac,
            mac_only_encrypted: true,
            encrypted_selector: selector.to_string(),
            rules: rule.rules.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        if let serde_json::Value::Object(map) = &mut tree {
            map.insert(METADATA_LABEL.to_string(), metadata.to_json()?);
        }
        debug!(values = count, "encoded envelope");
        Ok(tree)
    }

    /// Decrypt an encoded tree.
    ///
    /// The returned tree has the `sops` entry removed.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::MissingMetadata` if there is no `sops` entry,
    /// `KeyError::RecoverFailed` if no key service can recover the data key,
    /// `CipherError::NotEncryptedValue` if an in-scope value is plain, and
    /// `CipherError::MacMismatch` if the values were tampered with.
    pub fn decode(&self, encoded: &serde_json::Value) -> Result<Plain> {
        let mut tree = encoded.clone();
        let raw = match &mut tree {
            serde_json::Value::Object(map) => map
                .shift_remove(METADATA_LABEL)
                .ok_or(CipherError::MissingMetadata)?,
            _ => return Err(CipherError::RootNotObject.into()),
        };
        let metadata = Metadata::from_json(raw)?;
        if metadata.key_groups.len() > 1 {
            return Err(PolicyError::ShamirUnsupported(metadata.key_groups.len()).into());
        }

        let selector: Selector = metadata
            .encrypted_selector
            .parse()
            .map_err(|e| CipherError::InvalidMetadata(format!("encrypted_selector: {}", e)))?;
        let scope = metadata.rules.compile(&selector)?;
        let data_key = keyservice::recover(&metadata.key_groups, &self.services)?;
        let aes = Aes::new(data_key.as_bytes())?;

        let mut mac = Mac::new();
        let mut literals = Literals::new();
        let count = tree::decrypt(&mut tree, &mut literals, &scope, &aes, &mut mac)?;

        let (recorded, _) = aes
            .decrypt(&metadata.mac, &metadata.lastmodified)
            .map_err(|_| CipherError::MacMismatch)?;
        if recorded.as_slice() != mac.finish().as_bytes() {
            return Err(CipherError::MacMismatch.into());
        }

        debug!(values = count, "decoded envelope");
        Ok(Plain {
            tree,
            selector,
            literals,
        })
    }
}
