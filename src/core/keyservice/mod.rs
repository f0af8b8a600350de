//! Data key custody.
//!
//! A random data key encrypts every leaf value; master keys listed in the
//! creation policy each hold a wrapped copy of it. A [`KeyService`] knows
//! how to wrap the data key for a master key and how to unwrap it again.
//! Services are injected into the codec as an ordered list, so tests can
//! substitute a stub for real key custody.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::core::constants::DATA_KEY_LEN;
use crate::error::{CipherError, KeyError, Result};

mod age;
#[cfg(any(test, feature = "test-keyservice"))]
mod stub;

pub use self::age::AgeKeyService;
#[cfg(any(test, feature = "test-keyservice"))]
pub use self::stub::StubKeyService;

/// An age recipient and, once generated, its wrapped copy of the data key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKey {
    pub recipient: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub enc: String,
}

impl MasterKey {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            enc: String::new(),
        }
    }
}

/// Master keys that can each recover the data key on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGroup {
    #[serde(default)]
    pub age: Vec<MasterKey>,
}

impl KeyGroup {
    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
    }
}

/// Symmetric key for leaf values. Zeroed on drop.
#[derive(Clone)]
pub struct DataKey(Zeroizing<Vec<u8>>);

impl DataKey {
    /// Fresh random key.
    pub fn generate() -> Self {
        let mut key = Zeroizing::new(vec![0u8; DATA_KEY_LEN]);
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// # Errors
    ///
    /// Returns `CipherError::InvalidKeyLength` unless `bytes` is 32 bytes.
    pub fn from_bytes(bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        if bytes.len() != DATA_KEY_LEN {
            return Err(CipherError::InvalidKeyLength {
                expected: DATA_KEY_LEN,
                got: bytes.len(),
            }
            .into());
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey(..)")
    }
}

/// Wraps and unwraps the data key for master keys.
pub trait KeyService: fmt::Debug {
    /// Service name for diagnostics.
    fn name(&self) -> &'static str;

    /// Wrap `data_key` for `key`, returning the text stored in `enc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot wrap for this master key.
    fn encrypt(&self, key: &MasterKey, data_key: &DataKey) -> Result<String>;

    /// Unwrap the data key from `key.enc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service holds no matching secret.
    fn decrypt(&self, key: &MasterKey) -> Result<DataKey>;
}

/// Key services used by the command-line tool.
pub fn default_services() -> Vec<Box<dyn KeyService>> {
    vec![Box::new(AgeKeyService::default())]
}

/// Generate a data key and wrap it for every master key of every group.
///
/// Each master key is offered to the services in order until one succeeds.
/// A master key no service can wrap is dropped with a warning. Returns the
/// key and the groups as they should be recorded.
///
/// # Errors
///
/// Returns `KeyError::GenerateFailed` with every collected reason if no
/// master key could be wrapped.
pub fn generate(
    groups: &[KeyGroup],
    services: &[Box<dyn KeyService>],
) -> Result<(DataKey, Vec<KeyGroup>)> {
    let data_key = DataKey::generate();
    let mut failures = Vec::new();
    let mut wrapped = Vec::new();

    for group in groups {
        let mut out = KeyGroup::default();
        for key in &group.age {
            match wrap(key, &data_key, services) {
                Ok(enc) => out.age.push(MasterKey {
                    recipient: key.recipient.clone(),
                    enc,
                }),
                Err(reasons) => {
                    warn!(recipient = %key.recipient, "dropping master key: data key could not be wrapped");
                    failures.extend(reasons);
                }
            }
        }
        if !out.is_empty() {
            wrapped.push(out);
        }
    }

    if wrapped.is_empty() {
        return Err(KeyError::GenerateFailed(failures).into());
    }
    debug!(
        keys = wrapped.iter().map(|g| g.age.len()).sum::<usize>(),
        "generated data key"
    );
    Ok((data_key, wrapped))
}

fn wrap(
    key: &MasterKey,
    data_key: &DataKey,
    services: &[Box<dyn KeyService>],
) -> std::result::Result<String, Vec<String>> {
    let mut reasons = Vec::new();
    for service in services {
        match service.encrypt(key, data_key) {
            Ok(enc) => {
                trace!(recipient = %key.recipient, service = service.name(), "wrapped data key");
                return Ok(enc);
            }
            Err(e) => reasons.push(format!("{} via {}: {}", key.recipient, service.name(), e)),
        }
    }
    if reasons.is_empty() {
        reasons.push(format!("{}: no key services configured", key.recipient));
    }
    Err(reasons)
}

/// Recover the data key from any master key any service can unwrap.
///
/// # Errors
///
/// Returns `KeyError::RecoverFailed` with every collected reason if no
/// (master key, service) pair succeeds.
pub fn recover(groups: &[KeyGroup], services: &[Box<dyn KeyService>]) -> Result<DataKey> {
    let mut reasons = Vec::new();
    for key in groups.iter().flat_map(|g| &g.age) {
        for service in services {
            match service.decrypt(key) {
                Ok(data_key) => {
                    debug!(recipient = %key.recipient, service = service.name(), "recovered data key");
                    return Ok(data_key);
                }
                Err(e) => reasons.push(format!("{} via {}: {}", key.recipient, service.name(), e)),
            }
        }
    }
    if reasons.is_empty() {
        reasons.push("no master keys recorded".to_string());
    }
    Err(KeyError::RecoverFailed(reasons).into())
}
