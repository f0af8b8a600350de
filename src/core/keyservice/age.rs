//! Local age custody of the data key.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ::age::x25519;
use tracing::debug;

use super::{DataKey, KeyService, MasterKey};
use crate::core::cipher::{parse_identities, parse_recipient, Age, Cipher};
use crate::core::constants::{AGE_KEY_ENV, AGE_KEY_FILE, AGE_KEY_FILE_ENV};
use crate::error::{KeyError, Result};

/// Wraps the data key for age X25519 recipients.
///
/// Identities for unwrapping come from `SOPS_AGE_KEY`, then
/// `SOPS_AGE_KEY_FILE` or the default `<config dir>/sops/age/keys.txt`,
/// unless they were supplied with [`AgeKeyService::with_identities`].
#[derive(Default)]
pub struct AgeKeyService {
    identities: Option<Vec<x25519::Identity>>,
}

impl fmt::Debug for AgeKeyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgeKeyService")
            .field("identities", &self.identities.as_ref().map(Vec::len))
            .finish()
    }
}

impl AgeKeyService {
    /// Service that unwraps with the given identities only.
    pub fn with_identities(identities: Vec<x25519::Identity>) -> Self {
        Self {
            identities: Some(identities),
        }
    }

    fn identities(&self) -> Result<Vec<x25519::Identity>> {
        match &self.identities {
            Some(ids) => Ok(ids.clone()),
            None => load_identities(),
        }
    }
}

impl KeyService for AgeKeyService {
    fn name(&self) -> &'static str {
        Age.name()
    }

    fn encrypt(&self, key: &MasterKey, data_key: &DataKey) -> Result<String> {
        let recipient = parse_recipient(&key.recipient)?;
        Age.encrypt(data_key.as_bytes(), &[recipient])
    }

    fn decrypt(&self, key: &MasterKey) -> Result<DataKey> {
        if key.enc.is_empty() {
            return Err(KeyError::MissingWrappedKey(key.recipient.clone()).into());
        }
        let identities = self.identities()?;
        DataKey::from_bytes(Age.decrypt(&key.enc, &identities)?)
    }
}

/// Collect identities from the environment and the default key file.
///
/// # Errors
///
/// Returns `KeyError::NoIdentity` if no source yields an identity, and
/// `KeyError` if a source exists but cannot be read or parsed.
pub fn load_identities() -> Result<Vec<x25519::Identity>> {
    let mut identities = Vec::new();

    if let Ok(inline) = env::var(AGE_KEY_ENV) {
        identities.extend(parse_identities(&inline)?);
        debug!(source = AGE_KEY_ENV, "loaded age identities");
    }

    match env::var_os(AGE_KEY_FILE_ENV) {
        Some(path) => identities.extend(read_key_file(Path::new(&path))?),
        None => {
            if let Some(path) = default_key_file().filter(|p| p.exists()) {
                identities.extend(read_key_file(&path)?);
            }
        }
    }

    if identities.is_empty() {
        return Err(KeyError::NoIdentity.into());
    }
    Ok(identities)
}

fn default_key_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(AGE_KEY_FILE))
}

fn read_key_file(path: &Path) -> Result<Vec<x25519::Identity>> {
    let contents = fs::read_to_string(path).map_err(|source| KeyError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let identities = parse_identities(&contents)?;
    debug!(path = %path.display(), count = identities.len(), "loaded age identities");
    Ok(identities)
}
