//! Reversible stub key service for tests.

use zeroize::Zeroizing;

use super::{DataKey, KeyService, MasterKey};
use crate::error::{KeyError, Result};

const PREFIX: &str = "stub:";

/// Stub key service for testing.
///
/// Uses simple hex encoding with prefix; NOT cryptographically secure,
/// just exercises the key plumbing without real key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubKeyService;

impl KeyService for StubKeyService {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn encrypt(&self, _key: &MasterKey, data_key: &DataKey) -> Result<String> {
        let hex: String = data_key
            .as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Ok(format!("{}{}", PREFIX, hex))
    }

    fn decrypt(&self, key: &MasterKey) -> Result<DataKey> {
        let hex = key
            .enc
            .strip_prefix(PREFIX)
            .ok_or_else(|| KeyError::InvalidIdentity("not a stub-wrapped key".to_string()))?;
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(KeyError::InvalidIdentity("invalid hex".to_string()).into());
        }
        let bytes: std::result::Result<Vec<u8>, _> = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect();
        let bytes = bytes.map_err(|e| KeyError::InvalidIdentity(format!("invalid hex: {}", e)))?;
        DataKey::from_bytes(Zeroizing::new(bytes))
    }
}
