//! AES-256-GCM encryption of individual leaf values.
//!
//! Encrypted values are strings of the form
//! `ENC[AES256_GCM,data:<b64>,iv:<b64>,tag:<b64>,type:<type>]`, where the
//! type records how to turn the decrypted bytes back into a value.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use zeroize::Zeroizing;

use crate::core::constants::DATA_KEY_LEN;
use crate::error::{CipherError, Result};

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^ENC\[AES256_GCM,data:(.*),iv:(.+),tag:(.+),type:(.+)\]$")
            .unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}

/// Whether a string looks like an encrypted value.
pub fn is_encrypted(value: &str) -> bool {
    pattern().is_match(value)
}

/// Type of the plaintext an encrypted value decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
    /// A string kept in its CUE source spelling, quotes and escapes included.
    Literal,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Literal => "literal",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unknown value type {:?}", other)),
        }
    }
}

/// AES-256-GCM value cipher bound to one data key.
pub struct Aes {
    cipher: Aes256Gcm,
}

impl fmt::Debug for Aes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aes").finish_non_exhaustive()
    }
}

impl Aes {
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKeyLength` unless `key` is 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != DATA_KEY_LEN {
            return Err(CipherError::InvalidKeyLength {
                expected: DATA_KEY_LEN,
                got: key.len(),
            }
            .into());
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` with `aad` as additional authenticated data.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &[u8], kind: ValueType, aad: &str) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut sealed = self
            .cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(format!(
            "ENC[AES256_GCM,data:{},iv:{},tag:{},type:{}]",
            STANDARD.encode(&sealed),
            STANDARD.encode(iv),
            STANDARD.encode(tag),
            kind
        ))
    }

    /// Decrypt an `ENC[...]` string produced by [`Aes::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `CipherError::MalformedValue` if the string is not a valid
    /// encrypted value and `CipherError::DecryptionFailed` if authentication
    /// fails (wrong key, wrong `aad` or tampered data).
    pub fn decrypt(&self, value: &str, aad: &str) -> Result<(Zeroizing<Vec<u8>>, ValueType)> {
        let malformed = |reason: String| CipherError::MalformedValue {
            path: aad.trim_end_matches(':').replace(':', "."),
            reason,
        };
        let caps = pattern()
            .captures(value)
            .ok_or_else(|| malformed("not an ENC[AES256_GCM,...] value".to_string()))?;
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let decode = |name: &str, text: &str| {
            STANDARD
                .decode(text)
                .map_err(|e| malformed(format!("invalid {} encoding: {}", name, e)))
        };
        let data = decode("data", field(1))?;
        let iv = decode("iv", field(2))?;
        let tag = decode("tag", field(3))?;
        let kind: ValueType = field(4).parse().map_err(malformed)?;

        if iv.len() != IV_LEN {
            return Err(malformed(format!("iv must be {} bytes", IV_LEN)).into());
        }
        if tag.len() != TAG_LEN {
            return Err(malformed(format!("tag must be {} bytes", TAG_LEN)).into());
        }

        let mut sealed = data;
        sealed.extend_from_slice(&tag);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: &sealed,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| CipherError::DecryptionFailed("authentication failed".to_string()))?;
        Ok((Zeroizing::new(plaintext), kind))
    }
}
