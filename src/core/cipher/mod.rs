//! Cryptographic operations.
//!
//! Two layers:
//!
//! - **age** wraps the symmetric data key for X25519 recipients. It
//!   implements [`Cipher`], the recipient/identity abstraction that key
//!   services build on.
//! - **aes** encrypts individual leaf values under the data key with
//!   AES-256-GCM and renders them as `ENC[...]` strings.

use zeroize::Zeroizing;

use crate::error::Result;

pub mod aes;
mod age;

pub use self::aes::{Aes, ValueType};
pub use self::age::{parse_identities, parse_recipient, Age};

/// Public-key encryption backend.
///
/// Recipients and identities are backend-specific; for age they are X25519
/// public keys (`age1...`) and secret keys (`AGE-SECRET-KEY-1...`).
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt bytes for multiple recipients.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails.
    fn encrypt(&self, plaintext: &[u8], recipients: &[Self::Recipient]) -> Result<String>;

    /// Decrypt with the first identity that matches a recipient stanza.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if no identity matches or the payload is corrupt.
    fn decrypt(&self, encrypted: &str, identities: &[Self::Identity])
        -> Result<Zeroizing<Vec<u8>>>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}
