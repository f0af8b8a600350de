//! Error types.
//!
//! Each concern of the pipeline has its own error enum; [`Error`] wraps them
//! so callers can match on the category while `?` converts automatically.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for all cue-sops operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Splice(#[from] SpliceError),

    /// Decrypt was requested on a document without a metadata block.
    #[error("document is not encrypted: no sops metadata block found")]
    NotEncrypted,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or unsupported document input.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("{line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{line}:{column}: {what} is not supported")]
    Unsupported {
        line: usize,
        column: usize,
        what: &'static str,
    },

    #[error("{line}: duplicate field label: {label}")]
    DuplicateLabel { label: String, line: usize },
}

/// Field paths that cannot be addressed unambiguously.
#[derive(Error, Debug, PartialEq)]
pub enum PathError {
    #[error("label {label:?} contains reserved character {reserved:?}")]
    ReservedCharacter { label: String, reserved: char },

    #[error("secret field {0} is inside a list; fields in lists have no unique path")]
    InsideList(String),

    #[error("empty field path")]
    Empty,
}

/// Creation policy loading and validation.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("no .sops.yaml found in {0} or any parent directory")]
    NotFound(PathBuf),

    #[error("failed to read policy file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("no creation rule matches {0}")]
    NoMatchingRule(String),

    #[error("creation rule has no age recipients")]
    NoRecipients,

    #[error("invalid age recipient: {0}")]
    InvalidRecipient(String),

    #[error("invalid regex {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("only one of unencrypted_suffix, encrypted_suffix, unencrypted_regex may be set")]
    ConflictingRules,

    #[error("{0} key groups configured; shamir secret sharing is not supported")]
    ShamirUnsupported(usize),
}

/// Data key generation and recovery through key services.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("no key service could wrap the data key: {}", .0.join("; "))]
    GenerateFailed(Vec<String>),

    #[error("no key service could recover the data key: {}", .0.join("; "))]
    RecoverFailed(Vec<String>),

    #[error("failed to read key file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid age identity: {0}")]
    InvalidIdentity(String),

    #[error("no age identity available")]
    NoIdentity,

    #[error("master key for {0} has no wrapped data key")]
    MissingWrappedKey(String),
}

/// Encryption, decryption and envelope format failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("armor failed: {0}")]
    ArmorFailed(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid data key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("malformed encrypted value at {path}: {reason}")]
    MalformedValue { path: String, reason: String },

    #[error("value at {0} is in scope but not encrypted")]
    NotEncryptedValue(String),

    #[error("document root must be a struct")]
    RootNotObject,

    #[error("envelope has no sops metadata")]
    MissingMetadata,

    #[error("invalid sops metadata: {0}")]
    InvalidMetadata(String),

    #[error("message authentication code mismatch: document was modified")]
    MacMismatch,
}

/// Inconsistencies between the located paths, the document and the codec output.
#[derive(Error, Debug, PartialEq)]
pub enum SpliceError {
    #[error("path {0} is missing from the envelope output")]
    MissingInEnvelope(String),

    #[error("path {0} was selected but does not exist in the document")]
    MissingInDocument(String),

    #[error("path {0} is encrypted but no longer tagged as secret")]
    Untagged(String),
}

pub type Result<T> = std::result::Result<T, Error>;
