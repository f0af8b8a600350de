//! Constants used throughout cue-sops.
//!
//! Centralizes magic strings and configuration values.

/// Top-level label reserved for the metadata block.
pub const METADATA_LABEL: &str = "sops";

/// Comment written above the metadata block.
pub const PROVENANCE_COMMENT: &str = "// DO NOT EDIT: auto-generated by cue-sops";

/// Attribute name that marks a field as secret (`@secret()`).
pub const SECRET_ATTRIBUTE: &str = "secret";

/// Attribute bodies accepted alongside [`SECRET_ATTRIBUTE`].
pub const SECRET_KINDS: &[&str] = &["", "sops"];

/// Separator between labels of a field path.
pub const PATH_SEPARATOR: char = '.';

/// Separator between paths in a selector.
pub const SELECTOR_SEPARATOR: char = '|';

/// Policy file name (.sops.yaml).
pub const CONFIG_FILE: &str = ".sops.yaml";

/// Unencrypted suffix applied when a creation rule sets no exclusion rule.
pub const DEFAULT_UNENCRYPTED_SUFFIX: &str = "_unencrypted";

/// Environment variable holding age identities inline.
pub const AGE_KEY_ENV: &str = "SOPS_AGE_KEY";

/// Environment variable pointing to an age identity file.
pub const AGE_KEY_FILE_ENV: &str = "SOPS_AGE_KEY_FILE";

/// Default identity file relative to the user config directory.
pub const AGE_KEY_FILE: &str = "sops/age/keys.txt";

/// Length in bytes of the symmetric data key.
pub const DATA_KEY_LEN: usize = 32;
