//! Test support utilities for cue-sops integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::PathBuf;

use age::secrecy::ExposeSecret;
use age::x25519;
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own project dir holding the policy and documents, and
/// its own home dir holding the age identity file. No process-global state
/// is mutated; child processes use `.current_dir()` and explicit env vars,
/// so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory for the project
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    /// Identity whose public key the policy lists
    pub identity: x25519::Identity,
}

impl Test {
    /// Create an environment with an identity but no policy file.
    pub fn bare() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let identity = x25519::Identity::generate();

        let t = Self {
            dir,
            home,
            identity,
        };
        fs::write(t.key_file(), identity_file(&t.identity)).expect("failed to write key file");
        t
    }

    /// Create an environment with a policy encrypting `*.cue` for the identity.
    pub fn new() -> Self {
        let t = Self::bare();
        t.write(".sops.yaml", &policy(&[&t.recipient()]));
        t
    }

    /// Public key of the test identity.
    pub fn recipient(&self) -> String {
        self.identity.to_public().to_string()
    }

    /// Path of the identity file the commands use.
    pub fn key_file(&self) -> PathBuf {
        self.home.path().join("keys.txt")
    }

    /// Write a file in the project dir.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Read a file from the project dir.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).expect("failed to read file")
    }
}

/// Identity file contents in the age keys.txt format.
pub fn identity_file(identity: &x25519::Identity) -> String {
    format!(
        "# created: 2024-01-01T00:00:00Z\n# public key: {}\n{}\n",
        identity.to_public(),
        identity.to_string().expose_secret()
    )
}
