//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a cue-sops command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - SOPS_AGE_KEY_FILE pointing at the test identity
    /// - Current directory set to the test project directory
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cue-sops").expect("failed to find cue-sops binary");
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path().join(".config"));
        cmd.env("SOPS_AGE_KEY_FILE", self.key_file());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SOPS_AGE_KEY");
        cmd.env_remove("CUE_SOPS_CONFIG");
        cmd.env_remove("CUE_SOPS_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `cue-sops encrypt <file>`.
    pub fn encrypt(&self, file: &str) -> Output {
        self.cmd()
            .args(["encrypt", file])
            .output()
            .expect("failed to run cue-sops encrypt")
    }

    /// Shortcut for `cue-sops decrypt <file>`.
    pub fn decrypt(&self, file: &str) -> Output {
        self.cmd()
            .args(["decrypt", file])
            .output()
            .expect("failed to run cue-sops decrypt")
    }
}
