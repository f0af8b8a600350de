//! Encrypt command.
//!
//! Encrypts the secret fields of a file in place using the creation policy.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::core::config;
use crate::core::envelope::Codec;
use crate::core::transform::{transform, Operation, Outcome};
use crate::error::Result;

/// Encrypt `file` in place. An already encrypted file is left as is.
pub fn execute(file: &Path, policy: Option<&Path>) -> Result<()> {
    let source = fs::read_to_string(file)?;
    let codec = Codec::with_default_services();
    let outcome = transform(Operation::Encrypt, &source, &codec, || {
        config::resolve(file, policy)
    })?;

    let name = file.display().to_string();
    match outcome {
        Outcome::Encrypted { output: text, fields } => {
            fs::write(file, text)?;
            output::success(&format!(
                "encrypted {} {} in {}",
                fields,
                if fields == 1 { "field" } else { "fields" },
                output::path(&name)
            ));
        }
        Outcome::AlreadyEncrypted => {
            output::warn(&format!("{} is already encrypted", output::path(&name)));
        }
        Outcome::Decrypted { .. } => unreachable!("encrypt produced a decrypt outcome"),
    }
    Ok(())
}
