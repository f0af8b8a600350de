//! Decrypt command.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::core::envelope::Codec;
use crate::core::transform::{transform, Operation, Outcome};
use crate::error::{Error, Result};

/// Decrypt `file` in place.
///
/// # Errors
///
/// Returns `Error::NotEncrypted` if the file carries no metadata block.
pub fn execute(file: &Path) -> Result<()> {
    let source = fs::read_to_string(file)?;
    let codec = Codec::with_default_services();
    let outcome = transform(Operation::Decrypt, &source, &codec, || Err(Error::NotEncrypted))?;

    if let Outcome::Decrypted { output: text, fields } = outcome {
        fs::write(file, text)?;
        output::success(&format!(
            "decrypted {} {} in {}",
            fields,
            if fields == 1 { "field" } else { "fields" },
            output::path(&file.display().to_string())
        ));
    }
    Ok(())
}
