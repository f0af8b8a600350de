//! Command-line interface.

pub mod decrypt;
pub mod encrypt;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::core::transform::Operation;
use crate::error::Result;

/// Encrypt the @secret() fields of a CUE file in place.
#[derive(Parser, Debug)]
#[command(
    name = "cue-sops",
    about = "Encrypt the @secret() fields of a CUE file in place",
    version
)]
pub struct Cli {
    /// Operation to perform
    #[arg(value_enum)]
    pub operation: OperationArg,

    /// CUE file to transform
    pub file: PathBuf,

    /// Policy file (default: nearest .sops.yaml from the current directory)
    #[arg(long, env = "CUE_SOPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Operations accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationArg {
    Encrypt,
    Decrypt,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Encrypt => Operation::Encrypt,
            OperationArg::Decrypt => Operation::Decrypt,
        }
    }
}

/// Execute the parsed command line.
///
/// # Errors
///
/// Returns the first error of the transform; the file is left untouched.
pub fn execute(cli: &Cli) -> Result<()> {
    match cli.operation {
        OperationArg::Encrypt => encrypt::execute(&cli.file, cli.config.as_deref()),
        OperationArg::Decrypt => decrypt::execute(&cli.file),
    }
}
