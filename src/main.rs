//! cue-sops - Encrypt the secret fields of CUE files in place.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cue_sops::cli::output;
use cue_sops::cli::{execute, Cli};
use cue_sops::error::{Error, KeyError, PolicyError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("CUE_SOPS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cue_sops=debug")
        } else {
            EnvFilter::new("cue_sops=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(&cli) {
        let file = cli.file.display();
        let suggestion = match &e {
            Error::NotEncrypted => Some(format!("run: cue-sops encrypt {}", file)),
            Error::Policy(PolicyError::NotFound(_)) => {
                Some("create a .sops.yaml with creation_rules, or pass --config".to_string())
            }
            Error::Key(KeyError::NoIdentity | KeyError::RecoverFailed(_)) => {
                Some("set SOPS_AGE_KEY_FILE to a file holding your age identity".to_string())
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        let code = match e {
            Error::NotEncrypted => 1,
            _ => 2,
        };
        std::process::exit(code);
    }
}
