//! Encrypt and decrypt pipelines.
//!
//! One call decides the operation from the document's state and runs the
//! full pipeline in memory. Nothing is written here; the caller persists the
//! output only when a transform succeeded.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::core::config::CreationRule;
use crate::core::constants::METADATA_LABEL;
use crate::core::document::{Document, Literals};
use crate::core::envelope::{Codec, Plain};
use crate::core::locate;
use crate::core::metadata;
use crate::core::path::Selector;
use crate::core::splice::splice;
use crate::error::{CipherError, Error, Result, SpliceError};

/// Requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

/// What a transform produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Secret fields were encrypted; `output` is the new document text.
    Encrypted { output: String, fields: usize },
    /// Secret fields were decrypted; `output` is the new document text.
    Decrypted { output: String, fields: usize },
    /// Encrypt was requested on an already protected document.
    AlreadyEncrypted,
}

/// Run `op` over `source`.
///
/// `policy` is only invoked for encryption, after the document has been
/// parsed and found to be unprotected.
///
/// # Errors
///
/// Returns `Error::NotEncrypted` when decrypting a document without a
/// metadata block, and any parse, policy, key, cipher or splice error of
/// the pipeline. On error no output is produced.
pub fn transform<P>(op: Operation, source: &str, codec: &Codec, policy: P) -> Result<Outcome>
where
    P: FnOnce() -> Result<CreationRule>,
{
    let doc = Document::parse(source)?;
    let protected = metadata::is_present(&doc);
    debug!(?op, protected, "document parsed");

    match (op, protected) {
        (Operation::Encrypt, true) => Ok(Outcome::AlreadyEncrypted),
        (Operation::Decrypt, false) => Err(Error::NotEncrypted),
        (Operation::Encrypt, false) => encrypt(doc, codec, policy()?),
        (Operation::Decrypt, true) => decrypt(doc, codec),
    }
}

fn encrypt(mut doc: Document, codec: &Codec, rule: CreationRule) -> Result<Outcome> {
    let selector = locate::selector(&doc)?;
    if selector.is_empty() {
        warn!("no fields tagged @secret(); only metadata will be added");
    }

    let plain = Plain {
        tree: doc.to_json(),
        selector,
        literals: doc.literals(),
    };
    let encoded = codec.encode(&plain, &rule)?;
    let (values, meta) = split_metadata(encoded)?;

    let fields = splice(&mut doc, &values, &Literals::new(), &plain.selector)?;
    metadata::attach(&mut doc, &meta);

    info!(fields, "encrypted");
    Ok(Outcome::Encrypted {
        output: doc.render(),
        fields,
    })
}

fn decrypt(mut doc: Document, codec: &Codec) -> Result<Outcome> {
    let located = locate::selector(&doc)?;
    let plain = codec.decode(&doc.to_json())?;
    let selector = reconcile(&located, &plain.selector)?;

    let fields = splice(&mut doc, &plain.tree, &plain.literals, &selector)?;
    metadata::detach(&mut doc);

    info!(fields, "decrypted");
    Ok(Outcome::Decrypted {
        output: doc.render(),
        fields,
    })
}

/// The selector to splice with on decrypt.
///
/// Every recorded path must still be tagged; otherwise its ciphertext would
/// be left behind. Tagged paths that were not recorded are tolerated.
fn reconcile(located: &Selector, recorded: &Selector) -> Result<Selector> {
    if let Some(untagged) = recorded.paths().find(|p| !located.contains(p)) {
        return Err(SpliceError::Untagged(untagged.to_string()).into());
    }
    let extra: BTreeSet<String> = located
        .paths()
        .filter(|p| !recorded.contains(p))
        .map(ToString::to_string)
        .collect();
    if !extra.is_empty() {
        warn!(paths = ?extra, "fields tagged after encryption were not encrypted; leaving them unchanged");
    }
    Ok(located.clone())
}

fn split_metadata(encoded: serde_json::Value) -> Result<(serde_json::Value, serde_json::Value)> {
    let serde_json::Value::Object(mut map) = encoded else {
        return Err(CipherError::RootNotObject.into());
    };
    let meta = map
        .shift_remove(METADATA_LABEL)
        .ok_or(CipherError::MissingMetadata)?;
    Ok((serde_json::Value::Object(map), meta))
}
