//! Leaf-by-leaf encryption of a plain-data tree.

use serde_json::{Number, Value};
use sha2::{Digest, Sha512};
use tracing::trace;

use super::scope::Scope;
use crate::core::cipher::{Aes, ValueType};
use crate::core::document::{Literals, Scalar};
use crate::core::path::push_pointer;
use crate::error::{CipherError, Result};

/// Running message authentication code over in-scope plaintexts.
pub(super) struct Mac(Sha512);

impl Mac {
    pub(super) fn new() -> Self {
        Self(Sha512::new())
    }

    fn update(&mut self, plaintext: &[u8]) {
        self.0.update(plaintext);
    }

    /// Upper-case hex digest.
    pub(super) fn finish(self) -> String {
        self.0
            .finalize()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }
}

/// Encrypt every in-scope leaf in place. Returns the number encrypted.
///
/// Strings listed in `literals` are sealed in their source spelling.
pub(super) fn encrypt(
    tree: &mut Value,
    literals: &Literals,
    scope: &Scope<'_>,
    aes: &Aes,
    mac: &mut Mac,
) -> Result<usize> {
    let mut count = 0;
    walk(tree, &mut Vec::new(), &mut String::new(), &mut |path, pointer, leaf| {
        if leaf.is_null() || !scope.admits(path) {
            return Ok(());
        }
        let (plaintext, kind) = match literals.get(pointer) {
            Some(raw) if leaf.is_string() => (raw.clone(), ValueType::Literal),
            _ => plaintext_of(leaf),
        };
        mac.update(plaintext.as_bytes());
        *leaf = Value::String(aes.encrypt(plaintext.as_bytes(), kind, &aad(path))?);
        trace!(path = %path.join("."), "encrypted value");
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Decrypt every in-scope leaf in place. Returns the number decrypted.
///
/// Strings sealed in their source spelling are recorded in `literals`.
pub(super) fn decrypt(
    tree: &mut Value,
    literals: &mut Literals,
    scope: &Scope<'_>,
    aes: &Aes,
    mac: &mut Mac,
) -> Result<usize> {
    let mut count = 0;
    walk(tree, &mut Vec::new(), &mut String::new(), &mut |path, pointer, leaf| {
        if leaf.is_null() || !scope.admits(path) {
            return Ok(());
        }
        let sealed = leaf
            .as_str()
            .ok_or_else(|| CipherError::NotEncryptedValue(path.join(".")))?;
        if !crate::core::cipher::aes::is_encrypted(sealed) {
            return Err(CipherError::NotEncryptedValue(path.join(".")).into());
        }
        let (plaintext, kind) = aes.decrypt(sealed, &aad(path))?;
        mac.update(&plaintext);
        let (value, literal) = value_of(&plaintext, kind, path)?;
        if let Some(raw) = literal {
            literals.insert(pointer.to_string(), raw);
        }
        *leaf = value;
        trace!(path = %path.join("."), "decrypted value");
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Additional data binding a value to its location.
fn aad(path: &[String]) -> String {
    let mut aad = path.join(":");
    aad.push(':');
    aad
}

/// Visit every leaf with its label path and JSON pointer.
///
/// Array elements share the label path of their field but not its pointer.
fn walk<F>(
    node: &mut Value,
    path: &mut Vec<String>,
    pointer: &mut String,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[String], &str, &mut Value) -> Result<()>,
{
    let len = pointer.len();
    match node {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                path.push(key.clone());
                push_pointer(pointer, key);
                walk(value, path, pointer, f)?;
                pointer.truncate(len);
                path.pop();
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                push_pointer(pointer, &i.to_string());
                walk(item, path, pointer, f)?;
                pointer.truncate(len);
            }
            Ok(())
        }
        leaf => f(path, pointer, leaf),
    }
}

fn plaintext_of(leaf: &Value) -> (String, ValueType) {
    match leaf {
        Value::String(s) => (s.clone(), ValueType::Str),
        Value::Bool(b) => (b.to_string(), ValueType::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => (n.to_string(), ValueType::Int),
        other => (other.to_string(), ValueType::Float),
    }
}

/// The decrypted value, plus its source spelling for `literal` values.
fn value_of(
    plaintext: &[u8],
    kind: ValueType,
    path: &[String],
) -> Result<(Value, Option<String>)> {
    let malformed = |reason: &str| CipherError::MalformedValue {
        path: path.join("."),
        reason: reason.to_string(),
    };
    let text = std::str::from_utf8(plaintext).map_err(|_| malformed("plaintext is not UTF-8"))?;
    let value = match kind {
        ValueType::Str => Value::String(text.to_string()),
        ValueType::Bool => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(malformed("invalid bool plaintext").into()),
        },
        ValueType::Int | ValueType::Float => Value::Number(
            serde_json::from_str::<Number>(text)
                .map_err(|_| malformed("invalid number plaintext"))?,
        ),
        ValueType::Literal => {
            let scalar =
                Scalar::string_literal(text).map_err(|_| malformed("invalid string literal"))?;
            return Ok((scalar.value, Some(scalar.raw)));
        }
    };
    Ok((value, None))
}
