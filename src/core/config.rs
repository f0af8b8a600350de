//! Creation policy management.
//!
//! Handles locating, reading, and validating `.sops.yaml` policy files and
//! selecting the creation rule that applies to a document.

use std::env;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::core::cipher;
use crate::core::constants::{CONFIG_FILE, DEFAULT_UNENCRYPTED_SUFFIX};
use crate::core::envelope::ScopeRules;
use crate::core::keyservice::{KeyGroup, MasterKey};
use crate::core::path::Selector;
use crate::error::{PolicyError, Result};

/// Policy file contents.
#[derive(Debug, Default, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub creation_rules: Vec<RuleConfig>,
}

/// One entry of `creation_rules` as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Documents this rule applies to. A rule without it matches all.
    #[serde(default)]
    pub path_regex: Option<String>,
    /// Comma-separated age recipients, or a list of them.
    #[serde(default)]
    pub age: Option<Recipients>,
    #[serde(default)]
    pub key_groups: Vec<KeyGroupConfig>,
    #[serde(default)]
    pub shamir_threshold: Option<usize>,
    #[serde(flatten)]
    pub rules: ScopeRules,
}

/// Recipients given either as `age1a,age1b` or as a YAML list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    Joined(String),
    List(Vec<String>),
}

impl Recipients {
    fn split(&self) -> Vec<String> {
        let items: Vec<&str> = match self {
            Self::Joined(s) => s.split(',').collect(),
            Self::List(list) => list.iter().map(String::as_str).collect(),
        };
        items
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyGroupConfig {
    #[serde(default)]
    pub age: Vec<String>,
}

/// The validated rule an encryption runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRule {
    pub key_groups: Vec<KeyGroup>,
    pub shamir_threshold: Option<usize>,
    pub rules: ScopeRules,
}

impl CreationRule {
    /// Validate a configured rule.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if the rule has no recipients, an invalid
    /// recipient, more than one key group, or conflicting exclusion rules.
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let mut key_groups: Vec<KeyGroup> = config
            .key_groups
            .iter()
            .map(|g| KeyGroup {
                age: g.age.iter().map(|r| MasterKey::new(r.trim())).collect(),
            })
            .filter(|g| !g.is_empty())
            .collect();
        if let Some(age) = &config.age {
            let keys: Vec<MasterKey> = age.split().into_iter().map(MasterKey::new).collect();
            if !keys.is_empty() {
                key_groups.insert(0, KeyGroup { age: keys });
            }
        }

        if key_groups.is_empty() {
            return Err(PolicyError::NoRecipients.into());
        }
        if key_groups.len() > 1 {
            return Err(PolicyError::ShamirUnsupported(key_groups.len()).into());
        }
        for key in key_groups.iter().flat_map(|g| &g.age) {
            cipher::parse_recipient(&key.recipient)
                .map_err(|_| PolicyError::InvalidRecipient(key.recipient.clone()))?;
        }

        let mut rules = config.rules.clone();
        rules.compile(&Selector::default())?;
        if rules == ScopeRules::default() {
            rules.unencrypted_suffix = Some(DEFAULT_UNENCRYPTED_SUFFIX.to_string());
        }

        Ok(Self {
            key_groups,
            shamir_threshold: config.shamir_threshold,
            rules,
        })
    }
}

impl Policy {
    /// Find the policy file by walking up from `start`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotFound` if no directory up to the root holds one.
    pub fn find(start: &Path) -> Result<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| PolicyError::NotFound(start.to_path_buf()).into())
    }

    /// Load a policy file.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::ReadFile` if the file cannot be read and
    /// `PolicyError::Parse` if the YAML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading policy");
        let contents = std::fs::read_to_string(path).map_err(PolicyError::ReadFile)?;
        let policy: Self = serde_yaml::from_str(&contents).map_err(PolicyError::Parse)?;
        debug!(rules = policy.creation_rules.len(), "policy loaded");
        Ok(policy)
    }

    /// The first rule whose `path_regex` matches `file`.
    ///
    /// `file` is matched relative to `base` when it lies under it.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NoMatchingRule` if no rule applies, or the
    /// validation error of the matching rule.
    pub fn rule_for(&self, file: &Path, base: &Path) -> Result<CreationRule> {
        let relative = file.strip_prefix(base).unwrap_or(file);
        let name = relative.to_string_lossy().replace('\\', "/");

        for (index, rule) in self.creation_rules.iter().enumerate() {
            let matches = match &rule.path_regex {
                None => true,
                Some(pattern) => Regex::new(pattern)
                    .map_err(|e| PolicyError::InvalidRegex {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?
                    .is_match(&name),
            };
            if matches {
                debug!(rule = index, path = %name, "creation rule matched");
                return CreationRule::from_config(rule);
            }
        }
        Err(PolicyError::NoMatchingRule(name).into())
    }
}

/// Resolve the creation rule for `file`.
///
/// Uses `explicit` as the policy file when given, otherwise searches from
/// the current directory upwards.
///
/// # Errors
///
/// Returns `PolicyError` if no usable rule is found.
pub fn resolve(file: &Path, explicit: Option<&Path>) -> Result<CreationRule> {
    let cwd = env::current_dir()?;
    let path = match explicit {
        Some(p) if p.is_file() => cwd.join(p),
        Some(p) => return Err(PolicyError::NotFound(p.to_path_buf()).into()),
        None => Policy::find(&cwd)?,
    };
    let policy = Policy::load(&path)?;
    let base = path.parent().unwrap_or(&cwd);
    policy.rule_for(&cwd.join(file), base)
}
