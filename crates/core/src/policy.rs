//! Access policies, sidecar overlays, and filename pattern rules.
//!
//! Policies are recomputed per request by overlaying directory sidecar files
//! from the served root down to the directory owning the request path. This
//! module holds the pure data model and evaluation logic; the filesystem walk
//! lives in `shelf-storage`.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Externally verified caller reference.
///
/// Used only as a lookup key into per-user override rules; never parsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from its externally resolved value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identity as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-user upload/delete override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverride {
    /// Identity the override applies to.
    pub identity: Identity,
    /// Whether this user may upload.
    #[serde(default)]
    pub upload: bool,
    /// Whether this user may delete.
    #[serde(default)]
    pub delete: bool,
}

/// One filename rule: the first rule whose pattern matches decides access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    /// Regular expression tested against entry base names.
    pub regex: String,
    /// Whether a match allows or denies the entry.
    pub allow: bool,
}

/// Effective access policy for a request path.
///
/// Produced by seeding from process-wide defaults and overlaying sidecar
/// files ancestor to descendant. Never cached across requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Default upload permission for callers with no matching override.
    #[serde(rename = "upload")]
    pub allow_upload: bool,
    /// Default delete permission for callers with no matching override.
    #[serde(rename = "delete")]
    pub allow_delete: bool,
    /// Per-user overrides, evaluated first-match.
    #[serde(default)]
    pub users: Vec<UserOverride>,
    /// Filename rules, evaluated first-match.
    #[serde(default, rename = "accessTables")]
    pub access_tables: Vec<PathRule>,
}

impl AccessPolicy {
    /// Seed a policy from the process-wide default flags.
    pub fn seeded(allow_upload: bool, allow_delete: bool) -> Self {
        Self {
            allow_upload,
            allow_delete,
            users: Vec::new(),
            access_tables: Vec::new(),
        }
    }

    /// Overlay one sidecar level: present fields fully replace, absent
    /// fields inherit unchanged.
    pub fn overlay(&mut self, sidecar: SidecarConfig) {
        if let Some(upload) = sidecar.upload {
            self.allow_upload = upload;
        }
        if let Some(delete) = sidecar.delete {
            self.allow_delete = delete;
        }
        if let Some(users) = sidecar.users {
            self.users = users;
        }
        if let Some(tables) = sidecar.access_tables {
            self.access_tables = tables;
        }
    }

    /// Evaluate filename rules in order; the first matching rule decides.
    /// No matching rule allows the name.
    pub fn can_access(&self, patterns: &PatternCache, file_name: &str) -> bool {
        for rule in &self.access_tables {
            if patterns.matches(&rule.regex, file_name) {
                return rule.allow;
            }
        }
        true
    }

    /// Whether the caller may upload: the first matching user override
    /// decides, else the policy's default flag. An absent identity
    /// (unauthenticated caller) always falls back to the default flag.
    pub fn can_upload(&self, identity: Option<&Identity>) -> bool {
        match self.user_override(identity) {
            Some(user) => user.upload,
            None => self.allow_upload,
        }
    }

    /// Whether the caller may delete; same resolution as [`can_upload`].
    ///
    /// [`can_upload`]: AccessPolicy::can_upload
    pub fn can_delete(&self, identity: Option<&Identity>) -> bool {
        match self.user_override(identity) {
            Some(user) => user.delete,
            None => self.allow_delete,
        }
    }

    fn user_override(&self, identity: Option<&Identity>) -> Option<&UserOverride> {
        let identity = identity?;
        self.users.iter().find(|user| &user.identity == identity)
    }
}

/// Serde model of one sidecar file.
///
/// Every field is optional so an overlay can distinguish "absent, inherit"
/// from an explicit value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SidecarConfig {
    /// Replaces the inherited upload default when present.
    pub upload: Option<bool>,
    /// Replaces the inherited delete default when present.
    pub delete: Option<bool>,
    /// Replaces (does not append to) inherited user overrides when present.
    pub users: Option<Vec<UserOverride>>,
    /// Replaces (does not append to) inherited filename rules when present.
    #[serde(rename = "accessTables")]
    pub access_tables: Option<Vec<PathRule>>,
}

impl SidecarConfig {
    /// Parse a sidecar document. An empty document is a valid no-op sidecar;
    /// unknown keys are ignored.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Synchronized cache of compiled filename patterns.
///
/// Shared across concurrent policy resolutions. Invalid patterns are cached
/// as permanently non-matching, so each pattern is compiled at most once and
/// a bad rule can never crash resolution.
#[derive(Default)]
pub struct PatternCache {
    inner: Mutex<HashMap<String, Option<Regex>>>,
}

impl PatternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Test `text` against `pattern`, compiling and caching on first use.
    pub fn matches(&self, pattern: &str, text: &str) -> bool {
        let compiled = {
            let mut cache = self.inner.lock();
            cache
                .entry(pattern.to_string())
                .or_insert_with(|| match Regex::new(pattern) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        tracing::warn!(
                            pattern,
                            error = %err,
                            "invalid access rule pattern, rule will never match"
                        );
                        None
                    }
                })
                .clone()
        };
        compiled.is_some_and(|regex| regex.is_match(text))
    }

    /// Number of cached patterns (valid and invalid alike).
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
