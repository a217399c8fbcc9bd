use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PolicyError;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PolicySnapshot {
    pub rev: u64,
    pub comments: CommentPolicy,
    pub audit: AuditPolicy,
    pub provenance: BTreeMap<String, PolicyProvenance>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CommentPolicy {
    pub write_requirement: CommentWriteRequirement,
}

/// Which requirement guards comment edit and delete.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentWriteRequirement {
    /// Edit checks `UpdateComment`, delete checks `DeleteComment`.
    #[default]
    Strict,
    /// Edit and delete both check `CreateComment`.
    Legacy,
}

impl CommentWriteRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentWriteRequirement::Strict => "strict",
            CommentWriteRequirement::Legacy => "legacy",
        }
    }
}

impl fmt::Display for CommentWriteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentWriteRequirement {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(CommentWriteRequirement::Strict),
            "legacy" => Ok(CommentWriteRequirement::Legacy),
            other => Err(PolicyError::InvalidValue(format!(
                "expected 'strict' or 'legacy', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AuditPolicy {
    pub enabled: bool,
    pub channel_capacity: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyProvenance {
    pub path: String,
    pub source: PolicySource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
    Cli,
}

impl PolicySnapshot {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(
            path.to_string(),
            PolicyProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<PolicySource> {
        self.provenance.get(path).map(|entry| entry.source)
    }

    /// Audit channel capacity when auditing is on.
    pub fn audit_capacity(&self) -> Option<usize> {
        self.audit.enabled.then_some(self.audit.channel_capacity)
    }
}
