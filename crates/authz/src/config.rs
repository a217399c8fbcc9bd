//! Handler wiring definitions for the authorization service.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker_core_types::ResourceKind;

use crate::errors::AuthzError;

pub const WIRING_VERSION: u32 = 1;

/// Static wiring file: which handlers guard which resource kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerWiring {
    pub version: u32,
    pub kinds: Vec<KindWiring>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindWiring {
    pub kind: ResourceKind,
    pub handlers: Vec<HandlerSpec>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HandlerSpec {
    Admin,
    Owner,
    ManagerOwner,
    PublicRead,
}

/// Errors surfaced while loading a wiring file.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize wiring: {0}")]
    Deserialize(String),
}

impl From<WiringError> for AuthzError {
    fn from(value: WiringError) -> Self {
        AuthzError::Configuration(value.to_string())
    }
}

impl HandlerWiring {
    pub fn validate(&self) -> Result<(), AuthzError> {
        if self.version != WIRING_VERSION {
            return Err(AuthzError::Configuration(format!(
                "unsupported wiring version {} (expected {WIRING_VERSION})",
                self.version
            )));
        }

        let mut seen_kinds = HashSet::new();
        for entry in &self.kinds {
            if !seen_kinds.insert(entry.kind) {
                return Err(AuthzError::Configuration(format!(
                    "resource kind '{}' wired more than once",
                    entry.kind
                )));
            }
            let mut seen_handlers = HashSet::new();
            for spec in &entry.handlers {
                if !seen_handlers.insert(*spec) {
                    return Err(AuthzError::Configuration(format!(
                        "handler {spec:?} listed twice for '{}'",
                        entry.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn load_wiring_from_reader<R: Read>(mut reader: R) -> Result<HandlerWiring, WiringError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_wiring_str(&buf)
}

pub fn load_wiring_from_path(path: impl AsRef<Path>) -> Result<HandlerWiring, WiringError> {
    let file = File::open(path.as_ref())?;
    load_wiring_from_reader(file)
}

pub fn parse_wiring_str(raw: &str) -> Result<HandlerWiring, WiringError> {
    match serde_json::from_str(raw) {
        Ok(wiring) => Ok(wiring),
        Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| {
            WiringError::Deserialize(format!(
                "json error: {}; yaml error: {}",
                json_err, yaml_err
            ))
        }),
    }
}

/// Wiring equivalent to [`crate::HandlerSet::standard`].
pub fn default_wiring() -> HandlerWiring {
    HandlerWiring {
        version: WIRING_VERSION,
        kinds: vec![
            KindWiring {
                kind: ResourceKind::Project,
                handlers: vec![
                    HandlerSpec::Admin,
                    HandlerSpec::ManagerOwner,
                    HandlerSpec::PublicRead,
                ],
                notes: Some("owners only gain rights while holding the manager role".into()),
            },
            KindWiring {
                kind: ResourceKind::Ticket,
                handlers: vec![
                    HandlerSpec::Admin,
                    HandlerSpec::Owner,
                    HandlerSpec::PublicRead,
                ],
                notes: None,
            },
            KindWiring {
                kind: ResourceKind::Comment,
                handlers: vec![HandlerSpec::Admin, HandlerSpec::Owner],
                notes: Some("no public read".into()),
            },
        ],
    }
}
