//! Builds the policy snapshot from its layers: built-in defaults, YAML files
//! in the order given, `TRACKER_POLICY__*` keys, the JSON override variable,
//! then the CLI override list. A key that changes remembers its layer.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::apply::apply_override_to_snapshot;
use crate::defaults::default_snapshot;
use crate::errors::PolicyError;
use crate::model::{PolicySnapshot, PolicySource};

const KEY_VAR_PREFIX: &str = "TRACKER_POLICY__";
const JSON_VAR: &str = "TRACKER_POLICY_OVERRIDE_JSON";
const CLI_VAR: &str = "TRACKER_POLICY_CLI_OVERRIDES";

/// Every key a layer may set.
pub const POLICY_KEYS: [&str; 3] = [
    "comments.write_requirement",
    "audit.enabled",
    "audit.channel_capacity",
];

struct Setting {
    key: String,
    value: Value,
}

/// Policy from the built-in defaults, `files` and the process environment.
pub fn load_policy(files: &[PathBuf]) -> Result<PolicySnapshot, PolicyError> {
    load_policy_with_vars(files, env::vars())
}

/// Like [`load_policy`], reading the `TRACKER_POLICY*` variables from `vars`.
pub fn load_policy_with_vars<I>(files: &[PathBuf], vars: I) -> Result<PolicySnapshot, PolicyError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut snapshot = default_snapshot();
    for key in POLICY_KEYS {
        snapshot.set_provenance(key, PolicySource::Builtin);
    }

    for path in files {
        if path.exists() {
            apply(&mut snapshot, file_settings(path)?, PolicySource::File)?;
        } else {
            debug!(target = "policy", path = %path.display(), "policy file absent");
        }
    }

    let vars: BTreeMap<String, String> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with("TRACKER_POLICY"))
        .collect();

    let mut env_settings: Vec<Setting> = vars
        .iter()
        .filter_map(|(name, raw)| {
            let key = env_key(name.strip_prefix(KEY_VAR_PREFIX)?)?;
            Some(Setting {
                key,
                value: scalar(raw),
            })
        })
        .collect();
    if let Some(raw) = vars.get(JSON_VAR).filter(|raw| !raw.trim().is_empty()) {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| PolicyError::Invalid(format!("{JSON_VAR}: {err}")))?;
        collect_leaves(String::new(), value, &mut env_settings);
    }
    apply(&mut snapshot, env_settings, PolicySource::Env)?;

    if let Some(raw) = vars.get(CLI_VAR) {
        apply(&mut snapshot, cli_settings(raw), PolicySource::Cli)?;
    }
    Ok(snapshot)
}

fn apply(
    snapshot: &mut PolicySnapshot,
    settings: Vec<Setting>,
    source: PolicySource,
) -> Result<(), PolicyError> {
    for setting in settings {
        apply_override_to_snapshot(snapshot, &setting.key, &setting.value, source)?;
    }
    Ok(())
}

fn file_settings(path: &Path) -> Result<Vec<Setting>, PolicyError> {
    let content = fs::read_to_string(path)
        .map_err(|err| PolicyError::Io(format!("{}: {err}", path.display())))?;
    let document: Value = serde_yaml::from_str(&content)
        .map_err(|err| PolicyError::Invalid(format!("{}: {err}", path.display())))?;
    let mut settings = Vec::new();
    collect_leaves(String::new(), document, &mut settings);
    Ok(settings)
}

/// `COMMENTS__WRITE_REQUIREMENT` becomes `comments.write_requirement`.
fn env_key(suffix: &str) -> Option<String> {
    let key = suffix
        .split("__")
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(".");
    (!key.is_empty()).then_some(key)
}

/// `audit.enabled=true,audit.channel_capacity=8`
fn cli_settings(raw: &str) -> Vec<Setting> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            let key = key.trim();
            (!key.is_empty()).then(|| Setting {
                key: key.to_ascii_lowercase(),
                value: scalar(value.trim()),
            })
        })
        .collect()
}

/// JSON literal when it parses as one, otherwise a plain string.
fn scalar(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn collect_leaves(key: String, value: Value, out: &mut Vec<Setting>) {
    match value {
        Value::Object(map) => {
            for (child, value) in map {
                let child = child.trim().to_ascii_lowercase();
                let nested = if key.is_empty() {
                    child
                } else {
                    format!("{key}.{child}")
                };
                collect_leaves(nested, value, out);
            }
        }
        value if !key.is_empty() => out.push(Setting { key, value }),
        _ => {}
    }
}
