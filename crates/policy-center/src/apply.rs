use serde_json::Value;

use crate::errors::PolicyError;
use crate::model::{CommentWriteRequirement, PolicySnapshot, PolicySource};

pub fn apply_override_to_snapshot(
    snapshot: &mut PolicySnapshot,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    let changed = match path {
        "comments.write_requirement" => {
            let candidate: CommentWriteRequirement = to_str(value)?.parse()?;
            let changed = snapshot.comments.write_requirement != candidate;
            snapshot.comments.write_requirement = candidate;
            changed
        }
        "audit.enabled" => merge_bool(&mut snapshot.audit.enabled, to_bool(value)?),
        "audit.channel_capacity" => {
            merge_capacity(&mut snapshot.audit.channel_capacity, to_usize(value)?)?
        }
        path => return Err(PolicyError::UnsupportedPath(path.to_string())),
    };
    if changed {
        snapshot.set_provenance(path, source);
    }
    Ok(())
}

fn merge_bool(target: &mut bool, candidate: bool) -> bool {
    let original = *target;
    *target = candidate;
    *target != original
}

fn merge_capacity(target: &mut usize, candidate: usize) -> Result<bool, PolicyError> {
    if candidate == 0 {
        return Err(PolicyError::InvalidValue(
            "audit.channel_capacity must be positive".into(),
        ));
    }
    let original = *target;
    *target = candidate;
    Ok(*target != original)
}

fn to_usize(value: &Value) -> Result<usize, PolicyError> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected integer, got {value}")))
}

fn to_bool(value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected bool, got {value}")))
}

fn to_str(value: &Value) -> Result<&str, PolicyError> {
    value
        .as_str()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected string, got {value}")))
}
