use crate::model::{AuditPolicy, CommentPolicy, CommentWriteRequirement, PolicySnapshot};

pub fn default_snapshot() -> PolicySnapshot {
    PolicySnapshot {
        rev: 1,
        comments: CommentPolicy {
            write_requirement: CommentWriteRequirement::Strict,
        },
        audit: AuditPolicy {
            enabled: false,
            channel_capacity: 256,
        },
        provenance: Default::default(),
    }
}
