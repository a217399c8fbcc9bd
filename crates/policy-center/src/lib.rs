pub mod apply;
pub mod defaults;
pub mod errors;
pub mod loader;
pub mod model;

pub use apply::apply_override_to_snapshot;
pub use defaults::default_snapshot;
pub use errors::PolicyError;
pub use loader::{load_policy, load_policy_with_vars, POLICY_KEYS};
pub use model::{
    AuditPolicy, CommentPolicy, CommentWriteRequirement, PolicyProvenance, PolicySnapshot,
    PolicySource,
};
