//! Application-level errors and their HTTP mapping.

use thiserror::Error;
use tracker_authz::{AuthzError, WiringError};
use tracker_policy_center::PolicyError;
use tracker_store::StoreError;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Authorization failed. Never carries the reason.
    #[error("forbidden")]
    Forbidden,
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        TrackerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TrackerError::Forbidden => 403,
            TrackerError::NotFound { .. } => 404,
            TrackerError::Invalid(_) => 422,
            TrackerError::Configuration(_) | TrackerError::Infrastructure(_) => 500,
        }
    }

    /// Message safe to show to the caller.
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Forbidden => "Forbidden".to_string(),
            TrackerError::NotFound { kind, .. } => format!("{kind} not found"),
            TrackerError::Invalid(msg) => msg.clone(),
            TrackerError::Configuration(_) | TrackerError::Infrastructure(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, TrackerError::Forbidden)
    }
}

impl From<AuthzError> for TrackerError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::PermissionDenied => TrackerError::Forbidden,
            AuthzError::Configuration(msg) => TrackerError::Configuration(msg),
            AuthzError::PrincipalUnavailable(msg) => TrackerError::Infrastructure(msg),
        }
    }
}

impl From<WiringError> for TrackerError {
    fn from(value: WiringError) -> Self {
        TrackerError::Configuration(value.to_string())
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { kind, id } => TrackerError::NotFound { kind, id },
            StoreError::Duplicate(msg) | StoreError::Invalid(msg) => TrackerError::Invalid(msg),
            StoreError::UnknownRole(role) => {
                TrackerError::Configuration(format!("role '{role}' does not exist"))
            }
            StoreError::Io(err) => TrackerError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PolicyError> for TrackerError {
    fn from(value: PolicyError) -> Self {
        TrackerError::Configuration(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_maps_to_403_without_detail() {
        let err: TrackerError = AuthzError::PermissionDenied.into();
        assert_eq!(err.http_status(), 403);
        assert_eq!(err.user_message(), "Forbidden");
    }

    #[test]
    fn infrastructure_is_distinct_from_denial() {
        let err: TrackerError = AuthzError::PrincipalUnavailable("db down".into()).into();
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_forbidden());
        assert!(!err.user_message().contains("db down"));
    }

    #[test]
    fn store_errors_keep_their_class() {
        let err: TrackerError = StoreError::not_found("ticket", 9).into();
        assert_eq!(err.http_status(), 404);
        let err: TrackerError = StoreError::Invalid("bad".into()).into();
        assert_eq!(err.http_status(), 422);
    }
}
