use thiserror::Error;
use tracker_core_types::ParseError;

/// Errors produced by the authorization surface.
///
/// `PermissionDenied` carries no detail about which rule refused.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("authorization configuration error: {0}")]
    Configuration(String),
    #[error("principal lookup failed: {0}")]
    PrincipalUnavailable(String),
}

impl AuthzError {
    pub fn is_denial(&self) -> bool {
        matches!(self, AuthzError::PermissionDenied)
    }
}

impl From<ParseError> for AuthzError {
    fn from(value: ParseError) -> Self {
        AuthzError::Configuration(value.to_string())
    }
}
