//! Resolves the signed-in caller of a request.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracker_authz::{AuthzError, PrincipalProvider};
use tracker_core_types::UserId;
use tracker_store::MembershipStore;

/// Per-request session state. `None` means nobody is signed in.
#[derive(Clone, Debug, Default)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

/// Looks roles up in the membership store on every request, so role changes
/// take effect without signing out.
pub struct SessionPrincipalProvider {
    session: Session,
    membership: Arc<dyn MembershipStore>,
}

impl SessionPrincipalProvider {
    pub fn new(session: Session, membership: Arc<dyn MembershipStore>) -> Self {
        Self {
            session,
            membership,
        }
    }
}

#[async_trait]
impl PrincipalProvider for SessionPrincipalProvider {
    async fn current_user_id(&self) -> Result<Option<UserId>, AuthzError> {
        Ok(self.session.user_id.clone())
    }

    async fn roles_of(&self, user: &UserId) -> Result<BTreeSet<String>, AuthzError> {
        self.membership
            .roles_of(user)
            .await
            .map_err(|err| AuthzError::PrincipalUnavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_authz::Principal;
    use tracker_store::InMemoryMembership;

    #[tokio::test]
    async fn signed_in_session_carries_current_roles() {
        let membership = Arc::new(InMemoryMembership::new());
        membership.ensure_role("manager").await.unwrap();
        let account = membership.create_account("m@example.com").await.unwrap();
        membership.add_to_role(&account.id, "manager").await.unwrap();

        let provider =
            SessionPrincipalProvider::new(Session::signed_in(account.id.clone()), membership);
        let principal = provider.current_principal().await.unwrap();
        assert_eq!(principal.id(), Some(&account.id));
        assert!(principal.has_role("manager"));
    }

    #[tokio::test]
    async fn anonymous_session_needs_no_store() {
        let provider =
            SessionPrincipalProvider::new(Session::anonymous(), Arc::new(InMemoryMembership::new()));
        assert_eq!(
            provider.current_principal().await.unwrap(),
            Principal::anonymous()
        );
    }

    #[tokio::test]
    async fn stale_session_is_an_infrastructure_error() {
        let provider = SessionPrincipalProvider::new(
            Session::signed_in(UserId::from("ghost")),
            Arc::new(InMemoryMembership::new()),
        );
        assert!(matches!(
            provider.current_principal().await,
            Err(AuthzError::PrincipalUnavailable(_))
        ));
    }
}
