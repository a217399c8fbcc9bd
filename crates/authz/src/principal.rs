use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracker_core_types::UserId;

use crate::errors::AuthzError;

/// The acting party of a single request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Principal {
    Anonymous,
    User { id: UserId, roles: BTreeSet<String> },
}

impl Principal {
    pub fn anonymous() -> Self {
        Principal::Anonymous
    }

    pub fn user<I, S>(id: impl Into<UserId>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Principal::User {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id(&self) -> Option<&UserId> {
        match self {
            Principal::Anonymous => None,
            Principal::User { id, .. } => Some(id),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Principal::Anonymous => false,
            Principal::User { roles, .. } => roles.contains(role),
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        let roles = match self {
            Principal::Anonymous => None,
            Principal::User { roles, .. } => Some(roles),
        };
        roles.into_iter().flatten().map(String::as_str)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }
}

/// Session-side collaborator that knows who is calling.
#[async_trait]
pub trait PrincipalProvider: Send + Sync {
    async fn current_user_id(&self) -> Result<Option<UserId>, AuthzError>;

    async fn roles_of(&self, user: &UserId) -> Result<BTreeSet<String>, AuthzError>;

    async fn current_principal(&self) -> Result<Principal, AuthzError> {
        match self.current_user_id().await? {
            None => Ok(Principal::Anonymous),
            Some(id) => {
                let roles = self.roles_of(&id).await?;
                Ok(Principal::User { id, roles })
            }
        }
    }
}

/// Provider that always answers with the same principal.
#[derive(Clone, Debug)]
pub struct StaticPrincipal(pub Principal);

#[async_trait]
impl PrincipalProvider for StaticPrincipal {
    async fn current_user_id(&self) -> Result<Option<UserId>, AuthzError> {
        Ok(self.0.id().cloned())
    }

    async fn roles_of(&self, user: &UserId) -> Result<BTreeSet<String>, AuthzError> {
        if self.0.id() == Some(user) {
            Ok(self.0.roles().map(str::to_string).collect())
        } else {
            Ok(BTreeSet::new())
        }
    }

    async fn current_principal(&self) -> Result<Principal, AuthzError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_holds_no_roles() {
        let anon = Principal::anonymous();
        assert!(anon.id().is_none());
        assert!(!anon.has_role("admin"));
        assert_eq!(anon.roles().count(), 0);
    }

    #[tokio::test]
    async fn default_current_principal_combines_id_and_roles() {
        struct Fixed;

        #[async_trait]
        impl PrincipalProvider for Fixed {
            async fn current_user_id(&self) -> Result<Option<UserId>, AuthzError> {
                Ok(Some(UserId::from("alice")))
            }

            async fn roles_of(&self, _user: &UserId) -> Result<BTreeSet<String>, AuthzError> {
                Ok(["manager".to_string()].into_iter().collect())
            }
        }

        let principal = Fixed.current_principal().await.unwrap();
        assert_eq!(principal.id(), Some(&UserId::from("alice")));
        assert!(principal.has_role("manager"));
    }
}
