use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracker_core_types::UserId;

use crate::errors::StoreError;

/// A registered user and the roles they hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub roles: BTreeSet<String>,
}

/// Accounts and role membership.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Creates the role if missing. Returns `true` when it was created.
    async fn ensure_role(&self, role: &str) -> Result<bool, StoreError>;

    async fn role_exists(&self, role: &str) -> Result<bool, StoreError>;

    async fn create_account(&self, email: &str) -> Result<Account, StoreError>;

    async fn find_account(&self, id: &UserId) -> Result<Option<Account>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn roles_of(&self, id: &UserId) -> Result<BTreeSet<String>, StoreError>;

    async fn add_to_role(&self, id: &UserId, role: &str) -> Result<(), StoreError>;

    /// Replace every role of the account with `role`, or with nothing when
    /// `role` is `None`.
    async fn set_single_role(&self, id: &UserId, role: Option<&str>) -> Result<(), StoreError>;

    async fn delete_account(&self, id: &UserId) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryMembership {
    roles: RwLock<BTreeSet<String>>,
    accounts: DashMap<UserId, Account>,
    by_email: DashMap<String, UserId>,
}

fn normalize_email(email: &str) -> Result<String, StoreError> {
    let email = email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(StoreError::Invalid(format!("'{email}' is not an email address")));
    }
    Ok(email)
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_role(&self, role: &str) -> Result<(), StoreError> {
        if self.roles.read().contains(role) {
            Ok(())
        } else {
            Err(StoreError::UnknownRole(role.to_string()))
        }
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembership {
    async fn ensure_role(&self, role: &str) -> Result<bool, StoreError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(StoreError::Invalid("role name must not be empty".into()));
        }
        let created = self.roles.write().insert(role.to_string());
        if created {
            info!(target = "store", role, "role created");
        }
        Ok(created)
    }

    async fn role_exists(&self, role: &str) -> Result<bool, StoreError> {
        Ok(self.roles.read().contains(role))
    }

    async fn create_account(&self, email: &str) -> Result<Account, StoreError> {
        let email = normalize_email(email)?;
        let account = Account {
            id: UserId::new(),
            email: email.clone(),
            roles: BTreeSet::new(),
        };
        match self.by_email.entry(email) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                return Err(StoreError::Duplicate(format!(
                    "account '{}' already exists",
                    entry.key()
                )))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(account.id.clone());
            }
        }
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: &UserId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = email.trim().to_ascii_lowercase();
        let Some(id) = self.by_email.get(&email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        self.find_account(&id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> =
            self.accounts.iter().map(|entry| entry.value().clone()).collect();
        accounts.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(accounts)
    }

    async fn roles_of(&self, id: &UserId) -> Result<BTreeSet<String>, StoreError> {
        self.accounts
            .get(id)
            .map(|entry| entry.roles.clone())
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn add_to_role(&self, id: &UserId, role: &str) -> Result<(), StoreError> {
        self.require_role(role)?;
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("account", id))?;
        account.roles.insert(role.to_string());
        Ok(())
    }

    async fn set_single_role(&self, id: &UserId, role: Option<&str>) -> Result<(), StoreError> {
        if let Some(role) = role {
            self.require_role(role)?;
        }
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("account", id))?;
        account.roles.clear();
        if let Some(role) = role {
            account.roles.insert(role.to_string());
        }
        Ok(())
    }

    async fn delete_account(&self, id: &UserId) -> Result<(), StoreError> {
        let (_, account) = self
            .accounts
            .remove(id)
            .ok_or_else(|| StoreError::not_found("account", id))?;
        self.by_email.remove(&account.email);
        info!(target = "store", email = %account.email, "account deleted");
        Ok(())
    }
}
