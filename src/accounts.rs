//! Role seeding at start-up and the user administration surface.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use tracker_authz::{Principal, ADMINISTRATORS_ROLE, NO_ROLE};
use tracker_core_types::UserId;
use tracker_store::{Account, MembershipStore};

use crate::config::Config;
use crate::errors::{TrackerError, TrackerResult};

#[derive(Clone, Debug, Default, Serialize)]
pub struct SeedReport {
    pub roles_created: Vec<String>,
    pub admin_created: bool,
    pub admin_id: Option<UserId>,
}

/// Ensure the configured roles and the bootstrap administrator exist.
pub async fn seed_accounts(
    membership: &dyn MembershipStore,
    config: &Config,
) -> TrackerResult<SeedReport> {
    let mut report = SeedReport::default();
    for role in &config.seed_roles {
        if membership.ensure_role(role).await? {
            report.roles_created.push(role.clone());
        }
    }

    let email = config.bootstrap_admin.trim();
    if email.is_empty() {
        warn!(target = "accounts", "no bootstrap administrator configured");
        return Ok(report);
    }
    let account = match membership.find_by_email(email).await? {
        Some(account) => account,
        None => {
            report.admin_created = true;
            membership.create_account(email).await?
        }
    };
    if !membership.role_exists(ADMINISTRATORS_ROLE).await? {
        return Err(TrackerError::Configuration(format!(
            "role '{ADMINISTRATORS_ROLE}' is missing; add it to seed_roles"
        )));
    }
    membership.add_to_role(&account.id, ADMINISTRATORS_ROLE).await?;
    info!(target = "accounts", email, "bootstrap administrator ready");
    report.admin_id = Some(account.id);
    Ok(report)
}

/// One row of the user administration listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    /// First role held, or `none`.
    pub role: String,
}

impl From<Account> for UserSummary {
    fn from(account: Account) -> Self {
        let role = account
            .roles
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| NO_ROLE.to_string());
        Self {
            id: account.id,
            email: account.email,
            role,
        }
    }
}

/// Account management restricted to administrators.
pub struct UserAdmin {
    membership: Arc<dyn MembershipStore>,
}

impl UserAdmin {
    pub fn new(membership: Arc<dyn MembershipStore>) -> Self {
        Self { membership }
    }

    fn ensure_admin(principal: &Principal) -> TrackerResult<()> {
        if principal.has_role(ADMINISTRATORS_ROLE) {
            Ok(())
        } else {
            Err(TrackerError::Forbidden)
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        search: Option<&str>,
        role_filter: Option<&str>,
    ) -> TrackerResult<Vec<UserSummary>> {
        Self::ensure_admin(principal)?;
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase);
        let role_filter = role_filter.map(str::trim).filter(|s| !s.is_empty());
        Ok(self
            .membership
            .list_accounts()
            .await?
            .into_iter()
            .map(UserSummary::from)
            .filter(|user| {
                search
                    .as_deref()
                    .map_or(true, |needle| user.email.contains(needle))
            })
            .filter(|user| role_filter.map_or(true, |role| user.role == role))
            .collect())
    }

    /// Give `id` exactly one role; `none` removes every role.
    pub async fn assign_role(
        &self,
        principal: &Principal,
        id: &UserId,
        role: &str,
    ) -> TrackerResult<UserSummary> {
        Self::ensure_admin(principal)?;
        let role = role.trim();
        let role = (role != NO_ROLE).then_some(role);
        if let Some(name) = role {
            if !self.membership.role_exists(name).await? {
                return Err(TrackerError::Invalid(format!("unknown role '{name}'")));
            }
        }
        self.membership.set_single_role(id, role).await?;
        let account = self
            .membership
            .find_account(id)
            .await?
            .ok_or_else(|| TrackerError::not_found("account", id))?;
        info!(target = "accounts", email = %account.email, role = ?role, "role assigned");
        Ok(account.into())
    }

    pub async fn delete(&self, principal: &Principal, id: &UserId) -> TrackerResult<()> {
        Self::ensure_admin(principal)?;
        self.membership.delete_account(id).await?;
        Ok(())
    }
}
