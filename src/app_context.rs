//! Wires configuration, policy, authorization and storage together.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracker_authz::{load_wiring_from_path, AuthorizationService, HandlerSet};
use tracker_core_types::{Comment, Project, Ticket};
use tracker_policy_center::{load_policy, PolicySnapshot};
use tracker_store::{InMemoryMembership, InMemoryRepository, MembershipStore};

use crate::accounts::{seed_accounts, SeedReport, UserAdmin};
use crate::audit::{spawn_audit_recorder, AuditTrail};
use crate::config::Config;
use crate::controllers::{
    CommentsController, HomeController, ProjectsController, TicketsController,
};
use crate::errors::{TrackerError, TrackerResult};
use crate::session::{Session, SessionPrincipalProvider};

pub struct AppContext {
    config: Arc<Config>,
    policy: Arc<PolicySnapshot>,
    authz: Arc<AuthorizationService>,
    membership: Arc<InMemoryMembership>,
    projects: Arc<InMemoryRepository<Project>>,
    tickets: Arc<InMemoryRepository<Ticket>>,
    comments: Arc<InMemoryRepository<Comment>>,
    seed: SeedReport,
    audit: Option<AuditTrail>,
}

/// Build the handler set from the configured wiring file, or the built-in one.
pub fn build_handler_set(wiring_path: Option<&PathBuf>) -> TrackerResult<HandlerSet> {
    match wiring_path {
        Some(path) => {
            let wiring = load_wiring_from_path(path)?;
            let handlers = HandlerSet::from_wiring(&wiring)?;
            info!(path = %path.display(), handlers = handlers.len(), "loaded handler wiring");
            Ok(handlers)
        }
        None => Ok(HandlerSet::standard()),
    }
}

pub async fn create_context(config: Config) -> TrackerResult<AppContext> {
    let policy = load_policy(&config.policy_paths)?;

    let handlers = build_handler_set(config.wiring_path.as_ref())?;
    let mut authz = AuthorizationService::new(Arc::new(handlers));
    let mut audit = None;
    if let Some(capacity) = policy.audit_capacity() {
        authz = authz.with_audit(capacity);
        if let Some(rx) = authz.subscribe() {
            let trail = AuditTrail::new(capacity);
            spawn_audit_recorder(rx, trail.clone());
            info!(capacity, "authorization audit enabled");
            audit = Some(trail);
        }
    }

    let membership = Arc::new(InMemoryMembership::new());
    let seed = seed_accounts(membership.as_ref(), &config).await?;

    Ok(AppContext {
        config: Arc::new(config),
        policy: Arc::new(policy),
        authz: Arc::new(authz),
        membership,
        projects: Arc::new(InMemoryRepository::new()),
        tickets: Arc::new(InMemoryRepository::new()),
        comments: Arc::new(InMemoryRepository::new()),
        seed,
        audit,
    })
}

impl AppContext {
    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn policy(&self) -> &PolicySnapshot {
        self.policy.as_ref()
    }

    pub fn authz(&self) -> Arc<AuthorizationService> {
        Arc::clone(&self.authz)
    }

    pub fn membership(&self) -> Arc<dyn MembershipStore> {
        self.membership.clone()
    }

    pub fn seed_report(&self) -> &SeedReport {
        &self.seed
    }

    /// Recorded decisions, when the policy enables auditing.
    pub fn audit_trail(&self) -> Option<&AuditTrail> {
        self.audit.as_ref()
    }

    pub fn projects_store(&self) -> &InMemoryRepository<Project> {
        &self.projects
    }

    pub fn tickets_store(&self) -> &InMemoryRepository<Ticket> {
        &self.tickets
    }

    pub fn comments_store(&self) -> &InMemoryRepository<Comment> {
        &self.comments
    }

    pub fn projects(&self) -> ProjectsController {
        ProjectsController::new(
            self.authz(),
            self.projects.clone(),
            self.tickets.clone(),
            self.comments.clone(),
        )
    }

    pub fn tickets(&self) -> TicketsController {
        TicketsController::new(
            self.authz(),
            self.projects.clone(),
            self.tickets.clone(),
            self.comments.clone(),
        )
    }

    pub fn comments(&self) -> CommentsController {
        CommentsController::new(
            self.authz(),
            self.tickets.clone(),
            self.comments.clone(),
            self.policy.comments.write_requirement,
        )
    }

    pub fn home(&self) -> HomeController {
        HomeController::new(
            self.authz(),
            self.projects.clone(),
            self.tickets.clone(),
            self.comments.clone(),
        )
    }

    pub fn users(&self) -> UserAdmin {
        UserAdmin::new(self.membership())
    }

    pub fn provider_for(&self, session: Session) -> SessionPrincipalProvider {
        SessionPrincipalProvider::new(session, self.membership())
    }

    /// Stand-in for the login flow: a session for the account with `email`.
    pub async fn sign_in(&self, email: &str) -> TrackerResult<Session> {
        self.membership
            .find_by_email(email)
            .await?
            .map(|account| Session::signed_in(account.id))
            .ok_or_else(|| TrackerError::not_found("account", email))
    }

    /// Register an account holding `role`, or no role for `none`.
    pub async fn register(&self, email: &str, role: Option<&str>) -> TrackerResult<Session> {
        let account = self.membership.create_account(email).await?;
        if let Some(role) = role {
            self.membership.ensure_role(role).await?;
            self.membership.add_to_role(&account.id, role).await?;
        }
        Ok(Session::signed_in(account.id))
    }
}
