use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use tracker_core_types::{AsResource, ResourceKind, UserId};

use crate::context::EvaluationContext;
use crate::errors::AuthzError;
use crate::handlers::{HandlerOutcome, HandlerSet};
use crate::principal::{Principal, PrincipalProvider};
use crate::registry::Requirement;

/// Binary outcome handed back to callers; carries no reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationResult {
    Succeeded,
    Failed,
}

impl AuthorizationResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, AuthorizationResult::Succeeded)
    }

    pub fn into_result(self) -> Result<(), AuthzError> {
        match self {
            AuthorizationResult::Succeeded => Ok(()),
            AuthorizationResult::Failed => Err(AuthzError::PermissionDenied),
        }
    }
}

/// Event emitted for every decision when auditing is enabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthzDecisionEvent {
    pub requirement: String,
    pub kind: ResourceKind,
    pub user_id: Option<UserId>,
    pub succeeded: bool,
    /// Name of the handler that granted access, if any.
    pub handler: Option<String>,
    pub timestamp: SystemTime,
}

/// Runs the handlers registered for a resource's kind and ORs their answers.
pub struct AuthorizationService {
    handlers: Arc<HandlerSet>,
    events: Option<broadcast::Sender<AuthzDecisionEvent>>,
}

impl AuthorizationService {
    pub fn new(handlers: Arc<HandlerSet>) -> Self {
        Self {
            handlers,
            events: None,
        }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(HandlerSet::standard()))
    }

    pub fn with_audit(mut self, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        self.events = Some(tx);
        self
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<AuthzDecisionEvent>> {
        self.events.as_ref().map(broadcast::Sender::subscribe)
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    pub fn authorize<R: AsResource + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        requirement: &Requirement,
    ) -> AuthorizationResult {
        let resource = resource.as_resource();
        let kind = resource.kind();
        if requirement.kind() != kind {
            debug!(
                target = "authz",
                requirement = requirement.name(),
                %kind,
                "requirement targets a different resource kind"
            );
        }

        let ctx = EvaluationContext::new(principal, resource, requirement);
        let granted_by = self
            .handlers
            .handlers_for(kind)
            .iter()
            .find(|handler| {
                let outcome = handler.evaluate(&ctx);
                debug!(
                    target = "authz",
                    handler = handler.name(),
                    requirement = requirement.name(),
                    ?outcome,
                    "handler evaluated"
                );
                outcome == HandlerOutcome::Succeed
            })
            .map(|handler| handler.name());

        let result = if granted_by.is_some() {
            AuthorizationResult::Succeeded
        } else {
            AuthorizationResult::Failed
        };
        self.publish_event(principal, kind, requirement, granted_by, result);
        result
    }

    /// Like [`Self::authorize`] but maps `Failed` to `PermissionDenied`.
    pub fn require<R: AsResource + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        requirement: &Requirement,
    ) -> Result<(), AuthzError> {
        self.authorize(principal, resource, requirement).into_result()
    }

    /// Resolve the caller through `provider`, then authorize. Provider
    /// failures surface as errors, never as a denial.
    pub async fn authorize_current<R: AsResource + ?Sized>(
        &self,
        provider: &dyn PrincipalProvider,
        resource: &R,
        requirement: &Requirement,
    ) -> Result<AuthorizationResult, AuthzError> {
        let principal = provider.current_principal().await?;
        Ok(self.authorize(&principal, resource, requirement))
    }

    fn publish_event(
        &self,
        principal: &Principal,
        kind: ResourceKind,
        requirement: &Requirement,
        granted_by: Option<&'static str>,
        result: AuthorizationResult,
    ) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if events.receiver_count() == 0 {
            return;
        }
        let event = AuthzDecisionEvent {
            requirement: requirement.name().to_string(),
            kind,
            user_id: principal.id().cloned(),
            succeeded: result.succeeded(),
            handler: granted_by.map(str::to_string),
            timestamp: SystemTime::now(),
        };
        if let Err(err) = events.send(event) {
            warn!(target = "authz", "failed to publish decision event: {err}");
        }
    }
}
