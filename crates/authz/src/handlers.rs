//! Pluggable, resource-scoped authorization rules.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracker_core_types::{Operation, ResourceKind};

use crate::config::{HandlerSpec, HandlerWiring};
use crate::context::EvaluationContext;
use crate::errors::AuthzError;
use crate::registry::{ADMINISTRATORS_ROLE, MANAGERS_ROLE};

/// What a single handler says about a request. There is no explicit deny:
/// failure is whatever remains when nobody succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    Succeed,
    Abstain,
}

impl HandlerOutcome {
    fn when(condition: bool) -> Self {
        if condition {
            HandlerOutcome::Succeed
        } else {
            HandlerOutcome::Abstain
        }
    }
}

/// A pure predicate scoped to one resource kind.
///
/// Implementations must abstain for resources of any other kind and must not
/// depend on evaluation order or on other handlers.
pub trait AuthorizationHandler: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn kind(&self) -> ResourceKind;

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HandlerOutcome;
}

/// Grants every operation to holders of the `admin` role.
#[derive(Clone, Copy, Debug)]
pub struct AdminHandler {
    kind: ResourceKind,
}

impl AdminHandler {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

impl AuthorizationHandler for AdminHandler {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HandlerOutcome {
        if ctx.kind() != self.kind {
            return HandlerOutcome::Abstain;
        }
        HandlerOutcome::when(ctx.principal().has_role(ADMINISTRATORS_ROLE))
    }
}

/// Grants every operation to the principal named in the resource's owner
/// field. An unset owner never matches, not even an anonymous caller.
#[derive(Clone, Copy, Debug)]
pub struct OwnerHandler {
    kind: ResourceKind,
}

impl OwnerHandler {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

impl AuthorizationHandler for OwnerHandler {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HandlerOutcome {
        if ctx.kind() != self.kind {
            return HandlerOutcome::Abstain;
        }
        let (Some(principal_id), Some(owner_id)) = (ctx.principal().id(), ctx.resource().owner_id())
        else {
            return HandlerOutcome::Abstain;
        };
        HandlerOutcome::when(principal_id == owner_id)
    }
}

/// Ownership that only counts for principals holding the `manager` role.
#[derive(Clone, Copy, Debug)]
pub struct ManagerOwnerHandler {
    owner: OwnerHandler,
}

impl ManagerOwnerHandler {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            owner: OwnerHandler::new(kind),
        }
    }
}

impl AuthorizationHandler for ManagerOwnerHandler {
    fn name(&self) -> &'static str {
        "manager_owner"
    }

    fn kind(&self) -> ResourceKind {
        self.owner.kind
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HandlerOutcome {
        if !ctx.principal().has_role(MANAGERS_ROLE) {
            return HandlerOutcome::Abstain;
        }
        self.owner.evaluate(ctx)
    }
}

/// Grants the `Read` requirement of its kind to anyone, anonymous included.
#[derive(Clone, Copy, Debug)]
pub struct PublicReadHandler {
    kind: ResourceKind,
}

impl PublicReadHandler {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

impl AuthorizationHandler for PublicReadHandler {
    fn name(&self) -> &'static str {
        "public_read"
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HandlerOutcome {
        if ctx.kind() != self.kind {
            return HandlerOutcome::Abstain;
        }
        let requirement = ctx.requirement();
        HandlerOutcome::when(
            requirement.kind() == self.kind && requirement.operation() == Operation::Read,
        )
    }
}

pub fn handler_from_spec(kind: ResourceKind, spec: HandlerSpec) -> Arc<dyn AuthorizationHandler> {
    match spec {
        HandlerSpec::Admin => Arc::new(AdminHandler::new(kind)),
        HandlerSpec::Owner => Arc::new(OwnerHandler::new(kind)),
        HandlerSpec::ManagerOwner => Arc::new(ManagerOwnerHandler::new(kind)),
        HandlerSpec::PublicRead => Arc::new(PublicReadHandler::new(kind)),
    }
}

/// Handlers grouped by the resource kind they apply to.
///
/// Built once at start-up and shared read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct HandlerSet {
    by_kind: HashMap<ResourceKind, Vec<Arc<dyn AuthorizationHandler>>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl AuthorizationHandler + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    pub fn register(&mut self, handler: Arc<dyn AuthorizationHandler>) -> &mut Self {
        self.by_kind.entry(handler.kind()).or_default().push(handler);
        self
    }

    /// The tracker's built-in policy.
    pub fn standard() -> Self {
        Self::new()
            .with(AdminHandler::new(ResourceKind::Project))
            .with(ManagerOwnerHandler::new(ResourceKind::Project))
            .with(PublicReadHandler::new(ResourceKind::Project))
            .with(AdminHandler::new(ResourceKind::Ticket))
            .with(OwnerHandler::new(ResourceKind::Ticket))
            .with(PublicReadHandler::new(ResourceKind::Ticket))
            .with(AdminHandler::new(ResourceKind::Comment))
            .with(OwnerHandler::new(ResourceKind::Comment))
    }

    pub fn from_wiring(wiring: &HandlerWiring) -> Result<Self, AuthzError> {
        wiring.validate()?;
        let mut set = Self::new();
        for entry in &wiring.kinds {
            for spec in &entry.handlers {
                set.register(handler_from_spec(entry.kind, *spec));
            }
        }
        Ok(set)
    }

    pub fn handlers_for(&self, kind: ResourceKind) -> &[Arc<dyn AuthorizationHandler>] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(kind, handler names)` in registration order, for diagnostics.
    pub fn describe(&self) -> Vec<(ResourceKind, Vec<&'static str>)> {
        ResourceKind::ALL
            .iter()
            .map(|kind| {
                let names = self.handlers_for(*kind).iter().map(|h| h.name()).collect();
                (*kind, names)
            })
            .collect()
    }
}
