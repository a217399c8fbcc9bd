//! Canonical requirement and role catalog.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracker_core_types::{Operation, ResourceKind};

use crate::errors::AuthzError;

pub const ADMINISTRATORS_ROLE: &str = "admin";
pub const MANAGERS_ROLE: &str = "manager";
pub const USERS_ROLE: &str = "user";
/// Marker used by role assignment for "member of no role".
pub const NO_ROLE: &str = "none";

/// A (kind, operation) tag. Exactly one instance per pair lives in
/// [`REQUIREMENTS`]; compare by value or by address, both agree.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Requirement {
    kind: ResourceKind,
    operation: Operation,
    name: &'static str,
}

impl Requirement {
    const fn new(kind: ResourceKind, operation: Operation, name: &'static str) -> Self {
        Self {
            kind,
            operation,
            name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_read(&self) -> bool {
        self.operation == Operation::Read
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Kind-major, operation-minor; `slot` depends on this layout.
static REQUIREMENTS: [Requirement; 12] = [
    Requirement::new(ResourceKind::Project, Operation::Create, "CreateProject"),
    Requirement::new(ResourceKind::Project, Operation::Read, "ReadProject"),
    Requirement::new(ResourceKind::Project, Operation::Update, "UpdateProject"),
    Requirement::new(ResourceKind::Project, Operation::Delete, "DeleteProject"),
    Requirement::new(ResourceKind::Ticket, Operation::Create, "CreateTicket"),
    Requirement::new(ResourceKind::Ticket, Operation::Read, "ReadTicket"),
    Requirement::new(ResourceKind::Ticket, Operation::Update, "UpdateTicket"),
    Requirement::new(ResourceKind::Ticket, Operation::Delete, "DeleteTicket"),
    Requirement::new(ResourceKind::Comment, Operation::Create, "CreateComment"),
    Requirement::new(ResourceKind::Comment, Operation::Read, "ReadComment"),
    Requirement::new(ResourceKind::Comment, Operation::Update, "UpdateComment"),
    Requirement::new(ResourceKind::Comment, Operation::Delete, "DeleteComment"),
];

fn slot(kind: ResourceKind, operation: Operation) -> usize {
    let kind_index = match kind {
        ResourceKind::Project => 0,
        ResourceKind::Ticket => 1,
        ResourceKind::Comment => 2,
    };
    let operation_index = match operation {
        Operation::Create => 0,
        Operation::Read => 1,
        Operation::Update => 2,
        Operation::Delete => 3,
    };
    kind_index * Operation::ALL.len() + operation_index
}

/// Canonical requirement for a (kind, operation) pair.
pub fn requirement_for(kind: ResourceKind, operation: Operation) -> &'static Requirement {
    &REQUIREMENTS[slot(kind, operation)]
}

/// Read-only lookup tables built once on first use.
pub struct PolicyRegistry {
    by_name: HashMap<&'static str, &'static Requirement>,
}

static REGISTRY: Lazy<PolicyRegistry> = Lazy::new(PolicyRegistry::build);

impl PolicyRegistry {
    fn build() -> Self {
        let by_name = REQUIREMENTS.iter().map(|req| (req.name, req)).collect();
        Self { by_name }
    }

    pub fn global() -> &'static PolicyRegistry {
        &REGISTRY
    }

    pub fn requirement_named(&self, name: &str) -> Result<&'static Requirement, AuthzError> {
        self.by_name
            .get(name.trim())
            .copied()
            .ok_or_else(|| AuthzError::Configuration(format!("unknown requirement '{name}'")))
    }

    /// Resolve free-form kind/operation labels (configuration, CLI input).
    pub fn resolve(&self, kind: &str, operation: &str) -> Result<&'static Requirement, AuthzError> {
        let kind: ResourceKind = kind.parse()?;
        let operation: Operation = operation.parse()?;
        Ok(requirement_for(kind, operation))
    }

    pub fn requirements(&self) -> impl Iterator<Item = &'static Requirement> {
        REQUIREMENTS.iter()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_has_exactly_one_requirement() {
        let registry = PolicyRegistry::global();
        assert_eq!(registry.len(), 12);
        for kind in ResourceKind::ALL {
            for operation in Operation::ALL {
                let req = requirement_for(kind, operation);
                assert_eq!(req.kind(), kind);
                assert_eq!(req.operation(), operation);
                assert_eq!(req.name(), format!("{operation}{kind}"));
                let by_name = registry.requirement_named(req.name()).unwrap();
                assert!(std::ptr::eq(req, by_name));
            }
        }
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let registry = PolicyRegistry::global();
        assert!(matches!(
            registry.requirement_named("ArchiveProject"),
            Err(AuthzError::Configuration(_))
        ));
        assert!(matches!(
            registry.resolve("milestone", "read"),
            Err(AuthzError::Configuration(_))
        ));
        assert!(matches!(
            registry.resolve("ticket", "close"),
            Err(AuthzError::Configuration(_))
        ));
        assert_eq!(
            registry.resolve("Ticket", "edit").unwrap().name(),
            "UpdateTicket"
        );
    }
}
