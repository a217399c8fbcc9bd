use tracker_core_types::{ResourceKind, ResourceRef};

use crate::principal::Principal;
use crate::registry::Requirement;

/// Everything a handler may look at for one authorization call.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    principal: &'a Principal,
    resource: ResourceRef<'a>,
    requirement: &'a Requirement,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        principal: &'a Principal,
        resource: ResourceRef<'a>,
        requirement: &'a Requirement,
    ) -> Self {
        Self {
            principal,
            resource,
            requirement,
        }
    }

    pub fn principal(&self) -> &'a Principal {
        self.principal
    }

    pub fn resource(&self) -> ResourceRef<'a> {
        self.resource
    }

    pub fn requirement(&self) -> &'a Requirement {
        self.requirement
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }
}
