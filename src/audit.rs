//! Consumer for the authorization decision channel.
//!
//! When the policy enables auditing, every decision is logged under the
//! `authz.audit` target and the most recent ones are kept for inspection.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracker_authz::AuthzDecisionEvent;

/// Bounded record of the latest decisions.
#[derive(Clone)]
pub struct AuditTrail {
    events: Arc<Mutex<VecDeque<AuthzDecisionEvent>>>,
    capacity: usize,
}

impl AuditTrail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, event: AuthzDecisionEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<AuthzDecisionEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drain `rx` into `trail` until the service is dropped.
pub fn spawn_audit_recorder(
    mut rx: broadcast::Receiver<AuthzDecisionEvent>,
    trail: AuditTrail,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    info!(
                        target: "authz.audit",
                        requirement = %event.requirement,
                        kind = %event.kind,
                        user = ?event.user_id,
                        succeeded = event.succeeded,
                        handler = ?event.handler,
                        "authorization decision"
                    );
                    trail.push(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "authz.audit", skipped, "audit channel lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
