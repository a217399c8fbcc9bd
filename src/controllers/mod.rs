//! Request handlers for projects, tickets and comments.
//!
//! Every mutating action loads or builds the full resource (owner included),
//! authorizes it, and only then touches the store. A failed authorization
//! returns [`TrackerError::Forbidden`] and leaves the store untouched.

pub mod comments;
pub mod home;
pub mod projects;
pub mod tickets;

use tracing::info;
use tracker_authz::{AuthorizationService, Principal, Requirement};
use tracker_core_types::{AsResource, UserId};

use crate::errors::{TrackerError, TrackerResult};

pub use comments::{CommentDraft, CommentsController};
pub use home::{Dashboard, HomeController};
pub use projects::{ProjectDraft, ProjectsController};
pub use tickets::{TicketDraft, TicketPage, TicketQuery, TicketSort, TicketsController};

pub(crate) fn ensure_authorized<R: AsResource + ?Sized>(
    authz: &AuthorizationService,
    principal: &Principal,
    resource: &R,
    requirement: &Requirement,
) -> TrackerResult<()> {
    if authz.authorize(principal, resource, requirement).succeeded() {
        Ok(())
    } else {
        info!(
            target = "controllers",
            requirement = requirement.name(),
            user = ?principal.id(),
            "request forbidden"
        );
        Err(TrackerError::Forbidden)
    }
}

/// Owner recorded on a resource the caller creates. Anonymous callers get an
/// empty id, which no handler matches, so their request still goes through
/// the authorization check and is refused there.
pub(crate) fn creator_id(principal: &Principal) -> UserId {
    principal
        .id()
        .cloned()
        .unwrap_or_else(|| UserId(String::new()))
}

pub(crate) fn require_text(field: &str, value: &str) -> TrackerResult<()> {
    if value.trim().is_empty() {
        Err(TrackerError::Invalid(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}
