use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use tracker_authz::{requirement_for, AuthorizationService, PrincipalProvider, Requirement};
use tracker_core_types::{Comment, CommentId, Operation, ResourceKind, Ticket, TicketId};
use tracker_policy_center::CommentWriteRequirement;
use tracker_store::Repository;

use super::{creator_id, ensure_authorized, require_text};
use crate::errors::{TrackerError, TrackerResult};

#[derive(Clone, Debug, Default)]
pub struct CommentDraft {
    pub text: String,
}

pub struct CommentsController {
    authz: Arc<AuthorizationService>,
    tickets: Arc<dyn Repository<Ticket>>,
    comments: Arc<dyn Repository<Comment>>,
    write_requirement: CommentWriteRequirement,
}

impl CommentsController {
    pub fn new(
        authz: Arc<AuthorizationService>,
        tickets: Arc<dyn Repository<Ticket>>,
        comments: Arc<dyn Repository<Comment>>,
        write_requirement: CommentWriteRequirement,
    ) -> Self {
        Self {
            authz,
            tickets,
            comments,
            write_requirement,
        }
    }

    /// Requirement checked before editing or deleting a comment.
    pub fn requirement_for_write(&self, operation: Operation) -> &'static Requirement {
        match self.write_requirement {
            CommentWriteRequirement::Strict => requirement_for(ResourceKind::Comment, operation),
            CommentWriteRequirement::Legacy => {
                requirement_for(ResourceKind::Comment, Operation::Create)
            }
        }
    }

    /// Comments on `ticket_id` the caller may read.
    pub async fn list(
        &self,
        provider: &dyn PrincipalProvider,
        ticket_id: TicketId,
    ) -> TrackerResult<Vec<Comment>> {
        let principal = provider.current_principal().await?;
        self.ensure_ticket(ticket_id).await?;
        let read = requirement_for(ResourceKind::Comment, Operation::Read);
        let comments = self
            .comments
            .list(&|c: &Comment| c.ticket_id == ticket_id)
            .await?;
        Ok(comments
            .into_iter()
            .filter(|comment| self.authz.authorize(&principal, comment, read).succeeded())
            .collect())
    }

    pub async fn details(
        &self,
        provider: &dyn PrincipalProvider,
        ticket_id: TicketId,
        id: CommentId,
    ) -> TrackerResult<Comment> {
        let principal = provider.current_principal().await?;
        let comment = self.load(ticket_id, id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &comment,
            requirement_for(ResourceKind::Comment, Operation::Read),
        )?;
        Ok(comment)
    }

    pub async fn create(
        &self,
        provider: &dyn PrincipalProvider,
        ticket_id: TicketId,
        draft: CommentDraft,
    ) -> TrackerResult<Comment> {
        let principal = provider.current_principal().await?;
        self.ensure_ticket(ticket_id).await?;
        let comment = Comment {
            id: CommentId(0),
            text: draft.text.trim().to_string(),
            date: Utc::now(),
            ticket_id,
            owner_id: creator_id(&principal),
        };
        ensure_authorized(
            &self.authz,
            &principal,
            &comment,
            requirement_for(ResourceKind::Comment, Operation::Create),
        )?;
        require_text("text", &draft.text)?;

        let created = self.comments.create(comment).await?;
        info!(
            target = "controllers",
            id = created.id.0,
            ticket = ticket_id.0,
            "comment created"
        );
        Ok(created)
    }

    pub async fn edit(
        &self,
        provider: &dyn PrincipalProvider,
        ticket_id: TicketId,
        id: CommentId,
        draft: CommentDraft,
    ) -> TrackerResult<Comment> {
        let principal = provider.current_principal().await?;
        let mut comment = self.load(ticket_id, id).await?;
        comment.text = draft.text.trim().to_string();
        ensure_authorized(
            &self.authz,
            &principal,
            &comment,
            self.requirement_for_write(Operation::Update),
        )?;
        require_text("text", &draft.text)?;

        let updated = self.comments.update(comment).await?;
        info!(target = "controllers", id = id.0, "comment updated");
        Ok(updated)
    }

    pub async fn delete(
        &self,
        provider: &dyn PrincipalProvider,
        ticket_id: TicketId,
        id: CommentId,
    ) -> TrackerResult<()> {
        let principal = provider.current_principal().await?;
        let comment = self.load(ticket_id, id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &comment,
            self.requirement_for_write(Operation::Delete),
        )?;

        self.comments.delete(id).await?;
        info!(target = "controllers", id = id.0, "comment deleted");
        Ok(())
    }

    async fn ensure_ticket(&self, ticket_id: TicketId) -> TrackerResult<()> {
        match self.tickets.find(ticket_id).await? {
            Some(_) => Ok(()),
            None => Err(TrackerError::not_found("ticket", ticket_id.0)),
        }
    }

    /// The comment, provided both it and its ticket exist and belong together.
    async fn load(&self, ticket_id: TicketId, id: CommentId) -> TrackerResult<Comment> {
        self.ensure_ticket(ticket_id).await?;
        self.comments
            .find(id)
            .await?
            .filter(|comment| comment.ticket_id == ticket_id)
            .ok_or_else(|| TrackerError::not_found("comment", id.0))
    }
}
