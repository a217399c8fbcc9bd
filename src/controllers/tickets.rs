use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use tracker_authz::{requirement_for, AuthorizationService, PrincipalProvider};
use tracker_core_types::{
    Comment, Operation, Priority, Project, ProjectId, ResourceKind, Status, Ticket, TicketId,
};
use tracker_store::Repository;

use super::projects::project_by_title;
use super::{ensure_authorized, require_text};
use crate::errors::{TrackerError, TrackerResult};

pub const TICKETS_PER_PAGE: usize = 10;

/// Editable ticket fields. The project is addressed by title.
#[derive(Clone, Debug, Default)]
pub struct TicketDraft {
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub status: Status,
    pub priority: Priority,
    pub project_title: String,
}

impl TicketDraft {
    fn validate(&self) -> TrackerResult<()> {
        require_text("title", &self.title)?;
        require_text("short description", &self.short_description)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TicketSort {
    TitleAsc,
    TitleDesc,
    PriorityAsc,
    PriorityDesc,
    DateAsc,
    #[default]
    DateDesc,
}

/// Ticket index filters. Empty fields do not filter.
#[derive(Clone, Debug, Default)]
pub struct TicketQuery {
    pub search: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub project_title: Option<String>,
    /// Only tickets owned by the caller.
    pub own_only: bool,
    pub sort: TicketSort,
    /// 1-based.
    pub page: usize,
}

#[derive(Clone, Debug)]
pub struct TicketPage {
    pub tickets: Vec<Ticket>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

pub struct TicketsController {
    authz: Arc<AuthorizationService>,
    projects: Arc<dyn Repository<Project>>,
    tickets: Arc<dyn Repository<Ticket>>,
    comments: Arc<dyn Repository<Comment>>,
}

impl TicketsController {
    pub fn new(
        authz: Arc<AuthorizationService>,
        projects: Arc<dyn Repository<Project>>,
        tickets: Arc<dyn Repository<Ticket>>,
        comments: Arc<dyn Repository<Comment>>,
    ) -> Self {
        Self {
            authz,
            projects,
            tickets,
            comments,
        }
    }

    /// One page of the readable tickets matching `query`.
    pub async fn list(
        &self,
        provider: &dyn PrincipalProvider,
        query: &TicketQuery,
    ) -> TrackerResult<TicketPage> {
        let principal = provider.current_principal().await?;
        let project_ids: Option<HashSet<ProjectId>> = match query.project_title.as_deref() {
            Some(title) if !title.trim().is_empty() => {
                let title = title.trim();
                let ids = self
                    .projects
                    .list(&|p: &Project| p.title == title)
                    .await?
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
                Some(ids)
            }
            _ => None,
        };
        if query.own_only && principal.is_anonymous() {
            return Ok(TicketPage {
                tickets: Vec::new(),
                page: 1,
                pages: 0,
                total: 0,
            });
        }
        let caller = principal.id().cloned();
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matches = |ticket: &Ticket| {
            if query.own_only && ticket.owner_id != caller {
                return false;
            }
            if let Some(needle) = search.as_deref() {
                if !ticket.title.to_lowercase().contains(needle)
                    && !ticket.short_description.to_lowercase().contains(needle)
                {
                    return false;
                }
            }
            query.status.map_or(true, |status| ticket.status == status)
                && query.priority.map_or(true, |p| ticket.priority == p)
                && project_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&ticket.project_id))
        };

        let read = requirement_for(ResourceKind::Ticket, Operation::Read);
        let mut tickets: Vec<Ticket> = self
            .tickets
            .list(&matches)
            .await?
            .into_iter()
            .filter(|ticket| self.authz.authorize(&principal, ticket, read).succeeded())
            .collect();
        sort_tickets(&mut tickets, query.sort);

        let total = tickets.len();
        let pages = total.div_ceil(TICKETS_PER_PAGE);
        let page = query.page.max(1);
        let tickets = tickets
            .into_iter()
            .skip((page - 1).saturating_mul(TICKETS_PER_PAGE))
            .take(TICKETS_PER_PAGE)
            .collect();
        Ok(TicketPage {
            tickets,
            page,
            pages,
            total,
        })
    }

    pub async fn details(
        &self,
        provider: &dyn PrincipalProvider,
        id: TicketId,
    ) -> TrackerResult<Ticket> {
        let principal = provider.current_principal().await?;
        let ticket = self.load(id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &ticket,
            requirement_for(ResourceKind::Ticket, Operation::Read),
        )?;
        Ok(ticket)
    }

    pub async fn create(
        &self,
        provider: &dyn PrincipalProvider,
        draft: TicketDraft,
    ) -> TrackerResult<Ticket> {
        let principal = provider.current_principal().await?;
        let project = project_by_title(self.projects.as_ref(), &draft.project_title).await?;
        let ticket = Ticket {
            id: TicketId(0),
            title: draft.title.trim().to_string(),
            short_description: draft.short_description.trim().to_string(),
            long_description: draft.long_description.trim().to_string(),
            status: draft.status,
            priority: draft.priority,
            date: Utc::now(),
            project_id: project.id,
            owner_id: principal.id().cloned(),
        };
        ensure_authorized(
            &self.authz,
            &principal,
            &ticket,
            requirement_for(ResourceKind::Ticket, Operation::Create),
        )?;
        draft.validate()?;

        let created = self.tickets.create(ticket).await?;
        info!(
            target = "controllers",
            id = created.id.0,
            project = project.id.0,
            "ticket created"
        );
        Ok(created)
    }

    pub async fn edit(
        &self,
        provider: &dyn PrincipalProvider,
        id: TicketId,
        draft: TicketDraft,
    ) -> TrackerResult<Ticket> {
        let principal = provider.current_principal().await?;
        let mut ticket = self.load(id).await?;
        let project = project_by_title(self.projects.as_ref(), &draft.project_title).await?;
        ticket.title = draft.title.trim().to_string();
        ticket.short_description = draft.short_description.trim().to_string();
        ticket.long_description = draft.long_description.trim().to_string();
        ticket.status = draft.status;
        ticket.priority = draft.priority;
        ticket.project_id = project.id;
        ensure_authorized(
            &self.authz,
            &principal,
            &ticket,
            requirement_for(ResourceKind::Ticket, Operation::Update),
        )?;
        draft.validate()?;

        let updated = self.tickets.update(ticket).await?;
        info!(target = "controllers", id = id.0, "ticket updated");
        Ok(updated)
    }

    /// Removes the ticket and its comments.
    pub async fn delete(&self, provider: &dyn PrincipalProvider, id: TicketId) -> TrackerResult<()> {
        let principal = provider.current_principal().await?;
        let ticket = self.load(id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &ticket,
            requirement_for(ResourceKind::Ticket, Operation::Delete),
        )?;

        for comment in self.comments.list(&|c: &Comment| c.ticket_id == id).await? {
            self.comments.delete(comment.id).await?;
        }
        self.tickets.delete(id).await?;
        info!(target = "controllers", id = id.0, "ticket deleted");
        Ok(())
    }

    async fn load(&self, id: TicketId) -> TrackerResult<Ticket> {
        self.tickets
            .find(id)
            .await?
            .ok_or_else(|| TrackerError::not_found("ticket", id.0))
    }
}

fn sort_tickets(tickets: &mut [Ticket], sort: TicketSort) {
    match sort {
        TicketSort::TitleAsc => tickets.sort_by(|a, b| a.title.cmp(&b.title)),
        TicketSort::TitleDesc => tickets.sort_by(|a, b| b.title.cmp(&a.title)),
        TicketSort::PriorityAsc => tickets.sort_by_key(|t| t.priority),
        TicketSort::PriorityDesc => tickets.sort_by_key(|t| Reverse(t.priority)),
        TicketSort::DateAsc => tickets.sort_by_key(|t| t.date),
        TicketSort::DateDesc => tickets.sort_by_key(|t| Reverse(t.date)),
    }
}
