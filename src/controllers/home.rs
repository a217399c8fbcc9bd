use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use tracker_authz::{requirement_for, AuthorizationService, PrincipalProvider};
use tracker_core_types::{Comment, Operation, Project, ProjectId, ResourceKind, Ticket, TicketId};
use tracker_store::Repository;

use crate::errors::TrackerResult;

pub const RECENT_PROJECTS: usize = 3;
pub const RECENT_COMMENTS: usize = 5;

/// Landing page content for the current caller.
#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    /// Projects of the caller's newest tickets, then of their newest
    /// comments, then any other project.
    pub projects: Vec<Project>,
    /// Newest comments on tickets the caller owns.
    pub comments_on_own_tickets: Vec<Comment>,
}

pub struct HomeController {
    authz: Arc<AuthorizationService>,
    projects: Arc<dyn Repository<Project>>,
    tickets: Arc<dyn Repository<Ticket>>,
    comments: Arc<dyn Repository<Comment>>,
}

impl HomeController {
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

    pub async fn dashboard(&self, provider: &dyn PrincipalProvider) -> TrackerResult<Dashboard> {
        let principal = provider.current_principal().await?;
        let caller = principal.id().cloned();

        let mut own_tickets = match caller.as_ref() {
            Some(id) => {
                self.tickets
                    .list(&|t: &Ticket| t.owner_id.as_ref() == Some(id))
                    .await?
            }
            None => Vec::new(),
        };
        own_tickets.sort_by_key(|t| Reverse(t.date));

        let mut own_comments = match caller.as_ref() {
            Some(id) => self.comments.list(&|c: &Comment| &c.owner_id == id).await?,
            None => Vec::new(),
        };
        own_comments.sort_by_key(|c| Reverse(c.date));

        let mut candidates: Vec<ProjectId> = own_tickets.iter().map(|t| t.project_id).collect();
        for comment in &own_comments {
            if let Some(ticket) = self.tickets.find(comment.ticket_id).await? {
                candidates.push(ticket.project_id);
            }
        }

        let read_project = requirement_for(ResourceKind::Project, Operation::Read);
        let mut seen = HashSet::new();
        let mut projects = Vec::with_capacity(RECENT_PROJECTS);
        for id in candidates {
            if projects.len() == RECENT_PROJECTS {
                break;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(project) = self.projects.find(id).await? {
                if self.authz.authorize(&principal, &project, read_project).succeeded() {
                    projects.push(project);
                }
            }
        }
        let missing = RECENT_PROJECTS - projects.len();
        if missing > 0 {
            let rest = self
                .projects
                .list(&|p: &Project| !seen.contains(&p.id))
                .await?;
            projects.extend(
                rest.into_iter()
                    .filter(|p| self.authz.authorize(&principal, p, read_project).succeeded())
                    .take(missing),
            );
        }

        let owned: HashSet<TicketId> = own_tickets.iter().map(|t| t.id).collect();
        let read_comment = requirement_for(ResourceKind::Comment, Operation::Read);
        let mut comments_on_own_tickets: Vec<Comment> = if owned.is_empty() {
            Vec::new()
        } else {
            self.comments
                .list(&|c: &Comment| owned.contains(&c.ticket_id))
                .await?
                .into_iter()
                .filter(|c| self.authz.authorize(&principal, c, read_comment).succeeded())
                .collect()
        };
        comments_on_own_tickets.sort_by_key(|c| Reverse(c.date));
        comments_on_own_tickets.truncate(RECENT_COMMENTS);

        Ok(Dashboard {
            projects,
            comments_on_own_tickets,
        })
    }
}
