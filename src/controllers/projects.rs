use std::sync::Arc;

use tracing::info;
use tracker_authz::{requirement_for, AuthorizationService, PrincipalProvider};
use tracker_core_types::{Comment, Operation, Project, ProjectId, ResourceKind, Ticket};
use tracker_store::Repository;

use super::{creator_id, ensure_authorized, require_text};
use crate::errors::{TrackerError, TrackerResult};

/// Editable project fields.
#[derive(Clone, Debug, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
}

impl ProjectDraft {
    fn validate(&self) -> TrackerResult<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)
    }
}

pub struct ProjectsController {
    authz: Arc<AuthorizationService>,
    projects: Arc<dyn Repository<Project>>,
    tickets: Arc<dyn Repository<Ticket>>,
    comments: Arc<dyn Repository<Comment>>,
}

impl ProjectsController {
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

    /// Projects the caller may read.
    pub async fn list(&self, provider: &dyn PrincipalProvider) -> TrackerResult<Vec<Project>> {
        let principal = provider.current_principal().await?;
        let read = requirement_for(ResourceKind::Project, Operation::Read);
        let projects = self.projects.list(&|_: &Project| true).await?;
        Ok(projects
            .into_iter()
            .filter(|project| self.authz.authorize(&principal, project, read).succeeded())
            .collect())
    }

    pub async fn details(
        &self,
        provider: &dyn PrincipalProvider,
        id: ProjectId,
    ) -> TrackerResult<Project> {
        let principal = provider.current_principal().await?;
        let project = self.load(id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &project,
            requirement_for(ResourceKind::Project, Operation::Read),
        )?;
        Ok(project)
    }

    pub async fn create(
        &self,
        provider: &dyn PrincipalProvider,
        draft: ProjectDraft,
    ) -> TrackerResult<Project> {
        let principal = provider.current_principal().await?;
        let project = Project {
            id: ProjectId(0),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            owner_id: creator_id(&principal),
        };
        ensure_authorized(
            &self.authz,
            &principal,
            &project,
            requirement_for(ResourceKind::Project, Operation::Create),
        )?;
        draft.validate()?;

        let created = self.projects.create(project).await?;
        info!(target = "controllers", id = created.id.0, "project created");
        Ok(created)
    }

    pub async fn edit(
        &self,
        provider: &dyn PrincipalProvider,
        id: ProjectId,
        draft: ProjectDraft,
    ) -> TrackerResult<Project> {
        let principal = provider.current_principal().await?;
        let mut project = self.load(id).await?;
        project.title = draft.title.trim().to_string();
        project.description = draft.description.trim().to_string();
        ensure_authorized(
            &self.authz,
            &principal,
            &project,
            requirement_for(ResourceKind::Project, Operation::Update),
        )?;
        draft.validate()?;

        let updated = self.projects.update(project).await?;
        info!(target = "controllers", id = id.0, "project updated");
        Ok(updated)
    }

    /// Removes the project together with its tickets and their comments.
    pub async fn delete(&self, provider: &dyn PrincipalProvider, id: ProjectId) -> TrackerResult<()> {
        let principal = provider.current_principal().await?;
        let project = self.load(id).await?;
        ensure_authorized(
            &self.authz,
            &principal,
            &project,
            requirement_for(ResourceKind::Project, Operation::Delete),
        )?;

        let tickets = self.tickets.list(&|t: &Ticket| t.project_id == id).await?;
        for ticket in tickets {
            let ticket_id = ticket.id;
            let comments = self
                .comments
                .list(&|c: &Comment| c.ticket_id == ticket_id)
                .await?;
            for comment in comments {
                self.comments.delete(comment.id).await?;
            }
            self.tickets.delete(ticket_id).await?;
        }
        self.projects.delete(id).await?;
        info!(target = "controllers", id = id.0, "project deleted");
        Ok(())
    }

    async fn load(&self, id: ProjectId) -> TrackerResult<Project> {
        self.projects
            .find(id)
            .await?
            .ok_or_else(|| TrackerError::not_found("project", id.0))
    }
}

/// Finds a project by its exact title.
pub(crate) async fn project_by_title(
    projects: &dyn Repository<Project>,
    title: &str,
) -> TrackerResult<Project> {
    let wanted = title.trim();
    projects
        .list(&|p: &Project| p.title == wanted)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TrackerError::not_found("project", wanted))
}
