use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracker_authz::{AuthorizationService, PolicyRegistry, Principal};
use tracker_core_types::{
    Comment, CommentId, Project, ProjectId, ResourceKind, Ticket, TicketId, UserId,
};

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Resource kind: project, ticket or comment
    #[arg(long)]
    pub kind: String,

    /// Operation: create, read, update (edit) or delete
    #[arg(long)]
    pub operation: String,

    /// Acting user id; omit for an anonymous caller
    #[arg(long)]
    pub user: Option<String>,

    /// Role held by the acting user (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Owner of the resource; only tickets may be unowned
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Serialize)]
struct CheckReport {
    requirement: &'static str,
    principal: Principal,
    owner: Option<String>,
    succeeded: bool,
}

pub fn cmd_check(args: CheckArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let requirement = PolicyRegistry::global().resolve(&args.kind, &args.operation)?;
    let principal = match args.user.as_deref() {
        Some(user) => Principal::user(user, args.roles.iter().cloned()),
        None if args.roles.is_empty() => Principal::anonymous(),
        None => bail!("--role requires --user"),
    };
    let owner = args.owner.as_deref().map(UserId::from);

    let service = AuthorizationService::new(Arc::new(ctx.handler_set()?));
    let result = match (requirement.kind(), owner) {
        (ResourceKind::Ticket, owner_id) => {
            let ticket = Ticket {
                id: TicketId(0),
                title: "ad-hoc".into(),
                short_description: String::new(),
                long_description: String::new(),
                status: Default::default(),
                priority: Default::default(),
                date: Utc::now(),
                project_id: ProjectId(0),
                owner_id,
            };
            service.authorize(&principal, &ticket, requirement)
        }
        (ResourceKind::Project, Some(owner_id)) => {
            let project = Project {
                id: ProjectId(0),
                title: "ad-hoc".into(),
                description: String::new(),
                owner_id,
            };
            service.authorize(&principal, &project, requirement)
        }
        (ResourceKind::Comment, Some(owner_id)) => {
            let comment = Comment {
                id: CommentId(0),
                text: String::new(),
                date: Utc::now(),
                ticket_id: TicketId(0),
                owner_id,
            };
            service.authorize(&principal, &comment, requirement)
        }
        (kind, None) => bail!("--owner is required for {kind} resources"),
    };

    let report = CheckReport {
        requirement: requirement.name(),
        principal,
        owner: args.owner,
        succeeded: result.succeeded(),
    };
    output.emit(&report, || {
        let verdict = if report.succeeded {
            "Succeeded"
        } else {
            "Failed"
        };
        println!("{}: {verdict}", report.requirement);
    })
}
