use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracker_core_types::{Priority, Status};

use super::context::CliContext;
use super::output::OutputFormat;
use crate::controllers::{CommentDraft, ProjectDraft, TicketDraft, TicketQuery};
use crate::errors::TrackerResult;
use crate::session::Session;

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Write the final store contents as JSON into this directory
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DemoStep {
    actor: &'static str,
    action: &'static str,
    expected: u16,
    status: u16,
}

impl DemoStep {
    fn passed(&self) -> bool {
        self.expected == self.status
    }
}

fn record<T>(
    steps: &mut Vec<DemoStep>,
    actor: &'static str,
    action: &'static str,
    expected: u16,
    result: TrackerResult<T>,
) -> Option<T> {
    let (status, value) = match result {
        Ok(value) => (200, Some(value)),
        Err(err) => (err.http_status(), None),
    };
    steps.push(DemoStep {
        actor,
        action,
        expected,
        status,
    });
    value
}

pub async fn cmd_demo(args: DemoArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let app = ctx.app_context().await?;
    let admin_email = ctx.config().bootstrap_admin.clone();

    let alice = app.provider_for(app.register("alice@example.com", Some("manager")).await?);
    let bob = app.provider_for(app.register("bob@example.com", Some("user")).await?);
    let admin = app.provider_for(app.sign_in(&admin_email).await?);
    let anonymous = app.provider_for(Session::anonymous());

    let projects = app.projects();
    let tickets = app.tickets();
    let comments = app.comments();
    let mut steps = Vec::new();

    let draft = ProjectDraft {
        title: "P1".into(),
        description: "Issue tracker rollout".into(),
    };
    let Some(p1) = record(
        &mut steps,
        "alice",
        "create project P1",
        200,
        projects.create(&alice, draft.clone()).await,
    ) else {
        bail!("alice could not create P1");
    };
    record(
        &mut steps,
        "bob",
        "create project",
        403,
        projects.create(&bob, draft.clone()).await,
    );
    let renamed = ProjectDraft {
        description: "Rollout, phase two".into(),
        ..draft
    };
    record(
        &mut steps,
        "bob",
        "update P1",
        403,
        projects.edit(&bob, p1.id, renamed.clone()).await,
    );
    record(
        &mut steps,
        "alice",
        "update P1",
        200,
        projects.edit(&alice, p1.id, renamed).await,
    );
    record(
        &mut steps,
        "anonymous",
        "read P1",
        200,
        projects.details(&anonymous, p1.id).await,
    );

    let ticket_draft = TicketDraft {
        title: "Login page returns 500".into(),
        short_description: "Submitting the form fails".into(),
        long_description: String::new(),
        status: Status::Bug,
        priority: Priority::High,
        project_title: "P1".into(),
    };
    let Some(ticket) = record(
        &mut steps,
        "bob",
        "open ticket in P1",
        200,
        tickets.create(&bob, ticket_draft.clone()).await,
    ) else {
        bail!("bob could not open a ticket");
    };
    record(
        &mut steps,
        "anonymous",
        "open ticket in P1",
        403,
        tickets.create(&anonymous, ticket_draft.clone()).await,
    );
    record(
        &mut steps,
        "alice",
        "update bob's ticket",
        403,
        tickets.edit(&alice, ticket.id, ticket_draft.clone()).await,
    );
    record(
        &mut steps,
        "anonymous",
        "read bob's ticket",
        200,
        tickets.details(&anonymous, ticket.id).await,
    );
    record(
        &mut steps,
        "anonymous",
        "list tickets",
        200,
        tickets.list(&anonymous, &TicketQuery::default()).await,
    );

    let Some(comment) = record(
        &mut steps,
        "bob",
        "comment on ticket",
        200,
        comments
            .create(
                &bob,
                ticket.id,
                CommentDraft {
                    text: "Reproduced on staging".into(),
                },
            )
            .await,
    ) else {
        bail!("bob could not comment");
    };
    record(
        &mut steps,
        "anonymous",
        "read bob's comment",
        403,
        comments.details(&anonymous, ticket.id, comment.id).await,
    );
    record(
        &mut steps,
        "alice",
        "delete bob's comment",
        403,
        comments.delete(&alice, ticket.id, comment.id).await,
    );
    record(
        &mut steps,
        "admin",
        "delete P1",
        200,
        projects.delete(&admin, p1.id).await,
    );
    record(
        &mut steps,
        "anonymous",
        "read P1",
        404,
        projects.details(&anonymous, p1.id).await,
    );

    if let Some(dir) = args.snapshot_dir.as_ref() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating snapshot dir {}", dir.display()))?;
        app.projects_store().write_snapshot(dir.join("projects.json"))?;
        app.tickets_store().write_snapshot(dir.join("tickets.json"))?;
        app.comments_store().write_snapshot(dir.join("comments.json"))?;
    }

    output.emit(&steps, || {
        let seed = app.seed_report();
        if seed.admin_created {
            println!("seeded administrator {admin_email}");
        }
        for step in &steps {
            let mark = if step.passed() { "ok  " } else { "FAIL" };
            println!(
                "{mark} {:<10} {:<24} → {} (expected {})",
                step.actor, step.action, step.status, step.expected
            );
        }
    })?;

    let failures = steps.iter().filter(|step| !step.passed()).count();
    if failures > 0 {
        bail!("{failures} demo step(s) did not match the expected outcome");
    }
    Ok(())
}
