use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracker_authz::{AuthzDecisionEvent, PrincipalProvider};
use tracker_cli::controllers::{CommentDraft, ProjectDraft, TicketDraft, TicketQuery, TicketSort};
use tracker_cli::{create_context, AppContext, AuditTrail, Config, Session, TrackerError};
use tracker_core_types::{
    Comment, CommentId, Operation, Priority, ProjectId, Status, Ticket, TicketId, UserId,
};
use tracker_store::Repository;

async fn context() -> Result<Arc<AppContext>> {
    Ok(Arc::new(create_context(Config::default()).await?))
}

fn project(title: &str) -> ProjectDraft {
    ProjectDraft {
        title: title.into(),
        description: format!("{title} description"),
    }
}

fn ticket(title: &str, project: &str, priority: Priority) -> TicketDraft {
    TicketDraft {
        title: title.into(),
        short_description: format!("{title} summary"),
        long_description: String::new(),
        status: Status::Bug,
        priority,
        project_title: project.into(),
    }
}

#[tokio::test]
async fn manager_owns_projects_users_own_tickets() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let other_manager = app.provider_for(app.register("pm2@example.com", Some("manager")).await?);
    let user = app.provider_for(app.register("dev@example.com", None).await?);
    let anonymous = app.provider_for(Session::anonymous());

    let created = app.projects().create(&manager, project("Alpha")).await?;
    assert!(app
        .projects()
        .create(&user, project("Beta"))
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(app
        .projects()
        .edit(&other_manager, created.id, project("Alpha"))
        .await
        .unwrap_err()
        .is_forbidden());
    assert_eq!(app.projects().list(&anonymous).await?.len(), 1);

    let opened = app
        .tickets()
        .create(&user, ticket("Crash", "Alpha", Priority::High))
        .await?;
    assert!(app
        .tickets()
        .edit(&manager, opened.id, ticket("Crash", "Alpha", Priority::Low))
        .await
        .unwrap_err()
        .is_forbidden());
    let edited = app
        .tickets()
        .edit(&user, opened.id, ticket("Crash", "Alpha", Priority::Low))
        .await?;
    assert_eq!(edited.priority, Priority::Low);
    assert_eq!(app.tickets().details(&anonymous, opened.id).await?.id, opened.id);
    Ok(())
}

#[tokio::test]
async fn unowned_tickets_are_only_writable_by_admins() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let user = app.provider_for(app.register("dev@example.com", None).await?);
    let admin = app.provider_for(app.sign_in("admin@gmail.com").await?);
    let anonymous = app.provider_for(Session::anonymous());
    let alpha = app.projects().create(&manager, project("Alpha")).await?;

    let imported = app
        .tickets_store()
        .create(Ticket {
            id: TicketId(0),
            title: "Imported".into(),
            short_description: "from the old tracker".into(),
            long_description: String::new(),
            status: Status::Feature,
            priority: Priority::None,
            date: Utc::now(),
            project_id: alpha.id,
            owner_id: None,
        })
        .await?;

    assert!(app
        .tickets()
        .edit(&user, imported.id, ticket("Imported", "Alpha", Priority::Low))
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(app
        .tickets()
        .create(&anonymous, ticket("Drive-by", "Alpha", Priority::None))
        .await
        .unwrap_err()
        .is_forbidden());
    assert_eq!(app.tickets().details(&anonymous, imported.id).await?.owner_id, None);

    let edited = app
        .tickets()
        .edit(&admin, imported.id, ticket("Imported", "Alpha", Priority::Low))
        .await?;
    assert_eq!(edited.owner_id, None);
    assert_eq!(edited.priority, Priority::Low);
    Ok(())
}

#[tokio::test]
async fn comments_are_private_to_owner_and_admin() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let author = app.provider_for(app.register("author@example.com", None).await?);
    let reader = app.provider_for(app.register("reader@example.com", None).await?);
    let admin = app.provider_for(app.sign_in("admin@gmail.com").await?);
    let anonymous = app.provider_for(Session::anonymous());

    app.projects().create(&manager, project("Alpha")).await?;
    let opened = app
        .tickets()
        .create(&author, ticket("Crash", "Alpha", Priority::Medium))
        .await?;
    let comment = app
        .comments()
        .create(
            &author,
            opened.id,
            CommentDraft {
                text: "steps to reproduce".into(),
            },
        )
        .await?;

    assert_eq!(app.comments().list(&author, opened.id).await?.len(), 1);
    assert_eq!(app.comments().list(&admin, opened.id).await?.len(), 1);
    assert!(app.comments().list(&reader, opened.id).await?.is_empty());
    assert!(app.comments().list(&anonymous, opened.id).await?.is_empty());
    assert!(app
        .comments()
        .details(&reader, opened.id, comment.id)
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(app
        .comments()
        .create(
            &anonymous,
            opened.id,
            CommentDraft {
                text: "me too".into()
            }
        )
        .await
        .unwrap_err()
        .is_forbidden());

    app.comments().delete(&author, opened.id, comment.id).await?;
    assert!(app.comments().list(&admin, opened.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_resources_report_not_found_before_authorization() -> Result<()> {
    let app = context().await?;
    let anonymous = app.provider_for(Session::anonymous());
    let err = app
        .projects()
        .delete(&anonymous, ProjectId(42))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));
    assert_eq!(err.http_status(), 404);

    let err = app
        .comments()
        .list(&anonymous, TicketId(7))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn validation_runs_after_authorization() -> Result<()> {
    let app = context().await?;
    let user = app.provider_for(app.register("dev@example.com", None).await?);
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);

    let blank = ProjectDraft {
        title: "  ".into(),
        description: String::new(),
    };
    assert!(app
        .projects()
        .create(&user, blank.clone())
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(matches!(
        app.projects().create(&manager, blank).await,
        Err(TrackerError::Invalid(_))
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_project_cascades() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let user = app.provider_for(app.register("dev@example.com", None).await?);

    let alpha = app.projects().create(&manager, project("Alpha")).await?;
    let opened = app
        .tickets()
        .create(&user, ticket("Crash", "Alpha", Priority::High))
        .await?;
    app.comments()
        .create(
            &user,
            opened.id,
            CommentDraft {
                text: "first".into(),
            },
        )
        .await?;

    app.projects().delete(&manager, alpha.id).await?;
    assert!(app.projects_store().is_empty());
    assert!(app.tickets_store().is_empty());
    assert!(app.comments_store().is_empty());
    Ok(())
}

#[tokio::test]
async fn ticket_index_filters_sorts_and_paginates() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let user = app.provider_for(app.register("dev@example.com", None).await?);
    let anonymous = app.provider_for(Session::anonymous());
    app.projects().create(&manager, project("Alpha")).await?;
    app.projects().create(&manager, project("Beta")).await?;

    for n in 0..12 {
        let priority = if n % 2 == 0 { Priority::High } else { Priority::Low };
        app.tickets()
            .create(&user, ticket(&format!("alpha-{n:02}"), "Alpha", priority))
            .await?;
    }
    app.tickets()
        .create(&manager, ticket("beta-00", "Beta", Priority::Medium))
        .await?;

    let first = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                sort: TicketSort::TitleAsc,
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(first.total, 13);
    assert_eq!(first.pages, 2);
    assert_eq!(first.tickets.len(), 10);
    assert_eq!(first.tickets[0].title, "alpha-00");

    let second = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                sort: TicketSort::TitleAsc,
                page: 2,
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(second.tickets.len(), 3);
    assert_eq!(second.tickets[2].title, "beta-00");

    let high_in_alpha = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                priority: Some(Priority::High),
                project_title: Some("Alpha".into()),
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(high_in_alpha.total, 6);

    let mine = app
        .tickets()
        .list(
            &manager,
            &TicketQuery {
                own_only: true,
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(mine.total, 1);
    assert_eq!(mine.tickets[0].title, "beta-00");

    let searched = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                search: Some("ALPHA-1".into()),
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(searched.total, 2);
    Ok(())
}

#[tokio::test]
async fn legacy_comment_policy_checks_create_requirement() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let policy = dir.path().join("policy.yaml");
    std::fs::write(&policy, "comments:\n  write_requirement: legacy\n")?;
    let app = create_context(Config {
        policy_paths: vec![policy],
        ..Config::default()
    })
    .await?;

    let comments = app.comments();
    assert_eq!(
        comments.requirement_for_write(Operation::Update).name(),
        "CreateComment"
    );
    assert_eq!(
        comments.requirement_for_write(Operation::Delete).name(),
        "CreateComment"
    );

    let strict = context().await?;
    assert_eq!(
        strict
            .comments()
            .requirement_for_write(Operation::Delete)
            .name(),
        "DeleteComment"
    );
    Ok(())
}

#[tokio::test]
async fn role_changes_apply_to_existing_sessions() -> Result<()> {
    let app = context().await?;
    let session = app.register("dev@example.com", None).await?;
    let dev = app.provider_for(session.clone());
    assert!(app
        .projects()
        .create(&dev, project("Alpha"))
        .await
        .unwrap_err()
        .is_forbidden());

    let admin_session = app.sign_in("admin@gmail.com").await?;
    let admin = app.provider_for(admin_session);
    let root = admin.current_principal().await?;
    let Some(dev_id) = session.user_id().cloned() else {
        anyhow::bail!("registered session has no user");
    };
    app.users().assign_role(&root, &dev_id, "manager").await?;

    app.projects().create(&dev, project("Alpha")).await?;
    Ok(())
}

#[tokio::test]
async fn project_title_filter_covers_every_project_with_that_title() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let anonymous = app.provider_for(Session::anonymous());
    let first = app.projects().create(&manager, project("Core")).await?;
    let second = app.projects().create(&manager, project("Core")).await?;
    for (id, title) in [(first.id, "core-a"), (second.id, "core-b")] {
        app.tickets_store()
            .create(stored_ticket(title, id, None, Utc::now()))
            .await?;
    }

    let core = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                project_title: Some("Core".into()),
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(core.total, 2);

    let unknown = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                project_title: Some("Nope".into()),
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(unknown.total, 0);
    assert!(unknown.tickets.is_empty());
    Ok(())
}

#[tokio::test]
async fn page_past_the_end_is_empty() -> Result<()> {
    let app = context().await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let anonymous = app.provider_for(Session::anonymous());
    let alpha = app.projects().create(&manager, project("Alpha")).await?;
    app.tickets_store()
        .create(stored_ticket("only", alpha.id, None, Utc::now()))
        .await?;

    let page = app
        .tickets()
        .list(
            &anonymous,
            &TicketQuery {
                page: usize::MAX,
                ..TicketQuery::default()
            },
        )
        .await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.pages, 1);
    assert!(page.tickets.is_empty());
    Ok(())
}

#[tokio::test]
async fn dashboard_prefers_projects_the_caller_worked_on() -> Result<()> {
    let app = context().await?;
    let manager_session = app.register("pm@example.com", Some("manager")).await?;
    let dev_session = app.register("dev@example.com", Some("user")).await?;
    let manager_id = session_user(&manager_session)?;
    let dev_id = session_user(&dev_session)?;
    let manager = app.provider_for(manager_session);
    let dev = app.provider_for(dev_session);
    let anonymous = app.provider_for(Session::anonymous());

    let mut projects = Vec::new();
    for title in ["A", "B", "C", "D"] {
        projects.push(app.projects().create(&manager, project(title)).await?);
    }
    let (a, b, c, d) = (projects[0].id, projects[1].id, projects[2].id, projects[3].id);

    let base = Utc::now();
    let at = |minutes: i64| base + chrono::Duration::minutes(minutes);
    let tickets = app.tickets_store();
    tickets
        .create(stored_ticket("older", b, Some(dev_id.clone()), at(1)))
        .await?;
    let newest = tickets
        .create(stored_ticket("newest", d, Some(dev_id.clone()), at(3)))
        .await?;
    let managers = tickets
        .create(stored_ticket("managers", c, Some(manager_id.clone()), at(2)))
        .await?;

    let comments = app.comments_store();
    comments
        .create(stored_comment("on c", managers.id, dev_id.clone(), at(4)))
        .await?;
    comments
        .create(stored_comment("not mine to read", newest.id, manager_id, at(30)))
        .await?;
    for n in 0..6 {
        comments
            .create(stored_comment(&format!("note {n}"), newest.id, dev_id.clone(), at(10 + n)))
            .await?;
    }

    let mine = app.home().dashboard(&dev).await?;
    let ids: Vec<ProjectId> = mine.projects.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![d, b, c]);
    let texts: Vec<&str> = mine
        .comments_on_own_tickets
        .iter()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(texts, vec!["note 5", "note 4", "note 3", "note 2", "note 1"]);

    let visitor = app.home().dashboard(&anonymous).await?;
    let ids: Vec<ProjectId> = visitor.projects.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b, c]);
    assert!(visitor.comments_on_own_tickets.is_empty());
    Ok(())
}

#[tokio::test]
async fn audit_trail_records_refused_anonymous_creates() -> Result<()> {
    assert!(context().await?.audit_trail().is_none());

    let dir = tempfile::tempdir()?;
    let policy = dir.path().join("policy.yaml");
    std::fs::write(&policy, "audit:\n  enabled: true\n  channel_capacity: 16\n")?;
    let app = create_context(Config {
        policy_paths: vec![policy],
        ..Config::default()
    })
    .await?;
    let manager = app.provider_for(app.register("pm@example.com", Some("manager")).await?);
    let anonymous = app.provider_for(Session::anonymous());
    let alpha = app.projects().create(&manager, project("Alpha")).await?;
    let opened = app
        .tickets_store()
        .create(stored_ticket("crash", alpha.id, None, Utc::now()))
        .await?;

    assert!(app
        .projects()
        .create(&anonymous, project("Drive-by"))
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(app
        .comments()
        .create(
            &anonymous,
            opened.id,
            CommentDraft {
                text: "me too".into(),
            },
        )
        .await
        .unwrap_err()
        .is_forbidden());

    let trail = app.audit_trail().context("audit enabled by policy")?;
    let project_denial = wait_for_decision(trail, "CreateProject", false).await?;
    assert_eq!(project_denial.user_id, None);
    let comment_denial = wait_for_decision(trail, "CreateComment", false).await?;
    assert_eq!(comment_denial.user_id, None);
    assert!(trail
        .recent()
        .iter()
        .any(|e| e.requirement == "CreateProject" && e.succeeded));
    Ok(())
}

fn session_user(session: &Session) -> Result<UserId> {
    session.user_id().cloned().context("signed-in session")
}

fn stored_ticket(
    title: &str,
    project_id: ProjectId,
    owner_id: Option<UserId>,
    date: DateTime<Utc>,
) -> Ticket {
    Ticket {
        id: TicketId(0),
        title: title.into(),
        short_description: format!("{title} summary"),
        long_description: String::new(),
        status: Status::Bug,
        priority: Priority::Medium,
        date,
        project_id,
        owner_id,
    }
}

fn stored_comment(text: &str, ticket_id: TicketId, owner_id: UserId, date: DateTime<Utc>) -> Comment {
    Comment {
        id: CommentId(0),
        text: text.into(),
        date,
        ticket_id,
        owner_id,
    }
}

async fn wait_for_decision(
    trail: &AuditTrail,
    requirement: &str,
    succeeded: bool,
) -> Result<AuthzDecisionEvent> {
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(event) = trail
                .recent()
                .into_iter()
                .find(|e| e.requirement == requirement && e.succeeded == succeeded)
            {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(found)
}
