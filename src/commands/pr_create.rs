//! `glu pr create`
//!
//! LocalStateCheck -> Sync -> TicketContextResolve -> ReviewerResolve -> PRCreate
//! -> DescriptionGenerate -> TicketResolve -> TicketTransition.

use crate::config::Config;
use crate::context::Services;
use crate::error::GluError;
use crate::generation::{
    CommitRevision, TicketRequest, generate_commit_message, generate_pr_description,
    generate_ticket,
};
use crate::git::{DEFAULT_REMOTE, GitRepo, first_commit_since_checkout, is_remote_branch_in_sync};
use crate::github::{NewPullRequest, PullRequest, PullRequestUpdate};
use crate::jira::{IssueTracker, NewIssue, find_transition, resolve_project, resolve_user};
use crate::llm::ChatModel;
use crate::reviewers::match_reviewers;
use crate::ticket_key::TicketRef;
use crate::ui::{self, Prompter};
use crate::{log_debug, log_info};

use anyhow::Result;
use colored::Colorize;

const COMMIT_WITH_AI: &str = "Commit and push with AI message";
const COMMIT_MANUALLY: &str = "Commit and push with manual message";
const PROCEED: &str = "Proceed anyway";

const ACCEPT: &str = "Accept";
const REQUEST_CHANGES: &str = "Request changes";
const EDIT: &str = "Edit";

/// Options for `pr create`
#[derive(Debug, Clone, Default)]
pub struct PrCreateOptions {
    pub ticket: Option<String>,
    pub project: Option<String>,
    pub draft: bool,
    /// Move the ticket to "ready for review" (never for drafts)
    pub ready_for_review: bool,
    pub reviewers: Vec<String>,
    pub generate_title: bool,
}

/// What `pr create` did
#[derive(Debug, Clone)]
pub struct PrCreateOutcome {
    pub pr: PullRequest,
    pub ticket: Option<TicketRef>,
    pub reviewers: Vec<String>,
    /// Names of the Jira transitions applied
    pub transitions: Vec<String>,
}

/// Runs the whole PR creation workflow for the checked-out branch
pub async fn create_pr(
    services: &Services<'_>,
    repo: &GitRepo,
    repo_name: &str,
    chat: Option<&dyn ChatModel>,
    options: &PrCreateOptions,
) -> Result<PrCreateOutcome> {
    let branch = repo.current_branch()?;

    // LocalStateCheck
    if repo.is_dirty()? {
        commit_local_changes(services.prompter, repo, &branch, chat).await?;
    }

    // Sync
    sync_branch(services.prompter, repo, &branch)?;

    let first_commit = first_commit_since_checkout(repo)?;
    log_debug!("PR based on commit {}", first_commit.id);

    // TicketContextResolve
    let mut ticket = match &options.ticket {
        Some(number) => {
            let project = resolve_project(
                services.tracker,
                services.config,
                services.prompter,
                options.project.as_deref(),
                Some(repo_name),
            )
            .await?;
            Some(TicketRef::new(&project, number)?)
        }
        None => None,
    };

    let title = first_commit.summary.clone();
    let body = match &ticket {
        Some(ticket) => ticket.inject(&first_commit.body()),
        None => first_commit.body(),
    };

    // ReviewerResolve
    let reviewers = if options.draft && options.reviewers.is_empty() {
        Vec::new()
    } else {
        let org = repo_name.split('/').next().unwrap_or(repo_name);
        let members = services.host.org_members(org).await?;
        match_reviewers(&options.reviewers, &members, services.prompter)?
    };

    // PRCreate
    let repository = services.host.repository(repo_name).await?;
    let mut pr = services
        .host
        .create_pull_request(
            repo_name,
            &NewPullRequest {
                title: title.clone(),
                head: branch.clone(),
                base: repository.default_branch.clone(),
                body,
                draft: options.draft,
            },
        )
        .await?;
    log_info!("Created PR #{} in {}", pr.number, repo_name);

    match services.host.current_user().await {
        Ok(me) => {
            if let Err(e) = services
                .host
                .add_assignees(repo_name, pr.number, &[me.login])
                .await
            {
                ui::print_error(&format!("Failed to assign PR: {e}"));
            }
        }
        Err(e) => ui::print_error(&format!("Failed to look up GitHub user: {e}")),
    }

    let mut requested = Vec::new();
    for reviewer in &reviewers {
        match services
            .host
            .request_reviewer(repo_name, pr.number, &reviewer.login)
            .await
        {
            Ok(()) => requested.push(reviewer.login.clone()),
            Err(e) => ui::print_error(&format!("Failed to add reviewer {}: {e}", reviewer.login)),
        }
    }

    // DescriptionGenerate
    if let Some(chat) = chat {
        let generated = generate_pr_description(
            chat,
            services.host,
            services.config,
            repo_name,
            &repository.default_branch,
            &pr,
            options.generate_title,
            ticket.as_ref(),
        )
        .await?;

        let update = PullRequestUpdate {
            title: generated.title.clone(),
            body: Some(generated.description.clone()),
        };
        pr = services
            .host
            .update_pull_request(repo_name, pr.number, &update)
            .await?;
        ui::print_bordered_content("Description", &generated.description);
    } else {
        ui::print_bordered_content("Description", pr.body_text());
    }

    ui::print_message(&format!(
        "Created PR in {} with title {}",
        repo_name.blue(),
        pr.title.bold().green()
    ));
    ui::print_message(&pr.html_url.magenta().to_string());

    // TicketResolve
    if ticket.is_none() {
        ticket = resolve_ticket_after_creation(services, repo_name, chat, options, &pr).await?;
        if let Some(ticket) = &ticket {
            let body = ticket.inject(pr.body_text());
            if body != pr.body_text() {
                pr = services
                    .host
                    .update_pull_request(
                        repo_name,
                        pr.number,
                        &PullRequestUpdate {
                            title: None,
                            body: Some(body),
                        },
                    )
                    .await?;
            }
        }
    }

    // TicketTransition
    let transitions = match &ticket {
        Some(ticket) => {
            let ready = options.ready_for_review && !options.draft;
            transition_ticket(services.tracker, services.config, ticket, ready).await?
        }
        None => Vec::new(),
    };

    Ok(PrCreateOutcome {
        pr,
        ticket,
        reviewers: requested,
        transitions,
    })
}

async fn commit_local_changes(
    prompter: &dyn Prompter,
    repo: &GitRepo,
    branch: &str,
    chat: Option<&dyn ChatModel>,
) -> Result<()> {
    let mut choices = Vec::new();
    if chat.is_some() {
        choices.push(COMMIT_WITH_AI.to_string());
    }
    choices.push(COMMIT_MANUALLY.to_string());
    choices.push(PROCEED.to_string());

    let index = prompter.select("You have uncommitted changes.", &choices)?;
    let choice = choices.get(index).map(String::as_str).unwrap_or(PROCEED);

    let message = match (choice, chat) {
        (COMMIT_WITH_AI, Some(chat)) => draft_commit_message(prompter, repo, branch, chat).await?,
        (COMMIT_MANUALLY, _) => prompter.editor("Commit message", "")?,
        _ => return Ok(()),
    };

    if message.trim().is_empty() {
        return Err(GluError::NoCommitMessage.into());
    }

    let commit = repo.commit_all(message.trim())?;
    ui::print_success(&format!("Committed {}", commit.summary));
    repo.push(DEFAULT_REMOTE, branch)
}

/// Generates a commit message and lets the user accept, revise or edit it
async fn draft_commit_message(
    prompter: &dyn Prompter,
    repo: &GitRepo,
    branch: &str,
    chat: &dyn ChatModel,
) -> Result<String> {
    let diff = repo.uncommitted_diff()?;
    let choices = [ACCEPT, REQUEST_CHANGES, EDIT].map(String::from);

    let mut draft = generate_commit_message(chat, &diff, branch, None).await?;
    loop {
        ui::print_bordered_content("Commit message", &draft.message());
        let index = prompter.select("Use this commit message?", &choices)?;
        match choices.get(index).map(String::as_str) {
            Some(ACCEPT) => return Ok(draft.message()),
            Some(REQUEST_CHANGES) => {
                let changes = prompter.text("What should change?", None)?;
                let revision = CommitRevision {
                    previous: &draft,
                    requested_changes: &changes,
                };
                let next = generate_commit_message(chat, &diff, branch, Some(revision)).await?;
                draft = next;
            }
            _ => return prompter.editor("Commit message", &draft.message()),
        }
    }
}

/// Makes sure the remote branch exists and matches the local one
fn sync_branch(prompter: &dyn Prompter, repo: &GitRepo, branch: &str) -> Result<()> {
    if let Err(e) = repo.fetch(DEFAULT_REMOTE, branch) {
        log_debug!("Fetch failed ({}); pushing {} instead", e, branch);
        repo.push(DEFAULT_REMOTE, branch)?;
    }

    if !is_remote_branch_in_sync(repo, branch, DEFAULT_REMOTE)
        && prompter.confirm(
            "Local branch is not up to date with remote. Push to remote now?",
            true,
        )?
    {
        repo.push(DEFAULT_REMOTE, branch)?;
    }
    Ok(())
}

async fn resolve_ticket_after_creation(
    services: &Services<'_>,
    repo_name: &str,
    chat: Option<&dyn ChatModel>,
    options: &PrCreateOptions,
    pr: &PullRequest,
) -> Result<Option<TicketRef>> {
    let answer = services.prompter.text(
        "Ticket [enter #, enter (c) to create, or Enter to skip]",
        Some(""),
    )?;
    let answer = answer.trim();

    if answer.is_empty() {
        return Ok(None);
    }

    let is_create = answer.eq_ignore_ascii_case("c");
    if !is_create && !answer.chars().all(|c| c.is_ascii_digit()) {
        ui::print_warning(&format!("'{answer}' is not a ticket number; skipping Jira"));
        return Ok(None);
    }

    let project = resolve_project(
        services.tracker,
        services.config,
        services.prompter,
        options.project.as_deref(),
        Some(repo_name),
    )
    .await?;

    if !is_create {
        return Ok(Some(TicketRef::new(&project, answer)?));
    }

    let chat = chat.ok_or(GluError::NoProviderAvailable)?;
    let issue_types: Vec<String> = services
        .tracker
        .issue_types(&project)
        .await?
        .into_iter()
        .filter(|t| !t.subtask)
        .map(|t| t.name)
        .collect();

    let prompt = format!("Create a ticket for the work done in the pull request '{}'", pr.title);
    let generated = generate_ticket(
        chat,
        services.config,
        &TicketRequest {
            prompt: &prompt,
            issue_type: None,
            issue_types: &issue_types,
            repo_name: Some(repo_name),
            extra_context: Some(pr.body_text()),
            ..TicketRequest::default()
        },
    )
    .await?;

    let me = resolve_user(services.tracker, services.prompter, None, "reporter").await?;
    let created = services
        .tracker
        .create_issue(&NewIssue {
            project_key: project,
            issue_type: generated.issuetype,
            summary: generated.summary,
            description: Some(generated.description),
            reporter: Some(me.clone()),
            assignee: Some(me),
            ..NewIssue::default()
        })
        .await?;

    ui::print_success(&format!("Created issue {}", created.key));
    Ok(Some(TicketRef::parse_key(&created.key)?))
}

/// Applies the configured workflow transitions the ticket currently offers.
///
/// "In progress" is applied when offered; "ready for review" only when `ready_for_review`
/// is set and it was offered. Missing transitions are skipped silently.
pub async fn transition_ticket(
    tracker: &dyn IssueTracker,
    config: &Config,
    ticket: &TicketRef,
    ready_for_review: bool,
) -> Result<Vec<String>> {
    let key = ticket.to_string();
    let offered = tracker.transitions(&key).await?;
    let mut applied = Vec::new();

    if let Some(in_progress) = find_transition(&offered, &config.env.jira_in_progress_transition) {
        tracker.transition_issue(&key, &in_progress.id).await?;
        applied.push(in_progress.name.clone());
    }

    if ready_for_review {
        // The offered set changes once the issue has moved
        let current = if applied.is_empty() {
            offered
        } else {
            tracker.transitions(&key).await?
        };
        if let Some(ready) = find_transition(&current, &config.env.jira_ready_for_review_transition)
        {
            tracker.transition_issue(&key, &ready.id).await?;
            applied.push(ready.name.clone());
            ui::print_message(&format!(
                "Moved issue {} to {}",
                key.blue(),
                ready.name.green()
            ));
        }
    }

    Ok(applied)
}
