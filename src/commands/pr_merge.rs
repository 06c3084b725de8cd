//! `glu pr merge`

use crate::context::Services;
use crate::error::GluError;
use crate::generation::generate_squash_message;
use crate::github::MergeResult;
use crate::jira::resolve_project;
use crate::llm::ChatModel;
use crate::log_debug;
use crate::ticket_key::{TicketRef, find_ticket_numbers};
use crate::ui;

use anyhow::{Result, anyhow};
use colored::Colorize;

const SQUASH_WITH_AI: &str = "Generate squash message with AI";
const SQUASH_MANUALLY: &str = "Write squash message manually";

#[derive(Debug, Clone, Default)]
pub struct PrMergeOptions {
    pub number: u64,
    pub ticket: Option<String>,
    pub project: Option<String>,
}

/// Splits an edited message into title and body at the first blank line
pub fn split_manual_message(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let mut lines = text.lines();

    let mut title_lines = Vec::new();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        title_lines.push(line.trim());
    }

    let title = title_lines.join(" ");
    if title.is_empty() {
        return None;
    }
    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Some((title, body))
}

/// Squash-merges a PR with an AI-composed or hand-written message
pub async fn merge_pr(
    services: &Services<'_>,
    repo_name: &str,
    chat: Option<&dyn ChatModel>,
    options: &PrMergeOptions,
) -> Result<MergeResult> {
    let pr = services.host.pull_request(repo_name, options.number).await?;
    let commit_messages: Vec<String> = services
        .host
        .pull_request_commits(repo_name, options.number)
        .await?
        .into_iter()
        .map(|c| c.commit.message)
        .collect();
    log_debug!(
        "PR #{} has {} commit(s)",
        options.number,
        commit_messages.len()
    );

    let use_ai = match chat {
        Some(_) => {
            let choices = [SQUASH_WITH_AI, SQUASH_MANUALLY].map(String::from);
            let index = services.prompter.select("Squash message:", &choices)?;
            index == 0
        }
        None => false,
    };

    let (title, body) = match (use_ai, chat) {
        (true, Some(chat)) => {
            let ticket = resolve_merge_ticket(services, repo_name, options, pr.body_text(), &commit_messages)
                .await?;

            let generated =
                generate_squash_message(chat, &pr.title, pr.body_text(), &commit_messages).await?;
            let body = match &ticket {
                Some(ticket) => ticket.inject(&generated.body),
                None => generated.body.clone(),
            };

            let draft = format!("{}\n\n{body}", generated.title_line());
            let edited = services.prompter.editor("Squash commit message", &draft)?;
            split_manual_message(&edited).ok_or(GluError::NoCommitMessage)?
        }
        _ => {
            let mut draft = format!("{}\n\n", pr.title);
            for message in &commit_messages {
                draft.push_str(&format!("* {}\n", message.lines().next().unwrap_or_default()));
            }
            let edited = services.prompter.editor("Squash commit message", &draft)?;
            split_manual_message(&edited).ok_or(GluError::NoCommitMessage)?
        }
    };

    let result = services
        .host
        .merge_pull_request(repo_name, options.number, &title, &body)
        .await?;

    if !result.merged {
        return Err(anyhow!("PR #{} was not merged: {}", options.number, result.message));
    }

    ui::print_success(&format!("Merged PR #{} with {}", options.number, title.bold()));
    Ok(result)
}

/// `--ticket`, then a reference in the PR body or commits, then the user
async fn resolve_merge_ticket(
    services: &Services<'_>,
    repo_name: &str,
    options: &PrMergeOptions,
    pr_body: &str,
    commit_messages: &[String],
) -> Result<Option<TicketRef>> {
    let project = resolve_project(
        services.tracker,
        services.config,
        services.prompter,
        options.project.as_deref(),
        Some(repo_name),
    )
    .await?;

    if let Some(ticket) = &options.ticket {
        return Ok(Some(TicketRef::new(&project, ticket)?));
    }

    // Loose references such as `ABC-old` are skipped
    let found = std::iter::once(pr_body)
        .chain(commit_messages.iter().map(String::as_str))
        .flat_map(|text| find_ticket_numbers(text, &project))
        .find_map(|number| TicketRef::new(&project, number).ok());
    if found.is_some() {
        return Ok(found);
    }

    let answer = services
        .prompter
        .text("Ticket number (Enter to skip):", Some(""))?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    Ok(Some(TicketRef::new(&project, answer)?))
}
