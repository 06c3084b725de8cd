use super::generate_with_retries;
use super::prompt::{PrPromptInput, pr_description_prompt};
use crate::config::Config;
use crate::github::{CodeHost, PullRequest};
use crate::llm::{ChatModel, parse_json_response};
use crate::log_debug;
use crate::providers::Provider;
use crate::ticket_key::TicketRef;
use crate::types::PrDescriptionGeneration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};

/// PR template location inside a repository
pub const PR_TEMPLATE_PATH: &str = ".github/pull_request_template.md";

/// Used when neither the repository nor the config has a template
pub const DEFAULT_PR_TEMPLATE: &str = include_str!("pull_request_template.md");

/// PRs younger than this are not indexed remotely yet
pub const RECENT_PR_WINDOW: TimeDelta = TimeDelta::minutes(15);

/// How the PR's changes reach the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    /// The diff is embedded in the prompt
    EmbedDiff,
    /// Only the PR URL is given; the provider reads the indexed PR itself
    Link,
}

/// Recently created PRs always embed the diff; older ones are linked when the provider indexes remote content
pub fn description_source(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    provider: Provider,
) -> DescriptionSource {
    let recently_created = now - created_at < RECENT_PR_WINDOW;
    if recently_created || !provider.indexes_remote_content() {
        DescriptionSource::EmbedDiff
    } else {
        DescriptionSource::Link
    }
}

/// Template from the repository's default branch, then the repo config, then the bundled default
pub async fn resolve_pr_template(
    host: &dyn CodeHost,
    config: &Config,
    repo_name: &str,
    default_branch: &str,
) -> String {
    match host
        .file_contents(repo_name, PR_TEMPLATE_PATH, default_branch)
        .await
    {
        Ok(Some(template)) if !template.trim().is_empty() => return template,
        Ok(_) => {}
        Err(e) => log_debug!("Could not read PR template from {}: {}", repo_name, e),
    }

    config
        .repo_pr_template(repo_name)
        .unwrap_or(DEFAULT_PR_TEMPLATE)
        .to_string()
}

/// Drafts a description for `pr`, and a title too when `generate_title` is set.
///
/// A known ticket is injected into the generated description.
pub async fn generate_pr_description(
    chat: &dyn ChatModel,
    host: &dyn CodeHost,
    config: &Config,
    repo_name: &str,
    default_branch: &str,
    pr: &PullRequest,
    generate_title: bool,
    ticket: Option<&TicketRef>,
) -> Result<PrDescriptionGeneration> {
    let template = resolve_pr_template(host, config, repo_name, default_branch).await;

    let source = description_source(pr.created_at, Utc::now(), chat.provider());
    log_debug!("Describing PR #{} via {:?}", pr.number, source);

    let diff = match source {
        DescriptionSource::EmbedDiff => Some(host.pull_request_diff(repo_name, pr.number).await?),
        DescriptionSource::Link => None,
    };
    let location = match source {
        DescriptionSource::EmbedDiff => "diff below",
        DescriptionSource::Link => pr.html_url.as_str(),
    };

    let input = PrPromptInput {
        location,
        template: &template,
        body: pr.body_text(),
        diff: diff.as_deref(),
        generate_title,
    };

    let mut generated = generate_with_retries(
        chat,
        "PR description",
        |feedback| pr_description_prompt(&input, feedback),
        |response| {
            parse_json_response::<PrDescriptionGeneration>(response)
                .map_err(|e| {
                    format!("Your response was not valid JSON in the requested format ({e})")
                })?
                .validated(generate_title)
        },
    )
    .await?;

    if let Some(ticket) = ticket {
        generated.description = ticket.inject(&generated.description);
    }
    Ok(generated)
}
