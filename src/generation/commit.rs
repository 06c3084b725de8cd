use super::generate_with_retries;
use super::prompt::{commit_prompt, squash_prompt};
use crate::llm::{ChatModel, parse_json_response};
use crate::types::CommitGeneration;

use anyhow::Result;

/// A previous draft the user asked to change
#[derive(Debug, Clone, Copy)]
pub struct CommitRevision<'a> {
    pub previous: &'a CommitGeneration,
    pub requested_changes: &'a str,
}

fn validate_commit(response: &str) -> Result<CommitGeneration, String> {
    parse_json_response::<CommitGeneration>(response)
        .map_err(|e| format!("Your response was not valid JSON in the requested format ({e})"))?
        .validated()
}

/// Drafts a commit message for the uncommitted `diff`
pub async fn generate_commit_message(
    chat: &dyn ChatModel,
    diff: &str,
    branch: &str,
    revision: Option<CommitRevision<'_>>,
) -> Result<CommitGeneration> {
    let previous = revision.map(|r| r.previous.message());
    let revision_text = revision.map(|r| r.requested_changes);

    generate_with_retries(
        chat,
        "commit message",
        |feedback| {
            let revision = previous.as_deref().zip(revision_text);
            commit_prompt(diff, branch, revision, feedback)
        },
        validate_commit,
    )
    .await
}

/// Drafts the squash commit for a PR from its commits and body
pub async fn generate_squash_message(
    chat: &dyn ChatModel,
    pr_title: &str,
    pr_body: &str,
    commit_messages: &[String],
) -> Result<CommitGeneration> {
    generate_with_retries(
        chat,
        "squash commit message",
        |feedback| squash_prompt(pr_title, pr_body, commit_messages, feedback),
        validate_commit,
    )
    .await
}
