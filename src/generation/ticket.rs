use super::generate_with_retries;
use super::prompt::{TicketPromptInput, ticket_prompt};
use crate::config::Config;
use crate::llm::{ChatModel, parse_json_response};
use crate::types::TicketGeneration;

use anyhow::Result;

const DEFAULT_TICKET_TEMPLATE: &str = "Description:\n{description}";

/// Inputs for a ticket draft
#[derive(Debug, Clone, Default)]
pub struct TicketRequest<'a> {
    /// What the user wants the ticket to be about
    pub prompt: &'a str,
    /// Chosen issue type; when `None` the model picks from `issue_types`
    pub issue_type: Option<&'a str>,
    pub issue_types: &'a [String],
    pub repo_name: Option<&'a str>,
    /// Extra material such as a PR description
    pub extra_context: Option<&'a str>,
    pub previous_attempt: Option<&'a TicketGeneration>,
    pub requested_changes: Option<&'a str>,
}

fn templates_for(config: &Config, request: &TicketRequest<'_>) -> Vec<(String, String)> {
    match request.issue_type {
        Some(issue_type) => vec![(
            issue_type.to_string(),
            config
                .issue_template(issue_type)
                .unwrap_or(DEFAULT_TICKET_TEMPLATE)
                .to_string(),
        )],
        None => request
            .issue_types
            .iter()
            .filter_map(|t| config.issue_template(t).map(|tpl| (t.clone(), tpl.to_string())))
            .collect(),
    }
}

/// Drafts a Jira ticket's summary, description and issue type
pub async fn generate_ticket(
    chat: &dyn ChatModel,
    config: &Config,
    request: &TicketRequest<'_>,
) -> Result<TicketGeneration> {
    let templates = templates_for(config, request);

    let previous_json = request
        .previous_attempt
        .map(serde_json::to_string_pretty)
        .transpose()?;
    let revision = previous_json.as_deref().zip(request.requested_changes);

    let repo_context = request
        .repo_name
        .filter(|_| chat.provider().indexes_remote_content());

    let input = TicketPromptInput {
        user_prompt: request.prompt,
        issue_type: request.issue_type,
        issue_types: request.issue_types,
        templates: &templates,
        repo_context,
        extra_context: request.extra_context,
        revision,
    };

    let fallback_type = request
        .issue_type
        .or_else(|| request.issue_types.first().map(String::as_str))
        .unwrap_or("Task")
        .to_string();

    generate_with_retries(
        chat,
        "ticket",
        |feedback| ticket_prompt(&input, feedback),
        |response| {
            let mut parsed = parse_json_response::<TicketGeneration>(response).map_err(|e| {
                format!("Your response was not valid JSON in the requested format ({e})")
            })?;
            if request.issue_type.is_some() {
                parsed.issuetype.clone_from(&fallback_type);
            }
            parsed.validated(request.issue_types, &fallback_type)
        },
    )
    .await
}
