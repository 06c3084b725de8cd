//! `glu ticket create`

use crate::context::Services;
use crate::error::GluError;
use crate::generation::{TicketRequest, generate_ticket};
use crate::jira::{CreatedIssue, NewIssue, resolve_project, resolve_user};
use crate::llm::ChatModel;
use crate::types::TicketGeneration;
use crate::ui;
use crate::{log_debug, log_info};

use anyhow::{Result, anyhow};
use colored::Colorize;
use serde_json::{Map, Value};

const ACCEPT: &str = "Accept";
const REQUEST_CHANGES: &str = "Request changes";
const CANCEL: &str = "Cancel";

const EDITOR_ANSWER: &str = "e";

#[derive(Debug, Clone, Default)]
pub struct TicketCreateOptions {
    pub summary: Option<String>,
    pub issue_type: Option<String>,
    pub body: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub priority: Option<String>,
    pub project: Option<String>,
    /// Raw `key=value` pairs
    pub fields: Vec<String>,
    /// Prompt for AI drafting
    pub ai_prompt: Option<String>,
}

/// Parses repeated `key=value` options. Values that are valid JSON are kept as JSON.
pub fn parse_extra_fields(raw: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid field '{pair}', expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Invalid field '{pair}', key is empty"));
        }
        let value = value.trim();
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

/// Creates a Jira issue, optionally drafted by `chat`
pub async fn create_ticket(
    services: &Services<'_>,
    repo_name: Option<&str>,
    chat: Option<&dyn ChatModel>,
    options: &TicketCreateOptions,
) -> Result<CreatedIssue> {
    let extra_fields = parse_extra_fields(&options.fields)?;

    let project_key = resolve_project(
        services.tracker,
        services.config,
        services.prompter,
        options.project.as_deref(),
        repo_name,
    )
    .await?;

    let issue_types: Vec<String> = services
        .tracker
        .issue_types(&project_key)
        .await?
        .into_iter()
        .filter(|t| !t.subtask)
        .map(|t| t.name)
        .collect();
    log_debug!("Issue types for {}: {:?}", project_key, issue_types);

    let explicit_type = match options.issue_type.as_deref() {
        Some(requested) => Some(pick_issue_type(services, &issue_types, Some(requested))?),
        None => None,
    };

    let (issue_type, summary, description) = match (options.ai_prompt.as_deref(), chat) {
        (Some(prompt), Some(chat)) => {
            let request = TicketRequest {
                prompt,
                issue_type: explicit_type.as_deref(),
                issue_types: &issue_types,
                repo_name,
                ..TicketRequest::default()
            };
            let draft = draft_ticket(services, chat, request).await?;
            (draft.issuetype, draft.summary, Some(draft.description))
        }
        (Some(_), None) => return Err(GluError::NoProviderAvailable.into()),
        (None, _) => {
            let issue_type = match explicit_type {
                Some(issue_type) => issue_type,
                None => pick_issue_type(services, &issue_types, None)?,
            };
            let summary = match options.summary.as_deref().map(str::trim) {
                Some(summary) if !summary.is_empty() => summary.to_string(),
                _ => services.prompter.text("Summary:", None)?.trim().to_string(),
            };
            if summary.is_empty() {
                return Err(anyhow!("A ticket summary is required"));
            }
            let description = match &options.body {
                Some(body) => Some(body.clone()),
                None => prompt_description(services, &issue_type)?,
            };
            (issue_type, summary, description)
        }
    };

    let reporter = resolve_user(
        services.tracker,
        services.prompter,
        options.reporter.as_deref(),
        "reporter",
    )
    .await?;
    let assignee = match options.assignee.as_deref() {
        Some(query) => {
            Some(resolve_user(services.tracker, services.prompter, Some(query), "assignee").await?)
        }
        None => None,
    };

    let issue = NewIssue {
        project_key,
        issue_type,
        summary,
        description,
        reporter: Some(reporter),
        assignee,
        priority: options.priority.clone(),
        extra_fields,
    };

    let spinner = ui::create_spinner("Creating ticket...");
    let created = services.tracker.create_issue(&issue).await;
    spinner.finish_and_clear();
    let created = created?;

    log_info!("Created Jira issue {}", created.key);
    ui::print_success(&format!("Created {}", created.key.bold()));
    ui::print_message(&services.tracker.browse_url(&created.key));
    Ok(created)
}

/// `requested` matched case-insensitively, otherwise an interactive choice
fn pick_issue_type(
    services: &Services<'_>,
    issue_types: &[String],
    requested: Option<&str>,
) -> Result<String> {
    if let Some(requested) = requested {
        if let Some(found) = issue_types
            .iter()
            .find(|t| t.eq_ignore_ascii_case(requested.trim()))
        {
            return Ok(found.clone());
        }
        ui::print_warning(&format!("Issue type '{requested}' is not available"));
    }
    if issue_types.is_empty() {
        return Err(anyhow!("No issue types available"));
    }
    let index = services.prompter.select("Select issue type:", issue_types)?;
    issue_types
        .get(index)
        .cloned()
        .ok_or_else(|| GluError::Cancelled.into())
}

fn prompt_description(services: &Services<'_>, issue_type: &str) -> Result<Option<String>> {
    let answer = services.prompter.text(
        "Description [(e) to launch editor, enter to skip]",
        Some(""),
    )?;
    let answer = answer.trim();

    if answer.is_empty() {
        return Ok(None);
    }
    if answer.eq_ignore_ascii_case(EDITOR_ANSWER) {
        let skeleton = services
            .config
            .issue_template(issue_type)
            .unwrap_or_default();
        let edited = services.prompter.editor("Description", skeleton)?;
        let edited = edited.trim();
        return Ok((!edited.is_empty()).then(|| edited.to_string()));
    }
    Ok(Some(answer.to_string()))
}

/// Generate, show, and loop until the user accepts or cancels
async fn draft_ticket(
    services: &Services<'_>,
    chat: &dyn ChatModel,
    request: TicketRequest<'_>,
) -> Result<TicketGeneration> {
    let choices = [ACCEPT, REQUEST_CHANGES, CANCEL].map(String::from);
    let mut draft = generate_ticket(chat, services.config, &request).await?;

    loop {
        ui::print_bordered_content(
            &format!("{} ({})", draft.summary, draft.issuetype),
            &draft.description,
        );

        match services.prompter.select("Create this ticket?", &choices)? {
            0 => return Ok(draft),
            1 => {
                let changes = services.prompter.text("What should change?", None)?;
                let revision = TicketRequest {
                    previous_attempt: Some(&draft),
                    requested_changes: Some(changes.trim()),
                    ..request.clone()
                };
                let next = generate_ticket(chat, services.config, &revision).await?;
                draft = next;
            }
            _ => return Err(GluError::Cancelled.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_extra_fields() {
        let raw = vec![
            "labels=[\"backend\"]".to_string(),
            "customfield_10010=Team A".to_string(),
            "story_points = 3".to_string(),
        ];
        let fields = parse_extra_fields(&raw).expect("fields");
        assert_eq!(fields.get("labels"), Some(&json!(["backend"])));
        assert_eq!(fields.get("customfield_10010"), Some(&json!("Team A")));
        assert_eq!(fields.get("story_points"), Some(&json!(3)));
    }

    #[test]
    fn test_parse_extra_fields_rejects_missing_separator() {
        assert!(parse_extra_fields(&["labels".to_string()]).is_err());
        assert!(parse_extra_fields(&["=x".to_string()]).is_err());
    }
}
