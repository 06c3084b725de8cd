//! `glu ticket list`

use crate::context::Services;
use crate::jira::{Issue, resolve_project};
use crate::log_debug;
use crate::ui;

use anyhow::Result;
use colored::{ColoredString, Colorize};

const KEY_WIDTH: usize = 12;
const SUMMARY_WIDTH: usize = 50;
const STATUS_WIDTH: usize = 16;
const PRIORITY_WIDTH: usize = 10;
const PERSON_WIDTH: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct TicketListOptions {
    pub project: Option<String>,
    pub mine: bool,
    pub statuses: Vec<String>,
    pub open: bool,
    pub in_progress: bool,
    pub priorities: Vec<String>,
    /// Order by priority instead of creation date
    pub priority_order: bool,
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.trim().replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the JQL query for the listing
pub fn build_jql(project_key: &str, options: &TicketListOptions) -> String {
    let mut clauses = vec![format!("project={project_key}")];

    if options.mine {
        clauses.push("assignee = currentUser()".to_string());
    }

    if options.statuses.is_empty() {
        if options.open {
            clauses.push("resolution = unresolved".to_string());
        }
        if options.in_progress {
            clauses.push("status != \"to do\"".to_string());
        }
    } else {
        clauses.push(format!("status IN ({})", quoted_list(&options.statuses)));
    }

    if !options.priorities.is_empty() {
        clauses.push(format!("priority IN ({})", quoted_list(&options.priorities)));
    }

    let order = if options.priority_order {
        "priority"
    } else {
        "created"
    };
    format!("{} order by {order} desc", clauses.join(" and "))
}

/// ✔ resolved, ◆ in progress, blank otherwise
pub fn status_marker(issue: &Issue) -> &'static str {
    if issue.fields.resolution.is_some() {
        "✔"
    } else if issue.fields.status.name.eq_ignore_ascii_case("to do") {
        " "
    } else {
        "◆"
    }
}

fn colored_priority(priority: &str) -> ColoredString {
    let cell = ui::fit(priority, PRIORITY_WIDTH);
    match priority.to_lowercase().as_str() {
        "lowest" | "low" => cell.blue(),
        "high" | "highest" => cell.red(),
        _ => cell.normal(),
    }
}

pub async fn list_tickets(
    services: &Services<'_>,
    repo_name: Option<&str>,
    options: &TicketListOptions,
) -> Result<Vec<Issue>> {
    let project_key = resolve_project(
        services.tracker,
        services.config,
        services.prompter,
        options.project.as_deref(),
        repo_name,
    )
    .await?;

    let jql = build_jql(&project_key, options);
    log_debug!("Searching issues with JQL: {}", jql);

    let spinner = ui::create_spinner("Searching tickets...");
    let issues = services.tracker.search_issues(&jql).await;
    spinner.finish_and_clear();
    let issues = issues?;

    if issues.is_empty() {
        ui::print_message(&format!("No tickets found in {project_key}"));
        return Ok(issues);
    }

    ui::print_message(&format!(
        "  {}{}{}{}{}{}",
        ui::fit("Key", KEY_WIDTH).bold(),
        ui::fit("Summary", SUMMARY_WIDTH).bold(),
        ui::fit("Status", STATUS_WIDTH).bold(),
        ui::fit("Priority", PRIORITY_WIDTH).bold(),
        ui::fit("Assignee", PERSON_WIDTH).bold(),
        "Reporter".bold()
    ));
    for issue in &issues {
        let fields = &issue.fields;
        let priority = fields.priority.as_ref().map_or("", |p| p.name.as_str());
        let assignee = ui::abbreviate_last_name(fields.assignee.as_ref().map(|u| u.display_name.as_str()));
        let reporter = ui::abbreviate_last_name(fields.reporter.as_ref().map(|u| u.display_name.as_str()));

        ui::print_message(&format!(
            "{} {}{}{}{}{}{reporter}",
            status_marker(issue).green(),
            ui::fit(&issue.key, KEY_WIDTH).yellow(),
            ui::fit(&fields.summary, SUMMARY_WIDTH),
            ui::fit(&fields.status.name, STATUS_WIDTH),
            colored_priority(priority),
            ui::fit(&assignee, PERSON_WIDTH),
        ));
    }
    Ok(issues)
}
