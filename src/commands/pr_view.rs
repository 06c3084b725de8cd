//! `glu pr view`

use crate::context::Services;
use crate::github::PullRequest;
use crate::ui;

use anyhow::Result;
use colored::Colorize;

/// Plain-text summary of a PR, without the body
pub fn describe_pull_request(pr: &PullRequest) -> Vec<(&'static str, String)> {
    let reviewers = if pr.requested_reviewers.is_empty() {
        "[None]".to_string()
    } else {
        pr.requested_reviewers
            .iter()
            .map(|r| r.login.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    vec![
        ("Status", pr.status_label().to_string()),
        (
            "Assignee",
            pr.assignee
                .as_ref()
                .map_or_else(|| "[None]".to_string(), |a| a.login.clone()),
        ),
        ("Reviewers", reviewers),
        (
            "Branch",
            format!(
                "{} → {} ({} commit(s))",
                pr.head.name,
                pr.base.name,
                pr.commits.unwrap_or_default()
            ),
        ),
        ("Comments", pr.comments.unwrap_or_default().to_string()),
    ]
}

pub async fn view_pr(services: &Services<'_>, repo_name: &str, number: u64) -> Result<PullRequest> {
    let spinner = ui::create_spinner(&format!("Fetching PR #{number}..."));
    let pr = services.host.pull_request(repo_name, number).await;
    spinner.finish_and_clear();
    let pr = pr?;

    let status = match pr.status_label() {
        "Merged" => pr.status_label().magenta(),
        "Closed" => pr.status_label().red(),
        "Draft" => pr.status_label().dimmed(),
        other => other.green(),
    };
    ui::print_message(&format!("{} {} [{status}]", format!("#{}", pr.number).yellow(), pr.title.bold()));
    ui::print_info(&pr.html_url);

    for (label, value) in describe_pull_request(&pr) {
        ui::print_message(&format!("{:<10} {value}", format!("{label}:").bold()));
    }

    let body = pr.body_text().trim();
    ui::print_bordered_content(
        "Description",
        if body.is_empty() { "[No description]" } else { body },
    );
    Ok(pr)
}
