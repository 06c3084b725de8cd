//! `glu pr list`

use crate::context::Services;
use crate::github::PullRequest;
use crate::log_debug;
use crate::ui;

use anyhow::Result;
use colored::Colorize;

const NUMBER_WIDTH: usize = 7;
const TITLE_WIDTH: usize = 50;
const ASSIGNEE_WIDTH: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct PrListOptions {
    pub mine: bool,
    pub no_draft: bool,
}

/// Keeps the PRs matching `--mine` and `--no-draft`
pub fn filter_pull_requests(
    prs: Vec<PullRequest>,
    current_login: Option<&str>,
    options: &PrListOptions,
) -> Vec<PullRequest> {
    prs.into_iter()
        .filter(|pr| !(options.no_draft && pr.draft))
        .filter(|pr| {
            if !options.mine {
                return true;
            }
            match (current_login, &pr.assignee) {
                (Some(login), Some(assignee)) => assignee.login.eq_ignore_ascii_case(login),
                _ => false,
            }
        })
        .collect()
}

/// Lists open PRs with their comment and commit counts. Returns the rows shown.
pub async fn list_prs(
    services: &Services<'_>,
    repo_name: &str,
    options: &PrListOptions,
) -> Result<Vec<PullRequest>> {
    let spinner = ui::create_spinner("Fetching pull requests...");
    let listed = services.host.list_pull_requests(repo_name).await;
    spinner.finish_and_clear();
    let listed = listed?;

    let current_login = if options.mine {
        Some(services.host.current_user().await?.login)
    } else {
        None
    };
    let filtered = filter_pull_requests(listed, current_login.as_deref(), options);
    log_debug!("{} PR(s) after filtering", filtered.len());

    if filtered.is_empty() {
        ui::print_message("Currently no open PRs");
        return Ok(filtered);
    }

    // Counts are only returned by the single-PR endpoint
    let mut detailed = Vec::with_capacity(filtered.len());
    for pr in filtered {
        detailed.push(services.host.pull_request(repo_name, pr.number).await?);
    }

    ui::print_message(&format!(
        "{}{}{}{}",
        ui::fit("#", NUMBER_WIDTH).bold(),
        ui::fit("Title", TITLE_WIDTH).bold(),
        ui::fit("Assignee", ASSIGNEE_WIDTH).bold(),
        "Activity".bold()
    ));
    for pr in &detailed {
        ui::print_message(&render_row(pr));
    }
    Ok(detailed)
}

fn render_row(pr: &PullRequest) -> String {
    let number = ui::fit(&format!("#{}", pr.number), NUMBER_WIDTH);
    let title = ui::fit(&pr.title, TITLE_WIDTH);
    let title = if pr.draft {
        title.dimmed().to_string()
    } else {
        title
    };
    let assignee = ui::fit(
        pr.assignee.as_ref().map_or("", |a| a.login.as_str()),
        ASSIGNEE_WIDTH,
    );
    let labels = pr
        .labels
        .iter()
        .map(|l| format!("[{}]", l.name).cyan().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{}{title}{assignee}💬 {} ⎇ {} {labels}",
        number.yellow(),
        pr.comments.unwrap_or_default(),
        pr.commits.unwrap_or_default(),
    )
}
