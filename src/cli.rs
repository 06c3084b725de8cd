use crate::commands::pr_create::{PrCreateOptions, create_pr};
use crate::commands::pr_list::{PrListOptions, list_prs};
use crate::commands::pr_merge::{PrMergeOptions, merge_pr};
use crate::commands::pr_view::view_pr;
use crate::commands::ticket_create::{TicketCreateOptions, create_ticket};
use crate::commands::ticket_list::{TicketListOptions, list_tickets};
use crate::commands::{repo_name_or_local, repo_name_or_prompt, select_chat};
use crate::config::Config;
use crate::context::Services;
use crate::git::GitRepo;
use crate::github::GitHubClient;
use crate::jira::JiraClient;
use crate::log_debug;
use crate::logger::DEFAULT_LOG_FILE;
use crate::providers::{Provider, available_providers_parser};
use crate::ui::{self, InquirePrompter};

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand, crate_version};

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    name = "glu",
    version = crate_version!(),
    about = "glu: glue git, GitHub, Jira and AI together",
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug messages to a file
    #[arg(short = 'l', long = "log", global = true)]
    pub log: bool,

    /// Custom log file path (implies --log)
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<String>,

    /// Suppress non-essential output such as spinners
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with pull requests
    #[command(subcommand)]
    Pr(PrCommand),

    /// Work with Jira tickets
    #[command(subcommand)]
    Ticket(TicketCommand),
}

/// Chat provider selection shared by commands that generate text
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// AI provider to use
    #[arg(long, value_parser = available_providers_parser)]
    pub provider: Option<Provider>,

    /// Model to use instead of the provider's default
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum PrCommand {
    /// Create a PR from the current branch
    Create {
        /// Jira ticket number
        #[arg(short, long)]
        ticket: Option<String>,

        /// Jira project key
        #[arg(short, long)]
        project: Option<String>,

        /// Open the PR as a draft
        #[arg(short, long)]
        draft: bool,

        /// Do not move the ticket to ready for review
        #[arg(long)]
        no_ready_for_review: bool,

        /// Let the AI title the PR too
        #[arg(long)]
        generate_title: bool,

        /// Reviewer to request, matched against org members (repeatable)
        #[arg(short, long = "reviewer")]
        reviewers: Vec<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Squash-merge a PR
    Merge {
        /// PR number
        number: u64,

        /// Jira ticket number
        #[arg(short, long)]
        ticket: Option<String>,

        /// Jira project key
        #[arg(short, long)]
        project: Option<String>,

        /// Repository as org/repo
        #[arg(long)]
        repo: Option<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// List open PRs
    List {
        /// Repository as org/repo
        #[arg(long)]
        repo: Option<String>,

        /// Only PRs assigned to you
        #[arg(long)]
        mine: bool,

        /// Hide draft PRs
        #[arg(long)]
        no_draft: bool,
    },

    /// Show a single PR
    View {
        /// PR number
        number: u64,

        /// Repository as org/repo
        #[arg(long)]
        repo: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TicketCommand {
    /// Create a Jira ticket
    Create {
        #[arg(short, long)]
        summary: Option<String>,

        /// Issue type
        #[arg(short = 't', long = "type")]
        issue_type: Option<String>,

        /// Description
        #[arg(short, long)]
        body: Option<String>,

        /// Assignee name or email; me@me for yourself
        #[arg(short, long)]
        assignee: Option<String>,

        /// Reporter name or email; defaults to you
        #[arg(short, long)]
        reporter: Option<String>,

        #[arg(short = 'y', long)]
        priority: Option<String>,

        /// Jira project key
        #[arg(short, long)]
        project: Option<String>,

        /// Extra field as key=value (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Describe the ticket and let the AI draft it
        #[arg(long = "ai")]
        ai_prompt: Option<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// List Jira tickets
    List {
        /// Jira project key
        #[arg(short, long)]
        project: Option<String>,

        /// Only tickets assigned to you
        #[arg(short, long)]
        mine: bool,

        /// Status to include (repeatable)
        #[arg(short, long = "status")]
        statuses: Vec<String>,

        /// Only unresolved tickets
        #[arg(long)]
        open: bool,

        /// Exclude tickets still in "To Do"
        #[arg(long)]
        in_progress: bool,

        /// Priority to include (repeatable)
        #[arg(long = "priority")]
        priorities: Vec<String>,

        /// Order by priority instead of creation date
        #[arg(long)]
        priority_order: bool,
    },
}

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Main function to parse arguments and handle the command
pub async fn main() -> anyhow::Result<()> {
    let cli = parse_args();

    if cli.log || cli.log_file.is_some() {
        crate::logger::enable_logging();
        let log_file = cli.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE);
        crate::logger::set_log_file(log_file)?;
    } else {
        crate::logger::disable_logging();
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    let config = Config::load()?;
    log_debug!("Configuration loaded");

    let host = GitHubClient::new(config.env.github_pat.clone());
    let tracker = JiraClient::from_config(&config);
    let prompter = InquirePrompter::new();
    let services = Services::new(&config, &host, &tracker, &prompter);

    handle_command(&services, cli.command).await
}

pub async fn handle_command(services: &Services<'_>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Pr(pr) => handle_pr(services, pr).await,
        Commands::Ticket(ticket) => handle_ticket(services, ticket).await,
    }
}

async fn handle_pr(services: &Services<'_>, command: PrCommand) -> anyhow::Result<()> {
    match command {
        PrCommand::Create {
            ticket,
            project,
            draft,
            no_ready_for_review,
            generate_title,
            reviewers,
            provider,
        } => {
            let repo = GitRepo::open_current()?;
            let repo_name = repo.repo_name()?;
            let chat = select_chat(services, provider.provider, provider.model.as_deref(), false)?;
            let options = PrCreateOptions {
                ticket,
                project,
                draft,
                ready_for_review: !no_ready_for_review,
                reviewers,
                generate_title,
            };
            create_pr(services, &repo, &repo_name, chat.as_deref(), &options).await?;
        }
        PrCommand::Merge {
            number,
            ticket,
            project,
            repo,
            provider,
        } => {
            let repo_name = repo_name_or_prompt(repo.as_deref(), services.prompter)?;
            let chat = select_chat(services, provider.provider, provider.model.as_deref(), false)?;
            let options = PrMergeOptions {
                number,
                ticket,
                project,
            };
            merge_pr(services, &repo_name, chat.as_deref(), &options).await?;
        }
        PrCommand::List {
            repo,
            mine,
            no_draft,
        } => {
            let repo_name = repo_name_or_prompt(repo.as_deref(), services.prompter)?;
            list_prs(services, &repo_name, &PrListOptions { mine, no_draft }).await?;
        }
        PrCommand::View { number, repo } => {
            let repo_name = repo_name_or_prompt(repo.as_deref(), services.prompter)?;
            view_pr(services, &repo_name, number).await?;
        }
    }
    Ok(())
}

async fn handle_ticket(services: &Services<'_>, command: TicketCommand) -> anyhow::Result<()> {
    // Outside a repository the project simply cannot come from a repo override
    let repo_name = repo_name_or_local(None).ok();

    match command {
        TicketCommand::Create {
            summary,
            issue_type,
            body,
            assignee,
            reporter,
            priority,
            project,
            fields,
            ai_prompt,
            provider,
        } => {
            let chat = if ai_prompt.is_some() {
                select_chat(services, provider.provider, provider.model.as_deref(), true)?
            } else {
                None
            };
            let options = TicketCreateOptions {
                summary,
                issue_type,
                body,
                assignee,
                reporter,
                priority,
                project,
                fields,
                ai_prompt,
            };
            create_ticket(services, repo_name.as_deref(), chat.as_deref(), &options).await?;
        }
        TicketCommand::List {
            project,
            mine,
            statuses,
            open,
            in_progress,
            priorities,
            priority_order,
        } => {
            let options = TicketListOptions {
                project,
                mine,
                statuses,
                open,
                in_progress,
                priorities,
                priority_order,
            };
            list_tickets(services, repo_name.as_deref(), &options).await?;
        }
    }
    Ok(())
}
