//! Orchestrators behind each CLI command.

pub mod pr_create;
pub mod pr_list;
pub mod pr_merge;
pub mod pr_view;
pub mod ticket_create;
pub mod ticket_list;

use crate::context::Services;
use crate::error::GluError;
use crate::git::GitRepo;
use crate::llm::{ChatModel, chat_model};
use crate::providers::{Provider, available_providers, select_provider};
use crate::ui;

use anyhow::Result;

/// Picks a provider and builds its client.
///
/// `Ok(None)` only when nothing is configured and `require_available` is false.
pub fn select_chat(
    services: &Services<'_>,
    explicit: Option<Provider>,
    model: Option<&str>,
    require_available: bool,
) -> Result<Option<Box<dyn ChatModel>>> {
    let available = available_providers(services.config);
    let provider = select_provider(&available, explicit, require_available, services.prompter)?;

    match provider {
        Some(provider) => Ok(Some(chat_model(provider, services.config, model)?)),
        None => {
            ui::print_warning("No API key found for AI generation.");
            Ok(None)
        }
    }
}

/// `--repo` if given, otherwise the name of the repository in the working directory
pub fn repo_name_or_local(explicit: Option<&str>) -> Result<String> {
    match explicit.map(str::trim).filter(|r| !r.is_empty()) {
        Some(repo) => Ok(repo.to_string()),
        None => GitRepo::open_current()?.repo_name(),
    }
}

/// Like [`repo_name_or_local`], asking for org and repo when outside a repository
pub fn repo_name_or_prompt(explicit: Option<&str>, prompter: &dyn ui::Prompter) -> Result<String> {
    match repo_name_or_local(explicit) {
        Ok(name) => Ok(name),
        Err(e) if matches!(
            crate::error::as_glu_error(&e),
            Some(GluError::NotARepository | GluError::NoRemote)
        ) =>
        {
            let org = prompter.text("Enter org name:", None)?;
            let repo = prompter.text("Enter repo name:", None)?;
            Ok(format!("{}/{}", org.trim(), repo.trim()))
        }
        Err(e) => Err(e),
    }
}
