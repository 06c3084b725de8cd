//! LLM-backed drafting of commit messages, PR descriptions and Jira tickets.
//!
//! Every generator asks for a JSON object and validates it. A malformed answer
//! is retried with the error and the rejected output appended to the prompt,
//! for at most [`MAX_RETRIES`] retries.

mod commit;
mod pr;
mod prompt;
mod ticket;

pub use commit::{CommitRevision, generate_commit_message, generate_squash_message};
pub use pr::{
    DEFAULT_PR_TEMPLATE, DescriptionSource, PR_TEMPLATE_PATH, RECENT_PR_WINDOW, description_source,
    generate_pr_description, resolve_pr_template,
};
pub use prompt::Feedback;
pub use ticket::{TicketRequest, generate_ticket};

use crate::error::GluError;
use crate::llm::ChatModel;
use crate::ui;
use crate::{log_debug, log_warn};

use anyhow::Result;

/// Retries after the first attempt
pub const MAX_RETRIES: usize = 2;

/// Invokes `chat` until `validate` accepts the answer.
///
/// `build_prompt` receives the feedback from the previous rejected attempt.
/// Transport errors are returned immediately; only rejected answers are retried.
pub async fn generate_with_retries<T, B, V>(
    chat: &dyn ChatModel,
    what: &'static str,
    build_prompt: B,
    validate: V,
) -> Result<T>
where
    B: Fn(Option<&Feedback>) -> String,
    V: Fn(&str) -> Result<T, String>,
{
    let attempts = MAX_RETRIES + 1;
    let mut feedback: Option<Feedback> = None;

    for attempt in 1..=attempts {
        let prompt = build_prompt(feedback.as_ref());
        log_debug!("Generating {} (attempt {}/{})", what, attempt, attempts);

        let spinner = ui::create_spinner(&format!("Generating {what}..."));
        let response = chat.invoke(&prompt).await;
        spinner.finish_and_clear();
        let response = response?;

        match validate(&response) {
            Ok(value) => return Ok(value),
            Err(error) => {
                log_warn!("Rejected {} on attempt {}: {}", what, attempt, error);
                feedback = Some(Feedback {
                    previous_output: response,
                    error,
                });
            }
        }
    }

    Err(GluError::GenerationFailed {
        what,
        attempts,
        last_error: feedback.map(|f| f.error).unwrap_or_default(),
    }
    .into())
}
