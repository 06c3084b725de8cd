//! User-facing error taxonomy.
//!
//! Everything in here is an expected outcome of bad input or missing setup and is
//! reported as a one-line message. Unexpected failures (HTTP, git plumbing) travel
//! as plain `anyhow` errors with their full context chain.

use inquire::error::InquireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GluError {
    #[error("Not a valid git repository")]
    NotARepository,

    #[error("No remote found for git config")]
    NoRemote,

    #[error("Could not find a commit on this branch")]
    NoCommitFound,

    #[error(
        "Jira ticket must be an integer (got '{0}'). Provide the Jira project key via the config.toml file"
    )]
    InvalidTicketNumber(String),

    #[error("No API key found for \"{0}\"")]
    MissingCredential(String),

    #[error("No API key found for AI generation")]
    NoProviderAvailable,

    #[error("Failed to generate {what} after {attempts} attempts: {last_error}")]
    GenerationFailed {
        what: &'static str,
        attempts: usize,
        last_error: String,
    },

    #[error("No commit message provided")]
    NoCommitMessage,

    #[error("No members found in org {0}")]
    NoMembers(String),

    #[error("No user found with name '{0}'")]
    UserNotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl From<InquireError> for GluError {
    fn from(err: InquireError) -> Self {
        match err {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => Self::Cancelled,
            other => Self::Prompt(other.to_string()),
        }
    }
}

/// Finds a `GluError` anywhere in an error chain.
pub fn as_glu_error(err: &anyhow::Error) -> Option<&GluError> {
    err.chain().find_map(|cause| cause.downcast_ref::<GluError>())
}
