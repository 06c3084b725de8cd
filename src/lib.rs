//! glu - developer workflow CLI
//!
//! Glues a local git checkout, GitHub, Jira and an optional LLM provider together
//! to open pull requests, draft their descriptions, create and transition Jira
//! tickets, and squash-merge PRs.

// Allow certain clippy warnings that are stylistic
#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::future_not_send)] // Prompter is not Sync; commands run on a single task
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine
#![allow(clippy::too_many_arguments)] // Some functions legitimately need many params

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod git;
pub mod github;
pub mod jira;
pub mod llm;
pub mod logger;
pub mod providers;
pub mod reviewers;
pub mod ticket_key;
pub mod types;
pub mod ui;

// Re-export important structs and functions for easier testing
pub use config::Config;
pub use error::GluError;
pub use providers::Provider;
pub use ticket_key::{TicketRef, format_ticket, inject_ticket_key};
