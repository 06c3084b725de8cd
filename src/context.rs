use crate::config::Config;
use crate::github::CodeHost;
use crate::jira::IssueTracker;
use crate::ui::Prompter;

/// Collaborators shared by every command for one invocation
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub config: &'a Config,
    pub host: &'a dyn CodeHost,
    pub tracker: &'a dyn IssueTracker,
    pub prompter: &'a dyn Prompter,
}

impl<'a> Services<'a> {
    pub fn new(
        config: &'a Config,
        host: &'a dyn CodeHost,
        tracker: &'a dyn IssueTracker,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            config,
            host,
            tracker,
            prompter,
        }
    }
}
