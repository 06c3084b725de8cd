use crate::error::GluError;
use crate::log_debug;
use crate::providers::Provider;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration structure for glu, loaded once per invocation
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Environment-like settings: credentials and Jira workflow names
    pub env: EnvConfig,
    /// Per-repository overrides keyed by `org/repo`
    #[serde(default)]
    pub repos: HashMap<String, RepoConfig>,
    /// Description skeletons keyed by lowercase Jira issue type name
    #[serde(default = "default_issue_templates")]
    pub jira_issue_templates: HashMap<String, String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EnvConfig {
    pub jira_server: String,
    pub email: String,
    pub jira_api_token: String,
    pub jira_in_progress_transition: String,
    pub jira_ready_for_review_transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_jira_project: Option<String>,
    pub github_pat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glean_api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glean_instance: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct RepoConfig {
    /// Jira project key used for this repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_key: Option<String>,
    /// PR body template used when the repository has none of its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_template: Option<String>,
}

/// Credential material for a chat provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    /// Glean instance name; unused by the other providers
    pub instance: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            jira_server: "https://jira.atlassian.com".to_string(),
            email: "your_jira_email".to_string(),
            jira_api_token: "your_jira_api_token".to_string(),
            jira_in_progress_transition: "Starting".to_string(),
            jira_ready_for_review_transition: "Ready for review".to_string(),
            default_jira_project: None,
            github_pat: "your_github_pat".to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            glean_api_token: None,
            glean_instance: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: EnvConfig::default(),
            repos: HashMap::new(),
            jira_issue_templates: default_issue_templates(),
        }
    }
}

fn default_issue_templates() -> HashMap<String, String> {
    HashMap::from([
        (
            "bug".to_string(),
            "Description:\n{description}\n\nSteps to reproduce:\n{steps}\n\nExpected behaviour:\n{expected}"
                .to_string(),
        ),
        (
            "story".to_string(),
            "As a {persona}, I want {goal} so that {benefit}.\n\nAcceptance criteria:\n{criteria}"
                .to_string(),
        ),
        (
            "task".to_string(),
            "Description:\n{description}\n\nDefinition of done:\n{done}".to_string(),
        ),
    ])
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl Config {
    /// Load the configuration, creating a placeholder file first if none exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if Self::ensure_exists(&path)? {
            log_debug!("Created default configuration at {}", path.display());
        }
        Self::load_from(&path)
    }

    /// Load and validate the configuration stored at `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            GluError::Config(format!(
                "Error when setting up env variables in {}:\n\n{e}",
                path.display()
            ))
        })?;

        config.validate()?;
        log_debug!(
            "Configuration loaded from {} ({} repo overrides)",
            path.display(),
            config.repos.len()
        );
        Ok(config)
    }

    /// Write placeholder defaults to `path` if it does not exist. Returns whether a file was created.
    pub fn ensure_exists(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write default config to {}", path.display()))?;
        Ok(true)
    }

    /// `$XDG_CONFIG_HOME/glu/config.toml`, or `~/.config/glu/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let base = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| anyhow!("Unable to determine home directory"))?
                .join(".config"),
        };
        Ok(base.join("glu").join("config.toml"))
    }

    fn validate(&self) -> Result<(), GluError> {
        Url::parse(&self.env.jira_server).map_err(|e| {
            GluError::Config(format!("JIRA_SERVER '{}' is not a valid URL: {e}", self.env.jira_server))
        })?;

        if self.env.jira_in_progress_transition.trim().is_empty() {
            return Err(GluError::Config(
                "JIRA_IN_PROGRESS_TRANSITION must not be empty".to_string(),
            ));
        }
        if self.env.jira_ready_for_review_transition.trim().is_empty() {
            return Err(GluError::Config(
                "JIRA_READY_FOR_REVIEW_TRANSITION must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn repo_config(&self, repo_name: &str) -> Option<&RepoConfig> {
        self.repos.get(repo_name)
    }

    /// Jira project key override for a repository
    pub fn repo_jira_key(&self, repo_name: &str) -> Option<&str> {
        self.repo_config(repo_name)
            .and_then(|repo| repo.jira_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    /// PR template override for a repository
    pub fn repo_pr_template(&self, repo_name: &str) -> Option<&str> {
        self.repo_config(repo_name)
            .and_then(|repo| repo.pr_template.as_deref())
            .filter(|template| !template.trim().is_empty())
    }

    pub fn issue_template(&self, issue_type: &str) -> Option<&str> {
        self.jira_issue_templates
            .get(&issue_type.to_lowercase())
            .map(String::as_str)
    }

    /// Credential for `provider`, preferring the process environment over the file
    pub fn credential(&self, provider: Provider) -> Option<Credential> {
        self.credential_with_env(provider, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::credential`] with an injectable environment lookup
    pub fn credential_with_env<F>(&self, provider: Provider, lookup: F) -> Option<Credential>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match provider {
            Provider::OpenAI => from_env(provider.api_key_env())
                .or_else(|| non_empty(self.env.openai_api_key.as_ref()))
                .map(|api_key| Credential {
                    api_key,
                    instance: None,
                }),
            Provider::Anthropic => from_env(provider.api_key_env())
                .or_else(|| non_empty(self.env.anthropic_api_key.as_ref()))
                .map(|api_key| Credential {
                    api_key,
                    instance: None,
                }),
            Provider::Glean => {
                let api_key = from_env(provider.api_key_env())
                    .or_else(|| non_empty(self.env.glean_api_token.as_ref()))?;
                let instance = from_env("GLEAN_INSTANCE")
                    .or_else(|| non_empty(self.env.glean_instance.as_ref()))?;
                Some(Credential {
                    api_key,
                    instance: Some(instance),
                })
            }
        }
    }
}
