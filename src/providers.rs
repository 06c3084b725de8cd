//! Chat provider catalogue and selection.
//!
//! Single source of truth for the supported LLM backends and their defaults.

use crate::config::Config;
use crate::error::GluError;
use crate::log_debug;
use crate::ui::Prompter;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Glean,
    OpenAI,
    Anthropic,
}

impl Provider {
    /// All providers, in the order they are offered to the user
    pub const ALL: &'static [Provider] = &[Provider::Glean, Provider::OpenAI, Provider::Anthropic];

    /// Provider name as used on the command line
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Glean => "glean",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human readable label for prompts
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Glean => "Glean",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::Glean => "default",
            Self::OpenAI => "o4-mini",
            Self::Anthropic => "claude-sonnet-4-5-20250929",
        }
    }

    /// Environment variable holding the API key
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            Self::Glean => "GLEAN_API_TOKEN",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Whether the backend indexes remote repositories and can follow a PR link
    pub const fn indexes_remote_content(&self) -> bool {
        matches!(self, Self::Glean)
    }

    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::name).collect()
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.name() == lower)
            .copied()
            .ok_or_else(|| ProviderError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Unknown provider: {0}. Supported: glean, openai, anthropic")]
    Unknown(String),
}

/// clap value parser for `--provider`
pub fn available_providers_parser(s: &str) -> Result<Provider, String> {
    s.parse::<Provider>().map_err(|_| {
        format!(
            "Invalid provider '{}'. Available providers: {}",
            s,
            Provider::all_names().join(", ")
        )
    })
}

/// Providers whose credentials are present in the environment or config
pub fn available_providers(config: &Config) -> Vec<Provider> {
    Provider::ALL
        .iter()
        .copied()
        .filter(|provider| config.credential(*provider).is_some())
        .collect()
}

/// Picks the provider used for generation.
///
/// `Ok(None)` means "no generation" and is only returned when `require_available`
/// is false and nothing is configured.
pub fn select_provider(
    available: &[Provider],
    explicit: Option<Provider>,
    require_available: bool,
    prompter: &dyn Prompter,
) -> Result<Option<Provider>> {
    if let Some(provider) = explicit {
        if !available.contains(&provider) {
            return Err(GluError::MissingCredential(provider.label().to_string()).into());
        }
        return Ok(Some(provider));
    }

    match available {
        [] if require_available => Err(GluError::NoProviderAvailable.into()),
        [] => {
            log_debug!("No chat provider credentials found; skipping AI generation");
            Ok(None)
        }
        [only] => Ok(Some(*only)),
        many => {
            let labels: Vec<String> = many.iter().map(|p| p.label().to_string()).collect();
            let index = prompter.select("Select provider:", &labels)?;
            Ok(many.get(index).copied())
        }
    }
}
