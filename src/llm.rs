//! Single-turn chat clients for the supported providers.

use crate::config::Config;
use crate::error::GluError;
use crate::log_debug;
use crate::providers::Provider;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// A chat-completion backend: one message in, text out
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> Provider;

    async fn invoke(&self, prompt: &str) -> Result<String>;
}

/// Builds the client for `provider` from the configured credentials
pub fn chat_model(
    provider: Provider,
    config: &Config,
    model_override: Option<&str>,
) -> Result<Box<dyn ChatModel>> {
    let credential = config
        .credential(provider)
        .ok_or_else(|| GluError::MissingCredential(provider.label().to_string()))?;

    let model = model_override
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(provider.default_model())
        .to_string();

    log_debug!("Using {} with model {}", provider.label(), model);

    Ok(match provider {
        Provider::OpenAI => Box::new(OpenAiChat::new(credential.api_key, model)),
        Provider::Anthropic => Box::new(AnthropicChat::new(credential.api_key, model)),
        Provider::Glean => {
            let instance = credential
                .instance
                .ok_or_else(|| GluError::MissingCredential("Glean instance".to_string()))?;
            Box::new(GleanChat::new(credential.api_key, &instance, model))
        }
    })
}

async fn error_for_status(response: reqwest::Response, backend: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("{backend} request failed ({status}): {body}"))
}

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach OpenAI")?;

        let parsed: OpenAiResponse = error_for_status(response, "OpenAI").await?.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI returned no content"))
    }
}

pub struct AnthropicChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicChat {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for AnthropicChat {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Anthropic")?;

        let parsed: AnthropicResponse =
            error_for_status(response, "Anthropic").await?.json().await?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(anyhow!("Anthropic returned no text content"));
        }
        Ok(text)
    }
}

/// Glean chat; its answers draw on the company's indexed repositories
pub struct GleanChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GleanMessage {
    #[serde(default)]
    author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_type: Option<String>,
    #[serde(default)]
    fragments: Vec<GleanFragment>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct GleanFragment {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GleanResponse {
    #[serde(default)]
    messages: Vec<GleanMessage>,
}

impl GleanChat {
    pub fn new(api_key: String, instance: &str, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://{instance}-be.glean.com"),
            api_key,
            model,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for GleanChat {
    fn provider(&self) -> Provider {
        Provider::Glean
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let mut body = json!({
            "stream": false,
            "messages": [GleanMessage {
                author: "USER".to_string(),
                message_type: None,
                fragments: vec![GleanFragment { text: Some(prompt.to_string()) }],
            }],
        });
        if self.model != Provider::Glean.default_model() {
            body["agentConfig"] = json!({ "modelSetId": self.model });
        }

        let response = self
            .client
            .post(format!("{}/rest/api/v1/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Glean")?;

        let parsed: GleanResponse = error_for_status(response, "Glean").await?.json().await?;
        let answer = parsed
            .messages
            .iter()
            .rev()
            .find(|m| m.author != "USER" && m.message_type.as_deref().unwrap_or("CONTENT") == "CONTENT")
            .ok_or_else(|| anyhow!("Glean returned no answer"))?;

        Ok(answer
            .fragments
            .iter()
            .filter_map(|f| f.text.as_deref())
            .collect())
    }
}

/// Parse a model response that should be a JSON object, tolerating code fences and chatter
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    match serde_json::from_str::<T>(text) {
        Ok(message) => Ok(message),
        Err(e) => {
            log_debug!(
                "Direct JSON parse failed: {}. Attempting fallback extraction.",
                e
            );
            let cleaned_json = clean_json_from_llm(text);
            serde_json::from_str(&cleaned_json).map_err(|e| anyhow!("JSON parse error: {}", e))
        }
    }
}

fn clean_json_from_llm(json_str: &str) -> String {
    // Remove potential leading/trailing whitespace and invisible characters
    let trimmed = json_str
        .trim_start_matches(|c: char| c.is_whitespace() || !c.is_ascii())
        .trim_end_matches(|c: char| c.is_whitespace() || !c.is_ascii());

    let start = trimmed.find('{').unwrap_or(0);
    let end = trimmed.rfind('}').map_or(trimmed.len(), |i| i + 1);

    if start >= end {
        return trimmed.to_string();
    }
    trimmed[start..end].trim().to_string()
}
