//! GitHub REST access used by the PR workflows.

use crate::error::GluError;
use crate::log_debug;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("glu/", env!("CARGO_PKG_VERSION"));
const MEMBER_PAGES: u32 = 5;
const PAGE_SIZE: u32 = 100;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    pub default_branch: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default)]
    pub sha: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub head: BranchRef,
    #[serde(default)]
    pub base: BranchRef,
    /// Only present on single-PR responses
    #[serde(default)]
    pub comments: Option<u64>,
    #[serde(default)]
    pub commits: Option<u64>,
}

impl PullRequest {
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Draft / Open / Closed / Merged
    pub fn status_label(&self) -> &'static str {
        if self.merged_at.is_some() {
            "Merged"
        } else if self.state == "closed" {
            "Closed"
        } else if self.draft {
            "Draft"
        } else {
            "Open"
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetail {
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub draft: bool,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub merged: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sha: Option<String>,
}

/// The code hosting operations the workflows depend on
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn repository(&self, repo: &str) -> Result<Repository>;

    /// Raw file contents at `git_ref`; `None` when the file does not exist
    async fn file_contents(&self, repo: &str, path: &str, git_ref: &str)
    -> Result<Option<String>>;

    async fn current_user(&self) -> Result<User>;

    /// Members of `org`; fails with `NoMembers` when there are none
    async fn org_members(&self, org: &str) -> Result<Vec<User>>;

    async fn create_pull_request(&self, repo: &str, pr: &NewPullRequest) -> Result<PullRequest>;

    async fn update_pull_request(
        &self,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
    ) -> Result<PullRequest>;

    async fn add_assignees(&self, repo: &str, number: u64, logins: &[String]) -> Result<()>;

    async fn request_reviewer(&self, repo: &str, number: u64, login: &str) -> Result<()>;

    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest>;

    /// Unified diff of the PR
    async fn pull_request_diff(&self, repo: &str, number: u64) -> Result<String>;

    /// Open PRs, newest first
    async fn list_pull_requests(&self, repo: &str) -> Result<Vec<PullRequest>>;

    async fn pull_request_commits(&self, repo: &str, number: u64)
    -> Result<Vec<PullRequestCommit>>;

    /// Squash-merges the PR with the given commit title and message
    async fn merge_pull_request(
        &self,
        repo: &str,
        number: u64,
        title: &str,
        message: &str,
    ) -> Result<MergeResult>;
}

/// `CodeHost` backed by the GitHub REST API
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GITHUB_API_URL.to_string(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_accepting(method, path, "application/vnd.github+json")
    }

    fn request_accepting(&self, method: Method, path: &str, accept: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", USER_AGENT)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.context("Failed to reach GitHub")?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("GitHub request failed ({status}): {body}"))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .context("Unexpected response from GitHub")
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    #[tracing::instrument(skip(self))]
    async fn repository(&self, repo: &str) -> Result<Repository> {
        self.json(self.request(Method::GET, &format!("/repos/{repo}")))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn file_contents(
        &self,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>> {
        let response = self
            .request_accepting(
                Method::GET,
                &format!("/repos/{repo}/contents/{path}"),
                "application/vnd.github.raw+json",
            )
            .query(&[("ref", git_ref)])
            .send()
            .await
            .context("Failed to reach GitHub")?;

        if response.status() == StatusCode::NOT_FOUND {
            log_debug!("{} not found in {}@{}", path, repo, git_ref);
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("Failed to read {path} from {repo} ({status})"));
        }
        Ok(Some(response.text().await?))
    }

    #[tracing::instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        self.json(self.request(Method::GET, "/user")).await
    }

    #[tracing::instrument(skip(self))]
    async fn org_members(&self, org: &str) -> Result<Vec<User>> {
        let mut members = Vec::new();
        for page in 1..=MEMBER_PAGES {
            let batch: Vec<User> = self
                .json(
                    self.request(Method::GET, &format!("/orgs/{org}/members"))
                        .query(&[("per_page", PAGE_SIZE), ("page", page)]),
                )
                .await?;
            if batch.is_empty() {
                break;
            }
            members.extend(batch);
        }

        if members.is_empty() {
            return Err(GluError::NoMembers(org.to_string()).into());
        }
        log_debug!("Loaded {} members of {}", members.len(), org);
        Ok(members)
    }

    #[tracing::instrument(skip(self, pr), fields(head = %pr.head, draft = pr.draft))]
    async fn create_pull_request(&self, repo: &str, pr: &NewPullRequest) -> Result<PullRequest> {
        self.json(
            self.request(Method::POST, &format!("/repos/{repo}/pulls"))
                .json(pr),
        )
        .await
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_pull_request(
        &self,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
    ) -> Result<PullRequest> {
        self.json(
            self.request(Method::PATCH, &format!("/repos/{repo}/pulls/{number}"))
                .json(update),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn add_assignees(&self, repo: &str, number: u64, logins: &[String]) -> Result<()> {
        self.send(
            self.request(
                Method::POST,
                &format!("/repos/{repo}/issues/{number}/assignees"),
            )
            .json(&json!({ "assignees": logins })),
        )
        .await
        .map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn request_reviewer(&self, repo: &str, number: u64, login: &str) -> Result<()> {
        self.send(
            self.request(
                Method::POST,
                &format!("/repos/{repo}/pulls/{number}/requested_reviewers"),
            )
            .json(&json!({ "reviewers": [login] })),
        )
        .await
        .map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest> {
        self.json(self.request(Method::GET, &format!("/repos/{repo}/pulls/{number}")))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn pull_request_diff(&self, repo: &str, number: u64) -> Result<String> {
        let response = self
            .send(
                self.request_accepting(
                    Method::GET,
                    &format!("/repos/{repo}/pulls/{number}"),
                    "application/vnd.github.v3.diff",
                ),
            )
            .await
            .context("Failed to get PR diff")?;
        Ok(response.text().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_pull_requests(&self, repo: &str) -> Result<Vec<PullRequest>> {
        self.json(
            self.request(Method::GET, &format!("/repos/{repo}/pulls"))
                .query(&[("state", "open"), ("per_page", "50")]),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn pull_request_commits(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestCommit>> {
        self.json(
            self.request(
                Method::GET,
                &format!("/repos/{repo}/pulls/{number}/commits"),
            )
            .query(&[("per_page", PAGE_SIZE)]),
        )
        .await
    }

    #[tracing::instrument(skip(self, message))]
    async fn merge_pull_request(
        &self,
        repo: &str,
        number: u64,
        title: &str,
        message: &str,
    ) -> Result<MergeResult> {
        self.json(
            self.request(Method::PUT, &format!("/repos/{repo}/pulls/{number}/merge"))
                .json(&json!({
                    "merge_method": "squash",
                    "commit_title": title,
                    "commit_message": message,
                })),
        )
        .await
    }
}
