//! Jira REST (v2) access and the ticket helpers built on it.

use crate::config::Config;
use crate::error::GluError;
use crate::ui::{self, Prompter};
use crate::{log_debug, log_info};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Shorthand for "the authenticated user" in user options
pub const SELF_ALIAS: &str = "me@me";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueType {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Named {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: Named,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default)]
    pub resolution: Option<Named>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub reporter: Option<JiraUser>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

/// Fields for a new issue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub project_key: String,
    pub issue_type: String,
    pub summary: String,
    pub description: Option<String>,
    /// Account ids
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    /// Additional raw fields, merged last
    pub extra_fields: Map<String, Value>,
}

impl NewIssue {
    /// The `fields` object of Jira's create-issue payload
    pub fn to_fields(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("project".into(), json!({ "key": self.project_key }));
        fields.insert("issuetype".into(), json!({ "name": self.issue_type }));
        fields.insert("summary".into(), json!(self.summary));
        if let Some(description) = self.description.as_ref().filter(|d| !d.is_empty()) {
            fields.insert("description".into(), json!(description));
        }
        if let Some(reporter) = &self.reporter {
            fields.insert("reporter".into(), json!({ "id": reporter }));
        }
        if let Some(assignee) = &self.assignee {
            fields.insert("assignee".into(), json!({ "id": assignee }));
        }
        if let Some(priority) = &self.priority {
            fields.insert("priority".into(), json!({ "name": priority }));
        }
        for (key, value) in &self.extra_fields {
            fields.insert(key.clone(), value.clone());
        }
        Value::Object(fields)
    }
}

/// The issue tracker operations the workflows depend on
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn myself(&self) -> Result<JiraUser>;

    async fn search_users(&self, query: &str) -> Result<Vec<JiraUser>>;

    async fn projects(&self) -> Result<Vec<Project>>;

    async fn issue_types(&self, project_key: &str) -> Result<Vec<IssueType>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    /// Transitions currently offered for the issue
    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>>;

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()>;

    async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>>;

    /// Web link to an issue
    fn browse_url(&self, issue_key: &str) -> String;
}

/// `IssueTracker` backed by Jira's REST API with basic auth
pub struct JiraClient {
    client: reqwest::Client,
    server: String,
    email: String,
    token: String,
}

#[derive(Deserialize)]
struct ProjectDetails {
    #[serde(default, rename = "issueTypes")]
    issue_types: Vec<IssueType>,
}

#[derive(Deserialize)]
struct TransitionList {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    issues: Vec<Issue>,
}

impl JiraClient {
    pub fn new(server: &str, email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: server.trim_end_matches('/').to_string(),
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.env.jira_server,
            config.env.email.clone(),
            config.env.jira_api_token.clone(),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/api/2{path}", self.server))
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.context("Failed to reach Jira")?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("Jira request failed ({status}): {body}"))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.send(builder)
            .await?
            .json()
            .await
            .context("Unexpected response from Jira")
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[tracing::instrument(skip(self))]
    async fn myself(&self) -> Result<JiraUser> {
        self.json(self.request(Method::GET, "/myself")).await
    }

    #[tracing::instrument(skip(self))]
    async fn search_users(&self, query: &str) -> Result<Vec<JiraUser>> {
        self.json(
            self.request(Method::GET, "/user/search")
                .query(&[("query", query)]),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn projects(&self) -> Result<Vec<Project>> {
        self.json(self.request(Method::GET, "/project")).await
    }

    #[tracing::instrument(skip(self))]
    async fn issue_types(&self, project_key: &str) -> Result<Vec<IssueType>> {
        let details: ProjectDetails = self
            .json(self.request(Method::GET, &format!("/project/{project_key}")))
            .await?;
        Ok(details.issue_types)
    }

    #[tracing::instrument(skip(self, issue), fields(project = %issue.project_key))]
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        self.json(
            self.request(Method::POST, "/issue")
                .json(&json!({ "fields": issue.to_fields() })),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let list: TransitionList = self
            .json(self.request(Method::GET, &format!("/issue/{issue_key}/transitions")))
            .await?;
        Ok(list.transitions)
    }

    #[tracing::instrument(skip(self))]
    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        self.send(
            self.request(Method::POST, &format!("/issue/{issue_key}/transitions"))
                .json(&json!({ "transition": { "id": transition_id } })),
        )
        .await
        .map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        let results: SearchResults = self
            .json(self.request(Method::GET, "/search").query(&[
                ("jql", jql),
                (
                    "fields",
                    "summary,status,priority,resolution,assignee,reporter",
                ),
                ("maxResults", "50"),
            ]))
            .await?;
        Ok(results.issues)
    }

    fn browse_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{issue_key}", self.server)
    }
}

/// Picks the Jira project for a command.
///
/// Order: explicit key (must exist), repository override, `DEFAULT_JIRA_PROJECT`,
/// then an interactive choice over every project.
pub async fn resolve_project(
    tracker: &dyn IssueTracker,
    config: &Config,
    prompter: &dyn Prompter,
    explicit: Option<&str>,
    repo_name: Option<&str>,
) -> Result<String> {
    let mut projects: Option<Vec<Project>> = None;

    if let Some(requested) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        let all = tracker.projects().await?;
        if let Some(found) = all.iter().find(|p| p.key.eq_ignore_ascii_case(requested)) {
            return Ok(found.key.clone());
        }
        ui::print_warning(&format!("Jira project '{requested}' not found"));
        projects = Some(all);
    } else {
        if let Some(key) = repo_name.and_then(|name| config.repo_jira_key(name)) {
            log_debug!("Using Jira project {} from repository override", key);
            return Ok(key.to_string());
        }
        if let Some(key) = config
            .env
            .default_jira_project
            .as_deref()
            .filter(|k| !k.trim().is_empty())
        {
            return Ok(key.to_string());
        }
    }

    let projects = match projects {
        Some(projects) => projects,
        None => tracker.projects().await?,
    };
    let keys: Vec<String> = projects.iter().map(|p| p.key.clone()).collect();
    if keys.is_empty() {
        return Err(anyhow!("No Jira projects are visible to this account"));
    }
    let index = prompter.select("Select project:", &keys)?;
    keys.get(index)
        .cloned()
        .ok_or_else(|| GluError::Cancelled.into())
}

/// Resolves a user option to an account id.
///
/// No query or `me@me` means the authenticated user.
pub async fn resolve_user(
    tracker: &dyn IssueTracker,
    prompter: &dyn Prompter,
    query: Option<&str>,
    role: &str,
) -> Result<String> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let Some(query) = query.filter(|q| *q != SELF_ALIAS) else {
        return Ok(tracker.myself().await?.account_id);
    };

    let mut users = tracker.search_users(query).await?;
    match users.len() {
        0 => Err(GluError::UserNotFound(query.to_string()).into()),
        1 => Ok(users.remove(0).account_id),
        _ => {
            let names: Vec<String> = users
                .iter()
                .map(|u| match &u.email_address {
                    Some(email) => format!("{} <{email}>", u.display_name),
                    None => u.display_name.clone(),
                })
                .collect();
            let index = prompter.select(&format!("Select {role}:"), &names)?;
            users
                .get(index)
                .map(|u| u.account_id.clone())
                .ok_or_else(|| GluError::Cancelled.into())
        }
    }
}

/// Finds an offered transition by name, ignoring case
pub fn find_transition<'a>(transitions: &'a [Transition], name: &str) -> Option<&'a Transition> {
    transitions
        .iter()
        .find(|t| t.name.trim().eq_ignore_ascii_case(name.trim()))
}

/// Applies the named transition if the issue currently offers it. Returns whether it was applied.
pub async fn transition_by_name(
    tracker: &dyn IssueTracker,
    issue_key: &str,
    name: &str,
) -> Result<bool> {
    let transitions = tracker.transitions(issue_key).await?;
    match find_transition(&transitions, name) {
        Some(transition) => {
            tracker.transition_issue(issue_key, &transition.id).await?;
            log_info!("Moved {} via '{}'", issue_key, transition.name);
            Ok(true)
        }
        None => {
            log_debug!("Transition '{}' not offered for {}", name, issue_key);
            Ok(false)
        }
    }
}
