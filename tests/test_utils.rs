#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use glu::config::Config;
use glu::error::GluError;
use glu::git::GitRepo;
use glu::github::{
    CodeHost, MergeResult, NewPullRequest, PullRequest, PullRequestCommit, PullRequestUpdate,
    Repository, User,
};
use glu::jira::{
    CreatedIssue, Issue, IssueTracker, IssueType, JiraUser, NewIssue, Project, Transition,
};
use glu::llm::ChatModel;
use glu::providers::Provider;
use glu::ui::Prompter;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Git fixtures
// ---------------------------------------------------------------------------

/// Runs git in `dir` and returns stdout, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Creates a temporary repository on `main` with an initial commit
pub fn setup_git_repo() -> (TempDir, GitRepo) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path();

    git(path, &["init", "--quiet"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    commit_file(path, "initial.txt", "Initial content", "Initial commit");

    let repo = GitRepo::open(path).expect("Failed to open GitRepo");
    (temp_dir, repo)
}

/// [`setup_git_repo`] plus a bare `origin` that already has `main`
pub fn setup_git_repo_with_remote() -> (TempDir, TempDir, GitRepo) {
    let (work_dir, repo) = setup_git_repo();
    let remote_dir = TempDir::new().expect("Failed to create remote directory");
    git(remote_dir.path(), &["init", "--quiet", "--bare"]);

    let remote_path = remote_dir.path().to_string_lossy().to_string();
    git(work_dir.path(), &["remote", "add", "origin", &remote_path]);
    git(work_dir.path(), &["push", "--quiet", "origin", "main"]);
    (work_dir, remote_dir, repo)
}

/// Writes `name` and commits it; returns the new commit id
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(name), content).expect("Failed to write file");
    git(dir, &["add", name]);
    git(dir, &["commit", "--quiet", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

pub fn checkout_new_branch(dir: &Path, branch: &str) {
    git(dir, &["checkout", "--quiet", "-b", branch]);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default config with `ABC` as the default Jira project and no AI credentials
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.env.default_jira_project = Some("ABC".to_string());
    config
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Answer {
    Select(usize),
    MultiSelect(Vec<usize>),
    Text(String),
    Confirm(bool),
    Editor(String),
    Cancel,
}

/// Replays queued answers in order and records every question asked
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    pub asked: RefCell<Vec<String>>,
    /// Text each editor was seeded with
    pub editor_seeds: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            asked: RefCell::new(Vec::new()),
            editor_seeds: RefCell::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    pub fn editor_seeds(&self) -> Vec<String> {
        self.editor_seeds.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, message: &str) -> Answer {
        self.asked.borrow_mut().push(message.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected prompt: {message}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, message: &str, options: &[String]) -> anyhow::Result<usize> {
        match self.next(message) {
            Answer::Select(index) => {
                assert!(index < options.len(), "{message}: no option {index} in {options:?}");
                Ok(index)
            }
            Answer::Cancel => Err(GluError::Cancelled.into()),
            other => panic!("{message}: expected a select answer, got {other:?}"),
        }
    }

    fn multi_select(&self, message: &str, _options: &[String]) -> anyhow::Result<Vec<usize>> {
        match self.next(message) {
            Answer::MultiSelect(indices) => Ok(indices),
            Answer::Cancel => Err(GluError::Cancelled.into()),
            other => panic!("{message}: expected a multi-select answer, got {other:?}"),
        }
    }

    fn text(&self, message: &str, _default: Option<&str>) -> anyhow::Result<String> {
        match self.next(message) {
            Answer::Text(text) => Ok(text),
            Answer::Cancel => Err(GluError::Cancelled.into()),
            other => panic!("{message}: expected a text answer, got {other:?}"),
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> anyhow::Result<bool> {
        match self.next(message) {
            Answer::Confirm(value) => Ok(value),
            Answer::Cancel => Err(GluError::Cancelled.into()),
            other => panic!("{message}: expected a confirm answer, got {other:?}"),
        }
    }

    fn editor(&self, message: &str, initial: &str) -> anyhow::Result<String> {
        self.editor_seeds.borrow_mut().push(initial.to_string());
        match self.next(message) {
            Answer::Editor(text) => Ok(text),
            Answer::Cancel => Err(GluError::Cancelled.into()),
            other => panic!("{message}: expected an editor answer, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat model
// ---------------------------------------------------------------------------

/// Returns queued responses and records the prompts it receives
pub struct ScriptedChat {
    provider: Provider,
    responses: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn new(provider: Provider, responses: &[&str]) -> Self {
        Self {
            provider,
            responses: Mutex::new(responses.iter().map(|r| (*r).to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("ScriptedChat has no responses left"))
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

pub fn user(login: &str) -> User {
    User {
        login: login.to_string(),
        name: None,
    }
}

/// In-memory code host recording every mutating call
pub struct FakeCodeHost {
    pub repository: Repository,
    pub me: User,
    pub members: Vec<User>,
    pub template: Option<String>,
    pub diff: String,
    pub commits: Vec<PullRequestCommit>,
    /// Reviewer logins the host refuses
    pub rejected_reviewers: Vec<String>,
    pub merged: bool,
    pub pull_requests: Mutex<Vec<PullRequest>>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeCodeHost {
    fn default() -> Self {
        Self {
            repository: Repository {
                full_name: "acme/widgets".to_string(),
                default_branch: "main".to_string(),
                html_url: "https://github.com/acme/widgets".to_string(),
            },
            me: user("octocat"),
            members: vec![user("alice"), user("albert"), user("bob")],
            template: None,
            diff: "diff --git a/lib.rs b/lib.rs\n+fn cache() {}\n".to_string(),
            commits: Vec::new(),
            rejected_reviewers: Vec::new(),
            merged: true,
            pull_requests: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCodeHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn with_pull_request(self, pr: PullRequest) -> Self {
        self.pull_requests.lock().push(pr);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn find(&self, number: u64) -> anyhow::Result<PullRequest> {
        self.pull_requests
            .lock()
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("GitHub API error (404 Not Found)"))
    }
}

#[async_trait]
impl CodeHost for FakeCodeHost {
    async fn repository(&self, _repo: &str) -> anyhow::Result<Repository> {
        Ok(self.repository.clone())
    }

    async fn file_contents(
        &self,
        _repo: &str,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<Option<String>> {
        self.record(format!("file_contents {path}@{git_ref}"));
        Ok(self.template.clone())
    }

    async fn current_user(&self) -> anyhow::Result<User> {
        Ok(self.me.clone())
    }

    async fn org_members(&self, org: &str) -> anyhow::Result<Vec<User>> {
        self.record(format!("org_members {org}"));
        if self.members.is_empty() {
            return Err(GluError::NoMembers(org.to_string()).into());
        }
        Ok(self.members.clone())
    }

    async fn create_pull_request(
        &self,
        repo: &str,
        pr: &NewPullRequest,
    ) -> anyhow::Result<PullRequest> {
        let mut prs = self.pull_requests.lock();
        let number = prs.len() as u64 + 1;
        let created = PullRequest {
            number,
            title: pr.title.clone(),
            body: Some(pr.body.clone()),
            html_url: format!("https://github.com/{repo}/pull/{number}"),
            state: "open".to_string(),
            draft: pr.draft,
            created_at: Utc::now(),
            ..PullRequest::default()
        };
        prs.push(created.clone());
        drop(prs);
        self.record(format!("create_pull_request {}->{}", pr.head, pr.base));
        Ok(created)
    }

    async fn update_pull_request(
        &self,
        _repo: &str,
        number: u64,
        update: &PullRequestUpdate,
    ) -> anyhow::Result<PullRequest> {
        self.record(format!("update_pull_request {number}"));
        let mut prs = self.pull_requests.lock();
        let pr = prs
            .iter_mut()
            .find(|pr| pr.number == number)
            .ok_or_else(|| anyhow::anyhow!("GitHub API error (404 Not Found)"))?;
        if let Some(title) = &update.title {
            pr.title.clone_from(title);
        }
        if let Some(body) = &update.body {
            pr.body = Some(body.clone());
        }
        Ok(pr.clone())
    }

    async fn add_assignees(
        &self,
        _repo: &str,
        number: u64,
        logins: &[String],
    ) -> anyhow::Result<()> {
        self.record(format!("add_assignees {number} {}", logins.join(",")));
        Ok(())
    }

    async fn request_reviewer(&self, _repo: &str, number: u64, login: &str) -> anyhow::Result<()> {
        self.record(format!("request_reviewer {number} {login}"));
        if self.rejected_reviewers.iter().any(|r| r == login) {
            return Err(anyhow::anyhow!("GitHub API error (422): {login} is not a collaborator"));
        }
        Ok(())
    }

    async fn pull_request(&self, _repo: &str, number: u64) -> anyhow::Result<PullRequest> {
        self.find(number)
    }

    async fn pull_request_diff(&self, _repo: &str, number: u64) -> anyhow::Result<String> {
        self.record(format!("pull_request_diff {number}"));
        Ok(self.diff.clone())
    }

    async fn list_pull_requests(&self, _repo: &str) -> anyhow::Result<Vec<PullRequest>> {
        Ok(self.pull_requests.lock().clone())
    }

    async fn pull_request_commits(
        &self,
        _repo: &str,
        _number: u64,
    ) -> anyhow::Result<Vec<PullRequestCommit>> {
        Ok(self.commits.clone())
    }

    async fn merge_pull_request(
        &self,
        _repo: &str,
        number: u64,
        title: &str,
        message: &str,
    ) -> anyhow::Result<MergeResult> {
        self.record(format!("merge_pull_request {number} {title}\n{message}"));
        Ok(MergeResult {
            merged: self.merged,
            message: if self.merged {
                "Pull Request successfully merged".to_string()
            } else {
                "Merge conflict".to_string()
            },
            sha: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Jira
// ---------------------------------------------------------------------------

pub fn transition(id: &str, name: &str) -> Transition {
    Transition {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn jira_user(account_id: &str, display_name: &str) -> JiraUser {
    JiraUser {
        account_id: account_id.to_string(),
        display_name: display_name.to_string(),
        email_address: None,
    }
}

/// In-memory issue tracker.
///
/// `workflow` maps the issue's current status to the transitions it offers;
/// applying a transition moves the issue to the status named like the transition.
pub struct FakeIssueTracker {
    pub me: JiraUser,
    pub users: Vec<JiraUser>,
    pub projects: Vec<Project>,
    pub issue_types: Vec<IssueType>,
    pub workflow: Vec<(String, Vec<Transition>)>,
    pub status: Mutex<String>,
    pub issues: Vec<Issue>,
    pub created: Mutex<Vec<NewIssue>>,
    pub applied: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<String>>,
}

impl Default for FakeIssueTracker {
    fn default() -> Self {
        Self {
            me: jira_user("acc-me", "Test User"),
            users: Vec::new(),
            projects: vec![
                Project {
                    key: "ABC".to_string(),
                    name: "Alphabet".to_string(),
                },
                Project {
                    key: "XYZ".to_string(),
                    name: "Last letters".to_string(),
                },
            ],
            issue_types: vec![
                IssueType {
                    id: "1".to_string(),
                    name: "Bug".to_string(),
                    subtask: false,
                },
                IssueType {
                    id: "2".to_string(),
                    name: "Task".to_string(),
                    subtask: false,
                },
                IssueType {
                    id: "3".to_string(),
                    name: "Sub-task".to_string(),
                    subtask: true,
                },
            ],
            workflow: vec![
                ("To Do".to_string(), vec![transition("11", "Starting")]),
                (
                    "Starting".to_string(),
                    vec![transition("21", "Ready for review")],
                ),
            ],
            status: Mutex::new("To Do".to_string()),
            issues: Vec::new(),
            created: Mutex::new(Vec::new()),
            applied: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIssueTracker {
    /// Every status offers both configured transitions
    pub fn offering_everything() -> Self {
        let both = vec![transition("11", "Starting"), transition("21", "Ready for review")];
        Self {
            workflow: vec![
                ("To Do".to_string(), both.clone()),
                ("Starting".to_string(), both.clone()),
                ("Ready for review".to_string(), both),
            ],
            ..Self::default()
        }
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().clone()
    }

    pub fn created(&self) -> Vec<NewIssue> {
        self.created.lock().clone()
    }

    fn offered(&self) -> Vec<Transition> {
        let status = self.status.lock().clone();
        self.workflow
            .iter()
            .find(|(state, _)| *state == status)
            .map(|(_, transitions)| transitions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IssueTracker for FakeIssueTracker {
    async fn myself(&self) -> anyhow::Result<JiraUser> {
        Ok(self.me.clone())
    }

    async fn search_users(&self, query: &str) -> anyhow::Result<Vec<JiraUser>> {
        let query = query.to_lowercase();
        Ok(self
            .users
            .iter()
            .filter(|u| u.display_name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn projects(&self) -> anyhow::Result<Vec<Project>> {
        Ok(self.projects.clone())
    }

    async fn issue_types(&self, _project_key: &str) -> anyhow::Result<Vec<IssueType>> {
        Ok(self.issue_types.clone())
    }

    async fn create_issue(&self, issue: &NewIssue) -> anyhow::Result<CreatedIssue> {
        let mut created = self.created.lock();
        created.push(issue.clone());
        Ok(CreatedIssue {
            id: format!("{}", 10_000 + created.len()),
            key: format!("{}-{}", issue.project_key, 100 + created.len()),
        })
    }

    async fn transitions(&self, _issue_key: &str) -> anyhow::Result<Vec<Transition>> {
        Ok(self.offered())
    }

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> anyhow::Result<()> {
        let target = self
            .offered()
            .into_iter()
            .find(|t| t.id == transition_id)
            .ok_or_else(|| anyhow::anyhow!("Transition {transition_id} is not valid"))?;
        self.applied
            .lock()
            .push(format!("{issue_key} {}", target.name));
        *self.status.lock() = target.name;
        Ok(())
    }

    async fn search_issues(&self, jql: &str) -> anyhow::Result<Vec<Issue>> {
        self.queries.lock().push(jql.to_string());
        Ok(self.issues.clone())
    }

    fn browse_url(&self, issue_key: &str) -> String {
        format!("https://jira.example.com/browse/{issue_key}")
    }
}
