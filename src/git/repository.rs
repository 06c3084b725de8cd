use crate::error::GluError;
use crate::git::utils::{parse_repo_name, run_git_command};
use crate::log_debug;

use anyhow::{Context, Result, anyhow};
use git2::{DiffFormat, DiffOptions, Repository, Status, StatusOptions};
use std::path::{Path, PathBuf};

/// Default remote used for fetch/push
pub const DEFAULT_REMOTE: &str = "origin";

/// A commit as seen by the workflows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    /// First paragraph of the message, joined into one line
    pub summary: String,
    /// Full message
    pub message: String,
}

impl CommitInfo {
    pub fn from_commit(commit: &git2::Commit<'_>) -> Self {
        let message = commit.message().unwrap_or_default().to_string();
        let summary = commit
            .summary()
            .map(str::to_string)
            .unwrap_or_else(|| message.lines().next().unwrap_or_default().to_string());
        Self {
            id: commit.id().to_string(),
            summary,
            message,
        }
    }

    /// Everything after the first blank line
    pub fn body(&self) -> String {
        self.message
            .split_once("\n\n")
            .map_or("", |(_, body)| body)
            .trim()
            .to_string()
    }
}

/// Represents a local Git repository and provides methods for interacting with it.
#[derive(Debug, Clone)]
pub struct GitRepo {
    repo_path: PathBuf,
}

impl GitRepo {
    /// Opens the repository containing `path`, searching parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            log_debug!("No repository found from {}: {}", path.display(), e);
            GluError::NotARepository
        })?;

        let workdir = repo
            .workdir()
            .ok_or(GluError::NotARepository)?
            .to_path_buf();

        Ok(Self { repo_path: workdir })
    }

    /// Opens the repository containing the current directory
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::open(&cwd)
    }

    pub fn open_repo(&self) -> Result<Repository, git2::Error> {
        Repository::open(&self.repo_path)
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `org/repo` derived from the `origin` remote
    pub fn repo_name(&self) -> Result<String> {
        let repo = self.open_repo()?;
        let remote = repo
            .find_remote(DEFAULT_REMOTE)
            .map_err(|_| GluError::NoRemote)?;
        let url = remote.url().ok_or(GluError::NoRemote)?;
        parse_repo_name(url)
            .ok_or_else(|| anyhow!("Cannot derive repository name from remote URL '{url}'"))
    }

    pub fn current_branch(&self) -> Result<String> {
        let repo = self.open_repo()?;
        let head = repo.head().context("Unable to find repository HEAD")?;
        if !head.is_branch() {
            return Err(anyhow!("HEAD is detached; check out a branch first"));
        }
        let name = head
            .shorthand()
            .ok_or_else(|| anyhow!("Branch name is not valid UTF-8"))?
            .to_string();
        log_debug!("Current branch: {}", name);
        Ok(name)
    }

    /// Whether the working tree or index differ from HEAD (untracked files included)
    pub fn is_dirty(&self) -> Result<bool> {
        let repo = self.open_repo()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != Status::CURRENT && !entry.status().is_ignored()))
    }

    /// Patch text of every uncommitted change, as it would be committed by [`GitRepo::commit_all`]
    pub fn uncommitted_diff(&self) -> Result<String> {
        let repo = self.open_repo()?;
        let head_tree = repo.head()?.peel_to_tree()?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let diff = repo.diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(patch)
    }

    /// Stages every change (including untracked files) and commits it on HEAD
    pub fn commit_all(&self, message: &str) -> Result<CommitInfo> {
        let repo = self.open_repo()?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let signature = repo.signature()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let parent = repo.head()?.peel_to_commit()?;

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        let commit = repo.find_commit(oid)?;
        log_debug!("Created commit {}", oid);
        Ok(CommitInfo::from_commit(&commit))
    }

    pub fn fetch(&self, remote: &str, branch: &str) -> Result<()> {
        run_git_command(&self.repo_path, &["fetch", "--prune", remote, branch]).map(|_| ())
    }

    pub fn push(&self, remote: &str, branch: &str) -> Result<()> {
        run_git_command(&self.repo_path, &["push", remote, branch]).map(|_| ())
    }

    /// Commit id the local branch points at
    pub fn local_branch_head(&self, branch: &str) -> Result<git2::Oid> {
        let repo = self.open_repo()?;
        let reference = repo.find_reference(&format!("refs/heads/{branch}"))?;
        Ok(reference.peel_to_commit()?.id())
    }

    /// Commit id of the remote-tracking ref for `branch`
    pub fn remote_branch_head(&self, remote: &str, branch: &str) -> Result<git2::Oid> {
        let repo = self.open_repo()?;
        let reference = repo.find_reference(&format!("refs/remotes/{remote}/{branch}"))?;
        Ok(reference.peel_to_commit()?.id())
    }
}
