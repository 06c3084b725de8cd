use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Command;
use url::Url;

use crate::log_debug;

/// Executes a git command inside `repo_path` and returns its trimmed stdout.
///
/// Used for network operations (fetch/push) so the user's credential helpers,
/// SSH agent and remote configuration apply exactly as on the command line.
pub fn run_git_command(repo_path: &Path, args: &[&str]) -> Result<String> {
    log_debug!("Running git {:?} in {}", args, repo_path.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .context("Failed to execute git command")?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout =
        String::from_utf8(output.stdout).context("Invalid UTF-8 output from git command")?;

    Ok(stdout.trim().to_string())
}

/// `org/repo` from a remote URL such as `git@github.com:org/repo.git` or
/// `https://github.com/org/repo.git`
pub fn parse_repo_name(remote_url: &str) -> Option<String> {
    let trimmed = remote_url.trim();

    let path = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => trimmed.split_once(':')?.1.to_string(),
    };

    let name = path
        .trim_start_matches('/')
        .trim_end_matches('/')
        .trim_end_matches(".git");

    let mut parts = name.rsplitn(3, '/');
    let repo = parts.next().filter(|p| !p.is_empty())?;
    let org = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{org}/{repo}"))
}
