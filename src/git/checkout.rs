use crate::error::GluError;
use crate::git::repository::{CommitInfo, GitRepo};
use crate::log_debug;

use anyhow::Result;
use git2::Sort;

const CHECKOUT_PREFIX: &str = "checkout: moving from ";

/// Oldest commit made on the current branch since it was last checked out.
///
/// The HEAD reflog is scanned newest-first for the most recent checkout onto
/// the current branch. Commits reachable from HEAD but not from that point are
/// the branch's own work; the last of them in newest-to-oldest order is returned.
pub fn first_commit_since_checkout(repo: &GitRepo) -> Result<CommitInfo> {
    let branch = repo.current_branch()?;
    let git_repo = repo.open_repo()?;
    let reflog = git_repo.reflog("HEAD")?;

    let target_suffix = format!(" to {branch}");
    let checkout_point = reflog
        .iter()
        .find(|entry| {
            entry
                .message()
                .is_some_and(|m| m.starts_with(CHECKOUT_PREFIX) && m.ends_with(&target_suffix))
        })
        .map(|entry| entry.id_new())
        .ok_or(GluError::NoCommitFound)?;

    log_debug!("Branch {} was checked out at {}", branch, checkout_point);

    let head = git_repo.head()?.peel_to_commit()?;
    let mut revwalk = git_repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(head.id())?;
    revwalk.hide(checkout_point)?;

    let commits = revwalk.collect::<Result<Vec<_>, _>>()?;
    let oldest = commits.last().copied().ok_or(GluError::NoCommitFound)?;

    log_debug!(
        "{} commit(s) since checkout, first is {}",
        commits.len(),
        oldest
    );

    let commit = git_repo.find_commit(oldest)?;
    Ok(CommitInfo::from_commit(&commit))
}

/// Fetches `branch` from `remote` and compares the local and remote-tracking heads.
///
/// Returns false instead of failing when the fetch does not succeed. Never moves
/// the local branch.
pub fn is_remote_branch_in_sync(repo: &GitRepo, branch: &str, remote: &str) -> bool {
    if let Err(e) = repo.fetch(remote, branch) {
        log_debug!("Fetch of {}/{} failed: {}", remote, branch, e);
        return false;
    }

    match (
        repo.local_branch_head(branch),
        repo.remote_branch_head(remote, branch),
    ) {
        (Ok(local), Ok(remote_head)) => {
            log_debug!("Local {} at {}, remote at {}", branch, local, remote_head);
            local == remote_head
        }
        (local, remote_head) => {
            log_debug!(
                "Unable to resolve branch heads: local={:?} remote={:?}",
                local.err(),
                remote_head.err()
            );
            false
        }
    }
}
