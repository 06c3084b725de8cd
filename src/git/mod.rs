// Git module: repository access plus the branch/commit tracking used by the PR workflows

mod checkout;
mod repository;
mod utils;

pub use checkout::{first_commit_since_checkout, is_remote_branch_in_sync};
pub use repository::{CommitInfo, DEFAULT_REMOTE, GitRepo};
pub use utils::*;
