pub mod log;
pub mod repository;

pub use log::{parse_decorations, Log, LogCommit, PRETTY_FORMAT};
pub use repository::{GitRepository, RebaseOptions};

use crate::errors::{Result, StackError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Lookup of the local branches that contain a commit.
///
/// This is the only collaborator the inference engine needs.
pub trait BranchLookup {
    fn branches_containing_commit(&self, hash: &str) -> Result<Vec<String>>;
}

/// Read-only queries against a repository
pub trait GitQueries: BranchLookup {
    /// Commits reachable from any local branch but not from `not_reachable_from`
    fn log_all(&self, not_reachable_from: &str) -> Result<Log>;

    /// Checked out branch, or the short HEAD hash when detached
    fn current_branch(&self) -> Result<String>;

    fn short_commit_hash(&self, reference: &str) -> Result<String>;

    /// Local branches fully merged into `reference`, excluding `reference` itself
    fn merged_branches(&self, reference: &str) -> Result<BTreeSet<String>>;
}

/// Check if a directory is a Git repository
pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").exists() || git2::Repository::discover(path).is_ok()
}

/// Find the root of the Git repository
pub fn find_repository_root(start_path: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(start_path).map_err(StackError::Git)?;

    let workdir = repo
        .workdir()
        .ok_or_else(|| StackError::config("Repository has no working directory (bare repo?)"))?;

    Ok(workdir.to_path_buf())
}

/// Get the current working directory as a Git repository
pub fn get_current_repository() -> Result<GitRepository> {
    let current_dir = std::env::current_dir()
        .map_err(|e| StackError::config(format!("Could not get current directory: {e}")))?;

    let repo_root = find_repository_root(&current_dir)?;
    GitRepository::open(&repo_root)
}
