use crate::bitbucket::{BitbucketClient, PullRequestManager};
use crate::config::{load_repo_settings, Settings};
use crate::errors::{Result, StackError};
use crate::git::{get_current_repository, GitQueries, GitRepository};
use crate::stack::{
    exclude_fully_merged, find_by_name, get_current, infer_from_log, InferenceResult, Stack,
};
use crate::utils::concurrent::blocking;
use std::collections::BTreeSet;
use tracing::debug;

/// Everything a stack command needs, computed once per invocation
pub struct StackContext {
    pub repo: GitRepository,
    pub settings: Settings,
    pub inference: InferenceResult,
    /// Checked out branch, or the short HEAD hash when detached
    pub current_ref: String,
    /// Local branches already merged into the default branch
    pub merged: BTreeSet<String>,
}

impl StackContext {
    /// Open the repository in the current directory and infer its stacks
    pub async fn load() -> Result<Self> {
        let repo = get_current_repository()?;
        let settings = load_repo_settings(repo.path())?;
        Self::from_parts(repo, settings).await
    }

    /// Read HEAD, the commit log and the merged branches side by side, then
    /// infer stacks. Each query gets its own repository handle.
    pub async fn from_parts(repo: GitRepository, settings: Settings) -> Result<Self> {
        let path = repo.path().to_path_buf();
        let log_path = path.clone();
        let default_branch = settings.git.default_branch.clone();
        let log_base = default_branch.clone();

        let ((repo, current_ref), log, merged) = futures::try_join!(
            blocking(move || {
                let current_ref = repo.current_branch()?;
                Ok((repo, current_ref))
            }),
            blocking(move || GitRepository::open(&log_path)?.log_all(&log_base)),
            blocking(move || GitRepository::open(&path)?.merged_branches(&default_branch)),
        )?;

        let inference = infer_from_log(&log, &repo, &settings.inference_options())?;
        debug!(
            "Loaded {} stacks, current ref {}",
            inference.stacks.len(),
            current_ref
        );

        Ok(Self {
            repo,
            settings,
            inference,
            current_ref,
            merged,
        })
    }

    pub fn default_branch(&self) -> &str {
        &self.settings.git.default_branch
    }

    pub fn current_stack(&self) -> Result<&Stack> {
        get_current(&self.inference.stacks, &self.current_ref)
    }

    /// The named stack, or the current one when no name is given
    pub fn resolve_stack(&self, name: Option<&str>) -> Result<&Stack> {
        match name {
            Some(name) => find_by_name(&self.inference.stacks, name),
            None => self.current_stack(),
        }
    }

    /// The current stack, provided its tip is checked out
    pub fn current_stack_at_tip(&self, action: &str) -> Result<&Stack> {
        let stack = self.current_stack()?;
        ensure_on_tip(stack, &self.current_ref, action)?;
        Ok(stack)
    }

    /// Stacks that still have unmerged branches
    pub fn visible_stacks(&self) -> Vec<Stack> {
        exclude_fully_merged(self.inference.stacks.clone(), &self.merged)
    }

    /// Pull request client, failing with a hint when Bitbucket is not configured
    pub fn pull_requests(&self) -> Result<PullRequestManager> {
        match &self.settings.bitbucket {
            Some(config) if config.is_complete() => {
                Ok(PullRequestManager::new(BitbucketClient::new(config)?))
            }
            _ => Err(StackError::config(
                "Bitbucket is not configured. Set bitbucket.url, bitbucket.project, \
                 bitbucket.repo and bitbucket.token with `git-stack config set`",
            )),
        }
    }
}

/// `--update-refs` only moves branches below HEAD, so the tip must be checked out
pub fn ensure_on_tip(stack: &Stack, current_ref: &str, action: &str) -> Result<()> {
    let tip = stack.tip();
    if tip.hash() == current_ref || tip.branches().iter().any(|b| b == current_ref) {
        return Ok(());
    }

    Err(StackError::validation(format!(
        "must be on the tip of stack {} to {action}, currently checked out: {current_ref} (try `git-stack switch {}`)",
        stack.name(),
        stack.name()
    )))
}
