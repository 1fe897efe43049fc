use crate::errors::{Result, StackError};
use crate::git::{BranchLookup, GitQueries, Log, PRETTY_FORMAT};
use git2::{BranchType, Oid, Repository};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Flags for [`GitRepository::rebase`]. `--update-refs` is always passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebaseOptions {
    /// Hand the todo list to the user's editor
    pub interactive: bool,
    /// Keep the current merge base instead of moving onto the new tip
    pub keep_base: bool,
    /// Fold `fixup!` commits into their targets
    pub autosquash: bool,
}

/// Wrapper around git2::Repository with the queries stack inference needs
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open a Git repository at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .map_err(|e| StackError::config(format!("Not a git repository: {e}")))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| StackError::config("Repository has no working directory"))?
            .to_path_buf();

        Ok(Self {
            repo,
            path: workdir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a branch exists
    pub fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
    }

    /// Local branch names with the commit each one points at
    fn local_branch_targets(&self) -> Result<Vec<(String, Oid)>> {
        let mut targets = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()? else {
                continue;
            };
            if let Some(oid) = branch.get().target() {
                targets.push((name.to_string(), oid));
            }
        }
        Ok(targets)
    }

    fn resolve_commit(&self, reference: &str) -> Result<git2::Commit<'_>> {
        let object = self.repo.revparse_single(reference).map_err(|e| {
            StackError::branch(format!("Could not resolve reference '{reference}': {e}"))
        })?;
        object.peel_to_commit().map_err(|e| {
            StackError::branch(format!("'{reference}' does not point to a commit: {e}"))
        })
    }

    /// Create a branch at HEAD and check it out
    pub fn create_branch(&self, name: &str) -> Result<()> {
        let head = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| StackError::branch(format!("Could not get HEAD commit: {e}")))?;

        self.repo
            .branch(name, &head, false)
            .map_err(|e| StackError::branch(format!("Could not create branch '{name}': {e}")))?;
        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .map_err(|e| StackError::branch(format!("Could not update HEAD to '{name}': {e}")))?;

        info!("Created branch '{}'", name);
        Ok(())
    }

    /// Commit HEAD's tree unchanged on top of HEAD
    pub fn commit_empty(&self, message: &str) -> Result<String> {
        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let tree = parent.tree()?;

        let commit_id = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        info!("Created commit: {} - {}", commit_id, message);
        Ok(commit_id.to_string())
    }

    /// `git commit --fixup` targeting the commit `branch` points at
    pub fn commit_fixup(&self, branch: &str, stage_all: bool) -> Result<String> {
        let target = self.resolve_commit(branch)?.id().to_string();
        let mut args = vec!["commit", "--fixup", target.as_str()];
        if stage_all {
            args.push("-a");
        }
        self.run_git(&args)
    }

    /// Switch to a branch
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| StackError::branch(format!("Could not find branch '{name}': {e}")))?;

        let tree = branch.get().peel_to_tree().map_err(|e| {
            StackError::branch(format!("Could not get tree for branch '{name}': {e}"))
        })?;

        self.repo
            .checkout_tree(tree.as_object(), None)
            .map_err(|e| StackError::branch(format!("Could not checkout branch '{name}': {e}")))?;

        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .map_err(|e| StackError::branch(format!("Could not update HEAD to '{name}': {e}")))?;

        info!("Switched to branch '{}'", name);
        Ok(())
    }

    /// Remote and remote branch name that `branch` tracks
    pub fn upstream(&self, branch: &str) -> Result<(String, String)> {
        let refname = format!("refs/heads/{branch}");
        let no_upstream =
            |e: git2::Error| StackError::branch(format!("Branch {branch} has no upstream: {e}"));

        let remote = self.repo.branch_upstream_remote(&refname).map_err(no_upstream)?;
        let merge = self.repo.branch_upstream_merge(&refname).map_err(no_upstream)?;

        let remote = remote
            .as_str()
            .ok_or_else(|| StackError::branch(format!("Invalid remote name for {branch}")))?;
        let merge = merge
            .as_str()
            .ok_or_else(|| StackError::branch(format!("Invalid upstream name for {branch}")))?;
        let remote_branch = merge.strip_prefix("refs/heads/").unwrap_or(merge);

        Ok((remote.to_string(), remote_branch.to_string()))
    }

    /// Fast-forward `local_branch` from `remote_branch` on `remote` without checking it out
    pub fn fetch_into(&self, remote: &str, remote_branch: &str, local_branch: &str) -> Result<()> {
        info!("Fetching {}/{} into {}", remote, remote_branch, local_branch);
        let refspec = format!("{remote_branch}:{local_branch}");
        self.run_git(&["fetch", remote, &refspec])?;
        Ok(())
    }

    /// Force push a branch, refusing to clobber remote work we have not seen
    pub fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        info!("Pushing branch {} to {}", branch, remote);
        self.run_git(&["push", "--force-with-lease", remote, branch])?;
        Ok(())
    }

    /// Rebase the checked out stack onto `onto`, moving every branch along.
    ///
    /// Autosquash without `interactive` runs an interactive rebase whose todo
    /// list is accepted as is.
    pub fn rebase(&self, onto: &str, options: RebaseOptions) -> Result<String> {
        info!("Rebasing onto {} with --update-refs", onto);
        let mut args = vec!["rebase", onto, "--update-refs"];
        if options.keep_base {
            args.push("--keep-base");
        }
        if options.autosquash {
            args.push("--autosquash");
        }

        if options.interactive {
            args.push("-i");
            self.run_git_attached(&args)?;
            Ok(String::new())
        } else if options.autosquash {
            args.push("-i");
            self.run_git_with_env(&args, &[("GIT_SEQUENCE_EDITOR", "true")])
        } else {
            self.run_git(&args)
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        self.run_git_with_env(args, &[])
    }

    fn run_git_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
        debug!("Running git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .envs(env.iter().copied())
            .current_dir(&self.path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StackError::branch(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git on the user's terminal, for editors and conflict prompts
    fn run_git_attached(&self, args: &[&str]) -> Result<()> {
        debug!("Running git {} attached", args.join(" "));
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .status()?;

        if !status.success() {
            return Err(StackError::branch(format!(
                "git {} exited with {status}",
                args.first().copied().unwrap_or_default()
            )));
        }
        Ok(())
    }
}

impl BranchLookup for GitRepository {
    fn branches_containing_commit(&self, hash: &str) -> Result<Vec<String>> {
        let target = self.resolve_commit(hash)?.id();

        let mut containing = Vec::new();
        for (name, tip) in self.local_branch_targets()? {
            if tip == target || self.repo.graph_descendant_of(tip, target)? {
                containing.push(name);
            }
        }
        containing.sort();
        debug!("{} branches contain {}", containing.len(), hash);
        Ok(containing)
    }
}

impl GitQueries for GitRepository {
    fn log_all(&self, not_reachable_from: &str) -> Result<Log> {
        let pretty = format!("--pretty=format:{PRETTY_FORMAT}");
        let exclude = format!("^{not_reachable_from}");
        let output = self.run_git(&[
            "log",
            &pretty,
            "--decorate=full",
            "--topo-order",
            "--branches",
            &exclude,
            "--",
        ])?;
        Log::parse(&output)
    }

    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| StackError::branch(format!("Could not get HEAD: {e}")))?;

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(name.to_string());
            }
        }
        self.short_commit_hash("HEAD")
    }

    /// Abbreviated the same way as `%h` in [`GitQueries::log_all`]
    fn short_commit_hash(&self, reference: &str) -> Result<String> {
        let short = self.run_git(&["rev-parse", "--short", "--verify", reference])?;
        Ok(short.trim().to_string())
    }

    fn merged_branches(&self, reference: &str) -> Result<BTreeSet<String>> {
        let base = self.resolve_commit(reference)?.id();

        let mut merged = BTreeSet::new();
        for (name, tip) in self.local_branch_targets()? {
            if name == reference {
                continue;
            }
            if tip == base || self.repo.graph_descendant_of(base, tip)? {
                merged.insert(name);
            }
        }
        Ok(merged)
    }
}
