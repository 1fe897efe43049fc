use crate::errors::{Result, StackError};
use crate::stack::anomaly::StackAnomaly;
use crate::stack::graph::Commit;
use serde::Serialize;
use std::collections::BTreeSet;

/// A commit inside an inferred stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackCommit {
    pub commit: Commit,
    /// Depth score: 0 for the tip-most labeled commit, +1 per labeled commit below
    pub score: usize,
    /// Names of the other stacks that also contain this commit
    pub shared_with: BTreeSet<String>,
}

impl StackCommit {
    pub fn hash(&self) -> &str {
        &self.commit.hash
    }

    pub fn branches(&self) -> &[String] {
        &self.commit.local_branches
    }
}

/// A local branch within a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit_hash: String,
    /// Whether this branch is currently checked out
    pub current: bool,
}

/// A chain of commits from a stack tip down to the default branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stack {
    pub(crate) name: String,
    /// Ordered top to bottom, never empty
    pub(crate) commits: Vec<StackCommit>,
    pub(crate) validation_errors: Vec<StackAnomaly>,
}

impl Stack {
    /// Build a stack from a linear path ordered tip first, assigning depth scores.
    ///
    /// Returns `None` for an empty path.
    pub fn from_path(path: Vec<Commit>) -> Option<Self> {
        let mut last_labeled: Option<usize> = None;
        let commits: Vec<StackCommit> = path
            .into_iter()
            .map(|commit| {
                let score = if commit.has_branches() {
                    let score = last_labeled.map_or(0, |s| s + 1);
                    last_labeled = Some(score);
                    score
                } else {
                    last_labeled.unwrap_or(0)
                };
                StackCommit {
                    commit,
                    score,
                    shared_with: BTreeSet::new(),
                }
            })
            .collect();

        Self::from_scored(commits)
    }

    /// Build a stack from already scored commits ordered tip first.
    pub(crate) fn from_scored(commits: Vec<StackCommit>) -> Option<Self> {
        let tip = commits.first()?;
        let name = tip
            .commit
            .primary_branch()
            .unwrap_or(&tip.commit.hash)
            .to_string();

        Some(Self {
            name,
            commits,
            validation_errors: Vec::new(),
        })
    }

    /// Branch name at the tip, or the tip hash when the tip has no branch
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commits ordered top to bottom
    pub fn commits(&self) -> &[StackCommit] {
        &self.commits
    }

    pub fn tip(&self) -> &StackCommit {
        // Stacks are never constructed empty.
        &self.commits[0]
    }

    pub fn commit(&self, hash: &str) -> Option<&StackCommit> {
        self.commits.iter().find(|c| c.hash() == hash)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn validation_errors(&self) -> &[StackAnomaly] {
        &self.validation_errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    pub(crate) fn add_validation_error(&mut self, anomaly: StackAnomaly) {
        self.validation_errors.push(anomaly);
    }

    pub fn contains_commit(&self, hash: &str) -> bool {
        self.commit(hash).is_some()
    }

    pub fn contains_branch(&self, branch: &str) -> bool {
        self.commits
            .iter()
            .any(|c| c.branches().iter().any(|b| b == branch))
    }

    /// Whether `reference` names a commit hash or branch inside this stack
    pub fn contains_ref(&self, reference: &str) -> bool {
        self.contains_commit(reference) || self.contains_branch(reference)
    }

    /// Every branch of every commit, top to bottom.
    ///
    /// Non-empty for any stack inferred from a branch-bounded log, since each
    /// tip is a branch head.
    pub fn all_branches(&self) -> Vec<String> {
        self.commits
            .iter()
            .flat_map(|c| c.branches().iter().cloned())
            .collect()
    }

    /// Branches top to bottom, requiring one branch per labeled commit
    pub fn unique_branches(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for commit in &self.commits {
            match commit.branches() {
                [] => continue,
                [branch] => out.push(branch.clone()),
                branches => {
                    return Err(StackError::validation(format!(
                        "stack {} contains multiple branches ({}) pointing to commit {}",
                        self.name,
                        branches.join(", "),
                        commit.hash()
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Branches top to bottom with a marker for the checked out one
    pub fn branches(&self, current_branch: Option<&str>) -> Vec<Branch> {
        self.commits
            .iter()
            .flat_map(|c| {
                c.branches().iter().map(move |name| Branch {
                    name: name.clone(),
                    commit_hash: c.hash().to_string(),
                    current: current_branch == Some(name.as_str()),
                })
            })
            .collect()
    }

    fn labeled_by_score(&self) -> Vec<&StackCommit> {
        let mut labeled: Vec<&StackCommit> =
            self.commits.iter().filter(|c| c.commit.has_branches()).collect();
        labeled.sort_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| a.commit.primary_branch().cmp(&b.commit.primary_branch()))
        });
        labeled
    }

    /// Branches ordered tip first by depth score.
    ///
    /// Fails with [`StackAnomaly::NoTotalOrder`] when two labeled commits share
    /// a score, since nothing in the graph decides which sits on top.
    pub fn total_ordered_branches(&self) -> std::result::Result<Vec<String>, StackAnomaly> {
        let labeled = self.labeled_by_score();

        let mut incomparable_branch_pairs = Vec::new();
        for (i, a) in labeled.iter().enumerate() {
            for b in labeled[i + 1..].iter().take_while(|b| b.score == a.score) {
                if let (Some(x), Some(y)) = (a.commit.primary_branch(), b.commit.primary_branch()) {
                    incomparable_branch_pairs.push((x.to_string(), y.to_string()));
                }
            }
        }
        if !incomparable_branch_pairs.is_empty() {
            return Err(StackAnomaly::NoTotalOrder {
                stack_name: self.name.clone(),
                incomparable_branch_pairs,
            });
        }

        Ok(labeled
            .into_iter()
            .flat_map(|c| c.branches().iter().cloned())
            .collect())
    }

    /// Total order if one exists, otherwise a deterministic approximation.
    ///
    /// The flag is true when the order is approximate.
    pub fn ordered_branches_or_approximate(&self) -> (Vec<String>, bool) {
        match self.total_ordered_branches() {
            Ok(branches) => (branches, false),
            Err(_) => (
                self.labeled_by_score()
                    .into_iter()
                    .flat_map(|c| c.branches().iter().cloned())
                    .collect(),
                true,
            ),
        }
    }

    /// Names of every other stack sharing at least one commit with this one
    pub fn diverges_from(&self) -> BTreeSet<String> {
        self.commits
            .iter()
            .flat_map(|c| c.shared_with.iter().cloned())
            .filter(|name| name != &self.name)
            .collect()
    }

    /// Branch to base-branch pairs for pushing, tip first.
    ///
    /// The bottom branch targets `default_branch`. Requires the stack to have
    /// an unambiguous order: no collisions, no divergence, a total order.
    pub fn push_targets(&self, default_branch: &str) -> Result<Vec<(String, String)>> {
        if let Some(anomaly) = self.validation_errors.iter().find(|a| {
            matches!(
                a,
                StackAnomaly::BranchCollision { .. } | StackAnomaly::Divergence { .. }
            )
        }) {
            return Err(StackError::validation(format!(
                "cannot push stack {}: {anomaly} (hint: {})",
                self.name,
                anomaly.hint()
            )));
        }

        let branches = self.total_ordered_branches().map_err(|anomaly| {
            StackError::validation(format!(
                "cannot push stack {}: {anomaly} (hint: {})",
                self.name,
                anomaly.hint()
            ))
        })?;

        Ok(branches
            .iter()
            .enumerate()
            .map(|(i, branch)| {
                let target = branches
                    .get(i + 1)
                    .map(String::as_str)
                    .unwrap_or(default_branch);
                (branch.clone(), target.to_string())
            })
            .collect())
    }
}
