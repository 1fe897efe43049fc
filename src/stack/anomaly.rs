use serde::Serialize;

/// Topology problems found while inferring stacks.
///
/// These never abort inference; they are attached to the affected stack or
/// returned next to the stacks that could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StackAnomaly {
    /// A commit with more than one parent blocked a path
    #[error("{}", merge_commit_message(.hash, .containing_branches))]
    MergeCommit {
        hash: String,
        containing_branches: Vec<String>,
    },

    /// Two or more branches point at one commit
    #[error("Stack {stack_name} contains multiple branches ({}) pointing to the same commit", .branches.join(", "))]
    BranchCollision {
        stack_name: String,
        branches: Vec<String>,
    },

    /// The stack shares history with other stacks
    #[error("{}", divergence_message(.stack_name, .other_stack_names))]
    Divergence {
        stack_name: String,
        other_stack_names: Vec<String>,
    },

    /// Some branches cannot be ordered from commit ancestry alone
    #[error("{}", no_total_order_message(.stack_name, .incomparable_branch_pairs))]
    NoTotalOrder {
        stack_name: String,
        incomparable_branch_pairs: Vec<(String, String)>,
    },
}

impl StackAnomaly {
    /// Short label used when listing problems
    pub fn kind(&self) -> &'static str {
        match self {
            StackAnomaly::MergeCommit { .. } => "merge commit",
            StackAnomaly::BranchCollision { .. } => "branch collision",
            StackAnomaly::Divergence { .. } => "divergence",
            StackAnomaly::NoTotalOrder { .. } => "no total order",
        }
    }

    /// Remediation hint shown under the message
    pub fn hint(&self) -> &'static str {
        match self {
            StackAnomaly::MergeCommit { .. } => {
                "undo the merge (try `git reflog`) and rebase onto the default branch instead"
            }
            StackAnomaly::BranchCollision { .. } => {
                "add a commit to one of the branches or delete the duplicate"
            }
            StackAnomaly::Divergence { .. } => "rebase the stacks so they no longer share commits",
            StackAnomaly::NoTotalOrder { .. } => {
                "rebase one branch on top of the other so their order is unambiguous"
            }
        }
    }
}

fn merge_commit_message(hash: &str, containing_branches: &[String]) -> String {
    match containing_branches {
        [] => format!("Merge commit {hash}"),
        [branch] => format!("Merge commit {hash} is present in branch {branch}"),
        branches => format!(
            "Merge commit {hash} is present in branches {}",
            branches.join(", ")
        ),
    }
}

fn divergence_message(stack_name: &str, others: &[String]) -> String {
    match others {
        [other] => format!("Stack {stack_name} has diverged from stack {other}"),
        others => format!(
            "Stack {stack_name} has diverged from stacks {}",
            others.join(", ")
        ),
    }
}

fn no_total_order_message(stack_name: &str, pairs: &[(String, String)]) -> String {
    // Printing every pair is too noisy; the first one is actionable.
    match pairs.first() {
        Some((a, b)) if pairs.len() == 1 => {
            format!("{stack_name}: branch {a} does not contain {b}, and vice versa")
        }
        Some((a, b)) => format!(
            "{stack_name}: branch {a} does not contain {b}, and vice versa ({} more incomparable pairs)",
            pairs.len() - 1
        ),
        None => format!("{stack_name}: branches have no total order"),
    }
}
