//! Stack inference
//!
//! Reconstructs stacks from the commit DAG. Two strategies are available:
//! - `Forward` walks every source-to-sink path and refuses to cross merge commits
//! - `TipScoring` builds one stack per sink by walking parents backwards,
//!   tolerating merges and reporting branches it cannot order
//!
//! Both strategies assign the same depth scores, attach collisions and
//! divergence to the affected stacks, and return stacks sorted by name.

use crate::errors::{Result, StackError};
use crate::git::{BranchLookup, Log};
use crate::stack::anomaly::StackAnomaly;
use crate::stack::graph::{Dag, Node};
use crate::stack::stack::{Stack, StackCommit};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Longest commit path the engine will walk before giving up
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// How stacks are reconstructed from the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStrategy {
    /// Enumerate source-to-sink paths; merge commits abort the path
    #[default]
    Forward,
    /// One stack per sink with longest-path depth scores; merges tolerated
    TipScoring,
}

impl fmt::Display for InferenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceStrategy::Forward => write!(f, "forward"),
            InferenceStrategy::TipScoring => write!(f, "tip_scoring"),
        }
    }
}

impl FromStr for InferenceStrategy {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "forward" => Ok(InferenceStrategy::Forward),
            "tip_scoring" => Ok(InferenceStrategy::TipScoring),
            other => Err(StackError::config(format!(
                "unknown inference strategy '{other}' (expected forward or tip_scoring)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    pub strategy: InferenceStrategy,
    pub max_depth: usize,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            strategy: InferenceStrategy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Stacks sorted by name plus anomalies that prevented a stack from forming
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferenceResult {
    pub stacks: Vec<Stack>,
    pub errors: Vec<StackAnomaly>,
}

impl InferenceResult {
    /// Inference errors first, then the validation errors of `stacks` only.
    ///
    /// Pass `&self.stacks` for every anomaly, or a filtered list to leave out
    /// stacks that are not shown.
    pub fn anomalies_for<'a>(&'a self, stacks: &'a [Stack]) -> Vec<&'a StackAnomaly> {
        self.errors
            .iter()
            .chain(stacks.iter().flat_map(|s| s.validation_errors()))
            .collect()
    }
}

/// Build the graph from `log` and infer its stacks
pub fn infer_from_log(
    log: &Log,
    lookup: &dyn BranchLookup,
    options: &InferenceOptions,
) -> Result<InferenceResult> {
    let dag = Dag::compute(log)?;
    infer_stacks(&dag, lookup, options)
}

/// Infer stacks from a commit graph.
///
/// The outer `Result` only fails on fatal errors such as exceeding the depth
/// ceiling. Topology problems are reported as [`StackAnomaly`] values.
pub fn infer_stacks(
    dag: &Dag,
    lookup: &dyn BranchLookup,
    options: &InferenceOptions,
) -> Result<InferenceResult> {
    debug!(
        "Inferring stacks from {} commits using {} strategy",
        dag.len(),
        options.strategy
    );

    let (mut stacks, errors) = match options.strategy {
        InferenceStrategy::Forward => forward_stacks(dag, lookup, options.max_depth)?,
        InferenceStrategy::TipScoring => (tip_scored_stacks(dag, options.max_depth)?, Vec::new()),
    };

    mark_shared_commits(&mut stacks);
    for stack in &mut stacks {
        attach_validation_errors(stack);
    }
    stacks.sort_by(|a, b| a.name().cmp(b.name()));

    debug!(
        "Inferred {} stacks with {} inference errors",
        stacks.len(),
        errors.len()
    );
    Ok(InferenceResult { stacks, errors })
}

fn node<'a>(dag: &'a Dag, hash: &str) -> Result<&'a Node> {
    dag.node(hash)
        .ok_or_else(|| StackError::validation(format!("commit {hash} missing from graph")))
}

fn forward_stacks(
    dag: &Dag,
    lookup: &dyn BranchLookup,
    max_depth: usize,
) -> Result<(Vec<Stack>, Vec<StackAnomaly>)> {
    let mut stacks = Vec::new();
    let mut errors = Vec::new();
    let mut containing_cache: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for source in dag.sources() {
        let mut worklist: Vec<Vec<&str>> = vec![vec![source.hash()]];

        while let Some(path) = worklist.pop() {
            if path.len() > max_depth {
                return Err(StackError::MaxDepthExceeded { limit: max_depth });
            }
            let Some(&hash) = path.last() else {
                continue;
            };
            let current = node(dag, hash)?;

            if current.is_merge() {
                debug!("Path from {} blocked by merge commit {}", source.hash(), hash);
                let containing_branches = containing_cache
                    .entry(hash.to_string())
                    .or_insert_with(|| {
                        lookup.branches_containing_commit(hash).unwrap_or_else(|e| {
                            warn!("Failed to list branches containing {}: {}", hash, e);
                            Vec::new()
                        })
                    })
                    .clone();
                errors.push(StackAnomaly::MergeCommit {
                    hash: hash.to_string(),
                    containing_branches,
                });
                continue;
            }

            if current.is_sink() {
                let commits = path
                    .iter()
                    .rev()
                    .map(|h| node(dag, h).map(|n| n.commit.clone()))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(stack) = Stack::from_path(commits) {
                    debug!("Found stack {} with {} commits", stack.name(), stack.len());
                    stacks.push(stack);
                }
                continue;
            }

            // Reverse so children are visited in hash order.
            for child in current.children.iter().rev() {
                let mut next = path.clone();
                next.push(child.as_str());
                worklist.push(next);
            }
        }
    }

    Ok((stacks, errors))
}

/// Longest distances from a sink, relaxed until stable
#[derive(Debug, Clone, Copy, Default)]
struct Reach {
    /// Commits on the longest path from the sink, inclusive
    depth: usize,
    /// Labeled commits strictly above on the most-labeled path
    labeled_above: usize,
}

fn tip_scored_stacks(dag: &Dag, max_depth: usize) -> Result<Vec<Stack>> {
    let mut stacks = Vec::new();

    for sink in dag.sinks() {
        let mut reach: BTreeMap<&str, Reach> = BTreeMap::new();
        reach.insert(
            sink.hash(),
            Reach {
                depth: 1,
                labeled_above: 0,
            },
        );
        let mut worklist = vec![sink.hash()];

        while let Some(hash) = worklist.pop() {
            let current = node(dag, hash)?;
            let here = reach.get(hash).copied().unwrap_or_default();
            if here.depth > max_depth {
                return Err(StackError::MaxDepthExceeded { limit: max_depth });
            }

            let candidate = Reach {
                depth: here.depth + 1,
                labeled_above: here.labeled_above + usize::from(current.commit.has_branches()),
            };
            for parent in &current.parents {
                let improved = match reach.get_mut(parent.as_str()) {
                    Some(existing) => {
                        let improved = candidate.depth > existing.depth
                            || candidate.labeled_above > existing.labeled_above;
                        existing.depth = existing.depth.max(candidate.depth);
                        existing.labeled_above = existing.labeled_above.max(candidate.labeled_above);
                        improved
                    }
                    None => {
                        reach.insert(parent.as_str(), candidate);
                        true
                    }
                };
                if improved {
                    worklist.push(parent.as_str());
                }
            }
        }

        let mut ordered: Vec<(&str, Reach)> = reach.into_iter().collect();
        ordered.sort_by(|(ha, a), (hb, b)| a.depth.cmp(&b.depth).then_with(|| ha.cmp(hb)));

        let commits = ordered
            .into_iter()
            .map(|(hash, r)| {
                let commit = node(dag, hash)?.commit.clone();
                let score = if commit.has_branches() {
                    r.labeled_above
                } else {
                    r.labeled_above.saturating_sub(1)
                };
                Ok(StackCommit {
                    commit,
                    score,
                    shared_with: BTreeSet::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(stack) = Stack::from_scored(commits) {
            debug!("Scored stack {} with {} commits", stack.name(), stack.len());
            stacks.push(stack);
        }
    }

    Ok(stacks)
}

fn mark_shared_commits(stacks: &mut [Stack]) {
    let mut memberships: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for stack in stacks.iter() {
        for commit in stack.commits() {
            memberships
                .entry(commit.hash().to_string())
                .or_default()
                .insert(stack.name().to_string());
        }
    }

    for stack in stacks.iter_mut() {
        let name = stack.name.clone();
        for commit in &mut stack.commits {
            if let Some(names) = memberships.get(&commit.commit.hash) {
                commit.shared_with = names.iter().filter(|n| **n != name).cloned().collect();
            }
        }
    }
}

fn attach_validation_errors(stack: &mut Stack) {
    let others = stack.diverges_from();
    if !others.is_empty() {
        let anomaly = StackAnomaly::Divergence {
            stack_name: stack.name().to_string(),
            other_stack_names: others.into_iter().collect(),
        };
        stack.add_validation_error(anomaly);
    }

    let collisions: Vec<Vec<String>> = stack
        .commits()
        .iter()
        .filter(|c| c.branches().len() > 1)
        .map(|c| c.branches().to_vec())
        .collect();
    for branches in collisions {
        let anomaly = StackAnomaly::BranchCollision {
            stack_name: stack.name().to_string(),
            branches,
        };
        stack.add_validation_error(anomaly);
    }
}
