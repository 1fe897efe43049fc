//! Commit graph construction
//!
//! Turns a commit log into a DAG keyed by commit hash:
//! - Nodes carry the commit plus parent/child adjacency
//! - Edges to commits outside the fetched window are dropped, so the default
//!   branch acts as the implicit, unlabeled root
//! - Branch labels are sorted reverse-lexicographically for deterministic output

use crate::errors::{Result, StackError};
use crate::git::{Log, LogCommit};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An immutable commit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Short-form commit hash
    pub hash: String,
    pub author: String,
    pub subject: String,
    pub date: String,
    pub parent_hashes: Vec<String>,
    /// Local branches pointing exactly at this commit, reverse-lexicographic
    pub local_branches: Vec<String>,
}

impl Commit {
    pub fn from_log(commit: &LogCommit) -> Self {
        let mut local_branches = commit.local_branches.clone();
        local_branches.sort_unstable_by(|a, b| b.cmp(a));
        local_branches.dedup();

        Self {
            hash: commit.hash.clone(),
            author: commit.author.clone(),
            subject: commit.subject.clone(),
            date: commit.date.clone(),
            parent_hashes: commit.parent_hashes.clone(),
            local_branches,
        }
    }

    pub fn has_branches(&self) -> bool {
        !self.local_branches.is_empty()
    }

    /// First label in canonical order
    pub fn primary_branch(&self) -> Option<&str> {
        self.local_branches.first().map(String::as_str)
    }
}

/// A commit plus its adjacency inside the DAG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub commit: Commit,
    /// Parent hashes, all present in the same DAG
    pub parents: BTreeSet<String>,
    /// Child hashes, all present in the same DAG
    pub children: BTreeSet<String>,
}

impl Node {
    pub fn hash(&self) -> &str {
        &self.commit.hash
    }

    pub fn is_source(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Directed acyclic commit graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dag {
    nodes: BTreeMap<String, Node>,
}

impl Dag {
    /// Build the graph from a commit log.
    ///
    /// Fails if the same hash appears twice.
    pub fn compute(log: &Log) -> Result<Self> {
        let mut nodes = BTreeMap::new();

        for entry in &log.commits {
            if nodes.contains_key(&entry.hash) {
                return Err(StackError::DuplicateCommit {
                    hash: entry.hash.clone(),
                });
            }
            nodes.insert(
                entry.hash.clone(),
                Node {
                    commit: Commit::from_log(entry),
                    parents: BTreeSet::new(),
                    children: BTreeSet::new(),
                },
            );
        }

        for entry in &log.commits {
            for parent in &entry.parent_hashes {
                if !nodes.contains_key(parent) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&entry.hash) {
                    node.parents.insert(parent.clone());
                }
                if let Some(node) = nodes.get_mut(parent) {
                    node.children.insert(entry.hash.clone());
                }
            }
        }

        debug!("Built commit graph with {} nodes", nodes.len());
        Ok(Self { nodes })
    }

    pub fn node(&self, hash: &str) -> Option<&Node> {
        self.nodes.get(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in hash order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes with no parent inside the window
    pub fn sources(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.is_source())
    }

    /// Nodes with no child inside the window
    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.is_sink())
    }
}
