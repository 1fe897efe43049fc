//! Stack inference module
//!
//! This module reconstructs stacks of dependent branches from commit history:
//! - Commit graph construction from the log
//! - Stack inference with depth scoring and ordering
//! - Typed topology anomalies (merges, collisions, divergence)
//! - Queries over the inferred stacks

pub mod anomaly;
pub mod graph;
pub mod inference;
pub mod query;
pub mod stack;

pub use anomaly::StackAnomaly;
pub use graph::{Commit, Dag, Node};
pub use inference::{
    infer_from_log, infer_stacks, InferenceOptions, InferenceResult, InferenceStrategy,
    DEFAULT_MAX_DEPTH,
};
pub use query::{exclude_fully_merged, filter_unmerged, find_by_name, get_current};
pub use stack::{Branch, Stack, StackCommit};
