use crate::errors::{Result, StackError};
use crate::stack::stack::Stack;
use std::collections::BTreeSet;

/// The one stack containing `current_ref`, a commit hash or branch name.
pub fn get_current<'a>(stacks: &'a [Stack], current_ref: &str) -> Result<&'a Stack> {
    let matches: Vec<&Stack> = stacks.iter().filter(|s| s.contains_ref(current_ref)).collect();

    match matches.as_slice() {
        [] => Err(StackError::NotInStack),
        [stack] => Ok(stack),
        many => Err(StackError::AmbiguousPosition {
            names: many.iter().map(|s| s.name().to_string()).collect(),
        }),
    }
}

pub fn find_by_name<'a>(stacks: &'a [Stack], name: &str) -> Result<&'a Stack> {
    stacks
        .iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| StackError::StackNotFound(name.to_string()))
}

/// Drop branches that are already merged into the default branch
pub fn filter_unmerged(branches: &[String], merged: &BTreeSet<String>) -> Vec<String> {
    branches
        .iter()
        .filter(|b| !merged.contains(*b))
        .cloned()
        .collect()
}

/// Drop stacks whose every branch is merged into the default branch.
///
/// Stacks without any branch are kept.
pub fn exclude_fully_merged(stacks: Vec<Stack>, merged: &BTreeSet<String>) -> Vec<Stack> {
    stacks
        .into_iter()
        .filter(|stack| {
            let branches = stack.all_branches();
            branches.is_empty() || !filter_unmerged(&branches, merged).is_empty()
        })
        .collect()
}
