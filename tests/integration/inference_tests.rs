use git_stack::errors::Result;
use git_stack::git::{BranchLookup, GitQueries, Log, LogCommit};
use git_stack::stack::{
    get_current, infer_from_log, Dag, InferenceOptions, InferenceResult, InferenceStrategy,
    StackAnomaly,
};
use git_stack::StackError;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory stand-in for a repository
#[derive(Default)]
struct FakeGit {
    log: Log,
    containing: BTreeMap<String, Vec<String>>,
    current: String,
}

impl BranchLookup for FakeGit {
    fn branches_containing_commit(&self, hash: &str) -> Result<Vec<String>> {
        Ok(self.containing.get(hash).cloned().unwrap_or_default())
    }
}

impl GitQueries for FakeGit {
    fn log_all(&self, _not_reachable_from: &str) -> Result<Log> {
        Ok(self.log.clone())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    fn short_commit_hash(&self, reference: &str) -> Result<String> {
        Ok(reference.chars().take(7).collect())
    }

    fn merged_branches(&self, _reference: &str) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::new())
    }
}

fn commit(hash: &str, parents: &[&str], branches: &[&str]) -> LogCommit {
    LogCommit {
        hash: hash.to_string(),
        parent_hashes: parents.iter().map(|s| s.to_string()).collect(),
        local_branches: branches.iter().map(|s| s.to_string()).collect(),
        author: "Test User".to_string(),
        date: "1 day ago".to_string(),
        subject: format!("commit {hash}"),
    }
}

fn fake(commits: Vec<LogCommit>) -> FakeGit {
    FakeGit {
        log: Log::new(commits),
        ..Default::default()
    }
}

fn infer_with(git: &FakeGit, strategy: InferenceStrategy) -> InferenceResult {
    let log = git.log_all("main").unwrap();
    let options = InferenceOptions {
        strategy,
        ..Default::default()
    };
    infer_from_log(&log, git, &options).unwrap()
}

fn strategies() -> [InferenceStrategy; 2] {
    [InferenceStrategy::Forward, InferenceStrategy::TipScoring]
}

/// Properties that must hold for every inference result
fn assert_invariants(result: &InferenceResult) {
    for stack in &result.stacks {
        assert!(!stack.is_empty());

        let hashes: BTreeSet<&str> = stack.commits().iter().map(|c| c.hash()).collect();
        assert_eq!(hashes.len(), stack.len(), "stack {} repeats a commit", stack.name());

        assert_eq!(stack.total_ordered_branches(), stack.total_ordered_branches());

        if let Ok(ordered) = stack.total_ordered_branches() {
            let labeled: Vec<String> = stack
                .commits()
                .iter()
                .flat_map(|c| c.branches().iter().cloned())
                .collect();
            assert_eq!(ordered.len(), labeled.len());
        }

        for other in stack.diverges_from() {
            let other_stack = result
                .stacks
                .iter()
                .find(|s| s.name() == other)
                .expect("diverging stack must exist");
            assert!(
                other_stack.diverges_from().contains(stack.name()),
                "divergence between {} and {} is not symmetric",
                stack.name(),
                other
            );
        }
    }

    let names: Vec<&str> = result.stacks.iter().map(|s| s.name()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_linear_stack_scenario() {
    let git = fake(vec![
        commit("c2", &["c1"], &["feat/pt2"]),
        commit("c1", &["c0"], &["feat/pt1"]),
    ]);

    for strategy in strategies() {
        let result = infer_with(&git, strategy);
        assert_invariants(&result);
        assert_eq!(result.stacks.len(), 1);
        assert_eq!(result.stacks[0].name(), "feat/pt2");
        assert_eq!(
            result.stacks[0].total_ordered_branches().unwrap(),
            vec!["feat/pt2", "feat/pt1"]
        );
    }
}

#[test]
fn test_merge_commit_scenario() {
    let mut git = fake(vec![
        commit("c3", &["c2", "c1"], &["feat/pt3"]),
        commit("c2", &["c0"], &[]),
        commit("c1", &["c0"], &[]),
        commit("x2", &["x1"], &["other/top"]),
        commit("x1", &["c0"], &["other/base"]),
    ]);
    git.containing
        .insert("c3".to_string(), vec!["feat/pt3".to_string()]);

    let result = infer_with(&git, InferenceStrategy::Forward);
    assert_invariants(&result);

    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().all(|e| matches!(
        e,
        StackAnomaly::MergeCommit { hash, containing_branches }
            if hash == "c3" && containing_branches == &vec!["feat/pt3".to_string()]
    )));
    assert_eq!(result.stacks.len(), 1);
    assert_eq!(
        result.stacks[0].total_ordered_branches().unwrap(),
        vec!["other/top", "other/base"]
    );
}

#[test]
fn test_divergence_scenario() {
    let git = fake(vec![
        commit("c4", &["c3a"], &["feat/pt3"]),
        commit("c3a", &["c2"], &[]),
        commit("c3b", &["c2"], &["feat/pt2"]),
        commit("c2", &["c0"], &["feat/pt1"]),
    ]);

    for strategy in strategies() {
        let result = infer_with(&git, strategy);
        assert_invariants(&result);

        let names: Vec<&str> = result.stacks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["feat/pt2", "feat/pt3"]);
        for stack in &result.stacks {
            let other = if stack.name() == "feat/pt2" { "feat/pt3" } else { "feat/pt2" };
            assert!(stack.validation_errors().iter().any(|e| matches!(
                e,
                StackAnomaly::Divergence { other_stack_names, .. }
                    if other_stack_names == &vec![other.to_string()]
            )));
            assert!(stack.push_targets("main").is_err());
        }
    }
}

#[test]
fn test_collision_scenario() {
    let git = fake(vec![commit("c1", &["c0"], &["dev", "dev2"])]);

    for strategy in strategies() {
        let result = infer_with(&git, strategy);
        assert_invariants(&result);

        let stack = &result.stacks[0];
        assert_eq!(stack.name(), "dev2");
        assert_eq!(
            stack.validation_errors(),
            &[StackAnomaly::BranchCollision {
                stack_name: "dev2".to_string(),
                branches: vec!["dev2".to_string(), "dev".to_string()],
            }]
        );
        assert!(stack.unique_branches().is_err());
    }
}

#[test]
fn test_independent_chains_scenario() {
    let git = fake(vec![
        commit("b2", &["b1"], &["bravo/2"]),
        commit("b1", &["c0"], &["bravo/1"]),
        commit("a2", &["a1"], &["alpha/2"]),
        commit("a1", &["c0"], &["alpha/1"]),
    ]);

    for strategy in strategies() {
        let result = infer_with(&git, strategy);
        assert_invariants(&result);
        let names: Vec<&str> = result.stacks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alpha/2", "bravo/2"]);
        assert!(result.stacks.iter().all(|s| s.is_valid()));
    }
}

#[test]
fn test_empty_log_yields_nothing() {
    for strategy in strategies() {
        let result = infer_with(&fake(Vec::new()), strategy);
        assert!(result.stacks.is_empty());
        assert!(result.errors.is_empty());
    }
}

#[test]
fn test_unlabeled_commits_count_toward_depth_only() {
    let git = fake(vec![
        commit("c5", &["c4"], &["top"]),
        commit("c4", &["c3"], &[]),
        commit("c3", &["c2"], &["mid"]),
        commit("c2", &["c1"], &[]),
        commit("c1", &["c0"], &["base"]),
    ]);

    let result = infer_with(&git, InferenceStrategy::Forward);
    let stack = &result.stacks[0];
    assert_eq!(stack.total_ordered_branches().unwrap(), vec!["top", "mid", "base"]);
    let scores: Vec<usize> = stack.commits().iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0, 0, 1, 1, 2]);
}

#[test]
fn test_current_stack_lookup() {
    let mut git = fake(vec![
        commit("c4", &["c3a"], &["feat/pt3"]),
        commit("c3a", &["c2"], &[]),
        commit("c3b", &["c2"], &["feat/pt2"]),
        commit("c2", &["c0"], &["feat/pt1"]),
    ]);
    git.current = "feat/pt3".to_string();

    let result = infer_with(&git, InferenceStrategy::Forward);
    let current = git.current_branch().unwrap();
    assert_eq!(get_current(&result.stacks, &current).unwrap().name(), "feat/pt3");
    assert!(matches!(
        get_current(&result.stacks, "feat/pt1"),
        Err(StackError::AmbiguousPosition { .. })
    ));
    assert!(matches!(
        get_current(&result.stacks, "main"),
        Err(StackError::NotInStack)
    ));
}

#[test]
fn test_parsed_log_text_to_stacks() {
    let output = "\
c3-----c2-----HEAD -> refs/heads/feat/pt2, refs/remotes/origin/feat/pt2-----Jane-----1 hour ago-----Second part
c2-----c1-----refs/heads/feat/pt1, tag: refs/tags/v0.1-----Jane-----2 hours ago-----First part
";
    let log = Log::parse(output).unwrap();
    let result = infer_from_log(&log, &fake(Vec::new()), &InferenceOptions::default()).unwrap();

    assert_eq!(result.stacks.len(), 1);
    assert_eq!(
        result.stacks[0].total_ordered_branches().unwrap(),
        vec!["feat/pt2", "feat/pt1"]
    );
    assert_eq!(result.stacks[0].tip().commit.subject, "Second part");
}

#[test]
fn test_adjacency_is_symmetric() {
    let log = Log::new(vec![
        commit("c4", &["c3a"], &["feat/pt3"]),
        commit("c3a", &["c2"], &[]),
        commit("c3b", &["c2"], &["feat/pt2"]),
        commit("m", &["c3b", "x1"], &[]),
        commit("x1", &["c0"], &[]),
        commit("c2", &["c0"], &["feat/pt1"]),
    ]);
    let dag = Dag::compute(&log).unwrap();

    for node in dag.iter() {
        for parent in &node.parents {
            assert!(dag.node(parent).unwrap().children.contains(node.hash()));
        }
        for child in &node.children {
            assert!(dag.node(child).unwrap().parents.contains(node.hash()));
        }
    }
    // Parents outside the log are not part of the graph.
    assert!(!dag.contains("c0"));
    assert!(dag.node("c2").unwrap().is_source());
}

#[test]
fn test_duplicate_commit_is_fatal() {
    let log = Log::new(vec![commit("c1", &[], &["a"]), commit("c1", &[], &["b"])]);
    assert!(matches!(
        Dag::compute(&log),
        Err(StackError::DuplicateCommit { .. })
    ));
    assert!(infer_from_log(&log, &fake(Vec::new()), &InferenceOptions::default()).is_err());
}

#[test]
fn test_deep_history_hits_ceiling() {
    let depth = 30;
    let commits: Vec<LogCommit> = (1..=depth)
        .rev()
        .map(|i| {
            let parent = format!("c{}", i - 1);
            commit(&format!("c{i}"), &[parent.as_str()], &[])
        })
        .collect();
    let git = fake(commits);
    let log = git.log_all("main").unwrap();

    let options = InferenceOptions {
        strategy: InferenceStrategy::Forward,
        max_depth: 10,
    };
    match infer_from_log(&log, &git, &options) {
        Err(StackError::MaxDepthExceeded { limit }) => assert_eq!(limit, 10),
        other => panic!("expected depth ceiling, got {other:?}"),
    }
}
