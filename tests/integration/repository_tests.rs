use super::test_helpers::*;
use git_stack::cli::commands::StackContext;
use git_stack::config::{save_repo_settings, Settings};
use git_stack::git::{BranchLookup, GitQueries, GitRepository, RebaseOptions};
use git_stack::stack::{InferenceStrategy, StackAnomaly};
use git_stack::StackError;

async fn context(repo_path: &std::path::Path) -> StackContext {
    let repo = GitRepository::open(repo_path).unwrap();
    StackContext::from_parts(repo, Settings::default()).await.unwrap()
}

#[tokio::test]
async fn test_stacked_branches_are_inferred() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    let ctx = context(&repo_path).await;

    assert_eq!(ctx.current_ref, "feat/pt2");
    assert_eq!(ctx.inference.stacks.len(), 1);
    assert!(ctx.inference.errors.is_empty());

    let stack = ctx.current_stack().unwrap();
    assert_eq!(stack.name(), "feat/pt2");
    assert_eq!(stack.total_ordered_branches().unwrap(), vec!["feat/pt2", "feat/pt1"]);
    assert_eq!(
        stack.push_targets("main").unwrap(),
        vec![
            ("feat/pt2".to_string(), "feat/pt1".to_string()),
            ("feat/pt1".to_string(), "main".to_string()),
        ]
    );
}

#[test]
fn test_log_excludes_default_branch_history() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    let repo = GitRepository::open(&repo_path).unwrap();

    let log = repo.log_all("main").unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.commits[0].local_branches, vec!["feat/pt2"]);
    assert_eq!(log.commits[0].subject, "Work on feat/pt2");
    assert_eq!(log.commits[1].local_branches, vec!["feat/pt1"]);
    assert_eq!(log.commits[0].parent_hashes, vec![log.commits[1].hash.clone()]);
}

#[test]
fn test_log_lists_children_before_parents_despite_clock_skew() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    git(&repo_path, &["checkout", "-b", "feat/old"]);
    for (file, date) in [("a.txt", "2030-01-01T00:00:00"), ("b.txt", "2001-01-01T00:00:00")] {
        std::fs::write(repo_path.join(file), file).unwrap();
        git(&repo_path, &["add", file]);
        let status = std::process::Command::new("git")
            .args(["commit", "-m", file])
            .env("GIT_COMMITTER_DATE", date)
            .env("GIT_AUTHOR_DATE", date)
            .current_dir(&repo_path)
            .status()
            .unwrap();
        assert!(status.success());
    }

    let repo = GitRepository::open(&repo_path).unwrap();
    let log = repo.log_all("main").unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.commits[0].subject, "b.txt");
    assert_eq!(log.commits[0].local_branches, vec!["feat/old"]);
    assert_eq!(log.commits[0].parent_hashes, vec![log.commits[1].hash.clone()]);
}

#[tokio::test]
async fn test_branching_stacks_diverge() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    branch_with_commit(&repo_path, "feat/base");
    branch_with_commit(&repo_path, "feat/left");
    git(&repo_path, &["checkout", "feat/base"]);
    branch_with_commit(&repo_path, "feat/right");

    for strategy in [InferenceStrategy::Forward, InferenceStrategy::TipScoring] {
        let repo = GitRepository::open(&repo_path).unwrap();
        let mut settings = Settings::default();
        settings.inference.strategy = strategy;
        let ctx = StackContext::from_parts(repo, settings).await.unwrap();

        let names: Vec<&str> = ctx.inference.stacks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["feat/left", "feat/right"]);
        assert!(ctx
            .inference
            .stacks
            .iter()
            .all(|s| s.validation_errors().iter().any(|e| matches!(e, StackAnomaly::Divergence { .. }))));

        assert_eq!(ctx.current_stack().unwrap().name(), "feat/right");
        assert_eq!(ctx.resolve_stack(Some("feat/left")).unwrap().name(), "feat/left");
        assert!(matches!(
            ctx.resolve_stack(Some("feat/missing")),
            Err(StackError::StackNotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_base_branch_is_ambiguous_position() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    branch_with_commit(&repo_path, "feat/base");
    branch_with_commit(&repo_path, "feat/left");
    git(&repo_path, &["checkout", "feat/base"]);
    branch_with_commit(&repo_path, "feat/right");
    git(&repo_path, &["checkout", "feat/base"]);

    let ctx = context(&repo_path).await;
    match ctx.current_stack() {
        Err(StackError::AmbiguousPosition { names }) => {
            assert_eq!(names, vec!["feat/left", "feat/right"]);
        }
        other => panic!("expected ambiguous position, got {other:?}"),
    }
}

#[tokio::test]
async fn test_merge_commit_is_reported() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    branch_with_commit(&repo_path, "feat/side");
    git(&repo_path, &["checkout", "main"]);
    branch_with_commit(&repo_path, "feat/merged");
    git(&repo_path, &["merge", "--no-ff", "-m", "Merge side", "feat/side"]);

    let ctx = context(&repo_path).await;
    let merge_hash = ctx.repo.short_commit_hash("feat/merged").unwrap();

    assert!(!ctx.inference.errors.is_empty());
    for error in &ctx.inference.errors {
        match error {
            StackAnomaly::MergeCommit {
                hash,
                containing_branches,
            } => {
                assert_eq!(hash, &merge_hash);
                assert_eq!(containing_branches, &vec!["feat/merged".to_string()]);
            }
            other => panic!("unexpected anomaly {other:?}"),
        }
    }
}

#[test]
fn test_branches_containing_commit() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    let pt1 = branch_with_commit(&repo_path, "feat/pt1");
    branch_with_commit(&repo_path, "feat/pt2");
    git(&repo_path, &["checkout", "main"]);

    let repo = GitRepository::open(&repo_path).unwrap();
    assert_eq!(
        repo.branches_containing_commit(&pt1).unwrap(),
        vec!["feat/pt1", "feat/pt2"]
    );
}

#[tokio::test]
async fn test_detached_head_uses_short_hash() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    let hash = git(&repo_path, &["rev-parse", "--short", "feat/pt1"]);
    git(&repo_path, &["checkout", "--detach", "feat/pt1"]);

    let ctx = context(&repo_path).await;
    assert_eq!(ctx.current_ref, hash);
    assert_eq!(ctx.current_stack().unwrap().name(), "feat/pt2");
}

#[tokio::test]
async fn test_detached_head_matches_log_in_large_repository() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    // Past 2^14 objects git abbreviates hashes to 8 characters.
    write_unreachable_blobs(&repo_path, 20_000);
    git(&repo_path, &["checkout", "--detach", "feat/pt1"]);

    let ctx = context(&repo_path).await;
    let log = ctx.repo.log_all("main").unwrap();
    let pt1 = log
        .commits
        .iter()
        .find(|c| c.local_branches == vec!["feat/pt1".to_string()])
        .unwrap();

    assert_eq!(pt1.hash.len(), 8);
    assert_eq!(ctx.current_ref, pt1.hash);
    assert_eq!(ctx.current_stack().unwrap().name(), "feat/pt2");
}

#[tokio::test]
async fn test_merged_branches_are_hidden() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    git(&repo_path, &["checkout", "main"]);
    git(&repo_path, &["merge", "--ff-only", "feat/pt1"]);

    let ctx = context(&repo_path).await;
    assert_eq!(ctx.merged, ctx.repo.merged_branches("main").unwrap());
    assert!(ctx.merged.contains("feat/pt1"));
    assert!(!ctx.merged.contains("feat/pt2"));
    assert!(!ctx.merged.contains("main"));

    let visible = ctx.visible_stacks();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name(), "feat/pt2");
}

#[tokio::test]
async fn test_saved_settings_drive_inference() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    git(&repo_path, &["branch", "-m", "main", "trunk"]);

    let mut settings = Settings::default();
    settings.git.default_branch = "trunk".to_string();
    save_repo_settings(&repo_path, &settings).unwrap();

    let repo = GitRepository::open(&repo_path).unwrap();
    let loaded = git_stack::config::load_repo_settings(repo.path()).unwrap();
    let ctx = StackContext::from_parts(repo, loaded).await.unwrap();

    assert_eq!(ctx.default_branch(), "trunk");
    assert_eq!(ctx.inference.stacks.len(), 1);
}

#[tokio::test]
async fn test_pull_requests_require_configuration() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    let ctx = context(&repo_path).await;

    let err = ctx.pull_requests().err().unwrap();
    assert!(matches!(err, StackError::Config(_)));
    assert!(err.to_string().contains("bitbucket.url"));
}

#[test]
fn test_rebase_moves_every_branch() {
    let (_temp_dir, repo_path) = create_stacked_repo();
    git(&repo_path, &["checkout", "main"]);
    commit_file(&repo_path, "upstream.txt", "Upstream change");
    git(&repo_path, &["checkout", "feat/pt2"]);

    let repo = GitRepository::open(&repo_path).unwrap();
    repo.rebase("main", RebaseOptions::default()).unwrap();

    let main = git(&repo_path, &["rev-parse", "main"]);
    let pt1_parent = git(&repo_path, &["rev-parse", "feat/pt1^"]);
    let pt2_parent = git(&repo_path, &["rev-parse", "feat/pt2^"]);
    let pt1 = git(&repo_path, &["rev-parse", "feat/pt1"]);
    assert_eq!(pt1_parent, main);
    assert_eq!(pt2_parent, pt1);
}
