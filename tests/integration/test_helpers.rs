#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Run a git command in `repo_path`, panicking with stderr on failure
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Git command should start");

    if !output.status.success() {
        panic!(
            "Git command failed: git {}\nStderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create test git repository with a single commit on `main`
pub fn create_test_git_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    let git_commands = [
        vec!["init"],
        vec!["config", "user.name", "Test User"],
        vec!["config", "user.email", "test@example.com"],
        vec!["config", "core.autocrlf", "false"],
        vec!["config", "commit.gpgsign", "false"],
    ];
    for cmd_args in &git_commands {
        git(&repo_path, cmd_args);
    }

    std::fs::write(repo_path.join("README.md"), "# Test Repository").unwrap();
    git(&repo_path, &["add", "."]);
    git(&repo_path, &["commit", "-m", "Initial commit"]);
    git(&repo_path, &["branch", "-M", "main"]);

    (temp_dir, repo_path)
}

/// Commit a new file on the checked out branch and return its short hash
pub fn commit_file(repo_path: &Path, filename: &str, message: &str) -> String {
    std::fs::write(repo_path.join(filename), format!("Content for {filename}\n")).unwrap();
    git(repo_path, &["add", filename]);
    git(repo_path, &["commit", "-m", message]);
    git(repo_path, &["rev-parse", "--short", "HEAD"])
}

/// Create `branch` at the current HEAD, check it out and add one commit
pub fn branch_with_commit(repo_path: &Path, branch: &str) -> String {
    git(repo_path, &["checkout", "-b", branch]);
    let filename = format!("{}.txt", branch.replace('/', "_"));
    commit_file(repo_path, &filename, &format!("Work on {branch}"))
}

/// Repository with `feat/pt1` then `feat/pt2` stacked on `main`, pt2 checked out
pub fn create_stacked_repo() -> (TempDir, PathBuf) {
    let (temp_dir, repo_path) = create_test_git_repo();
    branch_with_commit(&repo_path, "feat/pt1");
    branch_with_commit(&repo_path, "feat/pt2");
    (temp_dir, repo_path)
}

/// Attach a bare repository as `origin`
pub fn add_bare_remote(repo_path: &Path) -> TempDir {
    let remote_dir = TempDir::new().unwrap();
    git(remote_dir.path(), &["init", "--bare"]);
    let remote_path = remote_dir.path().to_string_lossy().to_string();
    git(repo_path, &["remote", "add", "origin", &remote_path]);
    remote_dir
}

/// Store `count` distinct blobs that no commit references, to grow the object count
pub fn write_unreachable_blobs(repo_path: &Path, count: usize) {
    let mut stream = String::new();
    for i in 0..count {
        let content = format!("blob number {i}\n");
        stream.push_str(&format!("blob\ndata {}\n{content}\n", content.len()));
    }

    let mut child = Command::new("git")
        .args(["fast-import", "--quiet"])
        .current_dir(repo_path)
        .stdin(Stdio::piped())
        .spawn()
        .expect("git fast-import should start");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stream.as_bytes())
        .unwrap();
    assert!(child.wait().unwrap().success(), "git fast-import failed");
}

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_git-stack"))
}

/// Run the CLI inside `repo_path` without colors
pub fn run_cli(repo_path: &Path, args: &[&str]) -> Output {
    run_cli_with_env(repo_path, args, &[])
}

/// Run the CLI with extra environment variables, such as a non-interactive editor
pub fn run_cli_with_env(repo_path: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new(get_binary_path())
        .arg("--no-color")
        .args(args)
        .current_dir(repo_path)
        .env("NO_COLOR", "1")
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .output()
        .expect("CLI should start")
}

pub fn assert_cli_success(output: &Output, operation: &str) {
    if !output.status.success() {
        panic!(
            "{operation} failed with exit code {:?}\nStdout: {}\nStderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

pub fn assert_output_contains(output: &Output, expected_content: &str, context: &str) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(expected_content) || stdout.contains(expected_content),
        "{context}: Expected to find '{expected_content}' in output.\nStderr: {stderr}\nStdout: {stdout}"
    );
}
