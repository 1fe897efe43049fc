use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::{Result, StackError};

/// Start a new branch on top of the current stack with an empty first commit
pub async fn run(branch: String) -> Result<()> {
    let ctx = StackContext::load().await?;

    // A new stack may be started straight off the default branch.
    if ctx.current_ref != ctx.default_branch() {
        ctx.current_stack_at_tip("add another branch")?;
    }
    if ctx.repo.branch_exists(&branch) {
        return Err(StackError::branch(format!("branch {branch} already exists")));
    }

    ctx.repo.create_branch(&branch)?;
    ctx.repo.commit_empty(&start_message(&branch))?;
    Output::success(format!("Switched to a new branch '{branch}'"));
    Ok(())
}

pub fn start_message(branch: &str) -> String {
    format!("Start of {branch}")
}
