use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::git::RebaseOptions;

/// Update the default branch from its upstream and rebase the stack onto it
pub async fn run() -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.current_stack_at_tip("pull")?;
    let default_branch = ctx.default_branch();

    Output::info(format!(
        "Pulling from {default_branch} into the current stack {}",
        stack.name()
    ));
    let (remote, remote_branch) = ctx.repo.upstream(default_branch)?;
    ctx.repo.fetch_into(&remote, &remote_branch, default_branch)?;
    ctx.repo.rebase(default_branch, RebaseOptions::default())?;

    Output::success(format!("Rebased stack {} onto {default_branch}", stack.name()));
    Ok(())
}
