use crate::cli::commands::context::StackContext;
use crate::errors::Result;
use crate::git::RebaseOptions;

/// Edit the current stack with an interactive rebase that keeps its base
pub async fn run() -> Result<()> {
    let ctx = StackContext::load().await?;
    ctx.current_stack_at_tip("edit")?;

    ctx.repo.rebase(
        ctx.default_branch(),
        RebaseOptions {
            interactive: true,
            keep_base: true,
            autosquash: true,
        },
    )?;
    Ok(())
}
