use crate::cli::commands::context::{ensure_on_tip, StackContext};
use crate::cli::output::Output;
use crate::errors::{Result, StackError};
use crate::git::RebaseOptions;
use crate::stack::Stack;

/// Flags of the `rebase` command
#[derive(Debug, Clone, Default)]
pub struct RebaseArgs {
    pub new_base: Option<String>,
    pub interactive: bool,
    pub keep_base: bool,
    pub force: bool,
}

/// Rebase the current stack, moving every branch with it
pub async fn run(args: RebaseArgs) -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.current_stack()?;

    if !args.force {
        check_safe_to_rebase(stack, &ctx.current_ref)?;
    }

    let new_base = args.new_base.as_deref().unwrap_or(ctx.default_branch());
    ctx.repo.rebase(
        new_base,
        RebaseOptions {
            interactive: args.interactive,
            keep_base: args.keep_base,
            autosquash: false,
        },
    )?;

    if !args.interactive {
        Output::success(format!("Rebased stack {} onto {new_base}", stack.name()));
    }
    Ok(())
}

/// Rebasing elsewhere than the tip, or a stack sharing commits with another,
/// would detach branches from the stack they belong to.
pub fn check_safe_to_rebase(stack: &Stack, current_ref: &str) -> Result<()> {
    ensure_on_tip(stack, current_ref, "rebase").map_err(|e| {
        StackError::validation(format!("{e}; use --force to rebase anyway"))
    })?;

    let others = stack.diverges_from();
    if !others.is_empty() {
        return Err(StackError::validation(format!(
            "stack {} shares commits with {}; rebasing may lose the association between them, use --force to rebase anyway",
            stack.name(),
            others.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    Ok(())
}
