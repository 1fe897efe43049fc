use crate::cli::commands::context::StackContext;
use crate::errors::{Result, StackError};
use crate::git::RebaseOptions;
use crate::stack::Stack;
use dialoguer::{theme::ColorfulTheme, Select};

/// Commit staged changes as a fixup of one branch in the current stack
pub async fn run(branch: Option<String>, stage_all: bool, rebase: bool) -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.current_stack()?;

    let branch = match branch {
        Some(branch) => branch,
        None => select_branch(stack)?,
    };
    ensure_in_stack(stack, &branch)?;

    let output = ctx.repo.commit_fixup(&branch, stage_all)?;
    println!("{}", output.trim_end());

    if rebase {
        let output = ctx.repo.rebase(
            ctx.default_branch(),
            RebaseOptions {
                interactive: false,
                keep_base: true,
                autosquash: true,
            },
        )?;
        println!("{}", output.trim_end());
    }
    Ok(())
}

fn select_branch(stack: &Stack) -> Result<String> {
    let (branches, _) = stack.ordered_branches_or_approximate();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose which branch to fixup")
        .items(&branches)
        .interact()
        .map_err(|e| StackError::validation(format!("Branch selection cancelled: {e}")))?;

    branches
        .get(selection)
        .cloned()
        .ok_or_else(|| StackError::validation("invalid branch selection"))
}

pub fn ensure_in_stack(stack: &Stack, branch: &str) -> Result<()> {
    if stack.contains_branch(branch) {
        Ok(())
    } else {
        Err(StackError::validation(format!(
            "branch {branch} is not part of stack {}",
            stack.name()
        )))
    }
}
