use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::{Result, StackError};
use crate::stack::{find_by_name, Stack};
use dialoguer::{theme::ColorfulTheme, Select};

/// Check out the tip branch of a stack, prompting for one when no name is given.
///
/// With `by_branch`, the name is a branch of the current stack instead.
pub async fn run(name: Option<String>, by_branch: bool) -> Result<()> {
    let ctx = StackContext::load().await?;
    if by_branch {
        return switch_branch(&ctx, name);
    }

    let stack = match name {
        Some(name) => find_by_name(&ctx.inference.stacks, &name)?,
        None => select_stack(&ctx)?,
    };

    let branch = tip_branch(stack)?;
    ctx.repo.checkout_branch(branch)?;
    Output::success(format!("Switched to stack {} (branch {branch})", stack.name()));
    Ok(())
}

fn select_stack(ctx: &StackContext) -> Result<&Stack> {
    let stacks = &ctx.inference.stacks;
    if stacks.is_empty() {
        return Err(StackError::validation("no stacks to switch to"));
    }

    let names: Vec<&str> = stacks.iter().map(|s| s.name()).collect();
    let current = ctx
        .current_stack()
        .ok()
        .and_then(|current| names.iter().position(|n| *n == current.name()))
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Switch to stack")
        .items(&names)
        .default(current)
        .interact()
        .map_err(|e| StackError::validation(format!("Stack selection cancelled: {e}")))?;

    stacks
        .get(selection)
        .ok_or_else(|| StackError::validation("invalid stack selection"))
}

fn switch_branch(ctx: &StackContext, name: Option<String>) -> Result<()> {
    let stack = ctx.current_stack()?;
    let branch = match name {
        Some(name) => {
            if !stack.contains_branch(&name) {
                return Err(StackError::branch(format!(
                    "branch {name} is not part of stack {}",
                    stack.name()
                )));
            }
            name
        }
        None => select_branch(stack, &ctx.current_ref)?,
    };

    ctx.repo.checkout_branch(&branch)?;
    Output::success(format!("Switched to branch {branch}"));
    Ok(())
}

fn select_branch(stack: &Stack, current_ref: &str) -> Result<String> {
    let (branches, approximate) = stack.ordered_branches_or_approximate();
    if approximate {
        Output::warning(format!(
            "stack {} has no total order, branches are listed in approximate order",
            stack.name()
        ));
    }

    let labels = branch_labels(&branches, approximate);
    let current = branches.iter().position(|b| b == current_ref).unwrap_or(0);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Switch to branch")
        .items(&labels)
        .default(current)
        .interact()
        .map_err(|e| StackError::validation(format!("Branch selection cancelled: {e}")))?;

    branches
        .get(selection)
        .cloned()
        .ok_or_else(|| StackError::validation("invalid branch selection"))
}

/// Prompt labels, marking every entry when the order is only approximate
pub fn branch_labels(branches: &[String], approximate: bool) -> Vec<String> {
    branches
        .iter()
        .map(|b| {
            if approximate {
                format!("{b} (approximate order)")
            } else {
                b.clone()
            }
        })
        .collect()
}

/// The branch at the tip of the stack, preferring the canonical first label
pub fn tip_branch(stack: &Stack) -> Result<&str> {
    stack
        .tip()
        .commit
        .primary_branch()
        .ok_or_else(|| {
            StackError::branch(format!(
                "stack {} has no branch at its tip commit",
                stack.name()
            ))
        })
}
