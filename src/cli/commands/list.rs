use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::stack::Stack;
use console::style;

/// List every stack that still has unmerged branches
pub async fn run() -> Result<()> {
    let ctx = StackContext::load().await?;
    let stacks = ctx.visible_stacks();

    if stacks.is_empty() {
        Output::info(format!(
            "No stacks found. Create a branch off {} to start one.",
            ctx.default_branch()
        ));
    }

    let current = ctx.current_stack().ok().map(|s| s.name().to_string());
    for stack in &stacks {
        let is_current = current.as_deref() == Some(stack.name());
        println!("{}", format_stack_line(stack, is_current));
    }

    Output::problems(&ctx.inference.anomalies_for(&stacks));
    Ok(())
}

/// One line per stack: current marker, name and branch count
pub fn format_stack_line(stack: &Stack, is_current: bool) -> String {
    let count = stack.all_branches().len();
    let noun = if count == 1 { "branch" } else { "branches" };
    let marker = if is_current {
        style("*").green().bold().to_string()
    } else {
        " ".to_string()
    };
    let name = if is_current {
        style(stack.name()).green().to_string()
    } else {
        stack.name().to_string()
    };

    format!("{marker} {name} ({count} {noun})")
}
