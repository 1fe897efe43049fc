use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::stack::StackCommit;
use console::style;

/// Print the commits of a stack, tip first
pub async fn run(stack_name: Option<String>) -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.resolve_stack(stack_name.as_deref())?;

    Output::section(format!("Stack {}", stack.name()));
    for commit in stack.commits() {
        println!("{}", format_commit_line(commit));
    }

    for anomaly in stack.validation_errors() {
        Output::anomaly(anomaly);
    }
    Ok(())
}

/// Hash, branch column, subject, then author and relative date
pub fn format_commit_line(commit: &StackCommit) -> String {
    let branches = if commit.branches().is_empty() {
        String::new()
    } else {
        format!(" ({})", style(commit.branches().join(", ")).cyan())
    };

    format!(
        "{}{} {} {}",
        style(commit.hash()).yellow(),
        branches,
        commit.commit.subject,
        style(format!("<{}, {}>", commit.commit.author, commit.commit.date)).dim()
    )
}
