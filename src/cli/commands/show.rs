use crate::bitbucket::PullRequest;
use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::stack::filter_unmerged;
use crate::utils::concurrent::{not_found_as_none, try_map};
use crate::utils::spinner::Spinner;
use console::style;

/// Show a stack's branches top to bottom, optionally with their pull requests
pub async fn run(stack_name: Option<String>, prs: bool) -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.resolve_stack(stack_name.as_deref())?;

    let (ordered, approximate) = stack.ordered_branches_or_approximate();
    let branches = filter_unmerged(&ordered, &ctx.merged);

    let pull_requests = if prs {
        let manager = ctx.pull_requests()?;
        let spinner = Spinner::new("Fetching pull requests...");
        let found = try_map(branches.iter(), |branch| {
            let manager = &manager;
            async move { not_found_as_none(manager.find_pull_request(branch).await) }
        })
        .await;
        spinner.stop();
        found?
    } else {
        vec![None; branches.len()]
    };

    Output::section(format!("Stack {}", stack.name()));
    if approximate {
        Output::warning("Branch order is approximate, see problems below");
    }
    for (branch, pr) in branches.iter().zip(&pull_requests) {
        println!(
            "{}",
            format_branch_line(branch, ctx.current_ref == *branch, pr.as_ref())
        );
    }

    for anomaly in stack.validation_errors() {
        Output::anomaly(anomaly);
    }
    if approximate {
        if let Err(anomaly) = stack.total_ordered_branches() {
            Output::anomaly(&anomaly);
        }
    }
    Ok(())
}

pub fn format_branch_line(branch: &str, is_current: bool, pr: Option<&PullRequest>) -> String {
    let marker = if is_current { "*" } else { " " };
    let name = if is_current {
        style(branch).green().to_string()
    } else {
        style(branch).cyan().to_string()
    };

    match pr.and_then(PullRequest::web_url) {
        Some(url) => format!("{marker} {name}  {}", style(url).dim()),
        None => format!("{marker} {name}"),
    }
}
