use crate::bitbucket::{format_stack_description, PullRequest, PullRequestManager};
use crate::cli::commands::context::StackContext;
use crate::cli::output::Output;
use crate::errors::{Result, StackError};
use crate::utils::concurrent::{not_found_as_none, try_map};
use crate::utils::spinner::Spinner;
use std::collections::BTreeMap;
use tracing::info;

/// Push every branch of the current stack and sync its pull requests
pub async fn run() -> Result<()> {
    let ctx = StackContext::load().await?;
    let stack = ctx.current_stack()?;

    if !stack.is_valid() {
        Output::error(format!("Cannot push stack {}", stack.name()));
        for anomaly in stack.validation_errors() {
            Output::anomaly(anomaly);
        }
        return Err(StackError::validation(format!(
            "stack {} has unresolved problems",
            stack.name()
        )));
    }

    let targets = stack.push_targets(ctx.default_branch())?;
    let manager = ctx.pull_requests()?;

    let spinner = Spinner::new("Pushing stack...");
    let result = push_stack(&ctx, &manager, &targets).await;
    spinner.stop();

    for pr in result? {
        Output::success(format!(
            "Pushed {}: {}",
            pr.source_branch(),
            pr.web_url().unwrap_or_else(|| format!("#{}", pr.id))
        ));
    }
    Ok(())
}

/// Retarget, push, create, then describe, in that order.
///
/// `targets` pairs every branch with the branch below it, tip first.
pub async fn push_stack(
    ctx: &StackContext,
    manager: &PullRequestManager,
    targets: &[(String, String)],
) -> Result<Vec<PullRequest>> {
    let default_branch = ctx.default_branch();
    let want: BTreeMap<&str, &str> = targets
        .iter()
        .map(|(branch, target)| (branch.as_str(), target.as_str()))
        .collect();

    // Reordered branches could let the host auto-merge a PR into the wrong
    // base, so any PR with a stale target is parked on the default branch first.
    let existing = try_map(targets, |(branch, target)| async move {
        let Some(pr) = not_found_as_none(manager.find_pull_request(branch).await)? else {
            return Ok(None);
        };
        if pr.target_branch() != target.as_str() {
            return manager
                .update_pull_request(&pr, default_branch, pr.description.clone())
                .await
                .map(Some);
        }
        Ok(Some(pr))
    })
    .await?;
    let existing: BTreeMap<String, PullRequest> = existing
        .into_iter()
        .flatten()
        .map(|pr| (pr.source_branch().to_string(), pr))
        .collect();

    for (branch, _) in targets {
        ctx.repo.push_branch(&ctx.settings.git.remote, branch)?;
    }
    info!("Pushed {} branches", targets.len());

    let prs = try_map(targets, |(branch, target)| {
        let found = existing.get(branch).cloned();
        async move {
            match found {
                Some(pr) => Ok(pr),
                None => manager.create_pull_request(branch, target, branch).await,
            }
        }
    })
    .await?;

    try_map(&prs, |pr| {
        let description = format_stack_description(pr, &prs);
        let target = want.get(pr.source_branch()).copied().unwrap_or(default_branch);
        async move { manager.update_pull_request(pr, target, Some(description)).await }
    })
    .await
}
