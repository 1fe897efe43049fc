//! Bitbucket Server integration module
//!
//! Thin hosting-provider client used by `show --prs` and `push`:
//! - API client with token authentication
//! - Pull request lookup, creation and retargeting by branch
//! - Generated stack navigation in pull request descriptions

pub mod client;
pub mod pull_request;

pub use client::BitbucketClient;
pub use pull_request::{
    format_stack_description, PullRequest, PullRequestManager, PullRequestPage, PullRequestRef,
};
