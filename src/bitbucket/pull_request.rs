use crate::bitbucket::client::BitbucketClient;
use crate::errors::{Result, StackError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DESCRIPTION_BEGIN: &str = "<!-- DO NOT EDIT: generated by git stack push (start)-->";
const DESCRIPTION_END: &str = "<!-- DO NOT EDIT: generated by git stack push (end) -->";

/// Pull request operations keyed by source branch
pub struct PullRequestManager {
    client: BitbucketClient,
}

impl PullRequestManager {
    pub fn new(client: BitbucketClient) -> Self {
        Self { client }
    }

    /// The open pull request whose source is `branch`.
    ///
    /// Fails with [`StackError::NotFound`] when there is none.
    pub async fn find_pull_request(&self, branch: &str) -> Result<PullRequest> {
        let at = format!("refs/heads/{branch}");
        let page: PullRequestPage = self
            .client
            .get(
                "pull-requests",
                &[("at", at.as_str()), ("direction", "OUTGOING"), ("state", "OPEN")],
            )
            .await?;

        debug!("{} open pull requests from {}", page.values.len(), branch);
        page.values
            .into_iter()
            .find(|pr| pr.source_branch() == branch)
            .ok_or_else(|| StackError::not_found(format!("no open pull request for {branch}")))
    }

    pub async fn create_pull_request(
        &self,
        source_branch: &str,
        target_branch: &str,
        title: &str,
    ) -> Result<PullRequest> {
        let request = CreatePullRequestRequest {
            title: title.to_string(),
            description: None,
            from_ref: self.branch_ref(source_branch),
            to_ref: self.branch_ref(target_branch),
        };

        let pr: PullRequest = self.client.post("pull-requests", &request).await?;
        info!("Created pull request #{} for {}", pr.id, source_branch);
        Ok(pr)
    }

    /// Retarget a pull request and replace its description
    pub async fn update_pull_request(
        &self,
        pr: &PullRequest,
        target_branch: &str,
        description: Option<String>,
    ) -> Result<PullRequest> {
        #[derive(Debug, Serialize)]
        struct UpdatePullRequestRequest {
            title: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<String>,
            #[serde(rename = "toRef")]
            to_ref: BranchRef,
            version: u64,
        }

        let request = UpdatePullRequestRequest {
            title: pr.title.clone(),
            description,
            to_ref: self.branch_ref(target_branch),
            version: pr.version,
        };

        debug!("Updating pull request #{} to target {}", pr.id, target_branch);
        self.client
            .put(&format!("pull-requests/{}", pr.id), &request)
            .await
    }

    fn branch_ref(&self, branch: &str) -> BranchRef {
        BranchRef {
            id: format!("refs/heads/{branch}"),
            repository: RefRepository {
                slug: self.client.repo_slug().to_string(),
                project: RefProject {
                    key: self.client.project_key().to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePullRequestRequest {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "fromRef")]
    from_ref: BranchRef,
    #[serde(rename = "toRef")]
    to_ref: BranchRef,
}

#[derive(Debug, Clone, Serialize)]
struct BranchRef {
    id: String,
    repository: RefRepository,
}

#[derive(Debug, Clone, Serialize)]
struct RefRepository {
    slug: String,
    project: RefProject,
}

#[derive(Debug, Clone, Serialize)]
struct RefProject {
    key: String,
}

/// Pull request data structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PullRequest {
    pub id: u64,
    #[serde(default)]
    pub version: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "fromRef")]
    pub from_ref: PullRequestRef,
    #[serde(rename = "toRef")]
    pub to_ref: PullRequestRef,
    #[serde(default)]
    pub links: Option<PullRequestLinks>,
}

/// Pull request reference (branch information)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PullRequestRef {
    pub id: String,
    #[serde(rename = "displayId")]
    pub display_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PullRequestLinks {
    #[serde(rename = "self", default)]
    pub self_link: Vec<SelfLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelfLink {
    pub href: String,
}

/// Paginated pull request results
#[derive(Debug, Deserialize)]
pub struct PullRequestPage {
    #[serde(default)]
    pub values: Vec<PullRequest>,
    #[serde(rename = "isLastPage", default)]
    pub is_last_page: bool,
}

impl PullRequest {
    pub fn source_branch(&self) -> &str {
        &self.from_ref.display_id
    }

    pub fn target_branch(&self) -> &str {
        &self.to_ref.display_id
    }

    pub fn web_url(&self) -> Option<String> {
        self.links
            .as_ref()
            .and_then(|links| links.self_link.first())
            .map(|link| link.href.clone())
    }

    /// Markdown link to the pull request, falling back to its number
    pub fn markdown_link(&self) -> String {
        match self.web_url() {
            Some(url) => format!("[{}]({url})", self.title),
            None => format!("{} (#{})", self.title, self.id),
        }
    }
}

/// Rewrite `current`'s description with a navigation section for the stack.
///
/// `prs` is ordered top to bottom. Text outside the generated markers is kept.
pub fn format_stack_description(current: &PullRequest, prs: &[PullRequest]) -> String {
    let stack_section = if prs.len() <= 1 {
        String::new()
    } else {
        let current_index = prs
            .iter()
            .position(|pr| pr.source_branch() == current.source_branch());

        let lines: Vec<String> = prs
            .iter()
            .enumerate()
            .map(|(i, pr)| {
                let prefix = match current_index {
                    Some(c) if i == c => "Current: ",
                    Some(c) if i + 1 == c => "Next: ",
                    Some(c) if i == c + 1 => "Prev: ",
                    _ => "",
                };
                format!("- {prefix}{}", pr.markdown_link())
            })
            .collect();

        format!("Pull request stack:\n{}", lines.join("\n"))
    };

    let section = format!("{DESCRIPTION_BEGIN}\n{stack_section}\n{DESCRIPTION_END}");
    let existing = current.description.as_deref().unwrap_or_default();

    if let Some(begin) = existing.find(DESCRIPTION_BEGIN) {
        if let Some(end_offset) = existing[begin..].find(DESCRIPTION_END) {
            let end = begin + end_offset + DESCRIPTION_END.len();
            return format!("{}{section}{}", &existing[..begin], &existing[end..]);
        }
    }

    let existing = existing.trim();
    if existing.is_empty() {
        section
    } else {
        format!("{existing}\n\n{section}")
    }
}
