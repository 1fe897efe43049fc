use crate::errors::{Result, StackError};

/// Field separator used in the `git log` pretty format
pub const FIELD_SEPARATOR: &str = "-----";

/// Pretty format passed to `git log`, matched by [`Log::parse`]
pub const PRETTY_FORMAT: &str = "%h-----%p-----%D-----%an-----%ar-----%s";

const LOCAL_BRANCH_PREFIX: &str = "refs/heads/";
const HEAD_POINTER_PREFIX: &str = "HEAD -> ";

/// Commits reachable from local branches but not from the default branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    /// Commits in the order the log query emitted them
    pub commits: Vec<LogCommit>,
}

/// A single record of the commit log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCommit {
    pub hash: String,
    pub parent_hashes: Vec<String>,
    /// Bare names of the local branches pointing exactly at this commit
    pub local_branches: Vec<String>,
    pub author: String,
    pub date: String,
    pub subject: String,
}

impl Log {
    pub fn new(commits: Vec<LogCommit>) -> Self {
        Self { commits }
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Parse the output of
    /// `git log --pretty=format:<PRETTY_FORMAT> --decorate=full --branches ^<default>`.
    ///
    /// Blank lines are skipped. A line without exactly six fields is an error.
    pub fn parse(output: &str) -> Result<Self> {
        let mut commits = Vec::new();
        for line in output.lines() {
            if line.trim().is_empty() {
                continue;
            }
            commits.push(LogCommit::parse_line(line)?);
        }
        tracing::debug!("Parsed {} commits from git log", commits.len());
        Ok(Self { commits })
    }
}

impl LogCommit {
    fn parse_line(line: &str) -> Result<Self> {
        // The subject is last and may itself contain the separator.
        let parts: Vec<&str> = line.splitn(6, FIELD_SEPARATOR).collect();
        if parts.len() != 6 {
            return Err(StackError::parse(format!("unexpected git log line: {line}")));
        }

        let hash = parts[0].trim();
        if hash.is_empty() {
            return Err(StackError::parse(format!("missing commit hash: {line}")));
        }

        Ok(Self {
            hash: hash.to_string(),
            parent_hashes: parts[1].split_whitespace().map(str::to_string).collect(),
            local_branches: parse_decorations(parts[2]),
            author: parts[3].to_string(),
            date: parts[4].to_string(),
            subject: parts[5].to_string(),
        })
    }
}

/// Extract bare local branch names from a full ref decoration list such as
/// `HEAD -> refs/heads/feat, refs/remotes/origin/feat, tag: refs/tags/v1`.
///
/// Remote refs, tags and the bare `HEAD` pointer are dropped. Refs are
/// separated by `", "`; branch names may contain commas but never spaces.
pub fn parse_decorations(decorations: &str) -> Vec<String> {
    decorations
        .split(", ")
        .map(str::trim)
        .filter_map(|decoration| {
            let decoration = decoration
                .strip_prefix(HEAD_POINTER_PREFIX)
                .unwrap_or(decoration);
            decoration
                .strip_prefix(LOCAL_BRANCH_PREFIX)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
        .collect()
}
