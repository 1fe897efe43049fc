/// git-stack Error Types
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Branch management errors
    #[error("Branch error: {0}")]
    Branch(String),

    /// Commit log could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The same commit appeared twice in one log
    #[error("duplicate commit in log, hash: {hash}")]
    DuplicateCommit { hash: String },

    /// History is deeper than the inference walk is allowed to go
    #[error("failed to infer stacks, exceeded max depth of {limit} commits")]
    MaxDepthExceeded { limit: usize },

    /// The current position is not inside any stack
    #[error("not in a stack")]
    NotInStack,

    /// The current position is inside several stacks at once
    #[error("currently within multiple stacks: {}", names.join(", "))]
    AmbiguousPosition { names: Vec<String> },

    /// No stack with the requested name
    #[error("no stack named: {0}")]
    StackNotFound(String),

    /// Hosting provider has no such resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Hosting provider errors
    #[error("Host error: {0}")]
    Host(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A blocking git task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StackError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StackError::Config(msg.into())
    }

    pub fn branch<S: Into<String>>(msg: S) -> Self {
        StackError::Branch(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        StackError::Parse(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        StackError::Validation(msg.into())
    }

    pub fn host<S: Into<String>>(msg: S) -> Self {
        StackError::Host(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        StackError::NotFound(msg.into())
    }

    pub fn bitbucket_api(status: u16, message: String) -> Self {
        StackError::Host(format!("Bitbucket API error: {status} - {message}"))
    }

    /// Whether this is the "does not exist" sentinel from a hosting provider
    pub fn is_not_found(&self) -> bool {
        matches!(self, StackError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
