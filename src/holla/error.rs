use thiserror::Error;

const LOGIN_HINT: &str = "Run \"holla slack auth login\" to authenticate.";

#[derive(Error, Debug)]
pub enum HollaError {
    #[error("No workspaces configured. {}", LOGIN_HINT)]
    NoWorkspaces,

    #[error("Workspace \"{name}\" not found. Available: {}", .available.join(", "))]
    WorkspaceNotFound { name: String, available: Vec<String> },

    #[error("Multiple workspaces found. Use --workspace to specify: {}", .available.join(", "))]
    AmbiguousWorkspace { available: Vec<String> },

    #[error("No token found for workspace \"{workspace}\". {}", LOGIN_HINT)]
    MissingToken { workspace: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Channel not found: {input}{}", suggestion_suffix(.suggestion))]
    ChannelNotFound {
        input: String,
        suggestion: Option<String>,
    },

    #[error("User not found: {input}{}", suggestion_suffix(.suggestion))]
    UserNotFound {
        input: String,
        suggestion: Option<String>,
    },

    #[error("User group not found: {input}{}", suggestion_suffix(.suggestion))]
    GroupNotFound {
        input: String,
        suggestion: Option<String>,
    },

    #[error("Slack API error ({method}): {error}")]
    Api {
        method: String,
        error: String,
        needed: Option<String>,
        provided: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad classes of failure, used by the CLI to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user must act: log in, pick a workspace, fix arguments.
    Configuration,
    /// A name could not be resolved; the message may carry suggestions.
    NotFound,
    /// Slack or the network failed.
    Upstream,
    /// Local filesystem or encoding failure.
    Local,
}

impl HollaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HollaError::NoWorkspaces
            | HollaError::WorkspaceNotFound { .. }
            | HollaError::AmbiguousWorkspace { .. }
            | HollaError::MissingToken { .. }
            | HollaError::InvalidInput(_) => ErrorKind::Configuration,
            HollaError::ChannelNotFound { .. }
            | HollaError::UserNotFound { .. }
            | HollaError::GroupNotFound { .. } => ErrorKind::NotFound,
            HollaError::Api { .. } | HollaError::Http(_) => ErrorKind::Upstream,
            HollaError::Io(_) | HollaError::Serialization(_) => ErrorKind::Local,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        HollaError::InvalidInput(message.into())
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean: {}?", s),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, HollaError>;
