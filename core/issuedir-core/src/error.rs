//! Error types for issuedir-core operations.
//! Every variant maps to a user-facing notification in `notify::Toast::from_error`.

use std::path::PathBuf;

/// All errors that can occur in issuedir-core operations.
#[derive(Debug, thiserror::Error)]
pub enum IssuedirError {
    // ─────────────────────────────────────────────────────────────────────
    // Focus / Parsing Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No window found for the issue tracker")]
    NoWindowFound,

    #[error("No issue ID found in window title: {title:?}")]
    NoIssueIdInTitle { title: String },

    // ─────────────────────────────────────────────────────────────────────
    // Folder Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to search file system: {0}")]
    FolderSearchFailed(String),

    #[error("No folder found for {0}")]
    NoFolderMatch(String),

    #[error("Found {count} folders for {issue_id}")]
    AmbiguousFolderMatch { issue_id: String, count: usize },

    #[error("New folder location is not configured")]
    NewFolderLocationNotConfigured,

    #[error("Folder already exists: {0}")]
    FolderAlreadyExists(PathBuf),

    #[error("Invalid folder name: {0:?}")]
    InvalidFolderName(String),

    // ─────────────────────────────────────────────────────────────────────
    // Remote Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    // ─────────────────────────────────────────────────────────────────────
    // Configuration / I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Command execution failed: {command}: {details}")]
    CommandFailed { command: String, details: String },
}

impl IssuedirError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        IssuedirError::Io {
            context: context.into(),
            source,
        }
    }

    /// True when the caller should offer a "connect" remediation.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, IssuedirError::AuthRequired(_))
    }
}

/// Convenience type alias for Results using IssuedirError.
pub type Result<T> = std::result::Result<T, IssuedirError>;

impl From<IssuedirError> for String {
    fn from(err: IssuedirError) -> String {
        err.to_string()
    }
}
