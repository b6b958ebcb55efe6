//! Remote issue tracker abstraction.
//!
//! The reconciler only talks to `IssueTracker`; `LinearClient` is the
//! production implementation and tests use in-memory fakes.

mod linear;

pub use linear::{LinearClient, LinearCredential, LINEAR_GRAPHQL_URL};

use crate::error::{IssuedirError, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Auth failures get a "connect" remediation instead of a plain error.
    pub fn is_auth(&self) -> bool {
        match self {
            TrackerError::Unauthorized(_) => true,
            TrackerError::Api(message) => message_mentions_auth(message),
            _ => false,
        }
    }
}

pub(crate) fn message_mentions_auth(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("authentication required") || lower.contains("not authenticated")
}

impl From<TrackerError> for IssuedirError {
    fn from(err: TrackerError) -> Self {
        if err.is_auth() {
            IssuedirError::AuthRequired(err.to_string())
        } else {
            IssuedirError::RemoteCallFailed(err.to_string())
        }
    }
}

/// An issue as the tracker knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Tracker-internal id (used for attachment calls).
    pub id: String,
    /// Human key, e.g. `ENG-123`.
    pub identifier: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAttachment {
    pub issue_id: String,
    pub title: String,
    pub url: String,
}

/// Partial update for an attachment; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentChange {
    pub title: Option<String>,
    pub url: Option<String>,
}

pub trait IssueTracker {
    fn get_issue(&self, key: &str) -> std::result::Result<RemoteIssue, TrackerError>;

    fn list_attachments(&self, issue_id: &str) -> std::result::Result<Vec<Attachment>, TrackerError>;

    fn create_attachment(&self, attachment: &NewAttachment) -> std::result::Result<Attachment, TrackerError>;

    fn update_attachment(
        &self,
        attachment_id: &str,
        change: &AttachmentChange,
    ) -> std::result::Result<Attachment, TrackerError>;

    fn delete_attachment(&self, attachment_id: &str) -> std::result::Result<(), TrackerError>;

    /// Whether `update_attachment` can apply this change in place.
    /// When false the reconciler deletes and recreates the attachment.
    fn supports_in_place(&self, _change: &AttachmentChange) -> bool {
        true
    }
}

/// Hands out an authorized tracker client.
pub trait TrackerProvider {
    /// Fails with `IssuedirError::AuthRequired` when no usable credential exists.
    fn tracker(&self) -> Result<Box<dyn IssueTracker>>;

    fn is_authenticated(&self) -> bool {
        self.tracker().is_ok()
    }
}
