//! Backlink reconciliation.
//!
//! Keeps exactly one attachment on the remote issue pointing back at the local
//! folder. Repeated runs converge instead of piling up duplicates:
//!
//! ```text
//! title matches, url matches   → skipped
//! title matches, url differs   → fix url    → updated
//! url matches, title differs   → fix title  → updated
//! nothing matches              → create     → created
//! ```
//!
//! A fix is an in-place update when the tracker supports that change and a
//! delete + create otherwise. Either way it is the only mutation of the call.

use crate::config::Preferences;
use crate::tracker::{
    Attachment, AttachmentChange, IssueTracker, NewAttachment, RemoteIssue, TrackerError,
    TrackerProvider,
};
use serde::Serialize;

pub const ISSUE_ID_PLACEHOLDER: &str = "{issueId}";

/// The attachment every issue should carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklinkTarget {
    pub title: String,
    pub url: String,
}

impl BacklinkTarget {
    /// `None` when no url template is configured (backlinking is off).
    pub fn from_preferences(prefs: &Preferences, issue_id: &str) -> Option<Self> {
        let scheme = prefs.backlink_url_scheme()?;
        Some(Self {
            title: prefs.backlink_title().to_string(),
            url: scheme.replace(ISSUE_ID_PLACEHOLDER, issue_id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BacklinkStatus {
    Created,
    Updated,
    Skipped,
    Disabled,
    Error,
}

/// Which field an update corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatedField {
    Url,
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BacklinkOutcome {
    Created {
        url: String,
    },
    Updated {
        url: String,
        field: UpdatedField,
        replaced: bool,
    },
    Skipped {
        url: String,
    },
    Disabled,
    #[serde(rename = "error")]
    Failed {
        message: String,
        auth_required: bool,
    },
}

impl BacklinkOutcome {
    pub fn status(&self) -> BacklinkStatus {
        match self {
            BacklinkOutcome::Created { .. } => BacklinkStatus::Created,
            BacklinkOutcome::Updated { .. } => BacklinkStatus::Updated,
            BacklinkOutcome::Skipped { .. } => BacklinkStatus::Skipped,
            BacklinkOutcome::Disabled => BacklinkStatus::Disabled,
            BacklinkOutcome::Failed { .. } => BacklinkStatus::Error,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            BacklinkOutcome::Created { url }
            | BacklinkOutcome::Updated { url, .. }
            | BacklinkOutcome::Skipped { url } => Some(url),
            BacklinkOutcome::Disabled | BacklinkOutcome::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BacklinkOutcome::Created { .. } => "Created new backlink".to_string(),
            BacklinkOutcome::Updated {
                field: UpdatedField::Url,
                ..
            } => "Updated link URL".to_string(),
            BacklinkOutcome::Updated {
                field: UpdatedField::Title,
                ..
            } => "Updated link Title".to_string(),
            BacklinkOutcome::Skipped { .. } => "Link matches configuration".to_string(),
            BacklinkOutcome::Disabled => "Disabled in preferences".to_string(),
            BacklinkOutcome::Failed { message, .. } => message.clone(),
        }
    }

    /// One-line summary for notifications.
    pub fn describe(&self) -> String {
        match self {
            BacklinkOutcome::Created { .. } => "Backlink created".to_string(),
            BacklinkOutcome::Updated { .. } => "Backlink updated".to_string(),
            BacklinkOutcome::Skipped { .. } => "Backlink already up to date".to_string(),
            BacklinkOutcome::Disabled => "Backlinking disabled".to_string(),
            BacklinkOutcome::Failed { message, .. } => format!("Backlink failed: {}", message),
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(
            self,
            BacklinkOutcome::Failed {
                auth_required: true,
                ..
            }
        )
    }

    fn failed(err: &TrackerError) -> Self {
        BacklinkOutcome::Failed {
            message: err.to_string(),
            auth_required: err.is_auth(),
        }
    }
}

/// Ensures the configured backlink exists on `issue_id`. Never fails; remote
/// problems come back as `BacklinkOutcome::Failed`.
pub fn ensure_backlink(
    prefs: &Preferences,
    provider: &dyn TrackerProvider,
    issue_id: &str,
) -> BacklinkOutcome {
    let Some(target) = BacklinkTarget::from_preferences(prefs, issue_id) else {
        tracing::debug!(issue_id, "Backlinking disabled (no url scheme)");
        return BacklinkOutcome::Disabled;
    };

    let tracker = match provider.tracker() {
        Ok(tracker) => tracker,
        Err(err) => {
            return BacklinkOutcome::Failed {
                message: err.to_string(),
                auth_required: err.is_auth_required(),
            }
        }
    };

    let outcome = ensure_backlink_with(tracker.as_ref(), issue_id, &target);
    tracing::info!(issue_id, status = ?outcome.status(), "Backlink reconciled");
    outcome
}

/// Fetches the issue and its attachments, then reconciles.
pub fn ensure_backlink_with(
    tracker: &dyn IssueTracker,
    issue_id: &str,
    target: &BacklinkTarget,
) -> BacklinkOutcome {
    let issue = match tracker.get_issue(issue_id) {
        Ok(issue) => issue,
        Err(err) => return BacklinkOutcome::failed(&err),
    };
    let attachments = match tracker.list_attachments(&issue.id) {
        Ok(attachments) => attachments,
        Err(err) => return BacklinkOutcome::failed(&err),
    };

    match reconcile(tracker, &issue, &attachments, target) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(issue_id, error = %err, "Backlink reconciliation failed");
            BacklinkOutcome::failed(&err)
        }
    }
}

/// Applies at most one change so `attachments` ends up holding `target`.
pub fn reconcile(
    tracker: &dyn IssueTracker,
    issue: &RemoteIssue,
    attachments: &[Attachment],
    target: &BacklinkTarget,
) -> Result<BacklinkOutcome, TrackerError> {
    if attachments
        .iter()
        .any(|a| a.title == target.title && a.url == target.url)
    {
        return Ok(BacklinkOutcome::Skipped {
            url: target.url.clone(),
        });
    }

    if let Some(existing) = attachments.iter().find(|a| a.title == target.title) {
        let change = AttachmentChange {
            title: None,
            url: Some(target.url.clone()),
        };
        let replaced = apply_change(tracker, issue, existing, &change, target)?;
        return Ok(BacklinkOutcome::Updated {
            url: target.url.clone(),
            field: UpdatedField::Url,
            replaced,
        });
    }

    if let Some(existing) = attachments.iter().find(|a| a.url == target.url) {
        let change = AttachmentChange {
            title: Some(target.title.clone()),
            url: None,
        };
        let replaced = apply_change(tracker, issue, existing, &change, target)?;
        return Ok(BacklinkOutcome::Updated {
            url: target.url.clone(),
            field: UpdatedField::Title,
            replaced,
        });
    }

    tracker.create_attachment(&NewAttachment {
        issue_id: issue.id.clone(),
        title: target.title.clone(),
        url: target.url.clone(),
    })?;
    Ok(BacklinkOutcome::Created {
        url: target.url.clone(),
    })
}

/// Returns true when the attachment had to be replaced rather than updated.
fn apply_change(
    tracker: &dyn IssueTracker,
    issue: &RemoteIssue,
    existing: &Attachment,
    change: &AttachmentChange,
    target: &BacklinkTarget,
) -> Result<bool, TrackerError> {
    if tracker.supports_in_place(change) {
        tracker.update_attachment(&existing.id, change)?;
        return Ok(false);
    }

    // Delete before create; url-upserting trackers would merge the new one into `existing`.
    tracker.delete_attachment(&existing.id)?;
    tracker.create_attachment(&NewAttachment {
        issue_id: issue.id.clone(),
        title: target.title.clone(),
        url: target.url.clone(),
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_substitutes_every_placeholder() {
        let prefs = Preferences {
            backlink_url_scheme: Some("app://open/{issueId}?ref={issueId}".to_string()),
            ..Preferences::default()
        };
        let target = BacklinkTarget::from_preferences(&prefs, "ENG-1").unwrap();
        assert_eq!(target.url, "app://open/ENG-1?ref=ENG-1");
        assert_eq!(target.title, "Local Folder");
    }

    #[test]
    fn test_target_is_none_without_scheme() {
        assert!(BacklinkTarget::from_preferences(&Preferences::default(), "ENG-1").is_none());
    }

    #[test]
    fn test_describes_each_outcome() {
        let url = "app://x".to_string();
        assert_eq!(
            BacklinkOutcome::Created { url: url.clone() }.describe(),
            "Backlink created"
        );
        assert_eq!(
            BacklinkOutcome::Skipped { url }.describe(),
            "Backlink already up to date"
        );
        assert_eq!(BacklinkOutcome::Disabled.describe(), "Backlinking disabled");
        assert_eq!(
            BacklinkOutcome::Failed {
                message: "boom".into(),
                auth_required: false
            }
            .describe(),
            "Backlink failed: boom"
        );
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(BacklinkOutcome::Failed {
            message: "nope".into(),
            auth_required: true,
        })
        .unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["auth_required"], true);
    }
}
