//! User-facing notifications.
//!
//! Commands never surface raw errors; they end in a `Toast` that a front end
//! renders however it likes.

use crate::error::IssuedirError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastStyle {
    Success,
    Failure,
    /// Work in progress.
    Animated,
}

/// Remediation offered alongside a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastAction {
    ConnectTracker,
    OpenPreferences,
}

impl ToastAction {
    pub fn label(self) -> &'static str {
        match self {
            ToastAction::ConnectTracker => "Connect to Linear",
            ToastAction::OpenPreferences => "Open Preferences",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub style: ToastStyle,
    pub title: String,
    pub message: Option<String>,
    pub action: Option<ToastAction>,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            style: ToastStyle::Success,
            title: title.into(),
            message,
            action: None,
        }
    }

    pub fn failure(title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            style: ToastStyle::Failure,
            title: title.into(),
            message,
            action: None,
        }
    }

    pub fn progress(title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            style: ToastStyle::Animated,
            title: title.into(),
            message,
            action: None,
        }
    }

    pub fn with_action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.style == ToastStyle::Failure
    }

    pub fn from_error(err: &IssuedirError) -> Self {
        match err {
            IssuedirError::NoWindowFound => Toast::failure(
                "Linear not found",
                Some("Bring a Linear issue window to the front".to_string()),
            ),
            IssuedirError::NoIssueIdInTitle { title } => {
                Toast::failure("No Issue ID found", Some(format!("Window title: {}", title)))
            }
            IssuedirError::FolderSearchFailed(details) => {
                Toast::failure("Folder search failed", Some(details.clone()))
            }
            IssuedirError::NoFolderMatch(issue_id) => {
                Toast::failure("No folder found", Some(issue_id.clone()))
            }
            IssuedirError::AmbiguousFolderMatch { issue_id, count } => Toast::failure(
                "Multiple folders found",
                Some(format!("{} folders match {}", count, issue_id)),
            ),
            IssuedirError::NewFolderLocationNotConfigured => Toast::failure(
                "Configuration Required",
                Some("Set new_folder_location to create folders".to_string()),
            )
            .with_action(ToastAction::OpenPreferences),
            IssuedirError::FolderAlreadyExists(path) => Toast::failure(
                "Folder already exists",
                Some(path.display().to_string()),
            ),
            IssuedirError::InvalidFolderName(name) => {
                Toast::failure("Invalid folder name", Some(format!("{:?}", name)))
            }
            IssuedirError::AuthRequired(details) => {
                Toast::failure("Authentication Required", Some(details.clone()))
                    .with_action(ToastAction::ConnectTracker)
            }
            IssuedirError::ConfigMalformed { .. } => {
                Toast::failure("Configuration Error", Some(err.to_string()))
                    .with_action(ToastAction::OpenPreferences)
            }
            IssuedirError::RemoteCallFailed(_)
            | IssuedirError::Io { .. }
            | IssuedirError::Json { .. }
            | IssuedirError::CommandFailed { .. } => {
                Toast::failure("Something went wrong", Some(err.to_string()))
            }
        }
    }
}

pub trait Notifier {
    fn notify(&self, toast: &Toast);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_auth_errors_offer_connect() {
        let toast = Toast::from_error(&IssuedirError::AuthRequired("no token".into()));
        assert_eq!(toast.title, "Authentication Required");
        assert_eq!(toast.action, Some(ToastAction::ConnectTracker));
        assert!(toast.is_failure());
    }

    #[test]
    fn test_missing_location_offers_preferences() {
        let toast = Toast::from_error(&IssuedirError::NewFolderLocationNotConfigured);
        assert_eq!(toast.title, "Configuration Required");
        assert_eq!(toast.action, Some(ToastAction::OpenPreferences));
    }

    #[test]
    fn test_focus_errors_have_distinct_titles() {
        assert_eq!(
            Toast::from_error(&IssuedirError::NoWindowFound).title,
            "Linear not found"
        );
        assert_eq!(
            Toast::from_error(&IssuedirError::NoIssueIdInTitle {
                title: "Inbox".into()
            })
            .title,
            "No Issue ID found"
        );
    }

    #[test]
    fn test_other_errors_are_generic() {
        let toast = Toast::from_error(&IssuedirError::FolderAlreadyExists(PathBuf::from("/x/ENG-1")));
        assert_eq!(toast.message.as_deref(), Some("/x/ENG-1"));
        assert_eq!(toast.action, None);

        let toast = Toast::from_error(&IssuedirError::RemoteCallFailed("500".into()));
        assert_eq!(toast.title, "Something went wrong");
    }
}
