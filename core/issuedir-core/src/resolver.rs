//! Hand-off from the one-shot `open` command to interactive resolution.

use crate::config::Preferences;
use crate::creator::build_folder_name;
use crate::error::IssuedirError;
use crate::parser::IssueRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the resolver needs to pick up where `open` left off.
///
/// `found_paths` is `None` when no search has run yet (e.g. a typed id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveContext {
    pub issue_id: String,
    pub issue_title: String,
    pub found_paths: Option<Vec<PathBuf>>,
}

impl ResolveContext {
    pub fn new(issue_id: impl Into<String>, issue_title: impl Into<String>) -> Self {
        Self {
            issue_id: issue_id.into(),
            issue_title: issue_title.into(),
            found_paths: None,
        }
    }

    pub fn from_search(issue: &IssueRef, found_paths: Vec<PathBuf>) -> Self {
        Self {
            issue_id: issue.id().to_string(),
            issue_title: issue.title().to_string(),
            found_paths: Some(found_paths),
        }
    }

    /// The error a non-interactive caller reports instead of resolving.
    pub fn into_error(self) -> IssuedirError {
        match self.found_paths {
            Some(paths) if paths.len() > 1 => IssuedirError::AmbiguousFolderMatch {
                issue_id: self.issue_id,
                count: paths.len(),
            },
            _ => IssuedirError::NoFolderMatch(self.issue_id),
        }
    }
}

/// What the resolver shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolveView {
    /// One or more existing folders; the user picks.
    Matches {
        issue_id: String,
        paths: Vec<PathBuf>,
    },
    /// Nothing on disk yet; offer to create one.
    Missing {
        issue_id: String,
        display_title: String,
        suggested_name: String,
        /// No title is known, so a custom name is the primary action.
        manual: bool,
    },
}

impl ResolveView {
    pub fn build(ctx: &ResolveContext, paths: Vec<PathBuf>, prefs: &Preferences) -> Self {
        if !paths.is_empty() {
            return ResolveView::Matches {
                issue_id: ctx.issue_id.clone(),
                paths,
            };
        }

        let title = ctx.issue_title.trim();
        ResolveView::Missing {
            issue_id: ctx.issue_id.clone(),
            display_title: if title.is_empty() {
                ctx.issue_id.clone()
            } else {
                format!("{}: {}", ctx.issue_id, title)
            },
            suggested_name: build_folder_name(
                &ctx.issue_id,
                title,
                prefs.folder_separator,
                prefs.allow_emojis,
            ),
            manual: title.is_empty(),
        }
    }

    pub fn issue_id(&self) -> &str {
        match self {
            ResolveView::Matches { issue_id, .. } | ResolveView::Missing { issue_id, .. } => issue_id,
        }
    }
}
