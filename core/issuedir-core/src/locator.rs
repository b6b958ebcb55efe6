//! Folder search for issue keys.
//!
//! Two backends sit behind `FolderSearch`: a portable `walkdir` walk and
//! macOS Spotlight via `mdfind`. Both receive the same `FolderQuery` and both
//! re-check the predicate against the folder name, so results never depend on
//! how loosely a backend interprets the query.

use crate::config::{Preferences, SearchBackend};
use crate::error::{IssuedirError, Result};
use crate::patterns::RE_FOLDER_ISSUE_ID;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into by the walk backend.
const SKIPPED_DIR_NAMES: &[&str] = &["node_modules"];

/// Predicate over folder names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderQuery {
    /// Folder name starts with the given issue key.
    NamePrefix(String),
    /// Folder name contains an issue-key-shaped token anywhere.
    ContainsIssueId,
}

impl FolderQuery {
    pub fn matches(&self, folder_name: &str) -> bool {
        match self {
            FolderQuery::NamePrefix(prefix) => folder_name.starts_with(prefix.as_str()),
            FolderQuery::ContainsIssueId => RE_FOLDER_ISSUE_ID.is_match(folder_name),
        }
    }
}

/// A folder found by the bulk scan, paired with one key from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueFolder {
    pub path: PathBuf,
    pub issue_id: String,
}

pub trait FolderSearch {
    /// Returns absolute folder paths under `root` matching `query`, in discovery order.
    fn search(&self, query: &FolderQuery, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Picks the backend named in preferences.
pub fn search_backend(prefs: &Preferences) -> Box<dyn FolderSearch> {
    match prefs.search_backend {
        SearchBackend::Walk => Box::new(WalkSearch),
        SearchBackend::Spotlight => Box::new(SpotlightSearch),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Walk backend
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy)]
pub struct WalkSearch;

impl FolderSearch for WalkSearch {
    fn search(&self, query: &FolderQuery, root: &Path) -> Result<Vec<PathBuf>> {
        let root = absolute(root)?;
        if !root.is_dir() {
            return Err(IssuedirError::FolderSearchFailed(format!(
                "search root is not a directory: {}",
                root.display()
            )));
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if query.matches(name) {
                    found.push(entry.into_path());
                }
            }
        }

        Ok(found)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || SKIPPED_DIR_NAMES.contains(&name))
        .unwrap_or(false)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|err| IssuedirError::FolderSearchFailed(err.to_string()))?;
    Ok(cwd.join(path))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Spotlight backend
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy)]
pub struct SpotlightSearch;

impl SpotlightSearch {
    /// Builds the `mdfind` query string for a predicate.
    pub fn query_string(query: &FolderQuery) -> String {
        let name_pattern = match query {
            FolderQuery::NamePrefix(prefix) => format!("{}*", escape_spotlight(prefix)),
            FolderQuery::ContainsIssueId => "*-*".to_string(),
        };
        format!(
            "kMDItemContentType == \"public.folder\" && kMDItemFSName == \"{}\"",
            name_pattern
        )
    }
}

impl FolderSearch for SpotlightSearch {
    fn search(&self, query: &FolderQuery, root: &Path) -> Result<Vec<PathBuf>> {
        let query_string = Self::query_string(query);
        tracing::debug!(query = %query_string, root = %root.display(), "Running mdfind");

        let output = Command::new("mdfind")
            .arg("-onlyin")
            .arg(root)
            .arg(&query_string)
            .output()
            .map_err(|err| IssuedirError::FolderSearchFailed(format!("mdfind: {err}")))?;

        if !output.status.success() {
            return Err(IssuedirError::FolderSearchFailed(format!(
                "mdfind exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| query.matches(name))
                    .unwrap_or(false)
            })
            .collect())
    }
}

/// Escapes a value for use inside a double-quoted Spotlight string.
/// Wildcards are escaped too so an id can only ever match literally.
pub fn escape_spotlight(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '\'' | '*' | '?') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

/// Finds folders whose name starts with `issue_id`.
pub fn find_issue_folders(
    search: &dyn FolderSearch,
    issue_id: &str,
    root: &Path,
) -> Result<Vec<PathBuf>> {
    let results = search.search(&FolderQuery::NamePrefix(issue_id.to_string()), root)?;
    tracing::debug!(issue_id, count = results.len(), "Folder search finished");
    Ok(results)
}

/// Finds every folder whose name carries an issue key, one pair per key.
pub fn find_all_issue_folders(search: &dyn FolderSearch, root: &Path) -> Result<Vec<IssueFolder>> {
    let paths = search.search(&FolderQuery::ContainsIssueId, root)?;

    let mut folders = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        for token in RE_FOLDER_ISSUE_ID.find_iter(name) {
            folders.push(IssueFolder {
                path: path.clone(),
                issue_id: token.as_str().to_string(),
            });
        }
    }
    Ok(folders)
}

/// Keeps the first folder seen for each issue key.
pub fn unique_by_issue(folders: Vec<IssueFolder>) -> Vec<IssueFolder> {
    let mut seen = HashSet::new();
    folders
        .into_iter()
        .filter(|folder| seen.insert(folder.issue_id.clone()))
        .collect()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
