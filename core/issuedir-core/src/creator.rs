//! Naming and creating issue folders.

use crate::config::{Preferences, Separator};
use crate::error::{IssuedirError, Result};
use crate::locator::expand_home;
use crate::text::{replace_path_separators, strip_emoji};
use fs_err as fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Builds a folder name from an issue key and title.
/// Falls back to the bare key when the cleaned title is empty.
pub fn build_folder_name(
    issue_id: &str,
    issue_title: &str,
    separator: Separator,
    allow_emoji: bool,
) -> String {
    let title = replace_path_separators(issue_title.trim());
    let title = if allow_emoji {
        title.trim().to_string()
    } else {
        strip_emoji(&title)
    };

    if title.is_empty() {
        issue_id.to_string()
    } else {
        format!("{}{}{}", issue_id, separator.as_str(), title)
    }
}

/// Name shown while the user types a custom folder name.
pub fn folder_name_preview(issue_id: &str, custom_name: &str, separator: Separator) -> String {
    let name = custom_name.trim();
    if name.is_empty() {
        issue_id.to_string()
    } else {
        format!("{}{}{}", issue_id, separator.as_str(), name)
    }
}

/// Parent directory for new folders, as configured.
pub fn new_folder_location(prefs: &Preferences) -> Result<PathBuf> {
    prefs
        .new_folder_location()
        .map(expand_home)
        .ok_or(IssuedirError::NewFolderLocationNotConfigured)
}

/// Creates `parent/name` and returns its absolute path.
///
/// Never reuses an existing folder; intermediate parents are created as needed.
pub fn create_issue_folder(parent: &Path, folder_name: &str) -> Result<PathBuf> {
    let name = folder_name.trim();
    validate_folder_name(name)?;

    let full_path = parent.join(name);
    fs::create_dir_all(parent)
        .map_err(|err| IssuedirError::io(format!("creating {}", parent.display()), err))?;

    // The leaf is created exclusively so a concurrent creator can't be reused.
    match fs::create_dir(&full_path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(IssuedirError::FolderAlreadyExists(full_path))
        }
        Err(err) => {
            return Err(IssuedirError::io(
                format!("creating {}", full_path.display()),
                err,
            ))
        }
    }
    tracing::info!(path = %full_path.display(), "Created issue folder");

    if full_path.is_absolute() {
        Ok(full_path)
    } else {
        let cwd = std::env::current_dir()
            .map_err(|err| IssuedirError::io("resolving current directory", err))?;
        Ok(cwd.join(full_path))
    }
}

fn validate_folder_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(IssuedirError::InvalidFolderName(name.to_string()));
    }
    Ok(())
}
