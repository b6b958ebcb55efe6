//! User preferences, loaded from `config.toml` at invocation time.
//!
//! A missing file means defaults; a malformed file is an error so typos
//! don't silently disable features.

use crate::error::{IssuedirError, Result};
use crate::storage::StorageConfig;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BACKLINK_TITLE: &str = "Local Folder";
pub const DEFAULT_WINDOW_PROCESS: &str = "Linear";
pub const DEFAULT_REDIRECT_PORT: u16 = 8976;

/// Joins the issue key and title in generated folder names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    #[default]
    Space,
    Hyphen,
    Period,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::Hyphen => "-",
            Separator::Period => ".",
        }
    }
}

impl std::str::FromStr for Separator {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "space" | " " => Ok(Separator::Space),
            "hyphen" | "-" => Ok(Separator::Hyphen),
            "period" | "." => Ok(Separator::Period),
            other => Err(format!(
                "unknown separator {other:?} (expected space, hyphen or period)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Recursive directory walk; works everywhere.
    #[default]
    Walk,
    /// macOS Spotlight (`mdfind`).
    Spotlight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub search_directory: Option<String>,
    pub new_folder_location: Option<String>,
    pub allow_emojis: bool,
    pub folder_separator: Separator,
    pub auto_create_folders: bool,
    pub auto_backlink_on_create: bool,
    pub backlink_url_scheme: Option<String>,
    pub backlink_title: Option<String>,
    pub linear_api_key: Option<String>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub oauth_redirect_port: u16,
    pub window_process: String,
    pub search_backend: SearchBackend,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            search_directory: None,
            new_folder_location: None,
            allow_emojis: false,
            folder_separator: Separator::Space,
            auto_create_folders: false,
            auto_backlink_on_create: true,
            backlink_url_scheme: None,
            backlink_title: None,
            linear_api_key: None,
            oauth_client_id: None,
            oauth_client_secret: None,
            oauth_redirect_port: DEFAULT_REDIRECT_PORT,
            window_process: DEFAULT_WINDOW_PROCESS.to_string(),
            search_backend: SearchBackend::Walk,
        }
    }
}

impl Preferences {
    /// Search root with `~` expanded; defaults to the home directory.
    pub fn search_root(&self) -> PathBuf {
        crate::locator::expand_home(non_blank(&self.search_directory).unwrap_or("~"))
    }

    pub fn backlink_title(&self) -> &str {
        non_blank(&self.backlink_title).unwrap_or(DEFAULT_BACKLINK_TITLE)
    }

    pub fn backlink_url_scheme(&self) -> Option<&str> {
        non_blank(&self.backlink_url_scheme)
    }

    pub fn static_token(&self) -> Option<&str> {
        non_blank(&self.linear_api_key)
    }

    pub fn oauth_client_id(&self) -> Option<&str> {
        non_blank(&self.oauth_client_id)
    }

    pub fn oauth_client_secret(&self) -> Option<&str> {
        non_blank(&self.oauth_client_secret)
    }

    pub fn new_folder_location(&self) -> Option<&str> {
        non_blank(&self.new_folder_location)
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "********".to_string());
        Self {
            linear_api_key: mask(&self.linear_api_key),
            oauth_client_secret: mask(&self.oauth_client_secret),
            ..self.clone()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Loads preferences from the storage root.
pub fn load_preferences(storage: &StorageConfig) -> Result<Preferences> {
    let path = storage.config_file();
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|err| IssuedirError::io(format!("reading {}", path.display()), err))?;
    toml::from_str::<Preferences>(&content).map_err(|err| IssuedirError::ConfigMalformed {
        path: path.clone(),
        details: err.to_string(),
    })
}

pub const CONFIG_TEMPLATE: &str = r#"# issuedir configuration

# Root directory searched (recursively) for issue folders.
# search_directory = "~"

# Where new issue folders are created.
# new_folder_location = "~/Projects"

# allow_emojis = false
# folder_separator = "space"   # space | hyphen | period
# auto_create_folders = false
# auto_backlink_on_create = true

# Backlink attachment added to the issue. {issueId} is replaced with the key.
# backlink_url_scheme = "file:///Users/me/Projects/{issueId}"
# backlink_title = "Local Folder"

# Personal API key (takes precedence over OAuth).
# linear_api_key = ""

# OAuth application credentials for `issuedir authorize`.
# oauth_client_id = ""
# oauth_client_secret = ""
# oauth_redirect_port = 8976

# window_process = "Linear"
# search_backend = "walk"      # walk | spotlight
"#;

/// Writes the commented template if no config exists yet.
/// Returns false when a config file was already present.
pub fn init_config_file(storage: &StorageConfig) -> Result<bool> {
    let path = storage.config_file();
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(storage.root())
        .map_err(|err| IssuedirError::io("creating config directory", err))?;
    fs::write(&path, CONFIG_TEMPLATE)
        .map_err(|err| IssuedirError::io(format!("writing {}", path.display()), err))?;
    Ok(true)
}
