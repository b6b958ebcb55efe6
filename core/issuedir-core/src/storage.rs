//! Storage configuration and path management for issuedir.
//!
//! All file paths issuedir reads or writes are decided here so tests can
//! redirect everything with `StorageConfig::with_root(temp_dir)`.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the data root.
pub const HOME_ENV: &str = "ISSUEDIR_HOME";

/// Central configuration for all issuedir storage paths.
///
/// Production code uses `StorageConfig::default()` which points to `~/.issuedir/`
/// (or `$ISSUEDIR_HOME`). Tests use `StorageConfig::with_root(temp_dir)`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        if let Some(root) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Self {
                root: PathBuf::from(root),
            };
        }
        let home = dirs::home_dir().unwrap_or_else(env::temp_dir);
        Self {
            root: home.join(".issuedir"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for issuedir data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.toml (user preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to tokens.json (OAuth tokens, mode 0600).
    pub fn tokens_file(&self) -> PathBuf {
        self.root.join("tokens.json")
    }

    /// Path to logs/ directory (rolling log files).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
