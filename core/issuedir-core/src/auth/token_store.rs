//! OAuth token persistence.

use crate::error::{IssuedirError, Result};
use chrono::{DateTime, Duration, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_SKEW_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokens {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expires_at,
            None => false,
        }
    }
}

pub trait TokenStore {
    fn get(&self) -> Result<Option<OAuthTokens>>;
    fn set(&self, tokens: &OAuthTokens) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file store, written atomically with owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<OAuthTokens>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|err| IssuedirError::io("reading token store", err))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| IssuedirError::Json {
                context: format!("parsing {}", self.path.display()),
                source,
            })
    }

    fn set(&self, tokens: &OAuthTokens) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| IssuedirError::io("token store path", std::io::ErrorKind::InvalidInput.into()))?;
        fs::create_dir_all(dir).map_err(|err| IssuedirError::io("creating token store directory", err))?;

        let content = serde_json::to_string_pretty(tokens).map_err(|source| IssuedirError::Json {
            context: "serializing tokens".to_string(),
            source,
        })?;

        // NamedTempFile is created 0600 on Unix.
        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|err| IssuedirError::io("creating temp token file", err))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| IssuedirError::io("writing temp token file", err))?;
        temp.persist(&self.path)
            .map_err(|err| IssuedirError::io("persisting token store", err.error))?;
        tracing::debug!(path = %self.path.display(), "Stored OAuth tokens");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(IssuedirError::io("removing token store", err)),
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<OAuthTokens>>,
}

impl MemoryTokenStore {
    pub fn with_tokens(tokens: OAuthTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<OAuthTokens>> {
        Ok(self.tokens.lock().map(|t| t.clone()).unwrap_or(None))
    }

    fn set(&self, tokens: &OAuthTokens) -> Result<()> {
        if let Ok(mut slot) = self.tokens.lock() {
            *slot = Some(tokens.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.tokens.lock() {
            *slot = None;
        }
        Ok(())
    }
}
