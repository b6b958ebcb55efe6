//! Linear credentials.
//!
//! A personal API key in the preferences always wins. Without one, an OAuth
//! app (client id, optional secret) is required and tokens come from the
//! token store, refreshed on the fly when they have expired.

mod oauth;
mod token_store;

pub use oauth::{
    code_challenge, parse_callback, receive_callback, AuthorizationRequest, OAuthApp,
    AUTHORIZE_URL, OAUTH_SCOPE, TOKEN_URL,
};
pub use token_store::{FileTokenStore, MemoryTokenStore, OAuthTokens, TokenStore};

use crate::config::Preferences;
use crate::error::{IssuedirError, Result};
use crate::platform::Desktop;
use crate::storage::StorageConfig;
use crate::tracker::{IssueTracker, LinearClient, LinearCredential, TrackerProvider, LINEAR_GRAPHQL_URL};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Serialize;
use std::net::TcpListener;
use std::time::Duration;

const TOKEN_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How the tracker would be reached right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthStatus {
    ApiKey,
    OAuth {
        expires_at: Option<DateTime<Utc>>,
        expired: bool,
        refreshable: bool,
    },
    NotConnected {
        reason: String,
    },
}

impl AuthStatus {
    pub fn describe(&self) -> String {
        match self {
            AuthStatus::ApiKey => "Using personal API key".to_string(),
            AuthStatus::OAuth {
                expires_at: Some(at),
                expired: false,
                ..
            } => format!("Connected via OAuth (token expires {})", at.to_rfc3339()),
            AuthStatus::OAuth { expired: false, .. } => "Connected via OAuth".to_string(),
            AuthStatus::OAuth {
                refreshable: true, ..
            } => "Connected via OAuth (token expired, will refresh)".to_string(),
            AuthStatus::OAuth { .. } => "OAuth token expired; run `issuedir authorize`".to_string(),
            AuthStatus::NotConnected { reason } => format!("Not connected: {}", reason),
        }
    }
}

pub struct Authenticator {
    static_token: Option<String>,
    app: Option<OAuthApp>,
    redirect_port: u16,
    store: Box<dyn TokenStore>,
    graphql_endpoint: String,
    http: Client,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("static_token", &self.static_token.as_ref().map(|_| "********"))
            .field("app", &self.app.as_ref().map(|app| &app.client_id))
            .field("redirect_port", &self.redirect_port)
            .field("graphql_endpoint", &self.graphql_endpoint)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Production setup: tokens live in the data directory.
    pub fn from_preferences(prefs: &Preferences, storage: &StorageConfig) -> Self {
        Self::new(prefs, Box::new(FileTokenStore::new(storage.tokens_file())))
    }

    pub fn new(prefs: &Preferences, store: Box<dyn TokenStore>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(TOKEN_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            static_token: prefs.static_token().map(str::to_string),
            app: prefs
                .oauth_client_id()
                .map(|id| OAuthApp::new(id, prefs.oauth_client_secret())),
            redirect_port: prefs.oauth_redirect_port,
            store,
            graphql_endpoint: LINEAR_GRAPHQL_URL.to_string(),
            http,
        }
    }

    /// Points the client at other endpoints (local test servers).
    pub fn with_endpoints(mut self, graphql_endpoint: &str, token_url: &str) -> Self {
        self.graphql_endpoint = graphql_endpoint.to_string();
        if let Some(app) = self.app.as_mut() {
            app.token_url = token_url.to_string();
        }
        self
    }

    pub fn client(&self) -> Result<LinearClient> {
        let credential = self.credential()?;
        Ok(LinearClient::with_endpoint(credential, &self.graphql_endpoint))
    }

    fn credential(&self) -> Result<LinearCredential> {
        if let Some(token) = &self.static_token {
            return Ok(LinearCredential::ApiKey(token.clone()));
        }

        let app = self.require_app()?;
        let Some(tokens) = self.store.get()? else {
            return Err(IssuedirError::AuthRequired(
                "not connected to Linear; run `issuedir authorize`".to_string(),
            ));
        };

        if !tokens.is_expired() {
            return Ok(LinearCredential::AccessToken(tokens.access_token));
        }

        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            return Err(IssuedirError::AuthRequired(
                "access token expired and no refresh token is stored".to_string(),
            ));
        };

        match app.refresh(&self.http, refresh_token) {
            Ok(refreshed) => {
                self.store.set(&refreshed)?;
                tracing::info!("Refreshed Linear access token");
                Ok(LinearCredential::AccessToken(refreshed.access_token))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed");
                Err(IssuedirError::AuthRequired(format!(
                    "token refresh failed: {}",
                    err
                )))
            }
        }
    }

    fn require_app(&self) -> Result<&OAuthApp> {
        self.app.as_ref().ok_or_else(|| {
            IssuedirError::AuthRequired(
                "set linear_api_key or oauth_client_id in the configuration".to_string(),
            )
        })
    }

    /// Runs the browser authorization flow and stores the resulting tokens.
    /// A configured API key makes this a no-op.
    pub fn authorize(&self, desktop: &dyn Desktop) -> Result<AuthStatus> {
        if self.static_token.is_some() {
            tracing::info!("Personal API key configured; skipping OAuth");
            return Ok(AuthStatus::ApiKey);
        }

        let app = self.require_app()?;
        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port)).map_err(|err| {
            IssuedirError::io(
                format!("binding OAuth callback port {}", self.redirect_port),
                err,
            )
        })?;

        let request = app.authorization_request(self.redirect_port)?;
        tracing::info!(redirect_uri = %request.redirect_uri, "Starting OAuth authorization");
        desktop.open_url(request.url.as_str())?;

        let code = receive_callback(&listener, &request.state)?;
        let tokens = app.exchange_code(&self.http, &request, &code)?;
        self.store.set(&tokens)?;
        tracing::info!("Stored Linear OAuth tokens");
        Ok(self.status())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Cleared stored Linear tokens");
        Ok(())
    }

    /// Describes the credential without contacting the network.
    pub fn status(&self) -> AuthStatus {
        if self.static_token.is_some() {
            return AuthStatus::ApiKey;
        }
        if let Err(err) = self.require_app() {
            return AuthStatus::NotConnected {
                reason: err.to_string(),
            };
        }
        match self.store.get() {
            Ok(Some(tokens)) => AuthStatus::OAuth {
                expires_at: tokens.expires_at,
                expired: tokens.is_expired(),
                refreshable: tokens.refresh_token.is_some(),
            },
            Ok(None) => AuthStatus::NotConnected {
                reason: "no stored tokens".to_string(),
            },
            Err(err) => AuthStatus::NotConnected {
                reason: err.to_string(),
            },
        }
    }
}

impl TrackerProvider for Authenticator {
    fn tracker(&self) -> Result<Box<dyn IssueTracker>> {
        Ok(Box::new(self.client()?))
    }
}
