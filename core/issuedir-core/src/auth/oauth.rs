//! OAuth 2 authorization-code flow with PKCE against Linear.

use super::token_store::OAuthTokens;
use crate::error::{IssuedirError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration as StdDuration;

pub const AUTHORIZE_URL: &str = "https://linear.app/oauth/authorize";
pub const TOKEN_URL: &str = "https://api.linear.app/oauth/token";
pub const OAUTH_SCOPE: &str = "write";
const CALLBACK_PATH: &str = "/callback";
const CALLBACK_READ_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Everything needed to send the user to the consent page and finish the exchange.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub redirect_uri: String,
    pub code_verifier: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
}

impl OAuthApp {
    pub fn new(client_id: &str, client_secret: Option<&str>) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.map(str::to_string),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn authorization_request(&self, redirect_port: u16) -> Result<AuthorizationRequest> {
        let code_verifier = random_token(48);
        let state = random_token(16);
        let redirect_uri = format!("http://localhost:{}{}", redirect_port, CALLBACK_PATH);

        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPE),
                ("state", state.as_str()),
                ("code_challenge", code_challenge(&code_verifier).as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|err| IssuedirError::AuthRequired(format!("invalid authorize url: {err}")))?;

        Ok(AuthorizationRequest {
            url,
            redirect_uri,
            code_verifier,
            state,
        })
    }

    pub fn exchange_code(
        &self,
        http: &Client,
        request: &AuthorizationRequest,
        code: &str,
    ) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", request.code_verifier.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        self.post_token_request(http, &params, "Token exchange")
    }

    pub fn refresh(&self, http: &Client, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        let mut tokens = self.post_token_request(http, &params, "Refresh")?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }

    fn post_token_request(
        &self,
        http: &Client,
        params: &[(&str, &str)],
        label: &str,
    ) -> Result<OAuthTokens> {
        let response = http
            .post(&self.token_url)
            .form(params)
            .send()
            .map_err(|err| IssuedirError::RemoteCallFailed(format!("{label} failed: {err}")))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(IssuedirError::RemoteCallFailed(format!(
                "{label} failed: {} {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|source| IssuedirError::Json {
                context: format!("{label} response"),
                source,
            })?;
        Ok(parsed.into_tokens())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_tokens(self) -> OAuthTokens {
        OAuthTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            scope: self.scope,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn random_token(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

/// Waits for the browser redirect on `listener` and returns the authorization code.
///
/// Connections that close without a request, time out, or ask for another path
/// (preconnects, `/favicon.ico`) are answered or dropped and the wait continues.
pub fn receive_callback(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (stream, _) = listener
            .accept()
            .map_err(|err| IssuedirError::io("accepting OAuth callback", err))?;

        let request_line = match read_request(&stream) {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("OAuth listener: connection closed without a request");
                continue;
            }
            Err(err) => {
                tracing::debug!(error = %err, "OAuth listener: dropping unreadable connection");
                continue;
            }
        };

        if request_path(&request_line) != Some(CALLBACK_PATH) {
            tracing::debug!(request = request_line.trim(), "OAuth listener: ignoring request");
            respond(stream, "404 Not Found", "Not found");
            continue;
        }

        let result = parse_callback(&request_line, expected_state);
        let body = match &result {
            Ok(_) => "Authorized. You can close this window.",
            Err(_) => "Authorization failed. Check the terminal for details.",
        };
        respond(stream, "200 OK", body);
        return result;
    }
}

/// Reads the request line and drains the headers. `None` when the peer sent nothing.
fn read_request(stream: &TcpStream) -> std::io::Result<Option<String>> {
    stream.set_read_timeout(Some(CALLBACK_READ_TIMEOUT))?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 || header.trim().is_empty() {
            break;
        }
    }
    Ok(Some(request_line))
}

fn request_path(request_line: &str) -> Option<&str> {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|target| target.split('?').next())
}

fn respond(mut stream: TcpStream, status: &str, body: &str) {
    let _ = write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.flush();
}

/// Extracts the code from a request line like `GET /callback?code=..&state=.. HTTP/1.1`.
pub fn parse_callback(request_line: &str, expected_state: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| IssuedirError::AuthRequired("malformed OAuth callback".to_string()))?;
    let url = Url::parse(&format!("http://localhost{}", target))
        .map_err(|err| IssuedirError::AuthRequired(format!("malformed OAuth callback: {err}")))?;

    if url.path() != CALLBACK_PATH {
        return Err(IssuedirError::AuthRequired(format!(
            "unexpected OAuth callback path {}",
            url.path()
        )));
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(IssuedirError::AuthRequired(format!("authorization denied: {error}")));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(IssuedirError::AuthRequired("OAuth state mismatch".to_string()));
    }
    code.filter(|code| !code.is_empty())
        .ok_or_else(|| IssuedirError::AuthRequired("OAuth callback carried no code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_matches_rfc7636_example() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_authorization_url_carries_pkce_params() {
        let app = OAuthApp::new("client-123", None);
        let request = app.authorization_request(8976).unwrap();
        let pairs: std::collections::HashMap<String, String> =
            request.url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8976/callback");
        assert_eq!(pairs["scope"], "write");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["code_challenge"], code_challenge(&request.code_verifier));
        assert_eq!(pairs["state"], request.state);
    }

    #[test]
    fn test_parses_callback_code() {
        let code = parse_callback("GET /callback?code=abc&state=xyz HTTP/1.1\r\n", "xyz").unwrap();
        assert_eq!(code, "abc");
    }

    #[test]
    fn test_rejects_state_mismatch_and_denials() {
        assert!(parse_callback("GET /callback?code=abc&state=other HTTP/1.1", "xyz").is_err());
        assert!(parse_callback("GET /callback?error=access_denied&state=xyz HTTP/1.1", "xyz").is_err());
        assert!(parse_callback("GET /favicon.ico HTTP/1.1", "xyz").is_err());
        assert!(parse_callback("garbage", "xyz").is_err());
    }

    #[test]
    fn test_callback_wait_skips_preconnects_and_other_paths() {
        use std::io::Read;
        use std::net::TcpStream;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = std::thread::spawn(move || {
            drop(TcpStream::connect(addr).unwrap());

            let mut favicon = TcpStream::connect(addr).unwrap();
            favicon
                .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .unwrap();
            let mut ignored = String::new();
            let _ = favicon.read_to_string(&mut ignored);

            let mut redirect = TcpStream::connect(addr).unwrap();
            redirect
                .write_all(b"GET /callback?code=abc&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .unwrap();
            let mut response = String::new();
            let _ = redirect.read_to_string(&mut response);
            (ignored, response)
        });

        let code = receive_callback(&listener, "xyz").unwrap();
        let (favicon_response, callback_response) = browser.join().unwrap();

        assert_eq!(code, "abc");
        assert!(favicon_response.starts_with("HTTP/1.1 404"));
        assert!(callback_response.starts_with("HTTP/1.1 200"));
    }

    #[test]
    fn test_request_path_ignores_query() {
        assert_eq!(request_path("GET /callback?code=a HTTP/1.1"), Some("/callback"));
        assert_eq!(request_path("GET /favicon.ico HTTP/1.1"), Some("/favicon.ico"));
        assert_eq!(request_path(""), None);
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"scope":"write","refresh_token":"r"}"#,
        )
        .unwrap();
        let tokens = response.into_tokens();
        assert_eq!(tokens.access_token, "a");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
        assert!(!tokens.is_expired());
    }
}
