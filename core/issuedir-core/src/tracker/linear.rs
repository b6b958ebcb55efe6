//! Linear GraphQL client.
//!
//! Direct blocking HTTP against `api.linear.app/graphql`; only the handful of
//! issue and attachment operations the reconciler needs.

use super::{Attachment, AttachmentChange, IssueTracker, NewAttachment, RemoteIssue, TrackerError};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const LINEAR_GRAPHQL_URL: &str = "https://api.linear.app/graphql";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const ATTACHMENT_PAGE_SIZE: u32 = 100;

const ISSUE_QUERY: &str = r#"
query Issue($id: String!) {
  issue(id: $id) { id identifier title }
}"#;

const ATTACHMENTS_QUERY: &str = r#"
query IssueAttachments($id: String!, $first: Int!, $after: String) {
  issue(id: $id) {
    attachments(first: $first, after: $after) {
      nodes { id title url }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

const ATTACHMENT_CREATE: &str = r#"
mutation AttachmentCreate($input: AttachmentCreateInput!) {
  attachmentCreate(input: $input) { success attachment { id title url } }
}"#;

const ATTACHMENT_UPDATE: &str = r#"
mutation AttachmentUpdate($id: String!, $input: AttachmentUpdateInput!) {
  attachmentUpdate(id: $id, input: $input) { success attachment { id title url } }
}"#;

const ATTACHMENT_DELETE: &str = r#"
mutation AttachmentDelete($id: String!) {
  attachmentDelete(id: $id) { success }
}"#;

/// How the client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearCredential {
    /// Personal API key, sent verbatim.
    ApiKey(String),
    /// OAuth access token, sent as a bearer token.
    AccessToken(String),
}

impl LinearCredential {
    fn header_value(&self) -> String {
        match self {
            LinearCredential::ApiKey(key) => key.clone(),
            LinearCredential::AccessToken(token) => format!("Bearer {}", token),
        }
    }
}

#[derive(Clone)]
pub struct LinearClient {
    http: Client,
    endpoint: String,
    credential: LinearCredential,
}

impl std::fmt::Debug for LinearClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl LinearClient {
    pub fn new(credential: LinearCredential) -> Self {
        Self::with_endpoint(credential, LINEAR_GRAPHQL_URL)
    }

    pub fn with_endpoint(credential: LinearCredential, endpoint: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
        }
    }

    fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, TrackerError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.credential.header_value())
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .map_err(|err| TrackerError::Http(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| TrackerError::Http(err.to_string()))?;
        decode_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

/// Turns an HTTP status and body into typed data or a classified error.
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, TrackerError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(TrackerError::Unauthorized(format!("HTTP {}", status.as_u16())));
    }

    let parsed: GraphQlResponse<T> = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) if status.is_success() => return Err(TrackerError::Decode(err.to_string())),
        Err(_) => {
            return Err(TrackerError::Http(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )))
        }
    };

    if let Some(first) = parsed.errors.first() {
        let message = parsed
            .errors
            .iter()
            .map(|err| err.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(match first.code() {
            Some("AUTHENTICATION_ERROR") | Some("FORBIDDEN") => TrackerError::Unauthorized(message),
            _ if message.to_ascii_lowercase().contains("not found") => TrackerError::NotFound(message),
            _ => TrackerError::Api(message),
        });
    }

    parsed
        .data
        .ok_or_else(|| TrackerError::Decode("response carried neither data nor errors".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IssueData {
    issue: Option<RemoteIssue>,
}

#[derive(Debug, Deserialize)]
struct AttachmentsData {
    issue: Option<IssueAttachments>,
}

#[derive(Debug, Deserialize)]
struct IssueAttachments {
    attachments: AttachmentConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentConnection {
    nodes: Vec<Attachment>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    attachment_create: AttachmentPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    attachment_update: AttachmentPayload,
}

#[derive(Debug, Deserialize)]
struct AttachmentPayload {
    success: bool,
    attachment: Option<Attachment>,
}

impl AttachmentPayload {
    fn into_attachment(self, operation: &str) -> Result<Attachment, TrackerError> {
        match (self.success, self.attachment) {
            (true, Some(attachment)) => Ok(attachment),
            _ => Err(TrackerError::Api(format!("{} was not successful", operation))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteData {
    attachment_delete: DeletePayload,
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    success: bool,
}

impl IssueTracker for LinearClient {
    fn get_issue(&self, key: &str) -> Result<RemoteIssue, TrackerError> {
        let data: IssueData = self.execute(ISSUE_QUERY, json!({ "id": key }))?;
        data.issue
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", key)))
    }

    fn list_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>, TrackerError> {
        let mut attachments = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let data: AttachmentsData = self.execute(
                ATTACHMENTS_QUERY,
                json!({ "id": issue_id, "first": ATTACHMENT_PAGE_SIZE, "after": after }),
            )?;
            let connection = data
                .issue
                .ok_or_else(|| TrackerError::NotFound(format!("issue {}", issue_id)))?
                .attachments;

            attachments.extend(connection.nodes);
            match (connection.page_info.has_next_page, connection.page_info.end_cursor) {
                (true, Some(cursor)) => after = Some(cursor),
                _ => break,
            }
        }

        Ok(attachments)
    }

    fn create_attachment(&self, attachment: &NewAttachment) -> Result<Attachment, TrackerError> {
        let data: CreateData = self.execute(
            ATTACHMENT_CREATE,
            json!({
                "input": {
                    "issueId": attachment.issue_id,
                    "title": attachment.title,
                    "url": attachment.url,
                }
            }),
        )?;
        data.attachment_create.into_attachment("attachmentCreate")
    }

    fn update_attachment(
        &self,
        attachment_id: &str,
        change: &AttachmentChange,
    ) -> Result<Attachment, TrackerError> {
        if change.url.is_some() {
            return Err(TrackerError::Api(
                "attachment urls cannot be updated in place".to_string(),
            ));
        }
        let title = change
            .title
            .as_deref()
            .ok_or_else(|| TrackerError::Api("attachment update without a title".to_string()))?;

        let data: UpdateData = self.execute(
            ATTACHMENT_UPDATE,
            json!({ "id": attachment_id, "input": { "title": title } }),
        )?;
        data.attachment_update.into_attachment("attachmentUpdate")
    }

    fn delete_attachment(&self, attachment_id: &str) -> Result<(), TrackerError> {
        let data: DeleteData = self.execute(ATTACHMENT_DELETE, json!({ "id": attachment_id }))?;
        if data.attachment_delete.success {
            Ok(())
        } else {
            Err(TrackerError::Api("attachmentDelete was not successful".to_string()))
        }
    }

    /// Linear's update input has no url field; url changes need a replace.
    fn supports_in_place(&self, change: &AttachmentChange) -> bool {
        change.url.is_none() && change.title.is_some()
    }
}
