//! Slack Web API access.
//!
//! [`SlackApi`] is the seam between holla and Slack: the resolver and every
//! command talk to it, never to HTTP directly. [`SlackClient`] is the
//! production implementation; tests use `test_utils::MockSlack`.

use super::types::{
    to_params, AuthInfo, ConversationsPage, ListConversations, ListUsers, Params, UserGroupsList,
    UsersPage,
};
use crate::error::{HollaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default Slack Web API endpoint
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Overrides [`DEFAULT_BASE_URL`], e.g. to point at a local stub server.
pub const BASE_URL_ENV: &str = "SLACK_API_URL";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Invoke any Web API method and return its JSON body.
    ///
    /// # Errors
    ///
    /// `HollaError::Api` when Slack answers `ok: false`, `HollaError::Http` on
    /// transport failures.
    async fn call(&self, method: &str, params: Params) -> Result<Value>;

    async fn list_conversations(&self, request: &ListConversations) -> Result<ConversationsPage> {
        let body = self.call("conversations.list", to_params(request)?).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn list_users(&self, request: &ListUsers) -> Result<UsersPage> {
        let body = self.call("users.list", to_params(request)?).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn list_user_groups(&self) -> Result<UserGroupsList> {
        let body = self.call("usergroups.list", Params::new()).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn auth_test(&self) -> Result<AuthInfo> {
        let body = self.call("auth.test", Params::new()).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetch a private file URL (e.g. `url_private_download`).
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        Err(HollaError::invalid(format!(
            "Downloading {} is not supported by this client",
            url
        )))
    }

    /// Send file contents to an upload URL from `files.getUploadURLExternal`.
    async fn upload(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        Err(HollaError::invalid(format!(
            "Uploading {} bytes to {} is not supported by this client",
            bytes.len(),
            url
        )))
    }
}

/// HTTPS client for the Slack Web API, bound to one token.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    /// Create a client for `token`, honouring [`BASE_URL_ENV`].
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(token, base_url)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .use_rustls_tls()
            .user_agent(concat!("holla/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, params = params.len(), "calling Slack API");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .form(&form_fields(&params))
            .send()
            .await?;

        // 429 and 5xx replies still carry Slack's error body
        let status_error = response.error_for_status_ref().err();
        let text = response.text().await?;
        decode_body(method, &text, status_error)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "downloading file");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        debug!(url, bytes = bytes.len(), "uploading file");
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Slack accepts form-encoded arguments; nested values travel as JSON strings.
pub(crate) fn form_fields(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let encoded = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => value.to_string(),
            };
            Some((key.clone(), encoded))
        })
        .collect()
}

/// Parse a response body. A Slack envelope wins over the HTTP status; the
/// status error is only reported when the body is not one.
pub(crate) fn decode_body<E: Into<HollaError>>(
    method: &str,
    text: &str,
    status_error: Option<E>,
) -> Result<Value> {
    match (serde_json::from_str::<Value>(text), status_error) {
        (Ok(body), Some(e)) if body.get("ok").is_none() => Err(e.into()),
        (Ok(body), _) => check_ok(method, body),
        (Err(_), Some(e)) => Err(e.into()),
        (Err(e), None) => Err(e.into()),
    }
}

/// Turn an `ok: false` body into `HollaError::Api`.
pub(crate) fn check_ok(method: &str, body: Value) -> Result<Value> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(body);
    }
    let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
    Err(HollaError::Api {
        method: method.to_string(),
        error: field("error").unwrap_or_else(|| "unknown_error".to_string()),
        needed: field("needed"),
        provided: field("provided"),
    })
}
