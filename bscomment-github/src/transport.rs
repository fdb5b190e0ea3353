//! Device-flow transports.
//!
//! The controller talks to the authorization server through
//! [`DeviceFlowTransport`]. Two implementations exist:
//!
//! - [`DirectTransport`] posts straight to `github.com`
//! - [`ProxyTransport`] posts `{action, ...}` to a relay (see `bscomment proxy`),
//!   for deployments where the client id must not ship with the client
//!
//! Token responses are decoded exactly once, here, into [`TokenPoll`].

use std::sync::Arc;

use async_trait::async_trait;
use bscomment_core::{AccessToken, DeviceFlowSession};
use bscomment_fetch::HttpClient;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::GitHubError;

// ============================================================================
// Constants
// ============================================================================

/// GitHub's OAuth host.
pub const GITHUB_OAUTH_BASE: &str = "https://github.com";

/// Device code endpoint path.
const DEVICE_CODE_PATH: &str = "/login/device/code";

/// Access token endpoint path.
const ACCESS_TOKEN_PATH: &str = "/login/oauth/access_token";

/// Grant type for device-code token requests.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

// ============================================================================
// Poll Result
// ============================================================================

/// Outcome of one token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPoll {
    /// User authorized - here's the access token.
    Granted(AccessToken),
    /// User has not yet authorized - keep polling.
    Pending,
    /// Polling too fast.
    SlowDown,
    /// The device code expired.
    Expired,
    /// The user denied access.
    Denied,
    /// Any other error code; carries the server's description.
    Failed(String),
}

/// Token endpoint payload: either a token or an error code.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenPoll {
    /// Decodes a token endpoint body.
    pub fn decode(body: &str) -> Result<Self, GitHubError> {
        let response: TokenResponse = serde_json::from_str(body)
            .map_err(|e| GitHubError::InvalidResponse(format!("JSON parse error: {e}")))?;

        if let Some(error) = response.error {
            return Ok(match error.as_str() {
                "authorization_pending" => TokenPoll::Pending,
                "slow_down" => TokenPoll::SlowDown,
                "expired_token" => TokenPoll::Expired,
                "access_denied" => TokenPoll::Denied,
                _ => TokenPoll::Failed(
                    response
                        .error_description
                        .filter(|d| !d.is_empty())
                        .unwrap_or(error),
                ),
            });
        }

        match response.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(TokenPoll::Granted(AccessToken {
                access_token,
                token_type: response.token_type.unwrap_or_else(|| "bearer".to_string()),
                scope: response.scope.unwrap_or_default(),
            })),
            _ => Err(GitHubError::InvalidResponse(
                "token response has neither access_token nor error".to_string(),
            )),
        }
    }
}

/// Best-effort human message from an error body.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .message
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}

/// Parses a device code response, surfacing `{"error": ...}` bodies as
/// initiation failures.
fn decode_session(body: &str) -> Result<DeviceFlowSession, GitHubError> {
    if let Ok(session) = serde_json::from_str::<DeviceFlowSession>(body) {
        return Ok(session);
    }

    #[derive(Deserialize)]
    struct ErrorOnly {
        error: String,
    }
    if serde_json::from_str::<ErrorOnly>(body).is_ok() {
        return Err(GitHubError::InitiationFailed(error_message(body)));
    }

    warn!(len = body.len(), "Unparsable device code response");
    Err(GitHubError::InvalidResponse(
        "device code response is missing required fields".to_string(),
    ))
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Talks to the device authorization endpoints.
#[async_trait]
pub trait DeviceFlowTransport: Send + Sync {
    /// Requests a new device code for `scope`.
    async fn request_device_code(&self, scope: &str) -> Result<DeviceFlowSession, GitHubError>;

    /// Requests a token for `device_code` once.
    async fn request_token(&self, device_code: &str) -> Result<TokenPoll, GitHubError>;
}

#[async_trait]
impl<T: DeviceFlowTransport + ?Sized> DeviceFlowTransport for Arc<T> {
    async fn request_device_code(&self, scope: &str) -> Result<DeviceFlowSession, GitHubError> {
        (**self).request_device_code(scope).await
    }

    async fn request_token(&self, device_code: &str) -> Result<TokenPoll, GitHubError> {
        (**self).request_token(device_code).await
    }
}

// ============================================================================
// Direct Transport
// ============================================================================

/// Posts directly to GitHub's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct DirectTransport {
    http: HttpClient,
    oauth_base: String,
    client_id: String,
}

#[derive(Serialize)]
struct DeviceCodeForm<'a> {
    client_id: &'a str,
    scope: &'a str,
}

#[derive(Serialize)]
struct TokenForm<'a> {
    client_id: &'a str,
    device_code: &'a str,
    grant_type: &'a str,
}

impl DirectTransport {
    /// Creates a transport against `https://github.com`.
    pub fn new(http: HttpClient, client_id: impl Into<String>) -> Self {
        Self::with_base(http, client_id, GITHUB_OAUTH_BASE)
    }

    /// Creates a transport against a custom OAuth host.
    pub fn with_base(
        http: HttpClient,
        client_id: impl Into<String>,
        oauth_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            oauth_base: oauth_base.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl DeviceFlowTransport for DirectTransport {
    #[instrument(skip(self))]
    async fn request_device_code(&self, scope: &str) -> Result<DeviceFlowSession, GitHubError> {
        debug!("Requesting device code");

        let url = format!("{}{}", self.oauth_base, DEVICE_CODE_PATH);
        let form = DeviceCodeForm {
            client_id: &self.client_id,
            scope,
        };
        let response = self.http.post_form(&url, json_headers(), &form).await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GitHubError::InitiationFailed(format!(
                "HTTP {}: {}",
                status,
                error_message(&body)
            )));
        }

        let session = decode_session(&body)?;
        debug!(
            user_code = %session.user_code,
            verification_uri = %session.verification_uri,
            expires_in = session.expires_in,
            "Device flow started"
        );
        Ok(session)
    }

    #[instrument(skip(self, device_code))]
    async fn request_token(&self, device_code: &str) -> Result<TokenPoll, GitHubError> {
        let url = format!("{}{}", self.oauth_base, ACCESS_TOKEN_PATH);
        let form = TokenForm {
            client_id: &self.client_id,
            device_code,
            grant_type: DEVICE_CODE_GRANT_TYPE,
        };
        let response = self.http.post_form(&url, json_headers(), &form).await?;

        let status = response.status();
        let body = response.text().await?;

        match TokenPoll::decode(&body) {
            Ok(poll) => Ok(poll),
            Err(_) if !status.is_success() => Err(GitHubError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            }),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Proxy Transport
// ============================================================================

/// Posts `{action: "initiate" | "poll"}` requests to a device-flow relay.
#[derive(Debug, Clone)]
pub struct ProxyTransport {
    http: HttpClient,
    proxy_url: String,
}

/// Request body understood by the relay.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// `initiate` or `poll`.
    #[serde(default)]
    pub action: String,
    /// Scope for `initiate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Device code for `poll`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_code: Option<String>,
}

impl ProxyTransport {
    /// Creates a transport posting to `proxy_url`.
    pub fn new(http: HttpClient, proxy_url: impl Into<String>) -> Self {
        Self {
            http,
            proxy_url: proxy_url.into(),
        }
    }
}

#[async_trait]
impl DeviceFlowTransport for ProxyTransport {
    #[instrument(skip(self))]
    async fn request_device_code(&self, scope: &str) -> Result<DeviceFlowSession, GitHubError> {
        debug!("Requesting device code via proxy");

        let request = ProxyRequest {
            action: "initiate".to_string(),
            scope: Some(scope.to_string()),
            device_code: None,
        };
        let response = self
            .http
            .post_json(&self.proxy_url, json_headers(), &request)
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GitHubError::InitiationFailed(format!(
                "HTTP {}: {}",
                status,
                error_message(&body)
            )));
        }

        decode_session(&body)
    }

    #[instrument(skip(self, device_code))]
    async fn request_token(&self, device_code: &str) -> Result<TokenPoll, GitHubError> {
        let request = ProxyRequest {
            action: "poll".to_string(),
            scope: None,
            device_code: Some(device_code.to_string()),
        };
        let response = self
            .http
            .post_json(&self.proxy_url, json_headers(), &request)
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match TokenPoll::decode(&body) {
            Ok(poll) => Ok(poll),
            Err(_) if !status.is_success() => Err(GitHubError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            }),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
