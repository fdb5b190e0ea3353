//! GitHub REST API client.
//!
//! Covers the three endpoints the editor needs: `GET /user`,
//! `GET /repos/{owner}/{repo}/contents/{path}` and the matching `PUT`.
//! Error payloads are normalized into [`GitHubError`] variants here so
//! callers never inspect status codes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bscomment_core::{CommitInfo, FileHandle, GitHubUser};
use bscomment_fetch::HttpClient;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::GitHubError;
use crate::transport::error_message;

// ============================================================================
// Constants
// ============================================================================

/// GitHub API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// User endpoint.
const USER_ENDPOINT: &str = "user";

/// GitHub API version header.
const GITHUB_API_VERSION: &str = "2022-11-28";

// ============================================================================
// API Payloads
// ============================================================================

/// Response from `GET /repos/{owner}/{repo}/contents/{path}` for a file.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
}

/// Response from the contents `PUT`.
#[derive(Debug, Deserialize)]
struct UpdateResponse {
    commit: CommitInfo,
}

/// Which call produced an error, for status mapping.
#[derive(Debug, Clone, Copy)]
enum Operation<'a> {
    User,
    Read(&'a str),
    Write(&'a str),
}

// ============================================================================
// API Client
// ============================================================================

/// Authenticated calls against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: HttpClient,
    api_base: Url,
}

impl GitHubClient {
    /// Creates a client for `https://api.github.com`.
    pub fn new(http: HttpClient) -> Result<Self, GitHubError> {
        Self::with_base(http, GITHUB_API_BASE)
    }

    /// Creates a client for a custom API base (GitHub Enterprise, tests).
    ///
    /// Requests are restricted to the base URL's host.
    pub fn with_base(http: HttpClient, api_base: &str) -> Result<Self, GitHubError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| GitHubError::InvalidResponse(format!("invalid API base {api_base}: {e}")))?;
        let host = api_base
            .host_str()
            .ok_or_else(|| GitHubError::InvalidResponse(format!("API base has no host: {api_base}")))?
            .to_string();

        Ok(Self {
            http: http.allow_only(vec![host]),
            api_base,
        })
    }

    /// API base URL.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Build request headers.
    fn build_headers(token: &str) -> Result<HeaderMap, GitHubError> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::AuthenticationFailed("Token contains invalid characters".to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Joins `segments` onto the API base, percent-encoding each one.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<String, GitHubError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| GitHubError::InvalidResponse(format!("API base cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// URL of the contents endpoint for `path` (leading `/` ignored).
    pub fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<String, GitHubError> {
        let path = path.trim_start_matches('/');
        self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.split('/')),
        )
    }

    /// Fetches the authenticated user's profile.
    #[instrument(skip(self, token))]
    pub async fn fetch_user(&self, token: &str) -> Result<GitHubUser, GitHubError> {
        debug!("Fetching GitHub user info");

        let url = self.endpoint([USER_ENDPOINT])?;
        let response = self
            .http
            .get_with_headers(&url, Self::build_headers(token)?)
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_status(status, &body, Operation::User));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse user response");
            GitHubError::InvalidResponse(format!("JSON error: {e}"))
        })
    }

    /// Reads a file and the `sha` needed to update it.
    #[instrument(skip(self, token))]
    pub async fn get_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<FileHandle, GitHubError> {
        debug!("Fetching file contents");

        let url = self.contents_url(owner, repo, path)?;
        let response = self
            .http
            .get_with_headers(&url, Self::build_headers(token)?)
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_status(status, &body, Operation::Read(path)));
        }

        let contents: ContentsResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse contents response");
            GitHubError::InvalidResponse(format!("{path} is not a file: {e}"))
        })?;

        if contents.kind.as_deref().is_some_and(|k| k != "file") {
            return Err(GitHubError::InvalidResponse(format!("{path} is not a file")));
        }

        let content = decode_content(&contents)?;
        debug!(sha = %contents.sha, len = content.len(), "File fetched");

        Ok(FileHandle {
            path: contents.path,
            content,
            sha: contents.sha,
            html_url: contents.html_url,
        })
    }

    /// Writes `content` to `path`, creating a commit.
    ///
    /// `sha` must come from the read this write is based on; GitHub
    /// answers 409 when the file has moved on.
    #[instrument(skip(self, token, content, sha, message))]
    #[allow(clippy::too_many_arguments)]
    pub async fn update_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        sha: &str,
        message: &str,
    ) -> Result<CommitInfo, GitHubError> {
        debug!("Updating file contents");

        let url = self.contents_url(owner, repo, path)?;
        let request = UpdateRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            sha,
        };
        let response = self
            .http
            .put_json(&url, Self::build_headers(token)?, &request)
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_status(status, &body, Operation::Write(path)));
        }

        let update: UpdateResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse update response");
            GitHubError::InvalidResponse(format!("JSON error: {e}"))
        })?;

        debug!(commit = %update.commit.sha, "File updated");
        Ok(update.commit)
    }
}

/// Decodes the base64 `content` field of a contents response.
fn decode_content(contents: &ContentsResponse) -> Result<String, GitHubError> {
    match contents.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(GitHubError::InvalidResponse(format!(
                "unsupported content encoding '{other}' for {}",
                contents.path
            )));
        }
    }

    let raw: String = contents
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(raw)
        .map_err(|e| GitHubError::InvalidResponse(format!("invalid base64 content: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|_| GitHubError::InvalidResponse(format!("{} is not UTF-8 text", contents.path)))
}

/// Maps a non-2xx response to an error.
fn map_status(status: StatusCode, body: &str, operation: Operation<'_>) -> GitHubError {
    let message = error_message(body);
    debug!(%status, message = %message, ?operation, "GitHub API error");

    match status {
        StatusCode::UNAUTHORIZED => GitHubError::AuthenticationFailed(message),
        StatusCode::FORBIDDEN if message.to_lowercase().contains("rate limit") => {
            GitHubError::RateLimited(message)
        }
        StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited(message),
        StatusCode::FORBIDDEN if !matches!(operation, Operation::User) => {
            GitHubError::PermissionDenied(message)
        }
        StatusCode::NOT_FOUND => match operation {
            Operation::Read(path) => GitHubError::FileNotFound(path.to_string()),
            Operation::Write(_) | Operation::User => GitHubError::Api {
                status: status.as_u16(),
                message,
            },
        },
        StatusCode::CONFLICT if matches!(operation, Operation::Write(_)) => GitHubError::Conflict(message),
        _ => GitHubError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
