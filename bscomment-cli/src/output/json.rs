//! JSON output formatting.

use anyhow::Result;
use bscomment_core::{AuthToken, CommitInfo, ParsedMetadata};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Result of a completed edit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutput<'a> {
    pub url: &'a str,
    pub repository: String,
    pub file_path: &'a str,
    pub commit_sha: &'a str,
    pub commit_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<&'a str>,
}

impl<'a> EditOutput<'a> {
    /// Builds the output from the wizard's final state.
    pub fn new(url: &'a str, metadata: &'a ParsedMetadata, commit: &'a CommitInfo) -> Self {
        Self {
            url,
            repository: metadata.full_name(),
            file_path: &metadata.file_path,
            commit_sha: &commit.sha,
            commit_url: &commit.html_url,
            author: commit.author.as_ref().map(|a| a.name.as_str()),
        }
    }
}

/// Session status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusOutput<'a> {
    pub signed_in: bool,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

impl<'a> AuthStatusOutput<'a> {
    /// Builds the output from an optional session.
    pub fn new(backend: impl ToString, auth: Option<&'a AuthToken>) -> Self {
        Self {
            signed_in: auth.is_some(),
            backend: backend.to_string(),
            login: auth.map(|a| a.user.login.as_str()),
            name: auth.and_then(|a| a.user.name.as_deref()),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
