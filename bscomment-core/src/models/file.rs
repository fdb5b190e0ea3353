//! Contents API payloads.

use serde::{Deserialize, Serialize};

/// A file read from the Contents API.
///
/// The `sha` is GitHub's optimistic-concurrency token: the next write must
/// carry it unchanged or GitHub rejects the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Repository-relative path.
    pub path: String,
    /// Decoded text content.
    pub content: String,
    /// Blob sha at read time.
    pub sha: String,
    /// Browser URL of the file, if GitHub returned one.
    pub html_url: Option<String>,
}

/// Commit created by a Contents API write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit sha.
    pub sha: String,
    /// Browser URL of the commit.
    #[serde(default)]
    pub html_url: String,
    /// Commit message.
    #[serde(default)]
    pub message: String,
    /// Commit author.
    #[serde(default)]
    pub author: Option<CommitPerson>,
}

/// Author or committer of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPerson {
    /// Name.
    pub name: String,
    /// Email.
    pub email: String,
    /// ISO-8601 date.
    #[serde(default)]
    pub date: Option<String>,
}
