//! The timestamp edit: read, preview, commit.
//!
//! A [`PendingEdit`] owns the [`FileHandle`] it was built from, and
//! [`PendingEdit::commit`] consumes it, so every write carries the `sha`
//! of the read immediately before it.

use bscomment_core::metadata::COMMENT_MARKER;
use bscomment_core::{
    AuthToken, CommitInfo, FileHandle, GitHubUser, ParsedMetadata, add_timestamp_comment,
    add_timestamp_comment_at,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::api::GitHubClient;
use crate::error::GitHubError;

/// Lines shown on each side of the inserted comment.
pub const PREVIEW_CONTEXT_LINES: usize = 3;

// ============================================================================
// Preview
// ============================================================================

/// A window of the edited file around the inserted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// 1-based line number of the first line in `lines`.
    pub first_line: usize,
    /// Index into `lines` of the inserted comment.
    pub comment_index: usize,
    /// The lines themselves, without terminators.
    pub lines: Vec<String>,
}

impl Preview {
    /// Renders the window with a `+ ` marker on the added line.
    pub fn render(&self) -> String {
        let width = (self.first_line + self.lines.len()).to_string().len();
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let marker = if i == self.comment_index { '+' } else { ' ' };
                format!("{:>width$} {marker} {line}", self.first_line + i)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Pending Edit
// ============================================================================

/// A file read from GitHub together with its edited content.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    metadata: ParsedMetadata,
    file: FileHandle,
    edited: String,
}

impl PendingEdit {
    /// Reads the file named by `metadata` and applies the timestamp edit.
    #[instrument(skip(client, token, metadata), fields(repo = %metadata.full_name(), path = %metadata.file_path))]
    pub async fn prepare(
        client: &GitHubClient,
        token: &AuthToken,
        metadata: ParsedMetadata,
    ) -> Result<Self, GitHubError> {
        let file = client
            .get_file(&token.token, &metadata.owner, &metadata.repo_name, &metadata.file_path)
            .await?;
        debug!(sha = %file.sha, "Prepared edit");
        Ok(Self::from_file(metadata, file))
    }

    /// Builds an edit from a file that has already been read.
    pub fn from_file(metadata: ParsedMetadata, file: FileHandle) -> Self {
        let edited = add_timestamp_comment(&file.content);
        Self {
            metadata,
            file,
            edited,
        }
    }

    /// Like [`from_file`](Self::from_file) with a fixed timestamp.
    pub fn from_file_at(metadata: ParsedMetadata, file: FileHandle, at: DateTime<Utc>) -> Self {
        let edited = add_timestamp_comment_at(&file.content, at);
        Self {
            metadata,
            file,
            edited,
        }
    }

    /// Page metadata.
    pub fn metadata(&self) -> &ParsedMetadata {
        &self.metadata
    }

    /// The file as read.
    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// Content that will be written.
    pub fn edited(&self) -> &str {
        &self.edited
    }

    /// Lines around the inserted comment.
    pub fn preview(&self) -> Preview {
        let lines: Vec<&str> = self.edited.split('\n').collect();
        // The new comment sits after any earlier ones.
        let comment = lines
            .iter()
            .rposition(|line| line.contains(COMMENT_MARKER))
            .unwrap_or(0);

        let start = comment.saturating_sub(PREVIEW_CONTEXT_LINES);
        let end = (comment + PREVIEW_CONTEXT_LINES + 1).min(lines.len());

        Preview {
            first_line: start + 1,
            comment_index: comment - start,
            lines: lines[start..end].iter().map(|l| (*l).to_string()).collect(),
        }
    }

    /// Commit message credited to `user`.
    pub fn commit_message(&self, user: &GitHubUser) -> String {
        format!(
            "bsComment Editor: Updated {}\n\nUpdated by {} via bsComment Editor",
            self.metadata.file_path,
            user.display_name()
        )
    }

    /// Writes the edit, consuming it.
    #[instrument(skip(self, client, token), fields(path = %self.metadata.file_path))]
    pub async fn commit(self, client: &GitHubClient, token: &AuthToken) -> Result<CommitInfo, GitHubError> {
        let message = self.commit_message(&token.user);
        client
            .update_file(
                &token.token,
                &self.metadata.owner,
                &self.metadata.repo_name,
                &self.metadata.file_path,
                &self.edited,
                &self.file.sha,
                &message,
            )
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
