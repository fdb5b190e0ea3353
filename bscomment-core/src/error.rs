//! Core error types for bsComment Editor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Classification
// ============================================================================

/// Coarse failure class shared by every crate in the workspace.
///
/// Each crate-level error maps onto one of these so the wizard can decide
/// whether the user gets a retry path or only "start over".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed URL, repository, path, or missing metadata.
    Validation,
    /// Request never produced a response.
    Network,
    /// Device flow expired, denied, or failed; token rejected.
    Auth,
    /// Expired device code. Split from `Auth` because it is retryable.
    AuthExpired,
    /// 404 from the Contents API.
    NotFound,
    /// 403 from the Contents API.
    Permission,
    /// 409 from the Contents API (stale `sha`).
    Conflict,
    /// GitHub rate limit hit.
    RateLimited,
    /// Any other non-2xx response.
    Api,
}

impl ErrorClass {
    /// Recovery offered to the user for this class.
    pub fn recovery(self) -> Recovery {
        match self {
            ErrorClass::Validation | ErrorClass::AuthExpired | ErrorClass::RateLimited => {
                Recovery::Retry
            }
            _ => Recovery::StartOver,
        }
    }

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::Network => "network",
            ErrorClass::Auth | ErrorClass::AuthExpired => "authentication",
            ErrorClass::NotFound => "not found",
            ErrorClass::Permission => "permission",
            ErrorClass::Conflict => "conflict",
            ErrorClass::RateLimited => "rate limited",
            ErrorClass::Api => "api",
        }
    }
}

/// What the error screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Go back to the screen the error came from.
    Retry,
    /// Only "start over" is available.
    StartOver,
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Input validation failures. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No URL given.
    #[error("URL is required")]
    EmptyUrl,

    /// The URL did not parse.
    #[error("Please enter a valid URL")]
    InvalidUrl(String),

    /// Scheme other than http/https.
    #[error("URL must use HTTP or HTTPS protocol")]
    UnsupportedScheme(String),

    /// Repository is not on github.com.
    #[error("Invalid repository URL: Repository must be hosted on GitHub")]
    NotGitHub(String),

    /// Repository URL does not look like `https://github.com/owner/repo`.
    #[error("Invalid repository URL: Invalid GitHub repository URL format")]
    InvalidRepoFormat(String),

    /// Blank file path.
    #[error("Invalid file path: File path is required")]
    EmptyPath,

    /// File path without leading slash.
    #[error("Invalid file path: File path must start with /")]
    PathNotAbsolute(String),

    /// File path that is not an HTML file.
    #[error("Invalid file path: File must be an HTML file (.html)")]
    NotHtml(String),
}

// ============================================================================
// Core Error
// ============================================================================

/// Core error type for bsComment Editor operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The page has none (or only some) of the required meta tags.
    #[error(
        "No bsComment metadata found in the HTML file. \
         Please ensure the file contains the required meta tags."
    )]
    MetadataNotFound,
}

impl CoreError {
    /// Failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::Validation(_) | CoreError::MetadataNotFound => ErrorClass::Validation,
        }
    }
}

// ============================================================================
// Session Store Error
// ============================================================================

/// Failure writing to a session store backend.
#[derive(Debug, Error)]
#[error("Session store error: {0}")]
pub struct SessionStoreError(pub String);
