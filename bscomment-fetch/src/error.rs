//! Fetch error types.

use bscomment_core::{CoreError, ErrorClass, ValidationError};
use thiserror::Error;

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-level failure.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error (connect, TLS, body read, ...).
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    /// Failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            HttpError::Request(_) | HttpError::Build(_) => ErrorClass::Network,
            HttpError::DomainNotAllowed(_) | HttpError::InvalidUrl(_) => ErrorClass::Validation,
        }
    }
}

// ============================================================================
// Page Error
// ============================================================================

/// Failure loading metadata from a published page.
#[derive(Debug, Error)]
pub enum PageError {
    /// URL failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Metadata missing from the page, or present with bad values.
    #[error(transparent)]
    Metadata(#[from] CoreError),

    /// No response at all.
    #[error("Unable to access the URL. Please check if the URL is correct and accessible.")]
    Unreachable(#[source] HttpError),

    /// Non-2xx response.
    #[error("Failed to fetch HTML: {status} {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },
}

impl PageError {
    /// Failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            PageError::Validation(_) => ErrorClass::Validation,
            PageError::Metadata(e) => e.class(),
            PageError::Unreachable(_) => ErrorClass::Network,
            PageError::Status { status: 404, .. } => ErrorClass::NotFound,
            PageError::Status { status: 403, .. } => ErrorClass::Permission,
            PageError::Status { .. } => ErrorClass::Api,
        }
    }
}
