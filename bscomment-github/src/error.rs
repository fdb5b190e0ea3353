//! GitHub-specific errors.

use bscomment_core::{ErrorClass, SessionStoreError};
use bscomment_fetch::HttpError;
use thiserror::Error;

/// GitHub-specific errors.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] HttpError),

    /// `POST /login/device/code` returned non-2xx.
    #[error("Failed to initiate device flow: {0}")]
    InitiationFailed(String),

    /// Device code expired before the user authorized it.
    #[error("Authentication expired. Please try again.")]
    DeviceFlowExpired,

    /// User denied the authorization request.
    #[error("Authentication was denied.")]
    AccessDenied,

    /// Token endpoint returned an unrecognized error.
    #[error("Authentication failed: {0}")]
    DeviceFlowFailed(String),

    /// Token rejected by the API (401).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 404 from the Contents API.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// 403 from the Contents API.
    #[error("Access denied. Please check repository permissions.")]
    PermissionDenied(String),

    /// 403/429 caused by the rate limit.
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// 409: the file changed since it was read.
    #[error("File has been modified by someone else. Please refresh and try again.")]
    Conflict(String),

    /// Any other non-2xx.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error payload.
        message: String,
    },

    /// 2xx with a body we could not understand.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Token could not be persisted.
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

impl GitHubError {
    /// Failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            GitHubError::Network(e) => e.class(),
            GitHubError::DeviceFlowExpired => ErrorClass::AuthExpired,
            GitHubError::InitiationFailed(_)
            | GitHubError::AccessDenied
            | GitHubError::DeviceFlowFailed(_)
            | GitHubError::AuthenticationFailed(_) => ErrorClass::Auth,
            GitHubError::FileNotFound(_) => ErrorClass::NotFound,
            GitHubError::PermissionDenied(_) => ErrorClass::Permission,
            GitHubError::RateLimited(_) => ErrorClass::RateLimited,
            GitHubError::Conflict(_) => ErrorClass::Conflict,
            GitHubError::Api { .. } | GitHubError::InvalidResponse(_) | GitHubError::Session(_) => {
                ErrorClass::Api
            }
        }
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Network(HttpError::Request(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bscomment_core::Recovery;

    #[test]
    fn test_expired_is_retryable_but_denied_is_not() {
        assert_eq!(GitHubError::DeviceFlowExpired.class().recovery(), Recovery::Retry);
        assert_eq!(GitHubError::AccessDenied.class().recovery(), Recovery::StartOver);
    }

    #[test]
    fn test_contents_classes() {
        assert_eq!(GitHubError::Conflict("x".into()).class(), ErrorClass::Conflict);
        assert_eq!(GitHubError::FileNotFound("x".into()).class(), ErrorClass::NotFound);
        assert_eq!(
            GitHubError::PermissionDenied("x".into()).class(),
            ErrorClass::Permission
        );
        assert_eq!(
            GitHubError::Api { status: 500, message: "boom".into() }.class(),
            ErrorClass::Api
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            GitHubError::FileNotFound("/index.html".into()).to_string(),
            "File not found: /index.html"
        );
        assert_eq!(
            GitHubError::DeviceFlowFailed("bad_verification_code".into()).to_string(),
            "Authentication failed: bad_verification_code"
        );
    }
}
