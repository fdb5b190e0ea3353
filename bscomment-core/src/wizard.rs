//! Screen flow of the edit wizard.
//!
//! The wizard is a single current-screen enum plus the data each screen
//! produced. Forward transitions require the previous screen's data, `back`
//! reverses exactly one step, and `Error` is reachable from anywhere.
//!
//! ```text
//! url-input → metadata-review → permission-selection → github-auth
//!           → edit-confirmation → success
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::{ErrorClass, Recovery};
use crate::models::{AccessLevel, AuthToken, CommitInfo, ParsedMetadata};

// ============================================================================
// Screens
// ============================================================================

/// Wizard screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    /// Page URL entry.
    UrlInput,
    /// Extracted metadata shown for confirmation.
    MetadataReview,
    /// Public-only vs full repository access.
    PermissionSelection,
    /// Device-flow sign in.
    #[serde(rename = "github-auth")]
    GitHubAuth,
    /// Preview of the edit, awaiting confirmation.
    EditConfirmation,
    /// Commit created.
    Success,
    /// Something failed.
    Error,
}

impl Screen {
    /// Stable identifier (`url-input`, `metadata-review`, ...).
    pub fn id(self) -> &'static str {
        match self {
            Screen::UrlInput => "url-input",
            Screen::MetadataReview => "metadata-review",
            Screen::PermissionSelection => "permission-selection",
            Screen::GitHubAuth => "github-auth",
            Screen::EditConfirmation => "edit-confirmation",
            Screen::Success => "success",
            Screen::Error => "error",
        }
    }

    /// Previous screen on the forward path, if `back` is allowed here.
    pub fn previous(self) -> Option<Screen> {
        match self {
            Screen::MetadataReview => Some(Screen::UrlInput),
            Screen::PermissionSelection => Some(Screen::MetadataReview),
            Screen::GitHubAuth => Some(Screen::PermissionSelection),
            Screen::EditConfirmation => Some(Screen::GitHubAuth),
            Screen::UrlInput | Screen::Success | Screen::Error => None,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error shown on the error screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardError {
    /// User-readable message.
    pub message: String,
    /// Failure class.
    pub class: ErrorClass,
    /// Recovery offered.
    pub recovery: Recovery,
    /// Screen the failure happened on.
    pub origin: Screen,
}

/// A transition the wizard refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Action not valid on the current screen.
    #[error("cannot {action} from the {from} screen")]
    InvalidTransition {
        /// Current screen.
        from: Screen,
        /// Attempted action.
        action: &'static str,
    },

    /// The current screen lacks data the next one requires.
    #[error("the {0} screen requires {1}")]
    MissingData(Screen, &'static str),

    /// `back` from a screen with no predecessor.
    #[error("there is no screen before {0}")]
    NoPrevious(Screen),

    /// `retry` on an error that only allows starting over.
    #[error("this error cannot be retried")]
    NotRetryable,
}

// ============================================================================
// Wizard
// ============================================================================

/// Wizard state: current screen and accumulated data.
#[derive(Debug, Clone)]
pub struct Wizard {
    screen: Screen,
    url: Option<String>,
    metadata: Option<ParsedMetadata>,
    access: Option<AccessLevel>,
    auth: Option<AuthToken>,
    commit: Option<CommitInfo>,
    error: Option<WizardError>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Creates a wizard on the url-input screen.
    pub fn new() -> Self {
        Self {
            screen: Screen::UrlInput,
            url: None,
            metadata: None,
            access: None,
            auth: None,
            commit: None,
            error: None,
        }
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Submitted page URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Validated metadata.
    pub fn metadata(&self) -> Option<&ParsedMetadata> {
        self.metadata.as_ref()
    }

    /// Selected access level.
    pub fn access(&self) -> Option<AccessLevel> {
        self.access
    }

    /// Signed-in token and profile.
    pub fn auth(&self) -> Option<&AuthToken> {
        self.auth.as_ref()
    }

    /// Commit produced on success.
    pub fn commit(&self) -> Option<&CommitInfo> {
        self.commit.as_ref()
    }

    /// Error being shown.
    pub fn error(&self) -> Option<&WizardError> {
        self.error.as_ref()
    }

    fn expect_screen(&self, expected: Screen, action: &'static str) -> Result<(), TransitionError> {
        if self.screen == expected {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                from: self.screen,
                action,
            })
        }
    }

    fn go(&mut self, next: Screen) {
        debug!(from = %self.screen, to = %next, "Wizard transition");
        self.screen = next;
    }

    /// url-input → metadata-review.
    pub fn submit_url(
        &mut self,
        url: impl Into<String>,
        metadata: ParsedMetadata,
    ) -> Result<(), TransitionError> {
        self.expect_screen(Screen::UrlInput, "submit a URL")?;
        self.url = Some(url.into());
        self.metadata = Some(metadata);
        self.go(Screen::MetadataReview);
        Ok(())
    }

    /// metadata-review → permission-selection.
    pub fn confirm_metadata(&mut self) -> Result<(), TransitionError> {
        self.expect_screen(Screen::MetadataReview, "confirm metadata")?;
        if self.metadata.is_none() {
            return Err(TransitionError::MissingData(self.screen, "metadata"));
        }
        self.go(Screen::PermissionSelection);
        Ok(())
    }

    /// permission-selection → github-auth.
    pub fn select_access(&mut self, access: AccessLevel) -> Result<(), TransitionError> {
        self.expect_screen(Screen::PermissionSelection, "select access")?;
        if self.metadata.is_none() {
            return Err(TransitionError::MissingData(self.screen, "metadata"));
        }
        self.access = Some(access);
        self.go(Screen::GitHubAuth);
        Ok(())
    }

    /// github-auth → edit-confirmation.
    pub fn authenticated(&mut self, auth: AuthToken) -> Result<(), TransitionError> {
        self.expect_screen(Screen::GitHubAuth, "complete sign in")?;
        if self.metadata.is_none() {
            return Err(TransitionError::MissingData(self.screen, "metadata"));
        }
        if self.access.is_none() {
            return Err(TransitionError::MissingData(self.screen, "an access level"));
        }
        self.auth = Some(auth);
        self.go(Screen::EditConfirmation);
        Ok(())
    }

    /// edit-confirmation → success.
    pub fn committed(&mut self, commit: CommitInfo) -> Result<(), TransitionError> {
        self.expect_screen(Screen::EditConfirmation, "record a commit")?;
        if self.metadata.is_none() {
            return Err(TransitionError::MissingData(self.screen, "metadata"));
        }
        if self.auth.is_none() {
            return Err(TransitionError::MissingData(self.screen, "a signed-in user"));
        }
        self.commit = Some(commit);
        self.go(Screen::Success);
        Ok(())
    }

    /// Moves to the error screen from anywhere, with the recovery the
    /// error class allows.
    ///
    /// Failing while already on the error screen keeps the original origin.
    pub fn fail(&mut self, message: impl Into<String>, class: ErrorClass) {
        self.fail_with(message, class, class.recovery());
    }

    /// Like [`Wizard::fail`] with an explicit recovery.
    pub fn fail_with(&mut self, message: impl Into<String>, class: ErrorClass, recovery: Recovery) {
        let origin = match (&self.error, self.screen) {
            (Some(existing), Screen::Error) => existing.origin,
            _ => self.screen,
        };
        self.error = Some(WizardError {
            message: message.into(),
            class,
            recovery,
            origin,
        });
        self.go(Screen::Error);
    }

    /// error → originating screen, for recoverable errors only.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        self.expect_screen(Screen::Error, "retry")?;
        let Some(error) = self.error.take() else {
            return Err(TransitionError::NotRetryable);
        };
        if error.recovery != Recovery::Retry {
            self.error = Some(error);
            return Err(TransitionError::NotRetryable);
        }
        self.go(error.origin);
        Ok(())
    }

    /// One step back along the forward path.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        let previous = self
            .screen
            .previous()
            .ok_or(TransitionError::NoPrevious(self.screen))?;
        self.go(previous);
        Ok(())
    }

    /// Discards everything and returns to url-input.
    pub fn start_over(&mut self) {
        debug!(from = %self.screen, "Wizard reset");
        *self = Self::new();
    }
}
