//! GitHub Device Flow OAuth controller.
//!
//! This module drives the OAuth 2.0 Device Authorization Grant
//! (RFC 8628) against a [`DeviceFlowTransport`].
//!
//! ## Flow
//!
//! 1. **Start**: request a device code and user code
//! 2. **Display**: show the user the verification URL and user code
//! 3. **Poll**: request a token every `interval` seconds until the user acts
//! 4. **Complete**: hand the access token to the caller
//!
//! ## Polling policy
//!
//! The first attempt is made `interval` seconds after polling starts.
//! `authorization_pending` waits `interval` again; `slow_down` waits
//! `interval + 5` (not cumulative). A deadline of `expires_in` seconds is
//! checked before every attempt. All waiting goes through the injected
//! [`Clock`].
//!
//! ## Example
//!
//! ```ignore
//! let mut flow = DeviceFlowController::new(transport, TokioClock);
//! let session = flow.start(AccessLevel::Full.scope()).await?;
//! println!("Go to {} and enter code: {}", session.verification_uri, session.user_code);
//! let token = flow.poll(&session).await?;
//! ```

use std::time::Duration;

use bscomment_core::{AccessToken, Clock, DeviceFlowSession};
use tracing::{debug, instrument, warn};

use crate::error::GitHubError;
use crate::transport::{DeviceFlowTransport, TokenPoll};

/// Extra wait added to the interval after a `slow_down` response.
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

// ============================================================================
// State
// ============================================================================

/// Where the controller is in the device flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFlowState {
    /// Nothing requested yet.
    Idle,
    /// Device code request in flight.
    Requested,
    /// Codes issued; waiting for the user to enter them.
    AwaitingUserAction,
    /// Token requests in progress.
    Polling,
    /// A token was granted.
    Authenticated,
    /// The code expired, or the deadline passed.
    Expired,
    /// The user denied access.
    Denied,
    /// Initiation or polling failed for another reason.
    Failed,
}

impl DeviceFlowState {
    /// Returns true once no further requests will be made.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeviceFlowState::Authenticated
                | DeviceFlowState::Expired
                | DeviceFlowState::Denied
                | DeviceFlowState::Failed
        )
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Runs one device authorization at a time.
#[derive(Debug)]
pub struct DeviceFlowController<T, C> {
    transport: T,
    clock: C,
    state: DeviceFlowState,
}

impl<T: DeviceFlowTransport, C: Clock> DeviceFlowController<T, C> {
    /// Creates an idle controller.
    pub fn new(transport: T, clock: C) -> Self {
        Self {
            transport,
            clock,
            state: DeviceFlowState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> DeviceFlowState {
        self.state
    }

    /// Starts the device flow for `scope`.
    ///
    /// The user must visit the verification URL and enter the user code
    /// before [`poll`](Self::poll) can succeed.
    #[instrument(skip(self))]
    pub async fn start(&mut self, scope: &str) -> Result<DeviceFlowSession, GitHubError> {
        debug!("Starting GitHub device flow");
        self.state = DeviceFlowState::Requested;

        match self.transport.request_device_code(scope).await {
            Ok(session) => {
                self.state = DeviceFlowState::AwaitingUserAction;
                Ok(session)
            }
            Err(e) => {
                self.state = DeviceFlowState::Failed;
                Err(e)
            }
        }
    }

    /// Polls until the user authorizes, denies, or the code expires.
    #[instrument(skip(self, session), fields(interval = session.interval, expires_in = session.expires_in))]
    pub async fn poll(&mut self, session: &DeviceFlowSession) -> Result<AccessToken, GitHubError> {
        self.state = DeviceFlowState::Polling;

        let interval = Duration::from_secs(session.interval);
        let Some(deadline) = self
            .clock
            .now()
            .checked_add(Duration::from_secs(session.expires_in))
        else {
            self.state = DeviceFlowState::Failed;
            return Err(GitHubError::InvalidResponse(format!(
                "expires_in out of range: {}",
                session.expires_in
            )));
        };
        let mut wait = interval;
        let mut attempts = 0u32;

        loop {
            self.clock.sleep(wait).await;

            if self.clock.now() >= deadline {
                debug!(attempts, "Device flow deadline passed");
                self.state = DeviceFlowState::Expired;
                return Err(GitHubError::DeviceFlowExpired);
            }

            attempts += 1;
            let poll = match self.transport.request_token(&session.device_code).await {
                Ok(poll) => poll,
                Err(e) => {
                    warn!(error = %e, attempts, "Token request failed");
                    self.state = DeviceFlowState::Failed;
                    return Err(e);
                }
            };

            match poll {
                TokenPoll::Granted(token) => {
                    debug!(attempts, "Device flow completed - got access token");
                    self.state = DeviceFlowState::Authenticated;
                    return Ok(token);
                }
                TokenPoll::Pending => {
                    debug!("Authorization pending");
                    wait = interval;
                }
                TokenPoll::SlowDown => {
                    debug!("Polling too fast");
                    wait = interval.saturating_add(SLOW_DOWN_INCREMENT);
                }
                TokenPoll::Expired => {
                    debug!("Device code expired");
                    self.state = DeviceFlowState::Expired;
                    return Err(GitHubError::DeviceFlowExpired);
                }
                TokenPoll::Denied => {
                    debug!("Access denied by user");
                    self.state = DeviceFlowState::Denied;
                    return Err(GitHubError::AccessDenied);
                }
                TokenPoll::Failed(message) => {
                    warn!(error = %message, "Unknown OAuth error");
                    self.state = DeviceFlowState::Failed;
                    return Err(GitHubError::DeviceFlowFailed(message));
                }
            }
        }
    }

    /// Runs the complete device flow.
    ///
    /// Starts the flow, hands the session to `on_start` so the caller can
    /// show the code, then polls to completion.
    pub async fn run_with_callback<F>(
        &mut self,
        scope: &str,
        on_start: F,
    ) -> Result<AccessToken, GitHubError>
    where
        F: FnOnce(&DeviceFlowSession),
    {
        let session = self.start(scope).await?;
        on_start(&session);
        self.poll(&session).await
    }
}

// ============================================================================
// Tests
// ============================================================================
