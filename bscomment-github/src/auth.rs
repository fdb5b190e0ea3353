//! Sign-in: device flow, profile lookup, and session persistence.
//!
//! The token and the serialized profile are kept under two keys in an
//! injected [`SessionStore`]. Both are written on login and both are
//! removed on logout; a profile that no longer parses removes both.

use std::sync::Arc;

use bscomment_core::{AccessLevel, AuthToken, Clock, DeviceFlowSession, GitHubUser, SessionStore, SessionStoreError};
use tracing::{debug, info, instrument, warn};

use crate::api::GitHubClient;
use crate::device_flow::DeviceFlowController;
use crate::error::GitHubError;
use crate::transport::DeviceFlowTransport;

/// Session key holding the bearer token.
pub const TOKEN_KEY: &str = "github_token";

/// Session key holding the JSON-serialized [`GitHubUser`].
pub const USER_KEY: &str = "github_user";

/// Obtains, restores, and forgets credentials.
pub struct Authenticator<C> {
    transport: Arc<dyn DeviceFlowTransport>,
    client: GitHubClient,
    store: Arc<dyn SessionStore>,
    clock: C,
}

impl<C: Clock + Clone> Authenticator<C> {
    /// Creates an authenticator.
    pub fn new(
        transport: Arc<dyn DeviceFlowTransport>,
        client: GitHubClient,
        store: Arc<dyn SessionStore>,
        clock: C,
    ) -> Self {
        Self {
            transport,
            client,
            store,
            clock,
        }
    }

    /// The API client used for profile lookups.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Returns the stored credentials, if any.
    pub fn restore(&self) -> Option<AuthToken> {
        restore_session(self.store.as_ref())
    }

    /// Runs the device flow for `access`, then stores token and profile.
    ///
    /// `on_prompt` receives the session once the user code is available.
    #[instrument(skip(self, on_prompt))]
    pub async fn login<F>(&self, access: AccessLevel, on_prompt: F) -> Result<AuthToken, GitHubError>
    where
        F: FnOnce(&DeviceFlowSession),
    {
        let mut flow = DeviceFlowController::new(Arc::clone(&self.transport), self.clock.clone());
        let access_token = flow.run_with_callback(access.scope(), on_prompt).await?;

        let user = self.client.fetch_user(&access_token.access_token).await?;
        let serialized =
            serde_json::to_string(&user).map_err(|e| SessionStoreError(format!("serialize profile: {e}")))?;

        self.store.set(TOKEN_KEY, &access_token.access_token)?;
        self.store.set(USER_KEY, &serialized)?;

        info!(login = %user.login, scope = %access_token.scope, "Authenticated with GitHub");
        Ok(AuthToken {
            token: access_token.access_token,
            user,
        })
    }

    /// Forgets the stored credentials.
    pub fn logout(&self) -> Result<(), GitHubError> {
        clear_session(self.store.as_ref())?;
        debug!("Logged out");
        Ok(())
    }
}

// ============================================================================
// Session helpers
// ============================================================================

/// Reads token and profile from `store`.
///
/// A profile that no longer parses clears both keys and yields `None`.
pub fn restore_session(store: &dyn SessionStore) -> Option<AuthToken> {
    let token = store.get(TOKEN_KEY)?;
    let user = store.get(USER_KEY)?;

    match serde_json::from_str::<GitHubUser>(&user) {
        Ok(user) => {
            debug!(login = %user.login, "Restored session");
            Some(AuthToken { token, user })
        }
        Err(e) => {
            warn!(error = %e, "Stored profile is unreadable, clearing session");
            if let Err(e) = clear_session(store) {
                warn!(error = %e, "Failed to clear session");
            }
            None
        }
    }
}

/// Removes token and profile from `store`.
pub fn clear_session(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    store.remove(TOKEN_KEY)?;
    store.remove(USER_KEY)
}
