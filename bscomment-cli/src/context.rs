//! Wiring shared by the commands: settings, HTTP, session, and sign-in.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bscomment_core::SessionStore;
use bscomment_fetch::{HttpClient, TokioClock};
use bscomment_github::{Authenticator, DeviceFlowTransport, DirectTransport, GitHubClient, ProxyTransport};
use bscomment_store::{ENV_CLIENT_ID, ENV_PROXY_URL, Settings, SettingsStore, open_session_store};
use tracing::debug;

/// Effective settings plus the clients built from them.
pub struct AppContext {
    /// Settings with environment overrides applied.
    pub settings: Settings,
    /// Unrestricted client for page downloads and the relay.
    pub http: HttpClient,
}

impl AppContext {
    /// Loads settings from the default path.
    pub async fn load() -> Result<Self> {
        let store = SettingsStore::load_default().await?;
        Self::from_settings(store.effective().await)
    }

    /// Builds the context from already-resolved settings.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let http = HttpClient::with_timeout(settings.request_timeout())
            .context("Failed to create HTTP client")?;
        Ok(Self { settings, http })
    }

    /// REST client for the configured API base.
    pub fn github_client(&self) -> Result<GitHubClient> {
        GitHubClient::with_base(self.http.clone(), &self.settings.api_base)
            .with_context(|| format!("Invalid api_base: {}", self.settings.api_base))
    }

    /// Device-flow transport: the relay when configured, else direct.
    pub fn transport(&self) -> Result<Arc<dyn DeviceFlowTransport>> {
        if let Some(proxy_url) = &self.settings.proxy_url {
            debug!(%proxy_url, "Using device-flow relay");
            return Ok(Arc::new(ProxyTransport::new(self.http.clone(), proxy_url.clone())));
        }

        let Some(client_id) = &self.settings.client_id else {
            bail!(
                "No GitHub OAuth client id configured. Set {ENV_CLIENT_ID}, \
                 run `bscomment config set client_id <id>`, or set {ENV_PROXY_URL}."
            );
        };

        debug!(oauth_base = %self.settings.oauth_base, "Using direct device flow");
        Ok(Arc::new(DirectTransport::with_base(
            self.http.clone(),
            client_id.clone(),
            self.settings.oauth_base.clone(),
        )))
    }

    /// Session store selected in settings.
    pub fn session_store(&self) -> Result<Arc<dyn SessionStore>> {
        open_session_store(self.settings.session_backend, None)
            .with_context(|| format!("Failed to open {} session store", self.settings.session_backend))
    }

    /// Authenticator over the configured transport and session store.
    pub fn authenticator(&self) -> Result<Authenticator<TokioClock>> {
        Ok(Authenticator::new(
            self.transport()?,
            self.github_client()?,
            self.session_store()?,
            TokioClock,
        ))
    }
}
