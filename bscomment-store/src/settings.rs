//! User settings store.
//!
//! Settings live in `settings.json` under the config directory. Values from
//! the environment are layered on top after loading and are never written
//! back to disk.

use bscomment_core::AccessLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, remove_file, save_json};

// ============================================================================
// Environment
// ============================================================================

/// OAuth client id override.
pub const ENV_CLIENT_ID: &str = "BSCOMMENT_GITHUB_CLIENT_ID";

/// Fallback OAuth client id variable.
pub const ENV_CLIENT_ID_FALLBACK: &str = "GITHUB_CLIENT_ID";

/// Device-flow relay URL override.
pub const ENV_PROXY_URL: &str = "BSCOMMENT_PROXY_URL";

/// Default GitHub REST base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default GitHub OAuth base.
pub const DEFAULT_OAUTH_BASE: &str = "https://github.com";

// ============================================================================
// Settings Types
// ============================================================================

/// Where credentials are kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Forgotten when the process exits.
    #[default]
    Memory,
    /// OS keychain.
    Keychain,
    /// JSON file in the cache directory.
    File,
}

impl fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionBackend::Memory => write!(f, "memory"),
            SessionBackend::Keychain => write!(f, "keychain"),
            SessionBackend::File => write!(f, "file"),
        }
    }
}

impl FromStr for SessionBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(SessionBackend::Memory),
            "keychain" => Ok(SessionBackend::Keychain),
            "file" => Ok(SessionBackend::File),
            other => Err(StoreError::Parse(format!(
                "unknown session backend: {other} (expected memory, keychain or file)"
            ))),
        }
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OAuth App client id used for the device flow.
    pub client_id: Option<String>,

    /// Device-flow relay. When set, the client id stays on the relay.
    pub proxy_url: Option<String>,

    /// GitHub REST base.
    pub api_base: String,

    /// GitHub OAuth base.
    pub oauth_base: String,

    /// Access level offered first in the wizard.
    pub default_access: AccessLevel,

    /// Where the token is kept between runs.
    pub session_backend: SessionBackend,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Open the verification page in a browser.
    pub open_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: None,
            proxy_url: None,
            api_base: DEFAULT_API_BASE.to_string(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
            default_access: AccessLevel::default(),
            session_backend: SessionBackend::default(),
            request_timeout_secs: 30,
            open_browser: true,
        }
    }
}

impl Settings {
    /// Keys accepted by [`set`](Self::set).
    pub const KEYS: &'static [&'static str] = &[
        "client_id",
        "proxy_url",
        "api_base",
        "oauth_base",
        "default_access",
        "session_backend",
        "request_timeout_secs",
        "open_browser",
    ];

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_CLIENT_ID).or_else(|| get(ENV_CLIENT_ID_FALLBACK)) {
            debug!("Client id taken from environment");
            self.client_id = Some(id);
        }
        if let Some(url) = get(ENV_PROXY_URL) {
            debug!(proxy_url = %url, "Proxy URL taken from environment");
            self.proxy_url = Some(url);
        }
    }

    /// Sets one key from its string form. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let optional = |v: &str| (!v.trim().is_empty()).then(|| v.trim().to_string());

        match key {
            "client_id" => self.client_id = optional(value),
            "proxy_url" => self.proxy_url = optional(value),
            "api_base" => self.api_base = value.trim_end_matches('/').to_string(),
            "oauth_base" => self.oauth_base = value.trim_end_matches('/').to_string(),
            "default_access" => {
                self.default_access = value.parse().map_err(StoreError::Parse)?;
            }
            "session_backend" => self.session_backend = value.parse()?,
            "request_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| StoreError::Parse(format!("request_timeout_secs: {e}")))?;
                if secs == 0 {
                    return Err(StoreError::Config("request_timeout_secs must be positive".into()));
                }
                self.request_timeout_secs = secs;
            }
            "open_browser" => {
                self.open_browser = match value.to_lowercase().as_str() {
                    "true" | "yes" | "1" | "on" => true,
                    "false" | "no" | "0" | "off" => false,
                    other => return Err(StoreError::Parse(format!("open_browser: not a boolean: {other}"))),
                };
            }
            other => {
                return Err(StoreError::Config(format!(
                    "unknown key: {other} (expected one of {})",
                    Self::KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Settings with persistence.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store holding defaults.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        })
    }

    /// Settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the stored settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Gets the stored settings with environment overrides applied.
    pub async fn effective(&self) -> Settings {
        let mut settings = self.get().await;
        settings.apply_env_overrides();
        settings
    }

    /// Updates settings in memory.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Settings) -> R,
    {
        let mut settings = self.settings.write().await;
        f(&mut settings)
    }

    /// Saves settings to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await.clone();
        save_json(&self.path, &settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Restores defaults and deletes the file.
    pub async fn reset(&self) -> Result<(), StoreError> {
        *self.settings.write().await = Settings::default();
        remove_file(&self.path).await?;
        info!(path = %self.path.display(), "Settings reset");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
