//! Device flow and identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Device Flow
// ============================================================================

/// Device authorization started by `POST /login/device/code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFlowSession {
    /// The device verification code.
    pub device_code: String,

    /// The user verification code to display.
    pub user_code: String,

    /// The verification URL.
    pub verification_uri: String,

    /// Seconds until the codes expire.
    pub expires_in: u64,

    /// Polling interval in seconds.
    pub interval: u64,
}

/// Access token granted at the end of the device flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The OAuth access token.
    pub access_token: String,

    /// Token type (usually "bearer").
    #[serde(default)]
    pub token_type: String,

    /// Scopes granted.
    #[serde(default)]
    pub scope: String,
}

// ============================================================================
// Identity
// ============================================================================

/// GitHub user profile from `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    /// GitHub login (username).
    pub login: String,

    /// User ID.
    pub id: u64,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Public email (may be null if private).
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl GitHubUser {
    /// Display name, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

/// Bearer token plus the profile it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Bearer token.
    pub token: String,
    /// Profile of the token owner.
    pub user: GitHubUser,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("user", &self.user.login)
            .finish()
    }
}

// ============================================================================
// Access Level
// ============================================================================

/// Repository access requested from the user.
///
/// GitHub OAuth apps cannot be restricted to a single repository, so the
/// choice is between public repositories only and everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Public repositories only.
    Public,
    /// Public and private repositories.
    #[default]
    Full,
}

impl AccessLevel {
    /// OAuth scope string for this level.
    pub fn scope(self) -> &'static str {
        match self {
            AccessLevel::Public => "public_repo user:email",
            AccessLevel::Full => "repo user:email",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            AccessLevel::Public => "Public repositories only",
            AccessLevel::Full => "All repositories",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => write!(f, "public"),
            AccessLevel::Full => write!(f, "full"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(AccessLevel::Public),
            "full" | "all" | "private" => Ok(AccessLevel::Full),
            other => Err(format!("unknown access level: {other} (expected public or full)")),
        }
    }
}
