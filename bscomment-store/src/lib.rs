// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # bsComment Store
//!
//! Settings and session storage for bsComment Editor.
//!
//! This crate provides:
//!
//! - **SettingsStore**: user preferences with persistence and env overrides
//! - **Session stores**: memory, keychain and file backends for
//!   [`bscomment_core::SessionStore`]
//! - **Persistence**: file I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use bscomment_store::{SettingsStore, open_session_store};
//!
//! let settings = SettingsStore::load_default().await?.effective().await;
//! let session = open_session_store(settings.session_backend, None)?;
//! ```

pub mod error;
pub mod persistence;
pub mod session;
pub mod settings;

pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_session_path, default_settings_path, load_json,
    load_json_or_default, save_json,
};
pub use session::{
    FileSessionStore, KEYCHAIN_SERVICE, KeychainSessionStore, MemorySessionStore, open_session_store,
};
pub use settings::{
    DEFAULT_API_BASE, DEFAULT_OAUTH_BASE, ENV_CLIENT_ID, ENV_CLIENT_ID_FALLBACK, ENV_PROXY_URL,
    SessionBackend, Settings, SettingsStore,
};

#[cfg(test)]
mod persistence_tests;
