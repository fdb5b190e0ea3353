// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # bsComment GitHub
//!
//! Everything that talks to GitHub on behalf of bsComment Editor.
//!
//! ## Modules
//!
//! - [`transport`] - device-flow endpoints, direct or through a relay
//! - [`device_flow`] - the polling state machine
//! - [`api`] - `/user` and the Contents API
//! - [`auth`] - sign-in with session persistence
//! - [`editor`] - read, preview, and commit the timestamp edit

pub mod api;
pub mod auth;
pub mod device_flow;
pub mod editor;
pub mod error;
pub mod transport;

pub use api::{GITHUB_API_BASE, GitHubClient};
pub use auth::{Authenticator, TOKEN_KEY, USER_KEY, clear_session, restore_session};
pub use device_flow::{DeviceFlowController, DeviceFlowState, SLOW_DOWN_INCREMENT};
pub use editor::{PREVIEW_CONTEXT_LINES, PendingEdit, Preview};
pub use error::GitHubError;
pub use transport::{
    DEVICE_CODE_GRANT_TYPE, DeviceFlowTransport, DirectTransport, GITHUB_OAUTH_BASE, ProxyRequest,
    ProxyTransport, TokenPoll,
};
