//! Domain models for bsComment Editor.
//!
//! ## Submodules
//!
//! - [`metadata`] - Page metadata (RawMetadata, ParsedMetadata)
//! - [`auth`] - Device flow and identity (DeviceFlowSession, AuthToken, GitHubUser, AccessLevel)
//! - [`file`] - Contents API payloads (FileHandle, CommitInfo)

mod auth;
mod file;
mod metadata;

pub use auth::{AccessLevel, AccessToken, AuthToken, DeviceFlowSession, GitHubUser};
pub use file::{CommitInfo, CommitPerson, FileHandle};
pub use metadata::{ParsedMetadata, RawMetadata};

#[cfg(test)]
mod serde_tests;
