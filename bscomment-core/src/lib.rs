// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # bsComment Core
//!
//! Core types, metadata extraction, and wizard state for bsComment Editor.
//!
//! This crate has no I/O. It provides:
//!
//! - Domain models (device flow session, token, metadata, file handle)
//! - The `markpub:*` metadata extractor and validator
//! - The timestamp edit applied to the page source
//! - The wizard screen flow
//! - Error taxonomy shared by all crates
//! - Trait seams for session storage and time
//!
//! ## Key Types
//!
//! - [`ParsedMetadata`] - Validated page metadata
//! - [`DeviceFlowSession`] - One device authorization attempt
//! - [`AuthToken`] - Bearer token plus profile
//! - [`FileHandle`] - File content and its `sha`
//! - [`Wizard`] / [`Screen`] - Screen flow controller
//! - [`ErrorClass`] / [`Recovery`] - Error taxonomy
//! - [`SessionStore`] / [`Clock`] - Injected dependencies

pub mod error;
pub mod metadata;
pub mod models;
pub mod traits;
pub mod validate;
pub mod wizard;

// Re-export error types
pub use error::{CoreError, ErrorClass, Recovery, SessionStoreError, ValidationError};

// Re-export model types
pub use models::{
    AccessLevel, AccessToken, AuthToken, CommitInfo, CommitPerson, DeviceFlowSession, FileHandle,
    GitHubUser, ParsedMetadata, RawMetadata,
};

// Re-export operations
pub use metadata::{
    add_timestamp_comment, add_timestamp_comment_at, extract_metadata, parse_metadata, read_metadata,
};
pub use validate::{validate_file_path, validate_github_repo, validate_url};

// Re-export traits and wizard
pub use traits::{Clock, SessionStore};
pub use wizard::{Screen, TransitionError, Wizard, WizardError};
