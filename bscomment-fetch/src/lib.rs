// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # bsComment Fetch
//!
//! HTTP plumbing for bsComment Editor.
//!
//! - [`http::HttpClient`] - reqwest wrapper with tracing and domain allowlist
//! - [`page`] - download a published page and extract its metadata
//! - [`clock::TokioClock`] - the production [`bscomment_core::Clock`]

pub mod clock;
pub mod error;
pub mod http;
pub mod page;

pub use clock::TokioClock;
pub use error::{HttpError, PageError};
pub use http::{DEFAULT_TIMEOUT_SECS, HttpClient};
pub use page::{fetch_html, load_metadata};
