//! Trait seams for bsComment Editor.
//!
//! These are the two dependencies the flow takes from its environment:
//! where credentials live between runs, and how time passes. Both are
//! injected so tests can substitute in-memory fakes.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::SessionStoreError;

/// Session-scoped key/value storage for credentials.
///
/// String keys and string values. Nothing expires on its own; callers clear
/// the store on logout.
pub trait SessionStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionStoreError>;

    /// Removes every key owned by this store.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Monotonic time source with an async sleep.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
