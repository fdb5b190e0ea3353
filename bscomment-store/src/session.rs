//! [`SessionStore`] backends.
//!
//! - [`MemorySessionStore`]: process lifetime only
//! - [`KeychainSessionStore`]: one keychain entry holding a JSON map
//! - [`FileSessionStore`]: JSON map in the cache directory, mode 0600

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use bscomment_core::{SessionStore, SessionStoreError};
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{default_session_path, load_json_blocking, save_json_blocking};
use crate::settings::SessionBackend;

/// Keychain service name.
pub const KEYCHAIN_SERVICE: &str = "bscomment";

/// Keychain account holding the session map.
const KEYCHAIN_ACCOUNT: &str = "session";

type SessionMap = BTreeMap<String, String>;

fn lock(map: &Mutex<SessionMap>) -> MutexGuard<'_, SessionMap> {
    map.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// Memory
// ============================================================================

/// Session store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<SessionMap>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        lock(&self.values).remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        lock(&self.values).clear();
        Ok(())
    }
}

// ============================================================================
// File
// ============================================================================

/// Session store persisted as a JSON map.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<SessionMap>,
}

impl FileSessionStore {
    /// Opens the store at `path`. A missing file is an empty session.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match load_json_blocking::<SessionMap>(&path) {
            Ok(values) => values,
            Err(e) if e.is_not_found() => SessionMap::new(),
            Err(StoreError::Serialization(e)) => {
                warn!(path = %path.display(), error = %e, "Session file is corrupt, starting empty");
                SessionMap::new()
            }
            Err(e) => return Err(e),
        };

        debug!(path = %path.display(), keys = values.len(), "Opened session file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &SessionMap) -> Result<(), SessionStoreError> {
        if values.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::from(e).into()),
            };
        }
        save_json_blocking(&self.path, values).map_err(Into::into)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        values.clear();
        self.persist(&values)
    }
}

// ============================================================================
// Keychain
// ============================================================================

/// Session store kept in the OS keychain.
///
/// The whole map is one secret (service `bscomment`, account `session`) so
/// `clear` does not need to enumerate entries.
pub struct KeychainSessionStore {
    entry: Entry,
    values: Mutex<SessionMap>,
}

impl std::fmt::Debug for KeychainSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainSessionStore")
            .field("service", &KEYCHAIN_SERVICE)
            .field("keys", &lock(&self.values).len())
            .finish()
    }
}

impl KeychainSessionStore {
    /// Opens the keychain entry, reading any stored session.
    pub fn open() -> Result<Self, StoreError> {
        let entry = Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)?;

        let values = match entry.get_password() {
            Ok(secret) => serde_json::from_str(&secret).unwrap_or_else(|e| {
                warn!(error = %e, "Keychain session is corrupt, starting empty");
                SessionMap::new()
            }),
            Err(keyring::Error::NoEntry) => SessionMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(keys = values.len(), "Opened keychain session");
        Ok(Self {
            entry,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &SessionMap) -> Result<(), SessionStoreError> {
        if values.is_empty() {
            return match self.entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(StoreError::from(e).into()),
            };
        }
        let secret = serde_json::to_string(values).map_err(StoreError::from)?;
        self.entry
            .set_password(&secret)
            .map_err(|e| StoreError::from(e).into())
    }
}

impl SessionStore for KeychainSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut values = lock(&self.values);
        values.clear();
        self.persist(&values)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Opens the store selected by `backend`.
///
/// `file_path` overrides the default session file location.
pub fn open_session_store(
    backend: SessionBackend,
    file_path: Option<PathBuf>,
) -> Result<Arc<dyn SessionStore>, StoreError> {
    debug!(%backend, "Opening session store");
    Ok(match backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Keychain => Arc::new(KeychainSessionStore::open()?),
        SessionBackend::File => Arc::new(FileSessionStore::open(
            file_path.unwrap_or_else(default_session_path),
        )?),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.get("github_token").is_none());

        store.set("github_token", "gho_1").unwrap();
        store.set("github_user", "{}").unwrap();
        assert_eq!(store.get("github_token").as_deref(), Some("gho_1"));

        store.remove("github_token").unwrap();
        store.remove("github_token").unwrap();
        assert!(store.get("github_token").is_none());

        store.clear().unwrap();
        assert!(store.get("github_user").is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set("github_token", "gho_1").unwrap();
        drop(store);

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.get("github_token").as_deref(), Some("gho_1"));
    }

    #[test]
    fn test_file_store_clear_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set("github_token", "gho_1").unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.get("github_token").is_none());
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.get("github_token").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set("github_token", "gho_1").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_factory_memory_and_file() {
        let store = open_session_store(SessionBackend::Memory, None).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let store = open_session_store(SessionBackend::File, Some(path.clone())).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    // Keychain access needs a platform secret service; not exercised here.
}
