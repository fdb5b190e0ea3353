//! File persistence helpers.
//!
//! Handles loading and saving JSON to disk with owner-only permissions.
//! Settings go through the async functions; the session file is written
//! from the synchronous [`SessionStore`](bscomment_core::SessionStore)
//! methods through the blocking ones.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Directory name under the platform config/cache roots.
const APP_DIR: &str = "bscomment";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/bscomment`
/// - Linux: `~/.config/bscomment`
/// - Windows: `%APPDATA%\bscomment`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default cache directory.
///
/// - macOS: `~/Library/Caches/bscomment`
/// - Linux: `~/.cache/bscomment`
/// - Windows: `%LOCALAPPDATA%\bscomment`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default file-backed session path.
pub fn default_session_path() -> PathBuf {
    default_cache_dir().join("session.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    std::fs::set_permissions(path, perms)?;

    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Set restrictive permissions");
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

/// Sets restrictive file permissions (0o600) on Unix systems.
fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    set_mode(path, 0o600)
}

/// Sets restrictive directory permissions (0o700) on Unix systems.
fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    set_mode(path, 0o700)
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates the parent directory with restrictive permissions.
fn create_secure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!(path = %parent.display(), "Creating secure directory");
            std::fs::create_dir_all(parent)?;
            set_restrictive_dir_permissions(parent)?;
        }
    }
    Ok(())
}

/// Writes `bytes` atomically (temp file + rename) with 0600 on Unix.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    create_secure_parent_dir(path)?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, bytes)?;
    set_restrictive_permissions(&temp_path)?;
    std::fs::rename(&temp_path, path)?;

    debug!(path = %path.display(), "JSON file saved securely");
    Ok(())
}

/// Saves data to a JSON file with secure permissions, blocking the caller.
pub fn save_json_blocking<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");
    write_atomic(path, &serde_json::to_vec_pretty(data)?)
}

/// Loads data from a JSON file, blocking the caller.
pub fn load_json_blocking<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Saves data to a JSON file with secure permissions.
///
/// Creates the parent directory if it doesn't exist and writes atomically.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    let json = serde_json::to_vec_pretty(data)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || write_atomic(&path, &json))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    debug!(path = %path.display(), "JSON file loaded");
    Ok(data)
}

/// Loads data from a JSON file, returning default if not found.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Removes a file, treating "not found" as success.
pub async fn remove_file(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert!(!default_config_dir().as_os_str().is_empty());
        assert!(default_settings_path().ends_with("bscomment/settings.json"));
        assert!(default_session_path().ends_with("session.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_blocking_save_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("cache");
        let file = dir.join("session.json");

        save_json_blocking(&file, &serde_json::json!({"k": "v"})).unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "File should have 0600 permissions");
        let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700, "Directory should have 0700 permissions");
        assert!(!file.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        remove_file(&temp_dir.path().join("nope.json")).await.unwrap();
    }
}
