//! Persistence round-trip and edge case tests.
//!
//! Tests file I/O operations, JSON persistence, and settings round-trip.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::persistence::{load_json, load_json_or_default, save_json};
use crate::settings::{SessionBackend, Settings, SettingsStore};
use bscomment_core::AccessLevel;

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("test.json");

    let settings = Settings {
        client_id: Some("Iv1.abc".into()),
        default_access: AccessLevel::Public,
        ..Settings::default()
    };

    save_json(&file_path, &settings).await.unwrap();
    let loaded: Settings = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/settings.json");

    let result: Result<Settings, _> = load_json(&file_path).await;
    assert!(result.unwrap_err().is_not_found());

    let fallback: Settings = load_json_or_default(&file_path).await;
    assert_eq!(fallback, Settings::default());
}

#[tokio::test]
async fn test_load_corrupt_file_falls_back() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");
    tokio::fs::write(&file_path, "{ nope").await.unwrap();

    let settings: Settings = load_json_or_default(&file_path).await;
    assert_eq!(settings, Settings::default());
}

// ============================================================================
// Settings Store Tests
// ============================================================================

#[tokio::test]
async fn test_settings_store_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bscomment").join("settings.json");

    let store = SettingsStore::load(path.clone()).await.unwrap();
    assert_eq!(store.get().await, Settings::default());

    store
        .update(|s| s.set("session_backend", "file"))
        .await
        .unwrap();
    store.save().await.unwrap();

    let reloaded = SettingsStore::load(path).await.unwrap();
    assert_eq!(reloaded.get().await.session_backend, SessionBackend::File);
}

#[tokio::test]
async fn test_settings_store_reset() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let store = SettingsStore::load(path.clone()).await.unwrap();
    store.update(|s| s.open_browser = false).await;
    store.save().await.unwrap();
    assert!(path.exists());

    store.reset().await.unwrap();
    assert!(!path.exists());
    assert!(store.get().await.open_browser);
}

#[cfg(unix)]
#[tokio::test]
async fn test_settings_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let store = SettingsStore::new(path.clone());
    store.save().await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600, "File should have 0600 permissions");
}
