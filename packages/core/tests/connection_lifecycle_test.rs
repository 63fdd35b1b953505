//! Integration tests for the store connection lifecycle
//!
//! These tests exercise `ConnectionManager` end-to-end against real
//! libsql databases: lazy connect on first use, handle reuse across
//! calls, coalescing of concurrent connect attempts, and recovery
//! after a failed attempt.

use std::sync::Arc;

use doclens_core::{
    config::StoreConfig,
    db::{ConnectionError, ConnectionManager, ConnectionState, DocumentStore, StoreError},
    models::{Document, FieldValue, Filter},
};
use tempfile::TempDir;

/// Test helper: store config pointing at a database directory inside
/// the given temp dir.
fn local_config(temp_dir: &TempDir) -> StoreConfig {
    StoreConfig {
        connection_target: temp_dir.path().to_string_lossy().into_owned(),
        auth_token: None,
        database: "lens".to_string(),
        collection: "documents".to_string(),
    }
}

// ============================================================================
// Lazy Connect
// ============================================================================

#[tokio::test]
async fn test_manager_connects_on_first_use() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConnectionManager::new();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    let store = manager.ensure(&local_config(&temp_dir)).await.unwrap();

    assert_eq!(manager.state(), ConnectionState::Connected);
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_local_target_creates_database_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir);
    let manager = ConnectionManager::new();

    manager.ensure(&config).await.unwrap();

    let db_path = temp_dir.path().join("lens.db");
    assert!(
        db_path.exists(),
        "expected database file at {}",
        db_path.display()
    );
}

// ============================================================================
// Handle Reuse
// ============================================================================

#[tokio::test]
async fn test_repeated_ensure_reuses_verified_handle() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir);
    let manager = ConnectionManager::new();

    let first = manager.ensure(&config).await.unwrap();
    let second = manager.ensure(&config).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_concurrent_ensure_calls_share_one_connection() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir);
    let manager = Arc::new(ConnectionManager::new());

    let first_task = tokio::spawn({
        let manager = Arc::clone(&manager);
        let config = config.clone();
        async move { manager.ensure(&config).await }
    });
    let second_task = tokio::spawn({
        let manager = Arc::clone(&manager);
        let config = config.clone();
        async move { manager.ensure(&config).await }
    });

    let first = first_task.await.unwrap().unwrap();
    let second = second_task.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_invalidate_forces_fresh_connection() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir);
    let manager = ConnectionManager::new();

    let first = manager.ensure(&config).await.unwrap();
    manager.invalidate().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    let second = manager.ensure(&config).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(manager.state(), ConnectionState::Connected);
}

// ============================================================================
// Failure Recovery
// ============================================================================

#[tokio::test]
async fn test_failed_connect_leaves_manager_disconnected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = local_config(&temp_dir);
    config.collection = "bad name; drop".to_string();
    let manager = ConnectionManager::new();

    let result = manager.ensure(&config).await;

    match result {
        Err(ConnectionError::Open(StoreError::InvalidCollection { name })) => {
            assert_eq!(name, "bad name; drop");
        }
        other => panic!("expected invalid collection error, got {:?}", other),
    }
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_manager_recovers_after_failed_attempt() {
    let temp_dir = TempDir::new().unwrap();
    let good = local_config(&temp_dir);
    let mut bad = good.clone();
    bad.collection = "no spaces allowed".to_string();
    let manager = ConnectionManager::new();

    assert!(manager.ensure(&bad).await.is_err());
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    let store = manager.ensure(&good).await.unwrap();

    assert_eq!(manager.state(), ConnectionState::Connected);
    store.ping().await.unwrap();
}

// ============================================================================
// Durability Across Reconnects
// ============================================================================

#[tokio::test]
async fn test_reconnect_sees_previously_written_documents() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir);
    let manager = ConnectionManager::new();

    let store = manager.ensure(&config).await.unwrap();
    let mut document = Document::new();
    document.insert("_id", FieldValue::String("ind-1".to_string()));
    document.insert("value", FieldValue::String("8.8.8.8".to_string()));
    store.insert_one(document).await.unwrap();

    manager.invalidate().await;

    let store = manager.ensure(&config).await.unwrap();
    let found = store.find_one(&Filter::by_id("ind-1")).await.unwrap();

    let found = found.unwrap();
    assert_eq!(
        found.get_path("value"),
        Some(&FieldValue::String("8.8.8.8".to_string()))
    );
}
