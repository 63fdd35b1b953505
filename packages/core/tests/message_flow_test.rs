//! Integration tests for the message contract
//!
//! These tests drive `handle_message` end-to-end against a file-backed
//! libsql store: update and add mutations, refresh round trips, and
//! persistence of mutations across a dropped connection.

use std::sync::Arc;

use doclens_core::{
    config::{IntegrationConfig, StoreConfig},
    db::{ConnectionManager, DocumentStore},
    handlers::{handle_message, ADD_SUCCESS_DETAIL, UPDATE_SUCCESS_DETAIL},
    models::{Document, FieldValue, Filter},
    services::MutationService,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Test helper: seed one indicator and return a mutation service bound
/// to the same manager the seeding went through.
async fn seeded_service(
    temp_dir: &TempDir,
) -> anyhow::Result<(MutationService, Arc<ConnectionManager>, IntegrationConfig)> {
    let config = IntegrationConfig {
        store: StoreConfig {
            connection_target: temp_dir.path().to_string_lossy().into_owned(),
            auth_token: None,
            database: "lens".to_string(),
            collection: "indicators".to_string(),
        },
        title_field: "value".to_string(),
        ..IntegrationConfig::default()
    };
    let manager = Arc::new(ConnectionManager::new());

    let store = manager.ensure(&config.store).await?;
    let document = Document::from_json_object(json!({
        "_id": "doc-1",
        "value": "8.8.8.8",
        "severity": "low"
    }))?;
    store.insert_one(document).await?;

    let service = MutationService::new(Arc::clone(&manager), config.clone());
    Ok((service, manager, config))
}

/// Test helper: value of the named field inside a serialized tree.
fn field_value<'a>(tree: &'a Value, name: &str) -> &'a Value {
    tree["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["displayName"] == name)
        .unwrap_or_else(|| panic!("field '{}' not in tree: {}", name, tree))
        .get("value")
        .unwrap()
}

// ============================================================================
// Update and Refresh
// ============================================================================

#[tokio::test]
async fn test_update_sequence_round_trips_through_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _manager, _config) = seeded_service(&temp_dir).await.unwrap();

    let payload = json!({
        "action": "UPDATE_FIELD",
        "id": "doc-1",
        "key": "severity",
        "value": "critical"
    });
    let response = handle_message(&service, payload).await.unwrap();

    assert_eq!(response["detail"], UPDATE_SUCCESS_DETAIL);
    assert_eq!(field_value(&response, "severity"), "critical");

    let refreshed = handle_message(&service, json!({"action": "REFRESH_DOCUMENT", "id": "doc-1"}))
        .await
        .unwrap();

    assert!(refreshed.get("detail").is_none());
    assert_eq!(refreshed["id"], "doc-1");
    assert_eq!(refreshed["title"], "8.8.8.8");
    assert_eq!(field_value(&refreshed, "severity"), "critical");
}

#[tokio::test]
async fn test_mutation_survives_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let (service, manager, _config) = seeded_service(&temp_dir).await.unwrap();

    let payload = json!({
        "action": "UPDATE_FIELD",
        "id": "doc-1",
        "key": "severity",
        "value": "critical"
    });
    handle_message(&service, payload).await.unwrap();

    manager.invalidate().await;

    let refreshed = handle_message(&service, json!({"action": "REFRESH_DOCUMENT", "id": "doc-1"}))
        .await
        .unwrap();

    assert_eq!(field_value(&refreshed, "severity"), "critical");
}

#[tokio::test]
async fn test_second_identical_update_reports_unmodified() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _manager, _config) = seeded_service(&temp_dir).await.unwrap();

    let first = service
        .update_field("doc-1", "severity", "critical")
        .await
        .unwrap();
    assert!(first.is_modified);

    let second = service
        .update_field("doc-1", "severity", "critical")
        .await
        .unwrap();
    assert!(!second.is_modified);

    // The unmodified pass still carries the current tree.
    let index = second.details.keys["severity"];
    assert_eq!(
        second.details.fields[index].value.as_deref(),
        Some("critical")
    );
}

// ============================================================================
// Add Field
// ============================================================================

#[tokio::test]
async fn test_added_field_lands_in_stored_document() {
    let temp_dir = TempDir::new().unwrap();
    let (service, manager, config) = seeded_service(&temp_dir).await.unwrap();

    let payload = json!({
        "action": "ADD_FIELD",
        "id": "doc-1",
        "key": "analyst_note",
        "value": "confirmed malicious"
    });
    let response = handle_message(&service, payload).await.unwrap();

    assert_eq!(response["detail"], ADD_SUCCESS_DETAIL);
    assert_eq!(field_value(&response, "analyst_note"), "confirmed malicious");

    // The raw stored body carries the new field too.
    let store = manager.ensure(&config.store).await.unwrap();
    let stored = store
        .find_one(&Filter::by_id("doc-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.get_path("analyst_note"),
        Some(&FieldValue::String("confirmed malicious".to_string()))
    );
}
