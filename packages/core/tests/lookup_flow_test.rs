//! Integration tests for the batch lookup flow
//!
//! These tests run `LookupService` end-to-end against a file-backed
//! libsql store: template substitution, filter evaluation inside the
//! database, batch ordering, and typed round trips through the
//! extended-JSON body column.

use std::sync::Arc;

use doclens_core::{
    config::{IntegrationConfig, StoreConfig},
    db::{ConnectionManager, ConnectionState, DocumentStore},
    models::{Document, Entity, FieldValue, Filter},
    services::{LookupError, LookupService},
};
use serde_json::json;
use tempfile::TempDir;

/// Test helper: integration config over a database directory inside
/// the given temp dir.
fn lens_config(temp_dir: &TempDir, query_template: &str) -> IntegrationConfig {
    IntegrationConfig {
        store: StoreConfig {
            connection_target: temp_dir.path().to_string_lossy().into_owned(),
            auth_token: None,
            database: "lens".to_string(),
            collection: "indicators".to_string(),
        },
        query_template: query_template.to_string(),
        title_field: "value".to_string(),
        summary_fields: "value,threat.severity".to_string(),
        include_field_name_in_summary: true,
        addable_fields: String::new(),
        max_concurrent_lookups: 4,
    }
}

/// Test helper: connect through the manager and insert the fixture
/// indicators.
async fn seed_indicators(
    manager: &ConnectionManager,
    config: &IntegrationConfig,
) -> anyhow::Result<()> {
    let store = manager.ensure(&config.store).await?;
    for body in [
        json!({
            "_id": "ind-1",
            "value": "8.8.8.8",
            "alias": "8.8.8.8",
            "threat": {"severity": "high", "score": 42}
        }),
        json!({
            "_id": "ind-2",
            "value": "1.1.1.1",
            "alias": "1.1.1.1",
            "threat": {"severity": "low", "score": 3}
        }),
        json!({
            "_id": "ind-3",
            "value": "2.2.2.2",
            "alias": "quad-two",
            "threat": {"severity": "low", "score": 9}
        }),
    ] {
        store.insert_one(Document::from_json_object(body)?).await?;
    }
    Ok(())
}

// ============================================================================
// Batch Ordering
// ============================================================================

#[tokio::test]
async fn test_batch_results_keep_input_order() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"value": "{{entity}}"}"#);
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let entities = vec![
        Entity::new("8.8.8.8"),
        Entity::new("9.9.9.9"),
        Entity::new("1.1.1.1"),
    ];
    let results = service.lookup(&entities).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].entity.value, "8.8.8.8");
    assert_eq!(results[1].entity.value, "9.9.9.9");
    assert_eq!(results[2].entity.value, "1.1.1.1");

    assert!(results[0].details.is_some());
    assert_eq!(
        results[0].summary,
        vec!["value: 8.8.8.8", "threat.severity: high"]
    );

    assert!(results[1].details.is_none());
    assert_eq!(
        results[1].summary,
        vec!["value: N/A", "threat.severity: N/A"]
    );

    assert!(results[2].details.is_some());
    assert_eq!(
        results[2].summary,
        vec!["value: 1.1.1.1", "threat.severity: low"]
    );
}

#[tokio::test]
async fn test_hit_details_carry_identity_only() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"value": "{{entity}}"}"#);
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let results = service.lookup(&[Entity::new("8.8.8.8")]).await.unwrap();

    let details = results[0].details.as_ref().unwrap();
    assert_eq!(details.id, "ind-1");
    assert_eq!(details.title, "8.8.8.8");
    assert!(details.fields.is_empty());
    assert!(details.keys.is_empty());
}

// ============================================================================
// Template Substitution
// ============================================================================

#[tokio::test]
async fn test_template_replaces_every_placeholder_occurrence() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(
        &temp_dir,
        r#"{"value": "{{entity}}", "alias": "{{entity}}"}"#,
    );
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let results = service
        .lookup(&[Entity::new("8.8.8.8"), Entity::new("2.2.2.2")])
        .await
        .unwrap();

    // ind-1 matches both substituted clauses; ind-3 has a different
    // alias, so its entity misses.
    assert!(results[0].details.is_some());
    assert!(results[1].details.is_none());
}

#[tokio::test]
async fn test_invalid_substituted_template_aborts_whole_batch() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"value": {{entity}}}"#);
    let manager = Arc::new(ConnectionManager::new());
    let service = LookupService::new(Arc::clone(&manager), config);

    let entities = vec![
        Entity::new("1"),
        Entity::new("not json"),
        Entity::new("2"),
    ];
    let result = service.lookup(&entities).await;

    match result {
        Err(LookupError::QueryParse { entity, .. }) => assert_eq!(entity, "not json"),
        other => panic!("expected a parse failure, got {:?}", other),
    }

    // The batch failed during parsing, so no connection was made and
    // no database file was created.
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!temp_dir.path().join("lens.db").exists());
}

// ============================================================================
// Filter Evaluation
// ============================================================================

#[tokio::test]
async fn test_filter_descends_dotted_paths() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"threat.severity": "{{entity}}"}"#);
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let results = service.lookup(&[Entity::new("high")]).await.unwrap();

    assert_eq!(results[0].details.as_ref().unwrap().id, "ind-1");
}

#[tokio::test]
async fn test_numeric_template_value_matches_numeric_field() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"threat.score": {{entity}}}"#);
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let results = service.lookup(&[Entity::new("42")]).await.unwrap();

    assert_eq!(results[0].details.as_ref().unwrap().id, "ind-1");
}

#[tokio::test]
async fn test_id_clause_matches_stored_identifier() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"_id": "{{entity}}"}"#);
    let manager = Arc::new(ConnectionManager::new());
    seed_indicators(&manager, &config).await.unwrap();
    let service = LookupService::new(Arc::clone(&manager), config);

    let results = service.lookup(&[Entity::new("ind-2")]).await.unwrap();

    assert_eq!(results[0].summary[0], "value: 1.1.1.1");
}

// ============================================================================
// Typed Round Trips
// ============================================================================

#[tokio::test]
async fn test_typed_values_survive_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = lens_config(&temp_dir, r#"{"_id": "{{entity}}"}"#);
    let manager = ConnectionManager::new();
    let store = manager.ensure(&config.store).await.unwrap();

    let document = Document::from_json_object(json!({
        "_id": "typed-1",
        "value": "t1",
        "count": {"$numberLong": "9007199254740993"},
        "score": {"$numberDouble": "0.5"},
        "first_seen": {"$date": "2023-09-08T12:30:00Z"},
        "payload": {"$binary": "deadbeef"}
    }))
    .unwrap();
    store.insert_one(document).await.unwrap();

    let found = store
        .find_one(&Filter::by_id("typed-1"))
        .await
        .unwrap()
        .unwrap();

    // 2^53 + 1 is not representable as f64, so surviving intact means
    // the value stayed an Int64 through the body column.
    assert_eq!(
        found.get_path("count"),
        Some(&FieldValue::Int64(9007199254740993))
    );
    assert_eq!(found.get_path("score"), Some(&FieldValue::Double(0.5)));
    assert!(matches!(
        found.get_path("first_seen"),
        Some(FieldValue::DateTime(_))
    ));
    assert_eq!(
        found.get_path("first_seen").unwrap().display_text(),
        "2023-09-08T12:30:00.000Z"
    );
    assert_eq!(
        found.get_path("payload"),
        Some(&FieldValue::Binary(vec![0xde, 0xad, 0xbe, 0xef]))
    );
}

#[tokio::test]
async fn test_tagged_summary_fields_render_canonical_text() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = lens_config(&temp_dir, r#"{"_id": "{{entity}}"}"#);
    config.summary_fields = "first_seen,count".to_string();
    let manager = Arc::new(ConnectionManager::new());

    let store = manager.ensure(&config.store).await.unwrap();
    let document = Document::from_json_object(json!({
        "_id": "typed-2",
        "value": "t2",
        "count": {"$numberLong": "12"},
        "first_seen": {"$date": "2023-09-08T12:30:00Z"}
    }))
    .unwrap();
    store.insert_one(document).await.unwrap();

    let service = LookupService::new(Arc::clone(&manager), config);
    let results = service.lookup(&[Entity::new("typed-2")]).await.unwrap();

    assert_eq!(
        results[0].summary,
        vec!["first_seen: 2023-09-08T12:30:00.000Z", "count: 12"]
    );
}
