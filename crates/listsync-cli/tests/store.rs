//! JSON file store, on its own and behind the controller.

use std::fs;
use std::sync::Arc;

use listsync_cli::store::{JsonFileStore, StoreError};
use listsync_core::{
    FieldMap, NotificationLog, OpenOutcome, RecordService, SaveFlow, SyncOptions,
    SyncOrchestrator,
};
use listsync_model::{RecordId, RecordKind};
use listsync_schemas::SchemaCatalog;
use serde_json::{Value, json};

fn kind(name: &str) -> RecordKind {
    RecordKind::new(name).unwrap()
}

fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("store.json"));
    let records = store.fetch_collection(&kind("account")).await.unwrap();
    assert!(records.is_empty());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn created_records_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = JsonFileStore::new(&path);

    let id = store
        .create(&kind("account"), &fields(json!({"Name": "Acme", "Fax": null})))
        .await
        .unwrap();
    assert_eq!(id.as_str().len(), 36);

    let reopened = JsonFileStore::new(&path);
    let record = reopened
        .fetch_by_id(&kind("account"), &id)
        .await
        .unwrap()
        .expect("record persisted");
    assert_eq!(record.get("Name"), Some(&json!("Acme")));
    assert_eq!(record.get("Fax"), Some(&Value::Null));
    assert!(
        reopened
            .fetch_collection(&kind("contact"))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(!dir.path().join("store.json.tmp").exists());
}

#[tokio::test]
async fn update_merges_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("store.json"));
    let id = store
        .create(&kind("lead"), &fields(json!({"LastName": "Hopper", "Company": "Navy"})))
        .await
        .unwrap();

    store
        .update(&kind("lead"), &id, &fields(json!({"Company": "Harvard", "Id": "ignored"})))
        .await
        .unwrap();

    let record = store.find(&kind("lead"), &id).unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.get("LastName"), Some(&json!("Hopper")));
    assert_eq!(record.get("Company"), Some(&json!("Harvard")));
}

#[tokio::test]
async fn concurrent_creates_through_clones_all_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("store.json"));
    let other = store.clone();
    let account = kind("account");

    let (fa, fb, fc) = (
        fields(json!({"Name": "Acme"})),
        fields(json!({"Name": "Birch"})),
        fields(json!({"Name": "Cedar"})),
    );
    let (a, b, c) = tokio::join!(
        store.create(&account, &fa),
        other.create(&account, &fb),
        store.create(&account, &fc),
    );
    let ids = [a.unwrap(), b.unwrap(), c.unwrap()];

    let records = JsonFileStore::new(store.path())
        .fetch_collection(&account)
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    for id in &ids {
        assert!(records.iter().any(|record| &record.id == id));
    }
}

#[tokio::test]
async fn updating_an_unknown_record_fails_with_its_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("store.json"));
    let missing = RecordId::new("001-gone").unwrap();

    let err = store
        .modify(&kind("account"), &missing, &FieldMap::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownRecord { .. }));

    let transport = store
        .update(&kind("account"), &missing, &FieldMap::new())
        .await
        .unwrap_err();
    assert_eq!(transport.message, "account record 001-gone does not exist");
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::new(&path);

    let err = store.records(&kind("account")).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }));
    let transport = store.fetch_collection(&kind("account")).await.unwrap_err();
    assert!(transport.message.contains("is not a valid store"));
}

#[tokio::test]
async fn controller_round_trip_over_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("store.json")));
    let notes = Arc::new(NotificationLog::new());
    let schema = SchemaCatalog::builtin()
        .unwrap()
        .get(&kind("opportunity"))
        .cloned()
        .unwrap();
    let sync = SyncOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&notes),
        schema,
        SyncOptions::default(),
    );

    sync.activate().await;
    assert_eq!(sync.create_flow().await, OpenOutcome::Opened);
    let editor = sync.editor();
    editor.set_field("Name", "Renewal".into()).unwrap();
    editor.set_field("CloseDate", "2025-12-31".into()).unwrap();
    editor.set_field("StageName", "Prospecting".into()).unwrap();
    editor.set_field("Amount", "1500.50".into()).unwrap();

    let SaveFlow::Saved { id, refresh } = sync.save().await else {
        panic!("save failed: {:?}", notes.entries());
    };
    assert!(refresh.is_refreshed());
    assert_eq!(sync.snapshot().len(), 1);

    let stored = store.find(&kind("opportunity"), &id).unwrap().unwrap();
    assert_eq!(stored.get("Amount"), Some(&json!(1500.5)));
    assert_eq!(stored.get("Probability"), Some(&Value::Null));

    let messages: Vec<String> = notes.entries().iter().map(|n| n.message.clone()).collect();
    assert_eq!(messages, vec!["Opportunity created", "Refreshed"]);
}
