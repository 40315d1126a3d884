//! Status store tests

use std::sync::Arc;

use deploywatch::models::status::{all_terminal, EntryStatus, StatusUpdate};
use deploywatch::storage::status_store::StatusStore;

#[tokio::test]
async fn test_update_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    let store = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");

    store
        .update("4242", &StatusUpdate::status(EntryStatus::Initializing).with_progress(0))
        .await;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entries = raw.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["productId"], "4242");
    assert_eq!(entries[0]["slug"], "gift-cards");
    assert_eq!(entries[0]["version"], "1.4.0");
    assert_eq!(entries[0]["status"], "initializing");
    assert!(entries[0]["startTime"].is_string());
    assert!(entries[0]["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_update_merges_same_product() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    let store = StatusStore::new(Some(path), "gift-cards", "1.4.0");

    store
        .update(
            "4242",
            &StatusUpdate::status(EntryStatus::Remote("processing".into())).with_progress(40),
        )
        .await;
    let first = store.read_entry("4242").await.unwrap();

    store
        .update("4242", &StatusUpdate::status(EntryStatus::Success).with_progress(100))
        .await;

    let entries = store.read_all().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Success);
    assert_eq!(entries[0].progress, 100);
    assert_eq!(entries[0].start_time, first.start_time);
    assert!(entries[0].last_update >= first.last_update);
}

#[tokio::test]
async fn test_update_leaves_other_products_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    let a = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");
    let b = StatusStore::new(Some(path.clone()), "bookings", "2.0.0");

    a.update("1", &StatusUpdate::status(EntryStatus::Failed)).await;
    b.update("2", &StatusUpdate::status(EntryStatus::Initializing)).await;
    b.update("2", &StatusUpdate::status(EntryStatus::Timeout).with_progress(50))
        .await;

    let entries = a.read_all().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].product_id, "1");
    assert_eq!(entries[0].status, EntryStatus::Failed);
    assert_eq!(entries[1].slug, "bookings");
    assert_eq!(entries[1].status, EntryStatus::Timeout);
    assert!(all_terminal(&entries));
}

#[tokio::test]
async fn test_invalid_json_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let store = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");
    assert!(store.read_all().await.is_empty());

    store
        .update("4242", &StatusUpdate::status(EntryStatus::Error).with_error("boom"))
        .await;

    let entries = store.read_all().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_file_is_pretty_printed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    let store = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");

    store
        .update("4242", &StatusUpdate::status(EntryStatus::Initializing))
        .await;

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("[\n  {\n    \"productId\": \"4242\""));
    let slug = contents.find("\"slug\"").unwrap();
    let last_update = contents.find("\"lastUpdate\"").unwrap();
    assert!(slug < last_update);
}

#[tokio::test]
async fn test_merge_keeps_fields_written_by_other_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    std::fs::write(&path, r#"[{"productId": "7", "pid": 999}]"#).unwrap();

    let store = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");
    store
        .update("7", &StatusUpdate::status(EntryStatus::Error).with_error("x"))
        .await;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw[0];
    assert_eq!(entry["pid"], 999);
    assert_eq!(entry["status"], "error");
    assert_eq!(entry["error"], "x");
    assert_eq!(entry["slug"], "gift-cards");
    assert!(entry["startTime"].is_string());
    assert!(entry["lastUpdate"].is_string());

    let parsed = store.read_entry("7").await.unwrap();
    assert_eq!(parsed.extra.get("pid"), Some(&serde_json::json!(999)));
}

#[tokio::test]
async fn test_merge_keeps_start_time_of_unusual_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deploy-status.json");
    std::fs::write(
        &path,
        r#"[{"productId": "7", "slug": "bookings", "progress": 12.5,
             "startTime": "2026-01-01T00:00:00Z", "pid": 999}]"#,
    )
    .unwrap();

    let store = StatusStore::new(Some(path.clone()), "gift-cards", "1.4.0");
    store
        .update("7", &StatusUpdate::status(EntryStatus::Error).with_error("x"))
        .await;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw[0];
    assert_eq!(entry["startTime"], "2026-01-01T00:00:00Z");
    assert_eq!(entry["slug"], "bookings");
    assert_eq!(entry["progress"], 12.5);
    assert_eq!(entry["pid"], 999);

    let parsed = store.read_entry("7").await.unwrap();
    assert_eq!(parsed.progress, 13);
    assert_eq!(parsed.status, EntryStatus::Error);
}

#[cfg(unix)]
#[tokio::test]
async fn test_write_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    // a directory where the file should be makes every write fail
    let path = dir.path().join("deploy-status.json");
    std::fs::create_dir(&path).unwrap();

    let store = StatusStore::new(Some(path), "gift-cards", "1.4.0");
    store
        .update("4242", &StatusUpdate::status(EntryStatus::Initializing))
        .await;
    assert!(store.read_all().await.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_concurrent_writers_keep_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = Arc::new(dir.path().join("deploy-status.json"));

    let mut handles = Vec::new();
    for i in 0..8 {
        let path = path.clone();
        handles.push(tokio::spawn(async move {
            let store = StatusStore::new(Some(path.as_ref().clone()), "plugin", "1.0.0");
            store
                .update(&i.to_string(), &StatusUpdate::status(EntryStatus::Initializing))
                .await;
            store
                .update(&i.to_string(), &StatusUpdate::status(EntryStatus::Success))
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let store = StatusStore::new(Some(path.as_ref().clone()), "plugin", "1.0.0");
    let entries = store.read_all().await;
    assert_eq!(entries.len(), 8);
    assert!(all_terminal(&entries));
}
