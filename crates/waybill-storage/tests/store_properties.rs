// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavioral properties of the SQLite store, exercised through the
//! `StorageAdapter` trait the rest of the site uses.

use std::path::Path;

use tempfile::tempdir;
use waybill_config::model::StorageConfig;
use waybill_core::{sql_params, StorageAdapter, StoreState, WaybillError};
use waybill_storage::{queries, schema, snapshot, SqliteStore};

fn store_at(path: &Path) -> SqliteStore {
    SqliteStore::new(StorageConfig {
        database_path: path.to_string_lossy().into_owned(),
        ..StorageConfig::default()
    })
}

async fn settings_count(store: &dyn StorageAdapter) -> i64 {
    store
        .query_one("SELECT COUNT(*) AS n FROM site_settings", &[])
        .await
        .unwrap()
        .unwrap()
        .get_i64("n")
        .unwrap()
}

#[tokio::test]
async fn initialization_is_idempotent_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logistic.db");

    let first = store_at(&path);
    first.initialize().await.unwrap();
    first.initialize().await.unwrap();
    first.close().await.unwrap();
    drop(first);

    let second = store_at(&path);
    second.initialize().await.unwrap();
    assert_eq!(second.state(), StoreState::Ready);

    let tables = second
        .query_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[],
        )
        .await
        .unwrap();
    let names: Vec<_> = tables.iter().map(|r| r.text("name")).collect();
    assert_eq!(
        names,
        vec!["messages", "services", "shipments", "site_settings", "users"]
    );
    assert_eq!(settings_count(&second).await, 5);
}

#[tokio::test]
async fn seeds_exactly_the_default_keys_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logistic.db");

    let store = store_at(&path);
    let map = queries::settings::all(&store).await.unwrap();
    let mut expected: Vec<_> = schema::DEFAULT_SETTINGS.iter().map(|(k, _)| *k).collect();
    expected.sort_unstable();
    assert_eq!(map.keys().map(String::as_str).collect::<Vec<_>>(), expected);

    // Drop every default but one; a reopen must not top the table back up.
    store
        .execute("DELETE FROM site_settings WHERE key <> ?1", &sql_params!["site_name"])
        .await
        .unwrap();
    store.close().await.unwrap();
    drop(store);

    let reopened = store_at(&path);
    assert_eq!(settings_count(&reopened).await, 1);
}

#[tokio::test]
async fn unique_keys_raise_constraint_violation() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir.path().join("logistic.db"));

    store
        .execute(
            "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
            &sql_params!["admin", "hash", "admin"],
        )
        .await
        .unwrap();
    let err = store
        .execute(
            "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
            &sql_params!["admin", "other", "user"],
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, WaybillError::ConstraintViolation { .. }),
        "got {err:?}"
    );

    store
        .execute(
            "INSERT INTO shipments (tracking_number, status) VALUES (?1, ?2)",
            &sql_params!["GH777", "Pending"],
        )
        .await
        .unwrap();
    let err = store
        .execute(
            "INSERT INTO shipments (tracking_number, status) VALUES (?1, ?2)",
            &sql_params!["GH777", "Held"],
        )
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "got {err:?}");

    // The failed write left the original row alone.
    let row = store
        .query_one(
            "SELECT status FROM shipments WHERE tracking_number = ?1",
            &sql_params!["GH777"],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get_str("status"), Some("Pending"));
}

#[tokio::test]
async fn missing_rows_are_none_not_errors() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir.path().join("logistic.db"));

    let row = store
        .query_one(
            "SELECT * FROM shipments WHERE tracking_number = ?1",
            &sql_params!["NOPE"],
        )
        .await
        .unwrap();
    assert!(row.is_none());

    let rows = store
        .query_all("SELECT * FROM messages", &[])
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn acknowledged_writes_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logistic.db");

    let store = store_at(&path);
    store
        .execute(
            "UPDATE site_settings SET value = ?1 WHERE key = ?2",
            &sql_params!["Accra", "address"],
        )
        .await
        .unwrap();
    drop(store);

    let fresh = store_at(&path);
    assert_eq!(
        queries::settings::get(&fresh, "address").await.unwrap().as_deref(),
        Some("Accra")
    );
}

#[tokio::test]
async fn upsert_keeps_one_row_with_latest_value() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir.path().join("logistic.db"));
    let upsert = "INSERT INTO site_settings (key, value) VALUES (?1, ?2) \
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value";

    store
        .execute(upsert, &sql_params!["whatsapp", "+233 24 000 0001"])
        .await
        .unwrap();
    store
        .execute(upsert, &sql_params!["whatsapp", "+233 24 000 0002"])
        .await
        .unwrap();

    let rows = store
        .query_all(
            "SELECT value FROM site_settings WHERE key = ?1",
            &sql_params!["whatsapp"],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("value"), Some("+233 24 000 0002"));
}

#[tokio::test]
async fn tracking_lookup_scenario() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir.path().join("logistic.db"));

    store
        .execute(
            "INSERT INTO shipments (tracking_number, sender_name, receiver_name, status, origin, destination) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            &sql_params!["GH12345", "Kofi", "Akua", "In Transit", "Accra", "Tamale"],
        )
        .await
        .unwrap();

    let found = store
        .query_one(
            "SELECT * FROM shipments WHERE tracking_number = ?1",
            &sql_params!["GH12345"],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get_str("status"), Some("In Transit"));

    let missing = store
        .query_one(
            "SELECT * FROM shipments WHERE tracking_number = ?1",
            &sql_params!["GH00000"],
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn online_snapshot_then_restore() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logistic.db");
    let backup = dir.path().join("backups").join("nightly.db");

    let store = store_at(&path);
    queries::settings::upsert(&store, "site_name", "Before Backup")
        .await
        .unwrap();
    store.ready().await.unwrap().snapshot_to(&backup).await.unwrap();

    queries::settings::upsert(&store, "site_name", "After Backup")
        .await
        .unwrap();
    store.shutdown().await.unwrap();

    snapshot::restore_snapshot(&path, &backup).unwrap();
    assert!(snapshot::pre_restore_path(&path).exists());

    let restored = store_at(&path);
    assert_eq!(
        queries::settings::get(&restored, "site_name")
            .await
            .unwrap()
            .as_deref(),
        Some("Before Backup")
    );
}
