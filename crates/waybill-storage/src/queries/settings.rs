// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Site settings: a key/value table read on every public page.

use std::collections::BTreeMap;

use waybill_core::{sql_params, StorageAdapter, WaybillError};

const UPSERT: &str = "INSERT INTO site_settings (key, value) VALUES (?1, ?2) \
                      ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// Every setting as a key/value map.
pub async fn all(store: &dyn StorageAdapter) -> Result<BTreeMap<String, String>, WaybillError> {
    let rows = store
        .query_all("SELECT key, value FROM site_settings", &[])
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let key = row.get_str("key")?.to_string();
            Some((key, row.text("value")))
        })
        .collect())
}

/// Like [`all`], but a failed read yields an empty map.
pub async fn all_or_default(store: &dyn StorageAdapter) -> BTreeMap<String, String> {
    super::best_effort("site settings", all(store)).await
}

/// A single setting, or `None` if the key was never written.
pub async fn get(store: &dyn StorageAdapter, key: &str) -> Result<Option<String>, WaybillError> {
    let row = store
        .query_one(
            "SELECT value FROM site_settings WHERE key = ?1",
            &sql_params![key],
        )
        .await?;
    Ok(row.map(|r| r.text("value")))
}

/// Insert `key` or replace its value.
pub async fn upsert(store: &dyn StorageAdapter, key: &str, value: &str) -> Result<(), WaybillError> {
    store.execute(UPSERT, &sql_params![key, value]).await
}

/// Upsert several settings through one prepared statement.
///
/// Each pair commits on its own; a failure stops at that pair and leaves the
/// earlier ones written.
pub async fn upsert_many<K, V>(
    store: &dyn StorageAdapter,
    pairs: &[(K, V)],
) -> Result<(), WaybillError>
where
    K: AsRef<str> + Sync,
    V: AsRef<str> + Sync,
{
    let stmt = store.prepare(UPSERT).await?;
    for (key, value) in pairs {
        let (key, value): (&str, &str) = (key.as_ref(), value.as_ref());
        stmt.run(&sql_params![key, value]).await?;
    }
    Ok(())
}
