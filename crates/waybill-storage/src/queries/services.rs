// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service offerings shown on the home and services pages.

use waybill_core::{sql_params, Service, StorageAdapter, WaybillError};

const COLUMNS: &str = "id, title, description, image";

/// Services in insertion order, optionally capped at `limit`.
pub async fn list(
    store: &dyn StorageAdapter,
    limit: Option<i64>,
) -> Result<Vec<Service>, WaybillError> {
    let rows = match limit {
        Some(limit) => {
            store
                .query_all(
                    &format!("SELECT {COLUMNS} FROM services ORDER BY id LIMIT ?1"),
                    &sql_params![limit],
                )
                .await?
        }
        None => {
            store
                .query_all(&format!("SELECT {COLUMNS} FROM services ORDER BY id"), &[])
                .await?
        }
    };
    rows.into_iter().map(Service::try_from).collect()
}

pub async fn get(store: &dyn StorageAdapter, id: i64) -> Result<Option<Service>, WaybillError> {
    store
        .query_one(
            &format!("SELECT {COLUMNS} FROM services WHERE id = ?1"),
            &sql_params![id],
        )
        .await?
        .map(Service::try_from)
        .transpose()
}

pub async fn create(
    store: &dyn StorageAdapter,
    title: &str,
    description: &str,
    image: Option<&str>,
) -> Result<i64, WaybillError> {
    store
        .insert(
            "INSERT INTO services (title, description, image) VALUES (?1, ?2, ?3)",
            &sql_params![title, description, image],
        )
        .await
}

/// Update a service. `image: None` keeps the current image.
pub async fn update(
    store: &dyn StorageAdapter,
    id: i64,
    title: &str,
    description: &str,
    image: Option<&str>,
) -> Result<(), WaybillError> {
    match image {
        Some(image) => {
            store
                .execute(
                    "UPDATE services SET title = ?1, description = ?2, image = ?3 WHERE id = ?4",
                    &sql_params![title, description, image, id],
                )
                .await
        }
        None => {
            store
                .execute(
                    "UPDATE services SET title = ?1, description = ?2 WHERE id = ?3",
                    &sql_params![title, description, id],
                )
                .await
        }
    }
}

/// Remove a service. Returns `false` when no service has that id.
pub async fn delete(store: &dyn StorageAdapter, id: i64) -> Result<bool, WaybillError> {
    if get(store, id).await?.is_none() {
        return Ok(false);
    }
    store
        .execute("DELETE FROM services WHERE id = ?1", &sql_params![id])
        .await?;
    Ok(true)
}
