// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User accounts. Rows are created but never deleted.

use waybill_core::{sql_params, StorageAdapter, User, WaybillError};

/// Insert a user. A taken username is a `ConstraintViolation`.
pub async fn create(
    store: &dyn StorageAdapter,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<i64, WaybillError> {
    store
        .insert(
            "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
            &sql_params![username, password_hash, role],
        )
        .await
}

pub async fn find_by_username(
    store: &dyn StorageAdapter,
    username: &str,
) -> Result<Option<User>, WaybillError> {
    store
        .query_one(
            "SELECT id, username, password, role FROM users WHERE username = ?1",
            &sql_params![username],
        )
        .await?
        .map(User::try_from)
        .transpose()
}

pub async fn count(store: &dyn StorageAdapter) -> Result<i64, WaybillError> {
    let row = store
        .query_one("SELECT COUNT(*) AS n FROM users", &[])
        .await?
        .ok_or_else(|| WaybillError::Internal("COUNT(*) returned no row".into()))?;
    row.require_i64("n")
}

/// All users ordered by id.
pub async fn list(store: &dyn StorageAdapter) -> Result<Vec<User>, WaybillError> {
    store
        .query_all(
            "SELECT id, username, password, role FROM users ORDER BY id",
            &[],
        )
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}
