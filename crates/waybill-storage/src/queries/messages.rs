// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact and quote submissions.

use waybill_core::{sql_params, Message, StorageAdapter, WaybillError, QUOTE_SUBJECT};

/// Store a contact-form submission.
pub async fn submit_contact(
    store: &dyn StorageAdapter,
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
) -> Result<i64, WaybillError> {
    store
        .insert(
            "INSERT INTO messages (name, email, subject, message) VALUES (?1, ?2, ?3, ?4)",
            &sql_params![name, email, subject, message],
        )
        .await
}

/// Store a quote request. Quotes are messages with a fixed subject.
pub async fn submit_quote(
    store: &dyn StorageAdapter,
    name: &str,
    email: &str,
    details: &str,
) -> Result<i64, WaybillError> {
    submit_contact(store, name, email, QUOTE_SUBJECT, details).await
}

/// Newest submissions first.
pub async fn list_recent(
    store: &dyn StorageAdapter,
    limit: i64,
) -> Result<Vec<Message>, WaybillError> {
    store
        .query_all(
            "SELECT id, name, email, subject, message, created_at FROM messages \
             ORDER BY created_at DESC, id DESC LIMIT ?1",
            &sql_params![limit],
        )
        .await?
        .into_iter()
        .map(Message::try_from)
        .collect()
}

/// Newest quote requests first.
pub async fn list_quotes(
    store: &dyn StorageAdapter,
    limit: i64,
) -> Result<Vec<Message>, WaybillError> {
    store
        .query_all(
            "SELECT id, name, email, subject, message, created_at FROM messages \
             WHERE subject = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
            &sql_params![QUOTE_SUBJECT, limit],
        )
        .await?
        .into_iter()
        .map(Message::try_from)
        .collect()
}

pub async fn delete(store: &dyn StorageAdapter, id: i64) -> Result<(), WaybillError> {
    store
        .execute("DELETE FROM messages WHERE id = ?1", &sql_params![id])
        .await
}
