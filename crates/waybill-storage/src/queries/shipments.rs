// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shipments and the public tracking lookup.

use waybill_core::{sql_params, NewShipment, Shipment, StorageAdapter, WaybillError};

const COLUMNS: &str = "id, tracking_number, sender_name, receiver_name, status, origin, \
                       destination, current_location, estimated_delivery, created_at";

/// Exact-match tracking lookup. `None` when the number is unknown.
pub async fn find_by_tracking_number(
    store: &dyn StorageAdapter,
    tracking_number: &str,
) -> Result<Option<Shipment>, WaybillError> {
    store
        .query_one(
            &format!("SELECT {COLUMNS} FROM shipments WHERE tracking_number = ?1"),
            &sql_params![tracking_number],
        )
        .await?
        .map(Shipment::try_from)
        .transpose()
}

/// Newest shipments first.
pub async fn list_recent(
    store: &dyn StorageAdapter,
    limit: i64,
) -> Result<Vec<Shipment>, WaybillError> {
    store
        .query_all(
            &format!(
                "SELECT {COLUMNS} FROM shipments ORDER BY created_at DESC, id DESC LIMIT ?1"
            ),
            &sql_params![limit],
        )
        .await?
        .into_iter()
        .map(Shipment::try_from)
        .collect()
}

/// Register a shipment. A reused tracking number is a `ConstraintViolation`.
pub async fn create(store: &dyn StorageAdapter, shipment: &NewShipment) -> Result<i64, WaybillError> {
    store
        .insert(
            "INSERT INTO shipments (tracking_number, sender_name, receiver_name, origin, \
             destination, current_location, status, estimated_delivery) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            &sql_params![
                &shipment.tracking_number,
                &shipment.sender_name,
                &shipment.receiver_name,
                &shipment.origin,
                &shipment.destination,
                &shipment.current_location,
                &shipment.status,
                &shipment.estimated_delivery,
            ],
        )
        .await
}

/// Record where a shipment is now and what state it is in.
/// `estimated_delivery: None` keeps the stored date.
pub async fn update_progress(
    store: &dyn StorageAdapter,
    id: i64,
    current_location: &str,
    status: &str,
    estimated_delivery: Option<&str>,
) -> Result<(), WaybillError> {
    store
        .execute(
            "UPDATE shipments SET current_location = ?1, status = ?2, \
             estimated_delivery = COALESCE(?3, estimated_delivery) WHERE id = ?4",
            &sql_params![current_location, status, estimated_delivery, id],
        )
        .await
}

pub async fn delete(store: &dyn StorageAdapter, id: i64) -> Result<(), WaybillError> {
    store
        .execute("DELETE FROM shipments WHERE id = ?1", &sql_params![id])
        .await
}
