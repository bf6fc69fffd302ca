// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Waybill logistics site.
//!
//! This crate provides the error taxonomy, SQL value and row types, entity
//! records, and the storage trait shared by the store adapter and every
//! caller that issues queries against it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WaybillError;
pub use traits::{PreparedQuery, StorageAdapter};
pub use types::{
    HealthStatus, Message, NewShipment, Row, Service, Shipment, ShipmentStatus, SqlValue,
    StoreState, User, QUOTE_SUBJECT,
};
