// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded SQLite store for the Waybill logistics site.
//!
//! One database file holds site settings, users, services, shipments, and
//! contact messages. The store opens lazily, bootstraps its schema and
//! default settings once, and runs every statement through a single
//! `tokio-rusqlite` background connection in WAL mode with full fsync, so an
//! acknowledged write survives a crash.

pub mod adapter;
pub mod database;
pub mod queries;
pub mod schema;
pub mod snapshot;
pub mod statement;
mod value;

pub use adapter::SqliteStore;
pub use database::{Database, OpenOptions};
pub use statement::PreparedStatement;
