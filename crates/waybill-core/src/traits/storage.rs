// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the embedded relational store.

use async_trait::async_trait;

use crate::error::WaybillError;
use crate::types::{HealthStatus, Row, SqlValue, StoreState};

/// Uniform async query interface over the site's single database file.
///
/// Every operation waits for the store to be ready before touching the
/// engine. Mutations resolve only once the change is durable.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Human-readable name of the backend.
    fn name(&self) -> &str;

    /// Current position in the initialization lifecycle.
    fn state(&self) -> StoreState;

    /// Resolves once the schema and seed data are in place.
    ///
    /// Concurrent callers share one in-flight initialization. A failed
    /// initialization is reported to every later caller.
    async fn initialize(&self) -> Result<(), WaybillError>;

    /// Runs a mutating statement (insert, update, delete, DDL).
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<(), WaybillError>;

    /// Runs an insert and returns the rowid of the new row.
    async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, WaybillError>;

    /// Returns the first row of a read, or `None` when nothing matched.
    async fn query_one(&self, sql: &str, params: &[SqlValue])
    -> Result<Option<Row>, WaybillError>;

    /// Returns all rows of a read in engine order. Empty when nothing matched.
    async fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, WaybillError>;

    /// Validates `sql` once and returns a handle for repeated use.
    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedQuery>, WaybillError>;

    /// Checks that the engine answers a trivial query.
    async fn health_check(&self) -> Result<HealthStatus, WaybillError>;

    /// Flushes pending engine state before process exit.
    async fn close(&self) -> Result<(), WaybillError>;
}

/// A statement bound to one SQL text, reusable with different parameters.
#[async_trait]
pub trait PreparedQuery: Send + Sync {
    /// The statement text this handle was prepared from.
    fn sql(&self) -> &str;

    /// Same semantics as [`StorageAdapter::execute`].
    async fn run(&self, params: &[SqlValue]) -> Result<(), WaybillError>;

    /// Same semantics as [`StorageAdapter::query_one`].
    async fn get(&self, params: &[SqlValue]) -> Result<Option<Row>, WaybillError>;
}
