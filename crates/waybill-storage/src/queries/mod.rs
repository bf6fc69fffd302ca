// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.
//!
//! Every function takes any [`StorageAdapter`](waybill_core::StorageAdapter),
//! so the same code runs against the SQLite store and against test doubles.

use std::future::Future;

use tracing::error;
use waybill_core::WaybillError;

pub mod messages;
pub mod services;
pub mod settings;
pub mod shipments;
pub mod users;

/// Await a read for a public page, degrading a failure to an empty value.
///
/// The error is logged, never swallowed silently.
pub async fn best_effort<T, F>(what: &str, read: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, WaybillError>>,
{
    match read.await {
        Ok(value) => value,
        Err(e) => {
            error!(what, error = %e, "read failed, serving empty result");
            T::default()
        }
    }
}
