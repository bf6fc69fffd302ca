// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seam between the store and its callers.
//!
//! Both traits use `#[async_trait]` so callers can hold `&dyn StorageAdapter`.

pub mod storage;

pub use storage::{PreparedQuery, StorageAdapter};
