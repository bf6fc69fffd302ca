// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reusable statement handles.

use std::sync::Arc;

use async_trait::async_trait;
use waybill_core::{PreparedQuery, Row, SqlValue, WaybillError};

use crate::database::Database;

/// A statement validated by [`Database::prepare`].
///
/// The compiled form lives in the connection's statement cache, so each
/// `run`/`get` reuses it instead of recompiling the text.
#[derive(Clone)]
pub struct PreparedStatement {
    db: Database,
    sql: Arc<str>,
}

impl PreparedStatement {
    pub(crate) fn new(db: Database, sql: &str) -> Self {
        Self {
            db,
            sql: Arc::from(sql),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute with `params`. Returns the number of rows changed.
    pub async fn run(&self, params: &[SqlValue]) -> Result<usize, WaybillError> {
        self.db.execute(&self.sql, params).await
    }

    /// First row produced with `params`.
    pub async fn get(&self, params: &[SqlValue]) -> Result<Option<Row>, WaybillError> {
        self.db.query_one(&self.sql, params).await
    }
}

#[async_trait]
impl PreparedQuery for PreparedStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    async fn run(&self, params: &[SqlValue]) -> Result<(), WaybillError> {
        PreparedStatement::run(self, params).await.map(|_| ())
    }

    async fn get(&self, params: &[SqlValue]) -> Result<Option<Row>, WaybillError> {
        PreparedStatement::get(self, params).await
    }
}
