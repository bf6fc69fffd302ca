// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use waybill_config::model::StorageConfig;
use waybill_core::{
    HealthStatus, PreparedQuery, Row, SqlValue, StorageAdapter, StoreState, WaybillError,
};

use crate::database::{Database, OpenOptions};
use crate::statement::PreparedStatement;

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// SQLite-backed store adapter.
///
/// The database is opened lazily by the first operation (or an explicit
/// [`SqliteStore::ready`]). Concurrent callers await the same in-flight
/// open. If the open fails, the failure is remembered and returned to every
/// later caller without retrying.
pub struct SqliteStore {
    config: StorageConfig,
    read_only: bool,
    db: OnceCell<Result<Database, String>>,
    state: AtomicU8,
}

impl SqliteStore {
    /// Create a store for the configured file. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            read_only: false,
            db: OnceCell::new(),
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    /// Create a store that inspects an existing file without bootstrapping
    /// or writing to it. Writes fail with `Persistence`.
    pub fn read_only(config: StorageConfig) -> Self {
        Self {
            read_only: true,
            ..Self::new(config)
        }
    }

    /// Path of the database file this store manages.
    pub fn database_path(&self) -> &str {
        &self.config.database_path
    }

    /// Wait for the schema and seed data to be in place.
    pub async fn ready(&self) -> Result<&Database, WaybillError> {
        let outcome = self
            .db
            .get_or_init(|| async {
                self.state.store(INITIALIZING, Ordering::SeqCst);
                let options = OpenOptions {
                    busy_timeout: Duration::from_millis(self.config.busy_timeout_ms),
                };
                let opened = if self.read_only {
                    Database::open_read_only(&self.config.database_path, &options).await
                } else {
                    Database::open(&self.config.database_path, &options).await
                };
                match opened {
                    Ok(db) => {
                        self.state.store(READY, Ordering::SeqCst);
                        debug!(path = %self.config.database_path, "SQLite store initialized");
                        Ok(db)
                    }
                    Err(e) => {
                        self.state.store(FAILED, Ordering::SeqCst);
                        error!(path = %self.config.database_path, error = %e, "SQLite store failed to initialize");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        outcome.as_ref().map_err(|msg| WaybillError::Initialization {
            source: msg.clone().into(),
        })
    }

    /// The open database, if initialization already succeeded.
    pub fn database(&self) -> Option<&Database> {
        self.db.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Checkpoint and close the file for good, e.g. before a restore.
    pub async fn shutdown(self) -> Result<(), WaybillError> {
        if let Some(Ok(db)) = self.db.into_inner() {
            db.checkpoint().await?;
            db.close().await?;
        }
        Ok(())
    }

    /// Validate `sql` and return a concrete, cloneable statement handle.
    pub async fn prepare_statement(&self, sql: &str) -> Result<PreparedStatement, WaybillError> {
        self.ready().await?.prepare(sql).await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn state(&self) -> StoreState {
        match self.state.load(Ordering::SeqCst) {
            INITIALIZING => StoreState::Initializing,
            READY => StoreState::Ready,
            FAILED => StoreState::Failed,
            _ => StoreState::Uninitialized,
        }
    }

    async fn initialize(&self) -> Result<(), WaybillError> {
        self.ready().await.map(|_| ())
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<(), WaybillError> {
        self.ready().await?.execute(sql, params).await.map(|_| ())
    }

    async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, WaybillError> {
        self.ready().await?.insert(sql, params).await
    }

    async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, WaybillError> {
        self.ready().await?.query_one(sql, params).await
    }

    async fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, WaybillError> {
        self.ready().await?.query_all(sql, params).await
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedQuery>, WaybillError> {
        let stmt = self.prepare_statement(sql).await?;
        Ok(Box::new(stmt))
    }

    async fn health_check(&self) -> Result<HealthStatus, WaybillError> {
        let db = self.ready().await?;
        Ok(match db.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn close(&self) -> Result<(), WaybillError> {
        // Nothing to flush if the file was never opened or is read-only.
        if let Some(db) = self.database().filter(|_| !self.read_only) {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;
    use waybill_core::sql_params;

    fn store_at(path: &std::path::Path) -> SqliteStore {
        SqliteStore::new(StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        })
    }

    #[tokio::test]
    async fn lazy_init_on_first_query() {
        let dir = tempdir().unwrap();
        let store = store_at(&dir.path().join("lazy.db"));
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert!(store.database().is_none());

        let rows = store.query_all("SELECT key FROM site_settings", &[]).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(store.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_initialization() {
        let dir = tempdir().unwrap();
        let store = Arc::new(store_at(&dir.path().join("shared.db")));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.ready().await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let count = store
            .query_one("SELECT COUNT(*) AS n FROM site_settings", &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count.get_i64("n"), Some(5));
    }

    #[tokio::test]
    async fn failed_initialization_is_sticky() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.db");
        std::fs::write(&path, b"this file is not a database and never will be").unwrap();
        let store = store_at(&path);

        let first = store.ready().await.err().unwrap();
        assert!(matches!(first, WaybillError::Initialization { .. }));
        assert_eq!(store.state(), StoreState::Failed);

        // Repairing the file does not trigger a retry.
        std::fs::remove_file(&path).unwrap();
        let second = store.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(second, WaybillError::Initialization { .. }));
        assert_eq!(first.to_string(), second.to_string());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn prepare_through_trait_object() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn StorageAdapter> = Arc::new(store_at(&dir.path().join("dyn.db")));

        let stmt = store
            .prepare("SELECT value FROM site_settings WHERE key = ?1")
            .await
            .unwrap();
        let row = stmt.get(&sql_params!["primary_color"]).await.unwrap().unwrap();
        assert_eq!(row.get_str("value"), Some("#1a73e8"));
    }

    #[tokio::test]
    async fn read_only_store_reports_what_is_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inspect.db");
        let writer = store_at(&path);
        writer
            .execute("DELETE FROM site_settings WHERE key = ?1", &sql_params!["whatsapp"])
            .await
            .unwrap();
        writer.shutdown().await.unwrap();

        let reader = SqliteStore::read_only(StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        });
        let rows = reader.query_all("SELECT key FROM site_settings", &[]).await.unwrap();
        assert_eq!(rows.len(), 4);
        reader.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_and_close() {
        let dir = tempdir().unwrap();
        let store = store_at(&dir.path().join("health.db"));
        // Closing an unopened store is a no-op.
        store.close().await.unwrap();

        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }
}
