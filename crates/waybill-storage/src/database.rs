// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, bootstrap, and the raw
//! execute/query operations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which makes [`Database`] the single writer for its file. Do NOT
//! open additional connections for writes.
//!
//! Durability comes from the engine: the file runs in WAL mode with
//! `synchronous = FULL`, and every statement autocommits, so a statement that
//! returned successfully has been fsynced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{ErrorCode, OpenFlags};
use tracing::{debug, error, info, warn};
use waybill_core::{Row, SqlValue, WaybillError};

use crate::schema;
use crate::statement::PreparedStatement;
use crate::value;

const STATEMENT_CACHE_CAPACITY: usize = 64;

/// Classify a rusqlite error into the store's error taxonomy.
pub(crate) fn classify(e: rusqlite::Error) -> WaybillError {
    let (code, extended_code, message) = match &e {
        rusqlite::Error::SqliteFailure(failure, msg) => (
            Some(failure.code),
            failure.extended_code,
            msg.clone().unwrap_or_else(|| failure.to_string()),
        ),
        other => (None, 0, other.to_string()),
    };

    match code {
        Some(ErrorCode::ConstraintViolation)
            if extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            WaybillError::ConstraintViolation { message }
        }
        Some(
            ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull
            | ErrorCode::ReadOnly
            | ErrorCode::CannotOpen
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase,
        ) => WaybillError::Persistence {
            source: Box::new(e),
        },
        _ => WaybillError::Query {
            message,
            source: Some(Box::new(e)),
        },
    }
}

/// Convert a tokio-rusqlite error into a [`WaybillError`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WaybillError {
    match e {
        tokio_rusqlite::Error::Error(inner) => classify(inner),
        other => WaybillError::Internal(format!("database connection unavailable: {other}")),
    }
}

fn init_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WaybillError {
    match e {
        tokio_rusqlite::Error::Error(inner) => WaybillError::Initialization {
            source: Box::new(inner),
        },
        other => WaybillError::Initialization {
            source: other.to_string().into(),
        },
    }
}

fn log_failure(sql: &str, err: &WaybillError) {
    match err {
        WaybillError::ConstraintViolation { message } => debug!(sql, %message, "constraint violation"),
        WaybillError::Query { message, .. } => warn!(sql, %message, "query failed"),
        other => error!(sql, error = %other, "statement failed"),
    }
}

/// Tuning knobs applied when the file is opened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub busy_timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// An open, bootstrapped database file.
///
/// Cloning is cheap and every clone shares the one background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: Arc<PathBuf>,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, create any
    /// missing tables, and seed default settings into an empty settings table.
    pub async fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self, WaybillError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WaybillError::Initialization {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| WaybillError::Initialization {
                source: Box::new(e),
            })?;

        let busy_timeout = options.busy_timeout;
        let seeded = conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                if !mode.eq_ignore_ascii_case("wal") {
                    warn!(mode, "WAL journal mode unavailable, continuing with fallback");
                }
                conn.execute_batch("PRAGMA synchronous = FULL;")?;
                conn.busy_timeout(busy_timeout)?;
                conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
                schema::bootstrap(conn)
            })
            .await
            .map_err(init_err)?;

        if seeded > 0 {
            info!(count = seeded, "seeded default site settings");
        }
        debug!(path = %path.display(), "database ready");

        Ok(Self {
            conn,
            path: Arc::new(path),
        })
    }

    /// Open an existing database without writing to it.
    ///
    /// No PRAGMAs that change the file are applied and the bootstrap does not
    /// run, so missing tables or settings stay missing.
    pub async fn open_read_only(
        path: impl AsRef<Path>,
        options: &OpenOptions,
    ) -> Result<Self, WaybillError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio_rusqlite::Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(|e| WaybillError::Initialization {
            source: Box::new(e),
        })?;

        let busy_timeout = options.busy_timeout;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })?;
            Ok(())
        })
        .await
        .map_err(init_err)?;

        debug!(path = %path.display(), "database opened read-only");
        Ok(Self {
            conn,
            path: Arc::new(path),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The shared tokio-rusqlite connection, for callers that need raw access.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run a mutating statement. Returns the number of rows changed.
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize, WaybillError> {
        let owned_sql = sql.to_string();
        let params = params.to_vec();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let mut stmt = conn.prepare_cached(&owned_sql)?;
                stmt.execute(value::bind(&params))
            })
            .await
            .map_err(map_tr_err)
            .inspect_err(|e| log_failure(sql, e))
    }

    /// Run an insert and return the rowid it produced.
    pub async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, WaybillError> {
        let owned_sql = sql.to_string();
        let params = params.to_vec();
        self.conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.prepare_cached(&owned_sql)?
                    .execute(value::bind(&params))?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)
            .inspect_err(|e| log_failure(sql, e))
    }

    /// First row of a read, or `None` for an empty result.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, WaybillError> {
        let owned_sql = sql.to_string();
        let params = params.to_vec();
        self.conn
            .call(move |conn| -> Result<Option<Row>, rusqlite::Error> {
                let mut stmt = conn.prepare_cached(&owned_sql)?;
                let columns = column_names(&stmt);
                let mut rows = stmt.query(value::bind(&params))?;
                match rows.next()? {
                    Some(row) => Ok(Some(value::read_row(row, &columns)?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(map_tr_err)
            .inspect_err(|e| log_failure(sql, e))
    }

    /// Every row of a read, in engine order.
    pub async fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, WaybillError> {
        let owned_sql = sql.to_string();
        let params = params.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<Row>, rusqlite::Error> {
                let mut stmt = conn.prepare_cached(&owned_sql)?;
                let columns = column_names(&stmt);
                let mut rows = stmt.query(value::bind(&params))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    out.push(value::read_row(row, &columns)?);
                }
                Ok(out)
            })
            .await
            .map_err(map_tr_err)
            .inspect_err(|e| log_failure(sql, e))
    }

    /// Compile `sql` into the statement cache and return a reusable handle.
    ///
    /// Malformed SQL fails here rather than on first use.
    pub async fn prepare(&self, sql: &str) -> Result<PreparedStatement, WaybillError> {
        let owned_sql = sql.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.prepare_cached(&owned_sql)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
            .inspect_err(|e| log_failure(sql, e))?;
        Ok(PreparedStatement::new(self.clone(), sql))
    }

    /// `SELECT 1` round trip through the background thread.
    pub async fn ping(&self) -> Result<(), WaybillError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// `PRAGMA integrity_check`; an empty vector means the file is sound.
    pub async fn integrity_check(&self) -> Result<Vec<String>, WaybillError> {
        let rows: Vec<String> = self
            .conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;
        Ok(rows.into_iter().filter(|r| r != "ok").collect())
    }

    /// Copy the live database to `dest` via the online backup API.
    ///
    /// The copy is written to a temporary file next to `dest` and renamed
    /// into place, so `dest` is never observed half-written.
    pub async fn snapshot_to(&self, dest: impl AsRef<Path>) -> Result<(), WaybillError> {
        let dest = dest.as_ref().to_path_buf();
        let staging = crate::snapshot::staging_file(&dest)?;
        let staging_path = staging.path().to_path_buf();

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                crate::snapshot::copy_pages(conn, &staging_path)
            })
            .await
            .map_err(map_tr_err)?;

        crate::snapshot::publish(staging, &dest)?;
        info!(dest = %dest.display(), "snapshot written");
        Ok(())
    }

    /// Fold the WAL back into the main file.
    pub async fn checkpoint(&self) -> Result<(), WaybillError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Close the underlying connection. Every clone becomes unusable.
    pub async fn close(self) -> Result<(), WaybillError> {
        self.conn
            .close()
            .await
            .map_err(|e| WaybillError::Internal(format!("failed to close database: {e}")))?;
        debug!(path = %self.path.display(), "database closed");
        Ok(())
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use waybill_core::sql_params;

    async fn open_temp() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db"), &OpenOptions::default())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("site").join("logistic.db");
        let db = Database::open(&path, &OpenOptions::default()).await.unwrap();
        assert!(path.exists(), "database file should be created");
        assert_eq!(db.path(), path.as_path());
    }

    #[tokio::test]
    async fn open_enables_wal_and_full_sync() {
        let (db, _dir) = open_temp().await;
        let (mode, sync): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let mode = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let sync = conn.query_row("PRAGMA synchronous", [], |r| r.get(0))?;
                Ok((mode, sync))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        // FULL == 2
        assert_eq!(sync, 2);
    }

    #[tokio::test]
    async fn execute_reports_changed_rows() {
        let (db, _dir) = open_temp().await;
        let changed = db
            .execute(
                "UPDATE site_settings SET value = ?1 WHERE key = ?2",
                &sql_params!["Kumasi, Ghana", "address"],
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);
    }

    #[tokio::test]
    async fn insert_returns_rowid() {
        let (db, _dir) = open_temp().await;
        let first = db
            .insert(
                "INSERT INTO services (title, description, image) VALUES (?1, ?2, ?3)",
                &sql_params!["Air Freight", "Fast", "/uploads/air.jpg"],
            )
            .await
            .unwrap();
        let second = db
            .insert(
                "INSERT INTO services (title, description, image) VALUES (?1, ?2, ?3)",
                &sql_params!["Sea Freight", "Cheap", None::<String>],
            )
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn malformed_sql_is_a_query_error() {
        let (db, _dir) = open_temp().await;
        let err = db.query_all("SELEC * FROM shipments", &[]).await.unwrap_err();
        match err {
            WaybillError::Query { message, .. } => assert!(message.contains("syntax error")),
            other => panic!("expected Query, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_table_is_a_query_error() {
        let (db, _dir) = open_temp().await;
        let err = db
            .execute("DELETE FROM parcels WHERE id = ?1", &sql_params![1_i64])
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Query { .. }));
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn prepare_rejects_bad_sql_up_front() {
        let (db, _dir) = open_temp().await;
        let err = db.prepare("INSERT INTO nowhere VALUES (?1)").await.err().unwrap();
        assert!(matches!(err, WaybillError::Query { .. }));
    }

    #[tokio::test]
    async fn integrity_check_is_clean_on_fresh_file() {
        let (db, _dir) = open_temp().await;
        assert!(db.integrity_check().await.unwrap().is_empty());
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn read_only_open_skips_bootstrap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.db");
        let db = Database::open(&path, &OpenOptions::default()).await.unwrap();
        db.execute("DELETE FROM site_settings", &[]).await.unwrap();
        db.close().await.unwrap();

        let ro = Database::open_read_only(&path, &OpenOptions::default())
            .await
            .unwrap();
        let rows = ro.query_all("SELECT key FROM site_settings", &[]).await.unwrap();
        assert!(rows.is_empty(), "read-only open must not reseed");

        let err = ro
            .execute(
                "INSERT INTO site_settings (key, value) VALUES (?1, ?2)",
                &sql_params!["site_name", "Tema Freight"],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Persistence { .. }));
    }

    #[tokio::test]
    async fn read_only_open_of_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let err = Database::open_read_only(&path, &OpenOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WaybillError::Initialization { .. }));
        assert!(!path.exists());
    }

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn io_failures_classify_as_persistence() {
        for code in [
            rusqlite::ffi::SQLITE_IOERR,
            rusqlite::ffi::SQLITE_IOERR_FSYNC,
            rusqlite::ffi::SQLITE_FULL,
            rusqlite::ffi::SQLITE_READONLY,
        ] {
            let err = classify(sqlite_failure(code));
            assert!(
                matches!(err, WaybillError::Persistence { .. }),
                "code {code} gave {err:?}"
            );
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn only_unique_and_primary_key_are_constraint_violations() {
        for code in [
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        ] {
            assert!(classify(sqlite_failure(code)).is_constraint_violation());
        }
        for code in [
            rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL,
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK,
        ] {
            let err = classify(sqlite_failure(code));
            assert!(matches!(err, WaybillError::Query { .. }), "code {code} gave {err:?}");
            assert!(!err.is_fatal());
        }
    }

    #[tokio::test]
    async fn open_on_non_database_file_fails_initialization() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, b"definitely not a sqlite file, just some bytes here ok").unwrap();
        let err = Database::open(&path, &OpenOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WaybillError::Initialization { .. }));
    }
}
