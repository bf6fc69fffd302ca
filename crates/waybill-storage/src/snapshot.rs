// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-image snapshots of the database file.
//!
//! Copies go through SQLite's online backup API into a staging file in the
//! destination directory, which is then renamed over the destination. A
//! reader of the destination sees either the old file or the complete new
//! one, never a partial write.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;
use tracing::info;
use waybill_core::WaybillError;

use crate::database::classify;

/// Pages copied per backup step before yielding to writers.
const PAGES_PER_STEP: i32 = 100;
const STEP_PAUSE: Duration = Duration::from_millis(10);

fn persistence_err(e: impl std::error::Error + Send + Sync + 'static) -> WaybillError {
    WaybillError::Persistence {
        source: Box::new(e),
    }
}

fn not_found(what: &str, path: &Path) -> WaybillError {
    WaybillError::Persistence {
        source: Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{what} not found: {}", path.display()),
        )),
    }
}

/// Create an empty staging file beside `dest`.
pub(crate) fn staging_file(dest: &Path) -> Result<NamedTempFile, WaybillError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(persistence_err)?;
    tempfile::Builder::new()
        .prefix(".waybill-snapshot-")
        .suffix(".db")
        .tempfile_in(&dir)
        .map_err(persistence_err)
}

/// Atomically rename a completed staging file over `dest`.
pub(crate) fn publish(staging: NamedTempFile, dest: &Path) -> Result<(), WaybillError> {
    staging
        .persist(dest)
        .map_err(|e| persistence_err(e.error))?;
    Ok(())
}

/// Copy every page of `src` into a fresh database at `dest_path`.
pub(crate) fn copy_pages(src: &Connection, dest_path: &Path) -> rusqlite::Result<()> {
    let mut dst = Connection::open(dest_path)?;
    let backup = rusqlite::backup::Backup::new(src, &mut dst)?;
    backup.run_to_completion(PAGES_PER_STEP, STEP_PAUSE, None)?;
    Ok(())
}

/// Open `path` read-only and confirm it is a readable SQLite database.
fn open_verified(path: &Path) -> Result<Connection, WaybillError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(classify)?;
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(classify)?;
    Ok(conn)
}

/// Snapshot the database at `db_path` into `dest`. Returns bytes written.
///
/// Safe to run while another process has the database open.
pub fn write_snapshot(db_path: &Path, dest: &Path) -> Result<u64, WaybillError> {
    if !db_path.exists() {
        return Err(not_found("database", db_path));
    }

    let src = open_verified(db_path)?;
    let staging = staging_file(dest)?;
    copy_pages(&src, staging.path()).map_err(classify)?;
    publish(staging, dest)?;

    let size = std::fs::metadata(dest).map_err(persistence_err)?.len();
    info!(src = %db_path.display(), dest = %dest.display(), bytes = size, "snapshot written");
    Ok(size)
}

/// Checkpoint a WAL left beside `db_path` back into the main file, so the
/// main file alone holds every committed write.
fn fold_wal(db_path: &Path) -> Result<(), WaybillError> {
    if !sidecar_path(db_path, "-wal").exists() {
        return Ok(());
    }
    let conn = Connection::open(db_path).map_err(classify)?;
    let busy: i64 = conn
        .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| row.get(0))
        .map_err(classify)?;
    if busy != 0 {
        return Err(WaybillError::Persistence {
            source: Box::new(std::io::Error::other(format!(
                "database is in use: {}",
                db_path.display()
            ))),
        });
    }
    conn.close().map_err(|(_, e)| classify(e))?;
    Ok(())
}

/// Replace the database at `db_path` with the snapshot at `from`.
///
/// The store must not be open while restoring. Any leftover WAL is folded
/// into the current file, which is then snapshotted to
/// `<db_path>.pre-restore`. Stale WAL/SHM sidecars are removed only after
/// the restored image is in place.
pub fn restore_snapshot(db_path: &Path, from: &Path) -> Result<u64, WaybillError> {
    if !from.exists() {
        return Err(not_found("snapshot", from));
    }
    let src = open_verified(from)?;

    if db_path.exists() {
        fold_wal(db_path)?;
        let safety = pre_restore_path(db_path);
        write_snapshot(db_path, &safety)?;
        info!(path = %safety.display(), "pre-restore safety snapshot written");
    }

    let staging = staging_file(db_path)?;
    copy_pages(&src, staging.path()).map_err(classify)?;
    drop(src);

    publish(staging, db_path)?;
    for sidecar in ["-wal", "-shm"] {
        let path = sidecar_path(db_path, sidecar);
        if path.exists() {
            std::fs::remove_file(&path).map_err(persistence_err)?;
        }
    }

    let size = std::fs::metadata(db_path).map_err(persistence_err)?.len();
    info!(from = %from.display(), dest = %db_path.display(), bytes = size, "snapshot restored");
    Ok(size)
}

/// Where [`restore_snapshot`] keeps the image it replaced.
pub fn pre_restore_path(db_path: &Path) -> PathBuf {
    sidecar_path(db_path, ".pre-restore")
}

fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
