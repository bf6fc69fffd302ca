// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waybill backup` and `waybill restore` command implementation.
//!
//! Both run offline against the database file, using SQLite's online backup
//! API, so `backup` is safe while the site is serving requests. `restore`
//! must only run while the site is stopped.

use std::path::{Path, PathBuf};

use waybill_core::WaybillError;
use waybill_storage::snapshot;

/// Default backup file name for the given moment, e.g. `logistic-20261018-221503.db`.
pub fn default_backup_name(now: chrono::DateTime<chrono::Local>) -> PathBuf {
    PathBuf::from(format!("logistic-{}.db", now.format("%Y%m%d-%H%M%S")))
}

/// Copy the database at `db_path` to `backup_path`.
///
/// If `backup_path` is an existing directory, a timestamped file is created
/// inside it.
pub fn run_backup(db_path: &Path, backup_path: &Path) -> Result<PathBuf, WaybillError> {
    let dest = if backup_path.is_dir() {
        backup_path.join(default_backup_name(chrono::Local::now()))
    } else {
        backup_path.to_path_buf()
    };

    let bytes = snapshot::write_snapshot(db_path, &dest)?;
    let size_mb = bytes as f64 / (1024.0 * 1024.0);
    eprintln!("Backup complete: {size_mb:.1} MB written to {}", dest.display());
    Ok(dest)
}

/// Replace the database at `db_path` with the backup at `restore_from`.
pub fn run_restore(db_path: &Path, restore_from: &Path) -> Result<(), WaybillError> {
    let bytes = snapshot::restore_snapshot(db_path, restore_from)?;
    let size_mb = bytes as f64 / (1024.0 * 1024.0);
    eprintln!(
        "Restore complete: {size_mb:.1} MB restored from {} (previous copy at {})",
        restore_from.display(),
        snapshot::pre_restore_path(db_path).display()
    );
    Ok(())
}
