// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waybill doctor` command implementation.
//!
//! Runs diagnostic checks against the configured database file and prints a
//! pass/warn/fail report.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use waybill_config::model::WaybillConfig;
use waybill_core::{HealthStatus, StorageAdapter, WaybillError};
use waybill_storage::queries::{settings, users};
use waybill_storage::{schema, SqliteStore};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `waybill doctor` command. With `plain`, disables colored output.
///
/// Returns the number of failed checks.
pub async fn run_doctor(config: &WaybillConfig, plain: bool) -> Result<usize, WaybillError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  waybill doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(fail_count)
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    match (&result.status, use_color) {
        (CheckStatus::Pass, true) => format!(
            "    {} {:<20} {} ({duration_ms}ms)",
            "✓".green(),
            result.name,
            result.message
        ),
        (CheckStatus::Warn, true) => format!(
            "    {} {:<20} {} ({duration_ms}ms)",
            "!".yellow(),
            result.name,
            result.message.yellow()
        ),
        (CheckStatus::Fail, true) => format!(
            "    {} {:<20} {} ({duration_ms}ms)",
            "✗".red(),
            result.name,
            result.message.red()
        ),
        (CheckStatus::Pass, false) => format!(
            "    [OK]   {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        ),
        (CheckStatus::Warn, false) => format!(
            "    [WARN] {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        ),
        (CheckStatus::Fail, false) => format!(
            "    [FAIL] {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        ),
    }
}

/// Run every check. A missing database file skips the checks that need one.
pub async fn collect_checks(config: &WaybillConfig) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let db_path = Path::new(&config.storage.database_path);

    let start = Instant::now();
    if !db_path.exists() {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!(
                "not found: {} (run `waybill init` to create it)",
                db_path.display()
            ),
            start,
        ));
        return results;
    }

    let store = SqliteStore::read_only(config.storage.clone());
    match store.health_check().await {
        Ok(HealthStatus::Healthy) => results.push(CheckResult::new(
            "Database",
            CheckStatus::Pass,
            "connected",
            start,
        )),
        Ok(HealthStatus::Unhealthy(msg)) => {
            results.push(CheckResult::new("Database", CheckStatus::Fail, msg, start));
            return results;
        }
        Err(e) => {
            results.push(CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            ));
            return results;
        }
    }

    results.push(check_integrity(&store).await);
    results.push(check_settings(&store).await);
    results.push(check_admin(&store, &config.admin.username).await);
    results
}

async fn check_integrity(store: &SqliteStore) -> CheckResult {
    let start = Instant::now();
    let db = match store.ready().await {
        Ok(db) => db,
        Err(e) => return CheckResult::new("DB integrity", CheckStatus::Fail, e.to_string(), start),
    };
    match db.integrity_check().await {
        Ok(problems) if problems.is_empty() => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(problems) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} problem(s): {}", problems.len(), problems[0]),
            start,
        ),
        Err(e) => CheckResult::new("DB integrity", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_settings(store: &SqliteStore) -> CheckResult {
    let start = Instant::now();
    match settings::all(store).await {
        Ok(map) => {
            let missing: Vec<&str> = schema::DEFAULT_SETTINGS
                .iter()
                .map(|(key, _)| *key)
                .filter(|key| !map.contains_key(*key))
                .collect();
            if missing.is_empty() {
                CheckResult::new(
                    "Site settings",
                    CheckStatus::Pass,
                    format!("{} keys", map.len()),
                    start,
                )
            } else {
                CheckResult::new(
                    "Site settings",
                    CheckStatus::Warn,
                    format!("missing: {}", missing.join(", ")),
                    start,
                )
            }
        }
        Err(e) => CheckResult::new("Site settings", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_admin(store: &SqliteStore, username: &str) -> CheckResult {
    let start = Instant::now();
    match users::find_by_username(store, username).await {
        Ok(Some(user)) if user.is_admin() => {
            CheckResult::new("Admin account", CheckStatus::Pass, username.to_string(), start)
        }
        Ok(Some(_)) => CheckResult::new(
            "Admin account",
            CheckStatus::Warn,
            format!("{username} exists but is not an admin"),
            start,
        ),
        Ok(None) => CheckResult::new(
            "Admin account",
            CheckStatus::Warn,
            format!("{username} not found (run `waybill init`)"),
            start,
        ),
        Err(e) => CheckResult::new("Admin account", CheckStatus::Fail, e.to_string(), start),
    }
}
