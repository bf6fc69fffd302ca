// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Table definitions and first-run seed data.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so bootstrapping an
//! existing file is a no-op apart from the settings emptiness check.

use rusqlite::{params, Connection};

/// DDL for the five site tables, in creation order.
pub const TABLES: [(&str, &str); 5] = [
    (
        "site_settings",
        "CREATE TABLE IF NOT EXISTS site_settings (
            id INTEGER PRIMARY KEY,
            key TEXT UNIQUE,
            value TEXT
        )",
    ),
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE,
            password TEXT,
            role TEXT DEFAULT 'admin'
        )",
    ),
    (
        "services",
        "CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            description TEXT,
            image TEXT
        )",
    ),
    (
        "shipments",
        "CREATE TABLE IF NOT EXISTS shipments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_number TEXT UNIQUE,
            sender_name TEXT,
            receiver_name TEXT,
            status TEXT,
            origin TEXT,
            destination TEXT,
            current_location TEXT,
            estimated_delivery TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "messages",
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            email TEXT,
            subject TEXT,
            message TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
];

/// Settings written into an empty `site_settings` table.
pub const DEFAULT_SETTINGS: [(&str, &str); 5] = [
    ("site_name", "Ghana Logistics"),
    ("contact_email", "info@ghanalogistics.com"),
    ("contact_phone", "+233 20 000 0000"),
    ("address", "Accra, Ghana"),
    ("primary_color", "#1a73e8"),
];

/// Create missing tables and seed default settings if none exist.
///
/// Runs in one transaction. Returns the number of settings rows inserted
/// (zero when the table already had rows).
pub fn bootstrap(conn: &mut Connection) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;

    for (_, ddl) in TABLES {
        tx.execute(ddl, [])?;
    }

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM site_settings", [], |row| row.get(0))?;
    let mut seeded = 0;
    if existing == 0 {
        let mut stmt = tx.prepare("INSERT INTO site_settings (key, value) VALUES (?1, ?2)")?;
        for (key, value) in DEFAULT_SETTINGS {
            seeded += stmt.execute(params![key, value])?;
        }
    }

    tx.commit()?;
    Ok(seeded)
}
