// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Waybill configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaybillConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Database file settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Bootstrap admin account.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Password hashing cost.
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("waybill").join("logistic.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("logistic.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// The admin account created by `waybill init` when it does not exist yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Initial password. When unset, `init` generates one and prints it once.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: None,
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

/// Argon2id cost parameters for password hashes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

// OWASP minimum for Argon2id: m=19 MiB, t=2, p=1.
fn default_kdf_memory_cost() -> u32 {
    19456
}

fn default_kdf_iterations() -> u32 {
    2
}

fn default_kdf_parallelism() -> u32 {
    1
}
