// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./waybill.toml` > `~/.config/waybill/waybill.toml` > `/etc/waybill/waybill.toml`
//! with environment variable overrides via `WAYBILL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WaybillConfig;

pub(crate) const LOCAL_CONFIG: &str = "waybill.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/waybill/waybill.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waybill/waybill.toml`
/// 3. `~/.config/waybill/waybill.toml`
/// 4. `./waybill.toml`
/// 5. `WAYBILL_*` environment variables
pub fn load_config() -> Result<WaybillConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WaybillConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaybillConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WaybillConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaybillConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WaybillConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("waybill").join(LOCAL_CONFIG))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `WAYBILL_STORAGE_DATABASE_PATH`
/// must map to `storage.database_path`, not `storage.database.path`. Figment
/// hands the mapper the key as written, so it is lowercased first.
fn env_provider() -> Env {
    Env::prefixed("WAYBILL_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("site_", "site.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("admin_", "admin.", 1)
            .replacen("auth_", "auth.", 1);
        mapped.into()
    })
}
