// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::WaybillConfig;

const MIN_KDF_MEMORY_COST: u32 = 8192;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &WaybillConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.admin.username.trim().is_empty() {
        fail("admin.username must not be empty".to_string());
    }

    if let Some(password) = &config.admin.password
        && password.is_empty()
    {
        fail("admin.password must not be empty when set".to_string());
    }

    if !["trace", "debug", "info", "warn", "error"].contains(&config.site.log_level.as_str()) {
        fail(format!(
            "site.log_level `{}` is not one of trace, debug, info, warn, error",
            config.site.log_level
        ));
    }

    if config.auth.kdf_memory_cost < MIN_KDF_MEMORY_COST {
        fail(format!(
            "auth.kdf_memory_cost must be at least {MIN_KDF_MEMORY_COST} (8 MiB), got {}",
            config.auth.kdf_memory_cost
        ));
    }

    if config.auth.kdf_iterations < 1 {
        fail(format!(
            "auth.kdf_iterations must be at least 1, got {}",
            config.auth.kdf_iterations
        ));
    }

    if config.auth.kdf_parallelism < 1 {
        fail(format!(
            "auth.kdf_parallelism must be at least 1, got {}",
            config.auth.kdf_parallelism
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
