// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition via the WAYBILL_ADMIN_PASSWORD environment variable
//! or an interactive TTY prompt.

use std::io::IsTerminal;

use secrecy::{ExposeSecret, SecretString};
use waybill_core::WaybillError;

/// The environment variable consulted before prompting.
pub const ADMIN_PASSWORD_ENV_VAR: &str = "WAYBILL_ADMIN_PASSWORD";

fn read_line(label: &str) -> Result<String, WaybillError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map_err(|e| WaybillError::Auth(format!("failed to read password: {e}")))
}

/// Get a new account password from the environment or a confirmed prompt.
///
/// Priority:
/// 1. `WAYBILL_ADMIN_PASSWORD` (headless installs, CI)
/// 2. Two TTY prompts via `rpassword` that must agree
pub fn new_password(username: &str) -> Result<SecretString, WaybillError> {
    if let Ok(value) = std::env::var(ADMIN_PASSWORD_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::stdin().is_terminal() {
        let first = SecretString::from(read_line(&format!("Password for {username}"))?);
        let second = SecretString::from(read_line("Confirm password")?);
        if first.expose_secret() != second.expose_secret() {
            return Err(WaybillError::Auth("passwords do not match".to_string()));
        }
        if first.expose_secret().is_empty() {
            return Err(WaybillError::Auth("empty password not allowed".to_string()));
        }
        return Ok(first);
    }

    Err(WaybillError::Auth(format!(
        "no password provided. Set {ADMIN_PASSWORD_ENV_VAR} or run interactively."
    )))
}
