// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User accounts for the Waybill logistics site.
//!
//! Passwords are stored as Argon2id PHC strings with a random per-user salt.
//! Accounts live in the store's `users` table.

pub mod accounts;
pub mod password;
pub mod prompt;

pub use accounts::{authenticate, ensure_admin, register};
pub use password::{generate_password, PasswordHashing};
