// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Waybill store and its callers.

use thiserror::Error;

/// The primary error type returned by the store adapter and everything built on it.
#[derive(Debug, Error)]
pub enum WaybillError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The engine failed to open or bootstrap the database file. Fatal.
    #[error("initialization error: {source}")]
    Initialization {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A unique or primary key constraint rejected the write.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// Malformed statement, unknown column, type mismatch, or other engine failure.
    #[error("query error: {message}")]
    Query {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The write could not be made durable (disk full, I/O failure, read-only file).
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Registration or login failures surfaced to the user.
    #[error("auth error: {0}")]
    Auth(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WaybillError {
    /// Shorthand for a [`WaybillError::Query`] that carries only a message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// True when the error is a uniqueness conflict the caller can turn into
    /// an "already exists" message.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    /// True for errors after which the store must not keep serving requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Initialization { .. } | Self::Persistence { .. })
    }
}
