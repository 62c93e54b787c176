// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wabot backend.

use thiserror::Error;

/// The primary error type used across all Wabot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum WabotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (instance unreachable, unexpected response shape).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Completion service errors. Never surfaced to customers; mapped to a fallback reply.
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An inbound webhook payload is missing required fields.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WabotError {
    /// Shorthand for a [`WabotError::NotFound`] error.
    pub fn not_found(entity: &str, id: &str) -> Self {
        WabotError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}
