// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tether chat bot.

use thiserror::Error;

/// The primary error type used across all Tether collaborator traits.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// User storage errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, polling failure, closed inbound stream).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Identity provider errors (code exchange, claim extraction).
    #[error("identity error: {message}")]
    Identity {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TetherError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TetherError::Storage {
            source: Box::new(err),
        }
    }

    /// Builds an identity failure without an underlying source.
    pub fn identity(message: impl Into<String>) -> Self {
        TetherError::Identity {
            message: message.into(),
            source: None,
        }
    }
}
