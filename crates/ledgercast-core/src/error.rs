//! Centralized error types for Ledgercast.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Ledgercast operations.
#[derive(Error, Debug)]
pub enum LedgercastError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Send timed out after {0:?}")]
    SendTimeout(Duration),
}

/// Result type for Ledgercast operations.
pub type LedgercastResult<T> = Result<T, LedgercastError>;

impl LedgercastError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a send error.
    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }
}
