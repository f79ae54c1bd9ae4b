//! Server and broadcast configuration.

use std::time::Duration;

use axum::http::HeaderValue;
use ledgercast_core::{LedgercastError, LedgercastResult};

/// Default push period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound on a single client send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Listener and cross-origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to connect. Empty, or a `*` entry, means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse the origin allow-list into header values.
    pub fn origin_header_values(&self) -> LedgercastResult<Vec<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim()).map_err(|_| {
                    LedgercastError::config(format!("invalid allowed origin '{}'", origin))
                })
            })
            .collect()
    }
}

/// Timing of the broadcast loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub tick_interval: Duration,
    pub send_timeout: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl BroadcastConfig {
    /// Build a config from whole seconds, rejecting zero durations.
    pub fn from_secs(tick_secs: u64, send_timeout_secs: u64) -> LedgercastResult<Self> {
        if tick_secs == 0 {
            return Err(LedgercastError::config("tick interval must be at least 1 second"));
        }
        if send_timeout_secs == 0 {
            return Err(LedgercastError::config("send timeout must be at least 1 second"));
        }
        Ok(Self {
            tick_interval: Duration::from_secs(tick_secs),
            send_timeout: Duration::from_secs(send_timeout_secs),
        })
    }
}
