//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sink.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::parser::{IncompleteHead, ParseOptions};

/// Root configuration for the request sink.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-connection read loop settings.
    pub connection: ConnectionConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080", or ":8080" for all interfaces).
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Connection read loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Deadline for each individual read, restarted before every read.
    pub read_timeout_ms: u64,

    /// Maximum bytes requested from the socket per read.
    pub chunk_size: usize,

    /// Abort once this many bytes are buffered without a complete request.
    /// Unlimited when absent.
    pub max_request_bytes: Option<usize>,

    /// Whether an unterminated request head is malformed or awaited.
    pub incomplete_head: IncompleteHead,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 5_000,
            chunk_size: 8_192,
            max_request_bytes: None,
            incomplete_head: IncompleteHead::Reject,
        }
    }
}

impl ConnectionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            incomplete_head: self.incomplete_head,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "request_sink=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
