//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk size > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SinkConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::SinkConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("connection.read_timeout_ms must be greater than zero")]
    ZeroReadTimeout,

    #[error("connection.chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("connection.max_request_bytes must be greater than zero when set")]
    ZeroRequestLimit,
}

/// Check a parsed configuration for values the server cannot run with.
pub fn validate_config(config: &SinkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }
    if config.connection.read_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if config.connection.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }
    if config.connection.max_request_bytes == Some(0) {
        errors.push(ValidationError::ZeroRequestLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
