//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration from file, or fall back to defaults
//! - Apply command-line overrides
//! - Validate the result before anything binds
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Overrides are validated together with the file contents

use std::path::Path;

use crate::config::loader::{load_config, ConfigError};
use crate::config::validation::validate_config;
use crate::config::SinkConfig;

/// Settings supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}

/// Build the effective configuration for this process.
pub fn load_startup_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<SinkConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SinkConfig::default(),
    };

    if let Some(bind_address) = overrides.bind_address {
        config.listener.bind_address = bind_address;
    }
    if let Some(log_level) = overrides.log_level {
        config.observability.log_level = log_level;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
