//! Configuration loading and resolution.
//!
//! Precedence, highest first: CLI overrides, config file, built-in defaults.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::RecvlogConfig;
use crate::config::validation::{parse_socket_addr, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid listen address {0:?}")]
    InvalidAddress(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line. `None` leaves the file or default
/// value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_address: Option<String>,
    pub max_connections: Option<usize>,
    pub log_level: Option<String>,
}

/// Parse an address string into the socket address the listener binds.
pub fn resolve_bind_address(addr: &str) -> Result<SocketAddr, ConfigError> {
    parse_socket_addr(addr).ok_or_else(|| ConfigError::InvalidAddress(addr.to_string()))
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RecvlogConfig, ConfigError> {
    let config: RecvlogConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RecvlogConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Build the effective configuration from an optional file and CLI values.
pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<RecvlogConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => RecvlogConfig::default(),
    };

    if let Some(addr) = overrides.bind_address {
        resolve_bind_address(&addr)?;
        config.listener.bind_address = addr;
    }
    if let Some(max) = overrides.max_connections {
        config.listener.max_connections = max;
    }
    if let Some(level) = overrides.log_level {
        config.observability.log_level = level;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
