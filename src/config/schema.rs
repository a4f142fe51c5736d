//! Configuration schema definitions.
//!
//! All types derive Serde traits so the whole tree can be read from a TOML
//! file. Every section is defaulted, so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Listen address used when neither the CLI nor the config file names one.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:50000";

/// Where the paced client connects by default; same port as
/// [`DEFAULT_BIND_ADDRESS`].
pub const DEFAULT_CLIENT_HOST: &str = "localhost:50000";

/// Capacity of each connection's receive buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Upper bound accepted for `read_buffer_size`.
pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Filter directive used when nothing else is configured.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Root configuration for the receiver.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RecvlogConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address, e.g. "0.0.0.0:50000" or the short form ":50000".
    pub bind_address: String,

    /// Maximum concurrent connections. Further clients wait in the accept
    /// backlog until a slot frees up.
    pub max_connections: usize,

    /// Bytes read from a connection per read call.
    pub read_buffer_size: usize,

    /// Delay applied between consecutive failed accepts.
    pub accept_backoff: BackoffConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_connections: 10_000,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            accept_backoff: BackoffConfig::default(),
        }
    }
}

/// Exponential backoff bounds, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first failure.
    pub base_delay_ms: u64,

    /// Cap for the exponential growth.
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 5,
            max_delay_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression).
    pub log_level: String,

    /// Prometheus scrape endpoint. Disabled when absent.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_DIRECTIVE.to_string(),
            metrics_address: None,
        }
    }
}
