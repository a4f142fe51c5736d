//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses parse
//! - Validate value ranges (limits > 0, backoff bounds ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RecvlogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{Ipv4Addr, SocketAddr};

use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{ListenerConfig, RecvlogConfig, MAX_READ_BUFFER_SIZE};

/// A single semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be at least 1")]
    ZeroMaxConnections,

    #[error("listener.max_connections must be at most {max}, got {got}")]
    MaxConnectionsTooLarge { got: usize, max: usize },

    #[error("listener.read_buffer_size must be between 1 and {max}, got {got}")]
    ReadBufferSize { got: usize, max: usize },

    #[error("listener.accept_backoff.base_delay_ms must be at least 1")]
    ZeroBackoffBase,

    #[error("listener.accept_backoff.base_delay_ms ({base}) exceeds max_delay_ms ({max})")]
    BackoffInverted { base: u64, max: u64 },

    #[error("observability.log_level {0:?} is not a valid filter directive")]
    LogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Parse `ip:port`, `[ipv6]:port`, or the short form `:port`, which binds
/// every IPv4 interface.
pub fn parse_socket_addr(input: &str) -> Option<SocketAddr> {
    let input = input.trim();
    if let Some(port) = input.strip_prefix(':') {
        return port
            .parse::<u16>()
            .ok()
            .map(|port| SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }
    input.parse().ok()
}

/// Check every field of `config`, collecting all problems.
pub fn validate_config(config: &RecvlogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = listener_errors(&config.listener);

    let observability = &config.observability;
    if EnvFilter::try_new(&observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }

    if let Some(addr) = &observability.metrics_address {
        if parse_socket_addr(addr).is_none() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    into_result(errors)
}

/// Check the `[listener]` section alone.
pub fn validate_listener(listener: &ListenerConfig) -> Result<(), Vec<ValidationError>> {
    into_result(listener_errors(listener))
}

fn listener_errors(listener: &ListenerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if parse_socket_addr(&listener.bind_address).is_none() {
        errors.push(ValidationError::BindAddress(listener.bind_address.clone()));
    }

    if listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    } else if listener.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::MaxConnectionsTooLarge {
            got: listener.max_connections,
            max: Semaphore::MAX_PERMITS,
        });
    }

    if listener.read_buffer_size == 0 || listener.read_buffer_size > MAX_READ_BUFFER_SIZE {
        errors.push(ValidationError::ReadBufferSize {
            got: listener.read_buffer_size,
            max: MAX_READ_BUFFER_SIZE,
        });
    }

    let backoff = &listener.accept_backoff;
    if backoff.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroBackoffBase);
    } else if backoff.base_delay_ms > backoff.max_delay_ms {
        errors.push(ValidationError::BackoffInverted {
            base: backoff.base_delay_ms,
            max: backoff.max_delay_ms,
        });
    }

    errors
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
