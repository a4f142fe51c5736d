//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply CLI overrides)
//!     → validation.rs (semantic checks)
//!     → RecvlogConfig (validated, immutable)
//!     → handed by reference to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve, resolve_bind_address, ConfigError, Overrides};
pub use schema::{BackoffConfig, ListenerConfig, ObservabilityConfig, RecvlogConfig};
