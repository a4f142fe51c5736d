//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Acceptor and handlers produce:
//!     → logging.rs (structured log events, info → stdout, error → stderr)
//!     → payload.rs (escaped rendering of received bytes)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Operator terminal or log collector
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

#[cfg(test)]
pub(crate) mod capture;
pub mod logging;
pub mod metrics;
pub mod payload;

pub use logging::LogSink;
pub use payload::Quoted;
