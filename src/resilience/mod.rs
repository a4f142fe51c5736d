//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop:
//!     → accept fails
//!     → backoff.rs (delay grows with consecutive failures, capped)
//!     → sleep, accept again
//!     → first success resets the delay
//! ```
//!
//! # Design Decisions
//! - Accept errors never stop the loop
//! - A persistent failure (e.g. fd exhaustion) cannot spin the CPU

pub mod backoff;

pub use backoff::AcceptBackoff;
