//! recvlog: a concurrent TCP listener that logs the raw bytes each client sends.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (CLI flags, TOML file, defaults)
//!      │
//!      ▼
//!   server::Server::bind ──▶ net::Listener (bound once, N permits)
//!      │
//!      ▼ accept loop (backoff on errors)
//!   net::Handler task per connection ──▶ observability::LogSink
//!      read → log escaped payload → read → ... → EOF/error → close
//! ```
//!
//! The log sink is built once at startup and handed to the acceptor and to
//! every handler; nothing in the crate logs through ambient global state.

pub mod client;
pub mod config;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod server;

pub use config::schema::RecvlogConfig;
pub use observability::LogSink;
pub use server::{serve, ServeError, Server};
