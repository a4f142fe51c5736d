//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (permit, then accept)
//!     → connection.rs (id, live-connection guard)
//!     → handler.rs (read loop, one task per connection)
//!
//! Handler States:
//!     Running → Running (data) → Terminated (EOF or read error)
//! ```
//!
//! # Design Decisions
//! - Bounded permits prevent unbounded task growth under connection floods
//! - Each connection is owned by exactly one handler task
//! - Dropping the handler closes the socket and frees the permit

pub mod connection;
pub mod handler;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use handler::{CloseReason, Handler, HandlerState};
pub use listener::{AcceptSource, ConnectionPermit, Listener, ListenerError};
