//! Per-connection read loop.
//!
//! A handler owns exactly one accepted stream. It reads into a private
//! buffer until end-of-stream or a read error, logging every chunk it
//! receives, then drops the stream. Nothing is ever written back.
//!
//! There is no idle timeout: a peer that stays connected without sending
//! keeps its handler (and its connection permit) alive.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

use crate::net::connection::{ConnectionGuard, ConnectionId};
use crate::net::listener::ConnectionPermit;
use crate::observability::{metrics, Quoted};

/// Why a handler stopped reading.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed its side of the stream.
    EndOfStream,
    /// The read failed (reset, aborted, ...).
    ReadError(io::Error),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::EndOfStream => f.write_str("end of stream"),
            CloseReason::ReadError(e) => write!(f, "read error: {e}"),
        }
    }
}

/// Handler state after one read.
#[derive(Debug)]
pub enum HandlerState {
    /// `n` bytes arrived and the loop continues.
    Running(usize),
    /// The loop is over.
    Terminated(CloseReason),
}

impl From<io::Result<usize>> for HandlerState {
    fn from(read: io::Result<usize>) -> Self {
        match read {
            Ok(0) => HandlerState::Terminated(CloseReason::EndOfStream),
            Ok(n) => HandlerState::Running(n),
            Err(e) => HandlerState::Terminated(CloseReason::ReadError(e)),
        }
    }
}

/// Task state for one accepted connection.
pub struct Handler<S = TcpStream> {
    stream: S,
    peer: SocketAddr,
    buffer: Vec<u8>,
    guard: ConnectionGuard,
    _permit: Option<ConnectionPermit>,
}

impl<S: AsyncRead + Unpin> Handler<S> {
    pub fn new(
        stream: S,
        peer: SocketAddr,
        buffer_size: usize,
        guard: ConnectionGuard,
        permit: Option<ConnectionPermit>,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: vec![0; buffer_size],
            guard,
            _permit: permit,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.guard.id()
    }

    /// Read until the connection ends. The stream, permit, and guard are
    /// released when this returns.
    pub async fn run(mut self) -> CloseReason {
        let id = self.id();
        let reason = loop {
            let read = self.stream.read(&mut self.buffer).await;
            match HandlerState::from(read) {
                HandlerState::Running(n) => {
                    metrics::record_read(n);
                    tracing::info!(
                        connection_id = %id,
                        peer = %self.peer,
                        bytes = n,
                        payload = %Quoted(&self.buffer[..n]),
                        "received"
                    );
                }
                HandlerState::Terminated(reason) => break reason,
            }
        };

        match &reason {
            CloseReason::EndOfStream => {
                tracing::debug!(connection_id = %id, peer = %self.peer, reason = %reason, "connection closed")
            }
            CloseReason::ReadError(_) => {
                tracing::warn!(connection_id = %id, peer = %self.peer, reason = %reason, "connection closed")
            }
        }
        reason
    }
}

impl<S> fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.guard.id())
            .field("peer", &self.peer)
            .field("buffer_size", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
