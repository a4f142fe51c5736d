//! Paced test client.
//!
//! Opens one connection and writes each payload in turn, pausing between
//! writes. Used to check that a handler survives idle periods and reports
//! separate receive events.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        source: std::io::Error,
    },

    #[error("failed to write payload {index}: {source}")]
    Write {
        index: usize,
        source: std::io::Error,
    },

    #[error("failed to close the connection: {source}")]
    Shutdown { source: std::io::Error },
}

/// Connect to `host`, write every payload with `pause` between them, then
/// close the connection.
pub async fn send_paced<P: AsRef<[u8]>>(
    host: &str,
    payloads: &[P],
    pause: Duration,
) -> Result<(), ClientError> {
    let mut stream = TcpStream::connect(host)
        .await
        .map_err(|source| ClientError::Connect {
            host: host.to_string(),
            source,
        })?;
    stream.set_nodelay(true).ok();

    write_paced(&mut stream, payloads, pause).await
}

/// Write every payload to `stream` with `pause` between them, then shut
/// down its write side.
pub async fn write_paced<W, P>(stream: &mut W, payloads: &[P], pause: Duration) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
    P: AsRef<[u8]>,
{
    for (index, payload) in payloads.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pause).await;
        }
        stream
            .write_all(payload.as_ref())
            .await
            .map_err(|source| ClientError::Write { index, source })?;
        tracing::debug!(index, bytes = payload.as_ref().len(), "payload sent");
    }

    stream
        .shutdown()
        .await
        .map_err(|source| ClientError::Shutdown { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::AsyncReadExt;

    /// Accepts every write, fails on shutdown.
    #[derive(Default)]
    struct BrokenClose {
        written: Vec<u8>,
    }

    impl AsyncWrite for BrokenClose {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.written.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }
    }

    #[tokio::test]
    async fn writes_in_order_and_closes() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_paced(&mut client, &["one", "two"], Duration::from_millis(5))
            .await
            .unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "onetwo");
    }

    #[tokio::test]
    async fn failed_shutdown_is_an_error() {
        let mut stream = BrokenClose::default();
        let err = write_paced(&mut stream, &["a", "b"], Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Shutdown { .. }), "got {err:?}");
        assert_eq!(stream.written, b"ab");
    }
}
