//! Acceptor: binds the listen socket and runs the accept loop.
//!
//! # Responsibilities
//! - Validate, resolve and bind the listen address exactly once
//! - Accept connections for as long as the process lives
//! - Spawn one handler task per connection, never waiting on it
//! - Log accept errors and back off before retrying
//! - Start the optional metrics endpoint

use std::net::SocketAddr;

use crate::config::{
    resolve_bind_address,
    validation::{parse_socket_addr, validate_config, validate_listener},
    ConfigError, ListenerConfig, RecvlogConfig,
};
use crate::net::{AcceptSource, ConnectionTracker, Handler, Listener, ListenerError};
use crate::observability::{metrics, LogSink};
use crate::resilience::AcceptBackoff;

/// Errors that stop the server before or instead of serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("accept loop stopped: {0}")]
    Listener(ListenerError),
}

impl From<ListenerError> for ServeError {
    fn from(err: ListenerError) -> Self {
        match err {
            ListenerError::Bind(e) => ServeError::Bind(e),
            other => ServeError::Listener(other),
        }
    }
}

/// A bound listener plus everything its handlers need.
#[derive(Debug)]
pub struct Server {
    listener: Listener,
    config: ListenerConfig,
    sink: LogSink,
    tracker: ConnectionTracker,
}

impl Server {
    /// Validate `config` and bind the listen socket. Nothing is accepted
    /// until [`Server::run`].
    pub async fn bind(config: &ListenerConfig, sink: LogSink) -> Result<Self, ServeError> {
        validate_listener(config).map_err(ConfigError::Validation)?;
        let addr = resolve_bind_address(&config.bind_address)?;
        let listener = sink.attach(Listener::bind(addr, config.max_connections)).await?;

        Ok(Self {
            listener,
            config: config.clone(),
            sink,
            tracker: ConnectionTracker::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Handle onto the live-connection counters.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Run the accept loop. Only returns if the connection limit is closed,
    /// which cannot happen while the server owns it.
    pub async fn run(self) -> Result<(), ServeError> {
        let Server {
            listener,
            config,
            sink,
            tracker,
        } = self;
        sink.attach(accept_loop(&listener, &config, &sink, &tracker)).await
    }
}

async fn accept_loop<A: AcceptSource>(
    source: &A,
    config: &ListenerConfig,
    sink: &LogSink,
    tracker: &ConnectionTracker,
) -> Result<(), ServeError> {
    let mut backoff = AcceptBackoff::new(&config.accept_backoff);

    loop {
        match source.accept().await {
            Ok((stream, peer, permit)) => {
                backoff.reset();
                metrics::record_accepted();

                let guard = tracker.track();
                tracing::debug!(connection_id = %guard.id(), peer = %peer, "spawning handler");

                let handler =
                    Handler::new(stream, peer, config.read_buffer_size, guard, Some(permit));
                tokio::spawn(sink.attach(handler.run()));
            }
            Err(ListenerError::Accept(e)) => {
                metrics::record_accept_error();
                let delay = backoff.next_delay();
                tracing::error!(
                    error = %e,
                    consecutive_failures = backoff.failures(),
                    retry_in_ms = delay.as_millis() as u64,
                    "accept failed"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Validate `config`, start metrics (if configured), bind, and serve until
/// the process ends.
pub async fn serve(config: &RecvlogConfig, sink: LogSink) -> Result<(), ServeError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    if let Some(addr) = &config.observability.metrics_address {
        let addr = parse_socket_addr(addr)
            .ok_or_else(|| ConfigError::InvalidAddress(addr.clone()))?;
        sink.in_scope(|| metrics::init_metrics(addr))?;
    }

    let server = Server::bind(&config.listener, sink.clone()).await?;
    let local_addr = server.local_addr().map_err(ServeError::Bind)?;

    sink.in_scope(|| {
        tracing::info!(
            address = %local_addr,
            read_buffer_size = config.listener.read_buffer_size,
            "Listening for connections"
        )
    });

    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::sync::Semaphore;

    use crate::config::BackoffConfig;
    use crate::net::ConnectionPermit;
    use crate::observability::capture::captured_sink;

    type Scripted = io::Result<DuplexStream>;

    /// Replays a fixed list of accept results, then waits forever.
    struct ScriptedAccept {
        script: Mutex<VecDeque<Scripted>>,
        slots: Arc<Semaphore>,
    }

    impl ScriptedAccept {
        fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                slots: Arc::new(Semaphore::new(8)),
            }
        }
    }

    impl AcceptSource for ScriptedAccept {
        type Stream = DuplexStream;

        fn accept(
            &self,
        ) -> impl Future<Output = Result<(DuplexStream, SocketAddr, ConnectionPermit), ListenerError>>
               + Send {
            let next = self.script.lock().unwrap().pop_front();
            let slots = Arc::clone(&self.slots);
            async move {
                let Some(next) = next else {
                    return std::future::pending().await;
                };
                let permit = slots
                    .acquire_owned()
                    .await
                    .map_err(|_| ListenerError::LimitClosed)?;
                let stream = next.map_err(ListenerError::Accept)?;
                Ok((stream, "127.0.0.1:4242".parse().unwrap(), ConnectionPermit::new(permit)))
            }
        }
    }

    fn emfile() -> Scripted {
        Err(io::Error::from_raw_os_error(24))
    }

    fn fast_backoff() -> ListenerConfig {
        ListenerConfig {
            accept_backoff: BackoffConfig {
                base_delay_ms: 1,
                max_delay_ms: 4,
            },
            ..ListenerConfig::default()
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[tokio::test]
    async fn accept_errors_back_off_and_the_loop_keeps_serving() {
        let (mut client, server_side) = tokio::io::duplex(64);
        let source = ScriptedAccept::new([emfile(), emfile(), Ok(server_side), emfile()]);
        let config = fast_backoff();
        let (sink, info, error) = captured_sink();
        let tracker = ConnectionTracker::new();

        let task = tokio::spawn({
            let (sink, tracker) = (sink.clone(), tracker.clone());
            async move {
                let loop_sink = sink.clone();
                loop_sink
                    .attach(accept_loop(&source, &config, &sink, &tracker))
                    .await
            }
        });

        client.write_all(b"after errors").await.unwrap();
        wait_for(|| info.lines().iter().any(|l| l.contains(" received "))).await;
        wait_for(|| error.lines().len() == 3).await;

        let errors = error.lines();
        assert!(errors.iter().all(|l| l.contains("accept failed")), "{errors:#?}");
        assert!(errors[0].contains("consecutive_failures=1"), "{}", errors[0]);
        assert!(errors[1].contains("consecutive_failures=2"), "{}", errors[1]);
        // The success in between reset the count.
        assert!(errors[2].contains("consecutive_failures=1"), "{}", errors[2]);

        let received: Vec<_> = info
            .lines()
            .into_iter()
            .filter(|l| l.contains(" received "))
            .collect();
        assert_eq!(received.len(), 1);
        assert!(received[0].contains(r#"payload="after errors""#), "{}", received[0]);
        assert_eq!(tracker.accepted_count(), 1);

        drop(client);
        wait_for(|| tracker.active_count() == 0).await;
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test]
    async fn bind_rejects_unvalidated_listener_config() {
        let (sink, _, _) = captured_sink();
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            read_buffer_size: 0,
            ..ListenerConfig::default()
        };

        let err = Server::bind(&config, sink).await.unwrap_err();
        assert!(
            matches!(err, ServeError::Config(ConfigError::Validation(_))),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn serve_rejects_unvalidated_config() {
        let (sink, info, _) = captured_sink();
        let mut config = RecvlogConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.listener.max_connections = 0;

        let err = serve(&config, sink).await.unwrap_err();
        assert!(
            matches!(err, ServeError::Config(ConfigError::Validation(_))),
            "got {err:?}"
        );
        assert!(info.lines().is_empty());
    }
}
