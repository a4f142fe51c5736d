//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use recvlog::config::ListenerConfig;
use recvlog::net::ConnectionTracker;
use recvlog::{LogSink, Server};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log writer. Each event arrives as one `write` call.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).lines().map(str::to_owned).collect()
    }

    /// Lines for `received` events, in log order.
    pub fn received(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(" received "))
            .collect()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A server running on a loopback port with captured logs.
pub struct TestServer {
    pub addr: SocketAddr,
    pub info: Capture,
    pub error: Capture,
    pub tracker: ConnectionTracker,
}

/// Bind on 127.0.0.1:0 with `config` tweaks and start the accept loop.
pub async fn start_server(tweak: impl FnOnce(&mut ListenerConfig)) -> TestServer {
    let mut config = ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        ..ListenerConfig::default()
    };
    tweak(&mut config);

    let info = Capture::default();
    let error = Capture::default();
    let sink = LogSink::with_writers("info", info.clone(), error.clone());

    let server = Server::bind(&config, sink).await.unwrap();
    let addr = server.local_addr().unwrap();
    let tracker = server.tracker();
    tokio::spawn(server.run());

    TestServer {
        addr,
        info,
        error,
        tracker,
    }
}

/// Poll `condition` until it holds, panicking after `timeout`.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Await `future` with a generous upper bound.
pub async fn bounded<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("operation timed out")
}

/// Value of `key=value` in a log line, up to the next space.
pub fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("{key}=");
    line.split_whitespace()
        .find_map(|token| token.strip_prefix(prefix.as_str()))
}
