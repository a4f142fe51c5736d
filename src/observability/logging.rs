//! Structured logging.
//!
//! # Responsibilities
//! - Build the process log sink with separate info and error channels
//! - Hand that sink explicitly to the acceptor and every handler
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Info and below go to stdout, errors go to stderr with `file:line`
//! - Every line is timestamped and written with a single `write_all`, so
//!   concurrent handlers interleave whole lines only

use std::future::Future;
use std::io::IsTerminal;

use tracing::dispatcher::{self, Dispatch, SetGlobalDefaultError};
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::Level;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::schema::DEFAULT_LOG_DIRECTIVE;

/// Cloneable handle to the process log sink.
#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
}

impl LogSink {
    /// Sink writing info lines to stdout and error lines to stderr.
    pub fn stdio(directive: &str) -> Self {
        Self::build(
            directive,
            std::io::stdout,
            std::io::stderr,
            std::io::stdout().is_terminal(),
        )
    }

    /// Sink over arbitrary writers, without ANSI colouring.
    pub fn with_writers<I, E>(directive: &str, info: I, error: E) -> Self
    where
        I: for<'w> MakeWriter<'w> + Send + Sync + 'static,
        E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        Self::build(directive, info, error, false)
    }

    fn build<I, E>(directive: &str, info: I, error: E, ansi: bool) -> Self
    where
        I: for<'w> MakeWriter<'w> + Send + Sync + 'static,
        E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        // Directives are validated with the rest of the config.
        let filter =
            EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let info_layer = fmt::layer()
            .with_writer(info)
            .with_ansi(ansi)
            .with_target(false)
            .with_filter(filter_fn(|meta| *meta.level() != Level::ERROR));

        let error_layer = fmt::layer()
            .with_writer(error)
            .with_ansi(ansi)
            .with_file(true)
            .with_line_number(true)
            .with_filter(LevelFilter::ERROR);

        let subscriber = Registry::default()
            .with(filter)
            .with(info_layer)
            .with(error_layer);

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Run `future` with this sink as its subscriber.
    pub fn attach<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }

    /// Run `f` with this sink as the current subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this sink the fallback for code that is not attached to one.
    pub fn install_global(&self) -> Result<(), SetGlobalDefaultError> {
        dispatcher::set_global_default(self.dispatch.clone())
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}
