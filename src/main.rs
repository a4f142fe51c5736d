use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recvlog::config::schema::DEFAULT_LOG_DIRECTIVE;
use recvlog::config::{self, Overrides};
use recvlog::LogSink;

#[derive(Parser)]
#[command(name = "recvlog", version)]
#[command(about = "Accept TCP connections and log every byte received", long_about = None)]
struct Cli {
    /// Listen address, e.g. 127.0.0.1:50000 or :50000 [default: 0.0.0.0:50000]
    #[arg(short, long)]
    addr: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum concurrent connections
    #[arg(long)]
    max_connections: Option<usize>,

    /// Log filter directive (falls back to RUST_LOG, then the config file)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = Overrides {
        bind_address: cli.addr,
        max_connections: cli.max_connections,
        log_level: cli
            .log_level
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok()),
    };

    let config = match config::resolve(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            LogSink::stdio(DEFAULT_LOG_DIRECTIVE)
                .in_scope(|| tracing::error!(error = %e, "Invalid configuration"));
            return ExitCode::FAILURE;
        }
    };

    let sink = LogSink::stdio(&config.observability.log_level);
    if let Err(e) = sink.install_global() {
        eprintln!("log sink already installed: {e}");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        "recvlog starting"
    );

    match recvlog::serve(&config, sink).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
