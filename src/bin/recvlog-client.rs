use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use recvlog::config::schema::DEFAULT_CLIENT_HOST;
use recvlog::client::send_paced;
use recvlog::LogSink;

#[derive(Parser)]
#[command(name = "recvlog-client")]
#[command(about = "Send two paced payloads to a recvlog listener", long_about = None)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CLIENT_HOST)]
    host: String,

    /// First payload
    #[arg(long, default_value = "Test\n")]
    first: String,

    /// Second payload
    #[arg(long, default_value = "Test2\n")]
    second: String,

    /// Pause between the two writes
    #[arg(long, default_value_t = 3)]
    delay_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let sink = LogSink::stdio("info");

    let payloads = [cli.first.as_bytes(), cli.second.as_bytes()];
    let pause = Duration::from_secs(cli.delay_secs);

    match sink.attach(send_paced(&cli.host, &payloads, pause)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            sink.in_scope(|| tracing::error!(error = %e, "send failed"));
            ExitCode::from(1)
        }
    }
}
