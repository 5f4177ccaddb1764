use std::net::TcpStream as StdTcpStream;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use ledger_tracker::{Tracker, TrackerConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Ledger network tracker: admits nodes, assigns identities, mediates
/// introductions.
#[derive(Parser, Debug)]
#[command(name = "ledger-tracker", version, about)]
struct Cli {
    /// TCP port to listen on, 1-65535.
    port: u16,

    /// Suppress log output (the shell and any printed state remain).
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

/// Probes a port by attempting a loopback connection to it: a successful
/// connect means something is already listening there.
fn is_port_in_use(port: u16) -> bool {
    StdTcpStream::connect(("127.0.0.1", port)).is_ok()
}

fn format_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = TrackerConfig { port: cli.port, quiet: cli.quiet };

    let filter = if config.quiet { EnvFilter::new("off") } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if is_port_in_use(config.port) {
        error!(port = config.port, "port already in use");
        return ExitCode::FAILURE;
    }

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(l) => l,
        Err(err) => {
            error!(port = config.port, error = %err, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    info!(port = config.port, "tracker listening");

    let tracker = Tracker::new();
    let listener_task = tokio::spawn(tracker.clone().run(listener));

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // EOF: same as `stop`.
                tracker.shutdown().await;
                break;
            }
            Err(err) => {
                error!(error = %err, "failed to read command");
                break;
            }
        };

        match line.trim() {
            "stop" => {
                tracker.shutdown().await;
                break;
            }
            "nodes" => {
                for peer in tracker.peers_snapshot().await {
                    println!("{} {}:{}", peer.ident, peer.host, peer.port);
                }
            }
            "chain" => match serde_json::to_string(&tracker.chain_snapshot().await) {
                Ok(json) => println!("[{}] {}", format_timestamp(), json),
                Err(err) => error!(error = %err, "failed to serialise chain"),
            },
            "" => {}
            other => println!("unknown command: {other}"),
        }
    }

    let _ = listener_task.await;
    ExitCode::SUCCESS
}
