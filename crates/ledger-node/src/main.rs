use std::net::TcpStream as StdTcpStream;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use ledger_node::{admit, disconnect, send_transaction, NodeConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Ledger network node: admission client, peer dialer/acceptor, transaction
/// originator, mining coordinator.
#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about)]
struct Cli {
    /// Port the tracker listens on.
    tracker_port: u16,

    /// Port this node listens on for peer dials.
    listen_port: u16,

    /// Suppress log output (the shell and any printed state remain).
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

/// Probes a port by attempting a loopback connection to it.
fn is_port_in_use(port: u16) -> bool {
    StdTcpStream::connect(("127.0.0.1", port)).is_ok()
}

fn format_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = NodeConfig::connecting_to(cli.tracker_port, cli.listen_port);
    let quiet = cli.quiet;

    let filter = if quiet { EnvFilter::new("off") } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if is_port_in_use(cli.listen_port) {
        error!(port = cli.listen_port, "port already in use");
        return ExitCode::FAILURE;
    }

    let state = match admit(&config).await {
        Ok(state) => state,
        Err(err) => {
            error!(error = %err, "admission failed");
            return ExitCode::FAILURE;
        }
    };

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                disconnect(&state).await;
                break;
            }
            Err(err) => {
                error!(error = %err, "failed to read command");
                break;
            }
        };

        let mut words = line.trim().split_whitespace();
        match words.next() {
            Some("disconnect") => disconnect(&state).await,
            Some("peers") => {
                for peer in state.peers_snapshot().await {
                    println!("{} {}:{}", peer.ident, peer.host, peer.port);
                }
            }
            Some("chain") => match serde_json::to_string(&state.chain_snapshot().await) {
                Ok(json) => println!("[{}] {}", format_timestamp(), json),
                Err(err) => error!(error = %err, "failed to serialise chain"),
            },
            Some("send") => match (words.next().and_then(|s| s.parse::<u64>().ok()), words.next().and_then(|s| s.parse::<u64>().ok())) {
                (Some(receiver), Some(amount)) => send_transaction(&state, receiver, amount).await,
                _ => println!("usage: send <receiver_ident> <amount>"),
            },
            Some("balance") => println!("{}", state.balance().await),
            Some(other) => println!("unknown command: {other}"),
            None => {}
        }

        // Exit as soon as we're no longer connected, whether by our own
        // `disconnect` or by losing the tracker link.
        if !state.is_connected() {
            break;
        }
    }

    ExitCode::SUCCESS
}
