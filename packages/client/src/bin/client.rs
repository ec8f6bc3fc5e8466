//! Hikyaku relay client.
//!
//! Connects to `{url}/{client_id}`, sends `<target_id>:<message>` lines and
//! `/file <target_id> <path>` uploads, and saves received files to the
//! download directory. Reconnects on disconnection (max 5 attempts with 5
//! second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hikyaku-client -- --client-id 1
//! cargo run --bin hikyaku-client -- -c 2 --download-dir ./downloads
//! ```

use std::path::PathBuf;

use clap::Parser;

use hikyaku_client::{run_client, session::SessionConfig};
use hikyaku_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hikyaku-client")]
#[command(about = "Store-and-forward relay client with file transfer", long_about = None)]
struct Args {
    /// Numeric client ID (must be greater than zero)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u64).range(1..))]
    client_id: u64,

    /// WebSocket endpoint base URL; the client ID is appended
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Directory where received files are saved
    #[arg(short = 'd', long, default_value = ".")]
    download_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = SessionConfig {
        url: args.url,
        client_id: args.client_id,
        download_dir: args.download_dir,
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
