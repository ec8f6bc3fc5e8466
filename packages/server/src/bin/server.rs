//! WebSocket relay server with offline message queues.
//!
//! Relays text frames and files between clients addressed by numeric id.
//! Text sent to an offline client is queued and delivered on its next connection.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hikyaku-server
//! cargo run --bin hikyaku-server -- --host 0.0.0.0 --port 3000 --retention-days 30
//! ```

use std::sync::Arc;

use clap::Parser;
use hikyaku_server::{
    domain::{ConnectionRegistry, RegistryConfig},
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::Server,
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, RelayFrameUseCase},
};
use hikyaku_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hikyaku-server")]
#[command(about = "WebSocket relay server with offline message queues", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Days a queued message is kept for an offline client
    #[arg(long, default_value = "90", value_parser = clap::value_parser!(u32).range(1..))]
    retention_days: u32,

    /// Maximum queued messages per client; the oldest is evicted beyond this
    #[arg(long, default_value = "1000", value_parser = parse_capacity)]
    queue_capacity: usize,

    /// Clear a client's queue after flushing it on connect
    #[arg(long)]
    drain_on_flush: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("queue capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Registry
    // 2. UseCases
    // 3. Server

    // 1. Create Registry (in-memory connections and queues)
    let config = RegistryConfig {
        retention_days: args.retention_days,
        queue_capacity: args.queue_capacity,
        drain_on_flush: args.drain_on_flush,
    };
    tracing::info!(
        "Queue policy: retention {} days, capacity {}, drain on flush: {}",
        config.retention_days,
        config.queue_capacity,
        config.drain_on_flush
    );
    let registry: Arc<dyn ConnectionRegistry> =
        Arc::new(InMemoryConnectionRegistry::new(config, Arc::new(SystemClock)));

    // 2. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(registry.clone()));
    let relay_frame_usecase = Arc::new(RelayFrameUseCase::new(registry.clone()));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(registry.clone()));

    // 3. Create and run the server
    let server = Server::new(
        connect_client_usecase,
        relay_frame_usecase,
        disconnect_client_usecase,
        registry,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
