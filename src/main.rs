//! request-sink binary.
//!
//! Binds the configured address, logs every request it receives, and exits
//! on Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use request_sink::lifecycle::signals::shutdown_signal;
use request_sink::lifecycle::startup::{load_startup_config, Overrides};
use request_sink::observability::init_logging;
use request_sink::{HttpServer, Request};

#[derive(Debug, Parser)]
#[command(name = "request-sink")]
#[command(about = "Accept HTTP/1.1 requests over TCP and hand them to handlers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. "127.0.0.1:8080" or ":8080".
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_startup_config(
        cli.config.as_deref(),
        Overrides {
            bind_address: cli.bind,
            log_level: cli.log_level,
        },
    )?;

    init_logging(&config.observability)?;

    tracing::info!("request-sink v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        read_timeout_ms = config.connection.read_timeout_ms,
        chunk_size = config.connection.chunk_size,
        incomplete_head = ?config.connection.incomplete_head,
        "Configuration loaded"
    );

    let mut server = HttpServer::new(config);

    server.handle_request(|req: Arc<Request>| {
        tracing::info!(
            method = %String::from_utf8_lossy(req.method()),
            target = %String::from_utf8_lossy(req.target()),
            headers = req.headers().len(),
            body_len = req.body().len(),
            "Handling request"
        );
    });

    server.start(shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
