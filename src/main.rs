//! log-enricher
//!
//! Hosts the exchange logging middleware behind a small demo service, or
//! prints the environment snapshot the enricher would attach.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ trace ──▶ request-id ──▶ timeout ──▶ exchange middleware ──▶ handler
//!                                                 │        ▲
//!                                                 ▼        │ LogContext
//!                                      RequestResponseEnricher + factory enrichers
//!                                                 │
//!                                                 ▼
//!                            Logger (EnvironmentEnricher) ──▶ TracingSink
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use log_enricher::config::{load_config, EnricherConfig};
use log_enricher::http::HttpServer;
use log_enricher::lifecycle::{signals, startup, Shutdown};
use log_enricher::observability::{logging, metrics};
use log_enricher::pipeline::TracingSink;

#[derive(Parser)]
#[command(name = "log-enricher", version, about = "Structured log enrichment for HTTP exchanges")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo HTTP service (default).
    Serve,
    /// Print the environment snapshot as JSON and exit.
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EnricherConfig::default(),
    };

    logging::init_tracing(&config.observability);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Snapshot => {
            let enricher = startup::build_environment_enricher(&config.environment, None);
            println!("{}", serde_json::to_string_pretty(&enricher.snapshot())?);
            Ok(())
        }
    }
}

async fn serve(config: EnricherConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("log-enricher v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        exchange_enabled = config.exchange.enabled,
        request_timeout_secs = config.exchange.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let logger = Arc::new(startup::build_logger(&config, Arc::new(TracingSink), None));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, logger);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
