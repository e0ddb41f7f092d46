//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use log_enricher::config::EnricherConfig;
use log_enricher::enrich::{EnvironmentSource, MapEnvironment};
use log_enricher::http::HttpServer;
use log_enricher::lifecycle::{startup, Shutdown};
use log_enricher::pipeline::{Logger, MemorySink};

/// Environment seen by every test logger.
pub fn test_environment() -> Arc<dyn EnvironmentSource> {
    Arc::new(
        MapEnvironment::new()
            .with("APP_ENV", "integration")
            .with("APP_NAME", "   "),
    )
}

/// A logger writing to memory with the default environment tracking.
pub fn memory_logger(config: &EnricherConfig) -> (Arc<Logger>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = startup::build_logger(config, sink.clone(), Some(test_environment()));
    (Arc::new(logger), sink)
}

/// Start the demo server on an ephemeral port.
pub async fn start_server(config: EnricherConfig, logger: Arc<Logger>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, logger);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}
