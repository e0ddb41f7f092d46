//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (tracing, request ID, timeout, exchange logging)
//! - Bind server to listener and shut down on signal

use axum::{
    body::Bytes,
    middleware::from_fn_with_state,
    routing::{any, get},
    Extension, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EnricherConfig;
use crate::enrich::request_id::{request_id_enricher_factory, REQUEST_ID_HEADER};
use crate::event::PropertyValue;
use crate::http::middleware::exchange::{exchange_logging_middleware, ExchangeLoggingState};
use crate::pipeline::{LogContext, Logger};

/// HTTP server hosting the exchange logging middleware.
pub struct HttpServer {
    router: Router,
    config: EnricherConfig,
}

impl HttpServer {
    /// Create a server whose exchanges log through `logger`.
    pub fn new(config: EnricherConfig, logger: Arc<Logger>) -> Self {
        let state = ExchangeLoggingState::new(logger, &config.exchange)
            .with_enricher_factory(Arc::new(request_id_enricher_factory));
        Self::with_state(config, state)
    }

    /// Create a server with a caller-built middleware state.
    pub fn with_state(config: EnricherConfig, state: ExchangeLoggingState) -> Self {
        Self::with_routes(config, state, Self::demo_routes())
    }

    /// Serve `routes` behind the full middleware stack.
    pub fn with_routes(config: EnricherConfig, state: ExchangeLoggingState, routes: Router) -> Self {
        let router = Self::build_router(&config, state, routes);
        Self { router, config }
    }

    fn demo_routes() -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/echo", any(echo_handler))
    }

    /// Wrap `routes` in all middleware layers.
    ///
    /// The exchange middleware sits outside the timeout so a timed-out
    /// exchange still logs its 408 response.
    #[allow(deprecated)]
    fn build_router(config: &EnricherConfig, state: ExchangeLoggingState, routes: Router) -> Router {
        let header = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);

        routes
            .layer(TimeoutLayer::new(Duration::from_secs(config.exchange.request_timeout_secs)))
            .layer(from_fn_with_state(state, exchange_logging_middleware))
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the configured router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Returns the request body and logs its size through the exchange context.
async fn echo_handler(ctx: Option<Extension<LogContext>>, body: Bytes) -> Bytes {
    if let Some(Extension(ctx)) = ctx {
        ctx.info("Echoing {ByteCount} bytes", vec![PropertyValue::from(body.len())]);
    }
    body
}
