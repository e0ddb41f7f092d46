//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the host process
//! - Configure log level from environment, falling back to config
//!
//! # Design Decisions
//! - `RUST_LOG` takes precedence over `observability.log_level`
//! - Enriched events arrive through `TracingSink` and share this subscriber

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", config.log_level)));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
