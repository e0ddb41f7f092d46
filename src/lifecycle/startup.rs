//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn configuration into shared enrichment registries
//! - Build the process-wide logger
//!
//! # Design Decisions
//! - Registries are built once here and handed to enrichers explicitly
//! - An unknown event level falls back to INFO (validation reports it first)

use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;

use crate::config::{EnricherConfig, EnvironmentConfig};
use crate::enrich::{EnvironmentEnricher, EnvironmentSource, FallbackRegistry, TrackedVariables};
use crate::pipeline::{EventSink, Logger};

/// Registries and enricher derived from the `environment` section.
pub fn build_environment_enricher(
    config: &EnvironmentConfig,
    source: Option<Arc<dyn EnvironmentSource>>,
) -> EnvironmentEnricher {
    let tracked = Arc::new(TrackedVariables::new(config.tracked.iter().cloned()));
    let fallbacks = Arc::new(FallbackRegistry::from_config(&config.fallbacks));

    tracing::debug!(
        tracked = tracked.snapshot().len(),
        fallbacks = fallbacks.len(),
        "Environment enrichment configured"
    );

    let enricher = EnvironmentEnricher::new(tracked, fallbacks);
    match source {
        Some(source) => enricher.with_source(source),
        None => enricher,
    }
}

/// Parse a level name, defaulting to INFO.
pub fn parse_level(name: &str) -> Level {
    Level::from_str(name).unwrap_or_else(|_| {
        tracing::warn!(level = %name, "Unknown event level, using info");
        Level::INFO
    })
}

/// Build the logger every exchange writes through.
pub fn build_logger(
    config: &EnricherConfig,
    sink: Arc<dyn EventSink>,
    source: Option<Arc<dyn EnvironmentSource>>,
) -> Logger {
    let environment = build_environment_enricher(&config.environment, source);

    Logger::builder()
        .min_level(parse_level(&config.observability.event_level))
        .enrich_with(Arc::new(environment))
        .write_to(sink)
        .build()
}
