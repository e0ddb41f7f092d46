//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host process:
//!     → logging.rs (tracing subscriber: filter + formatter)
//!     → metrics.rs (counters, histograms, Prometheus exporter)
//!
//! Enrichment internals:
//!     → selflog.rs (non-fatal diagnostics that must never break logging)
//! ```
//!
//! # Design Decisions
//! - Enriched events are forwarded into `tracing`, so one subscriber serves both
//! - Self-log uses its own target so it can be filtered separately
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod selflog;
