//! Structured log enrichment for HTTP services.

pub mod config;
pub mod enrich;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;

pub use config::schema::EnricherConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{LogContext, Logger};
