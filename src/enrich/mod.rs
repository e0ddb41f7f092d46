//! Enrichment subsystem.
//!
//! # Data Flow
//! ```text
//! Process-wide (shared, read-mostly):
//!     TrackedVariables (ArcSwap) + FallbackRegistry (DashMap)
//!         → EnvironmentEnricher (snapshot computed once per instance)
//!
//! Per exchange (owned by the middleware):
//!     RequestFacts → RequestResponseEnricher
//!         → attach_response() moves it from request-only to request+response
//!
//! Every log event:
//!     Logger runs each enricher with a PropertyFactory
//!         → properties added if absent (first writer wins)
//! ```
//!
//! # Design Decisions
//! - Configuration holders are passed to enricher constructors, never global
//! - Properties are memoized per enricher through explicit cache slots
//! - Message direction is derived on every access instead of cached

pub mod cache;
pub mod environment;
pub mod exchange;
pub mod fallback;
pub mod request_id;

use std::sync::Arc;
use thiserror::Error;

use crate::event::{LogEvent, PropertyFactory};

pub use environment::{EnvironmentEnricher, EnvironmentSource, MapEnvironment, ProcessEnvironment, TrackedVariables};
pub use exchange::{Elapsed, RequestFacts, RequestResponseEnricher};
pub use fallback::{FallbackRegistry, FallbackRule};
pub use request_id::RequestIdEnricher;

/// Adds named properties to a log event before it is emitted.
pub trait Enricher: Send + Sync {
    fn enrich(&self, event: &mut LogEvent, factory: &dyn PropertyFactory);
}

/// Errors raised by an externally supplied enricher factory.
#[derive(Debug, Error)]
pub enum EnricherFactoryError {
    /// A header the factory depends on was not present.
    #[error("required request header {0} is missing")]
    MissingHeader(String),

    #[error("enricher factory failed: {0}")]
    Failed(String),
}

/// Produces per-exchange enrichers from the captured request.
pub type EnricherFactory =
    Arc<dyn Fn(&RequestFacts) -> Result<Vec<Arc<dyn Enricher>>, EnricherFactoryError> + Send + Sync>;
