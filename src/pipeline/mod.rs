//! Logging pipeline.
//!
//! # Data Flow
//! ```text
//! LogContext::info(template, args)         (explicit, request-scoped)
//!     → LogEvent::new (args bound to template holes)
//!     → Logger::write
//!         → scoped enrichers (innermost first)
//!         → global enrichers (registration order)
//!     → EventSink::emit (TracingSink / MemorySink)
//! ```
//!
//! # Design Decisions
//! - No ambient or thread-local context: handlers receive a `LogContext`
//!   through request extensions and pass it along explicitly
//! - Level filtering happens before any enricher runs

pub mod context;
pub mod logger;
pub mod sink;

pub use context::LogContext;
pub use logger::{Logger, LoggerBuilder};
pub use sink::{EventSink, MemorySink, TracingSink};
