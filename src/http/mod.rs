//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace/request-id layers)
//!     → middleware/exchange.rs (capture body, enrichers, request event)
//!     → timeout layer (408 when the handler runs too long)
//!     → handler (receives LogContext via extensions)
//!     → middleware/exchange.rs (capture response, response event)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{exchange_logging_middleware, ExchangeError, ExchangeLoggingState, FactoryFailurePolicy};
pub use server::HttpServer;
