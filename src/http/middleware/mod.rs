//! HTTP middleware.

pub mod capture;
pub mod exchange;

pub use capture::{capture_body, CaptureOutcome, CapturedBody};
pub use exchange::{exchange_logging_middleware, ExchangeError, ExchangeLoggingState, FactoryFailurePolicy};
