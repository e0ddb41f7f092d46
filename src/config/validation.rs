//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, levels and limits
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EnricherConfig → Result<(), Vec<ValidationError>>
//! - Blank tracked-variable property names and blank fallback variables are
//!   not errors; the enrichers skip them

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

use crate::config::schema::EnricherConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.event_level {0:?} is not a log level")]
    InvalidEventLevel(String),

    #[error("exchange.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("exchange.request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &EnricherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(observability.metrics_address.clone()));
    }
    if Level::from_str(&observability.event_level).is_err() {
        errors.push(ValidationError::InvalidEventLevel(observability.event_level.clone()));
    }

    if config.exchange.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.exchange.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&EnricherConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EnricherConfig::default();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();
        config.observability.event_level = "loud".into();
        config.exchange.request_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidMetricsAddress("bad".into()),
                ValidationError::InvalidEventLevel("loud".into()),
                ValidationError::ZeroTimeout,
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = EnricherConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());
    }
}
