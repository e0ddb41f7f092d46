//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the enricher
//! host. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EnricherConfig {
    /// Listener configuration for the demo host.
    pub listener: ListenerConfig,

    /// Tracked environment variables and their fallback rules.
    pub environment: EnvironmentConfig,

    /// Request/response exchange logging.
    pub exchange: ExchangeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// An environment variable to include in every log event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackedVariable {
    /// Environment variable name (e.g., "APP_ENV").
    pub variable: String,

    /// Output property name inside the `Environment` property.
    /// Blank names cause the variable to be skipped.
    pub property: String,
}

impl TrackedVariable {
    pub fn new(variable: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            property: property.into(),
        }
    }
}

/// When a fallback value replaces the raw environment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackCondition {
    /// Empty or whitespace-only.
    #[default]
    Blank,
    /// Exactly empty (unset variables read as empty).
    Empty,
    /// Always replace.
    Always,
}

/// A fallback rule declared in the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    /// Variable the rule governs.
    pub variable: String,

    #[serde(default)]
    pub when: FallbackCondition,

    /// Replacement value.
    pub value: String,
}

/// Environment enricher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Variables to track, in evaluation order.
    pub tracked: Vec<TrackedVariable>,

    /// Fallback rules, registered in order (later entries win).
    pub fallbacks: Vec<FallbackConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            tracked: vec![
                TrackedVariable::new("APP_ENV", "Type"),
                TrackedVariable::new("APP_NAME", "ApplicationName"),
            ],
            fallbacks: vec![FallbackConfig {
                variable: "APP_NAME".to_string(),
                when: FallbackCondition::Blank,
                value: "log-enricher".to_string(),
            }],
        }
    }
}

/// Exchange (request/response) logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Enable the exchange middleware. When disabled requests pass through.
    pub enabled: bool,

    /// Bytes of a request or response body kept for logging. Longer
    /// bodies are logged truncated and still delivered in full.
    pub max_body_bytes: usize,

    /// Log the response body. Event streams are never captured.
    pub capture_response_body: bool,

    /// Abort the exchange when the enricher factory fails.
    /// When false the exchange continues without the factory's enrichers.
    pub propagate_factory_errors: bool,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 1024 * 1024, // 1MB
            capture_response_body: true,
            propagate_factory_errors: true,
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive for the tracing subscriber (trace, debug, info, warn, error).
    pub log_level: String,

    /// Minimum level of enriched log events.
    pub event_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            event_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
