//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EnricherConfig (validated, immutable)
//!     → lifecycle::startup builds registries and the logger from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::EnricherConfig;
pub use schema::EnvironmentConfig;
pub use schema::ExchangeConfig;
pub use schema::FallbackConfig;
pub use schema::ObservabilityConfig;
pub use schema::TrackedVariable;
