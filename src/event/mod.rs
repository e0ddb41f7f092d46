//! Log event model.
//!
//! # Data Flow
//! ```text
//! call site (template + positional args)
//!     → template.rs (parse holes, bind args to property names)
//!     → LogEvent (properties seeded from bound args)
//!     → enrichers (add_property_if_absent, first writer wins)
//!     → sink (rendered message + structured properties)
//! ```
//!
//! # Design Decisions
//! - Property values are a closed enum so sinks never need reflection
//! - Properties are keyed by name; insertion never overwrites
//! - The property factory decides whether maps are captured as structures
//!   or stringified

pub mod log_event;
pub mod template;
pub mod value;

pub use log_event::LogEvent;
pub use template::MessageTemplate;
pub use value::{DefaultPropertyFactory, LogEventProperty, PropertyFactory, PropertyValue};
