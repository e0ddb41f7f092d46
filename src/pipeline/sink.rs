//! Event sinks.

use std::sync::{Mutex, PoisonError};
use tracing::Level;

use crate::event::LogEvent;
use crate::observability::selflog;

/// Target under which enriched events are forwarded to `tracing`.
pub const EVENTS_TARGET: &str = "log_enricher::events";

/// Receives fully enriched events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LogEvent);
}

/// Forwards events to the `tracing` subscriber: the rendered message plus
/// all properties as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LogEvent) {
        let message = event.rendered_message();
        let properties = match serde_json::to_string(event.properties()) {
            Ok(json) => json,
            Err(e) => {
                selflog::report("Failed to serialize event properties", event.template().text(), &e);
                String::from("{}")
            }
        };

        let level = event.level();
        if level == Level::ERROR {
            tracing::error!(target: EVENTS_TARGET, properties = %properties, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: EVENTS_TARGET, properties = %properties, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: EVENTS_TARGET, properties = %properties, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: EVENTS_TARGET, properties = %properties, "{}", message);
        } else {
            tracing::trace!(target: EVENTS_TARGET, properties = %properties, "{}", message);
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event emitted so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
