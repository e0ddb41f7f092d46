//! Request-scoped logging context.

use std::fmt;
use std::sync::Arc;
use tracing::Level;

use crate::enrich::Enricher;
use crate::event::{LogEvent, MessageTemplate, PropertyValue};
use crate::pipeline::logger::Logger;

/// A logger plus the enrichers of the current scope.
///
/// Cloning is cheap; a clone shares the same enricher instances, so state
/// attached to one (e.g. response data) is seen through every clone.
#[derive(Clone)]
pub struct LogContext {
    logger: Arc<Logger>,
    enrichers: Vec<Arc<dyn Enricher>>,
}

impl LogContext {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            enrichers: Vec::new(),
        }
    }

    /// A nested scope with one more enricher.
    pub fn with_enricher(&self, enricher: Arc<dyn Enricher>) -> Self {
        let mut scope = self.clone();
        scope.enrichers.push(enricher);
        scope
    }

    /// A nested scope with several more enrichers, pushed in order.
    pub fn with_enrichers(&self, enrichers: impl IntoIterator<Item = Arc<dyn Enricher>>) -> Self {
        let mut scope = self.clone();
        scope.enrichers.extend(enrichers);
        scope
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn enrichers(&self) -> &[Arc<dyn Enricher>] {
        &self.enrichers
    }

    pub fn write(&self, level: Level, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) {
        if !self.logger.is_enabled(level) {
            return;
        }
        self.logger.write(LogEvent::new(level, template, args), &self.enrichers);
    }

    pub fn debug(&self, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) {
        self.write(Level::DEBUG, template, args);
    }

    pub fn info(&self, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) {
        self.write(Level::INFO, template, args);
    }

    pub fn warn(&self, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) {
        self.write(Level::WARN, template, args);
    }

    pub fn error(&self, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) {
        self.write(Level::ERROR, template, args);
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("logger", &self.logger)
            .field("enrichers", &self.enrichers.len())
            .finish()
    }
}
