//! The logger: level filter, global enrichers, property factory and sink.

use std::fmt;
use std::sync::Arc;
use tracing::Level;

use crate::enrich::Enricher;
use crate::event::{DefaultPropertyFactory, LogEvent, PropertyFactory};
use crate::pipeline::sink::{EventSink, TracingSink};

/// Writes enriched events to a sink.
pub struct Logger {
    min_level: Level,
    enrichers: Vec<Arc<dyn Enricher>>,
    factory: Arc<dyn PropertyFactory>,
    sink: Arc<dyn EventSink>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// True if events at `level` pass the filter.
    pub fn is_enabled(&self, level: Level) -> bool {
        // tracing orders more verbose levels as greater
        level <= self.min_level
    }

    /// Enrich and emit an event.
    ///
    /// `scoped` enrichers run before the logger's own, last pushed first,
    /// so the closest scope claims a property name first.
    pub fn write(&self, mut event: LogEvent, scoped: &[Arc<dyn Enricher>]) {
        if !self.is_enabled(event.level()) {
            return;
        }

        for enricher in scoped.iter().rev().chain(self.enrichers.iter()) {
            enricher.enrich(&mut event, self.factory.as_ref());
        }

        self.sink.emit(&event);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("enrichers", &self.enrichers.len())
            .finish()
    }
}

/// Builder for [`Logger`].
pub struct LoggerBuilder {
    min_level: Level,
    enrichers: Vec<Arc<dyn Enricher>>,
    factory: Arc<dyn PropertyFactory>,
    sink: Arc<dyn EventSink>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enrichers: Vec::new(),
            factory: Arc::new(DefaultPropertyFactory),
            sink: Arc::new(TracingSink),
        }
    }
}

impl LoggerBuilder {
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Add an enricher applied to every event.
    pub fn enrich_with(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    pub fn property_factory(mut self, factory: Arc<dyn PropertyFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn write_to(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            min_level: self.min_level,
            enrichers: self.enrichers,
            factory: self.factory,
            sink: self.sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEventProperty, PropertyValue};
    use crate::pipeline::sink::MemorySink;

    struct Fixed(&'static str, &'static str);

    impl Enricher for Fixed {
        fn enrich(&self, event: &mut LogEvent, _factory: &dyn PropertyFactory) {
            event.add_property_if_absent(LogEventProperty::new(self.0, self.1));
        }
    }

    #[test]
    fn test_level_filter() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder().min_level(Level::WARN).write_to(sink.clone()).build();

        logger.write(LogEvent::new(Level::INFO, "dropped", vec![]), &[]);
        logger.write(LogEvent::new(Level::ERROR, "kept", vec![]), &[]);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rendered_message(), "kept");
    }

    #[test]
    fn test_enricher_order() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder()
            .enrich_with(Arc::new(Fixed("Source", "global")))
            .write_to(sink.clone())
            .build();

        let scoped: Vec<Arc<dyn Enricher>> = vec![
            Arc::new(Fixed("Source", "outer")),
            Arc::new(Fixed("Source", "inner")),
        ];
        logger.write(LogEvent::new(Level::INFO, "x", vec![]), &scoped);
        logger.write(LogEvent::new(Level::INFO, "y", vec![]), &[]);

        let events = sink.events();
        assert_eq!(events[0].property("Source"), Some(&PropertyValue::from("inner")));
        assert_eq!(events[1].property("Source"), Some(&PropertyValue::from("global")));
    }
}
