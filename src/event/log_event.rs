//! The log event passed through enrichers to a sink.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::Level;

use crate::event::template::MessageTemplate;
use crate::event::value::{LogEventProperty, PropertyValue};

/// A single log record with its property set.
#[derive(Debug, Clone)]
pub struct LogEvent {
    timestamp: SystemTime,
    level: Level,
    template: MessageTemplate,
    properties: BTreeMap<String, PropertyValue>,
}

impl LogEvent {
    /// Create an event, binding `args` to the template's holes.
    ///
    /// Bound arguments become the event's first properties, so enrichers
    /// cannot override values supplied at the call site.
    pub fn new(level: Level, template: impl Into<MessageTemplate>, args: Vec<PropertyValue>) -> Self {
        let template = template.into();
        let properties = template.bind(args).into_iter().collect();
        Self {
            timestamp: SystemTime::now(),
            level,
            template,
            properties,
        }
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Add a property unless one with the same name is already present.
    ///
    /// Returns true if the property was added.
    pub fn add_property_if_absent(&mut self, property: LogEventProperty) -> bool {
        match self.properties.entry(property.name) {
            Entry::Vacant(slot) => {
                slot.insert(property.value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Add a property, replacing any existing value.
    pub fn add_or_update_property(&mut self, property: LogEventProperty) {
        self.properties.insert(property.name, property.value);
    }

    /// The template rendered against the current property set.
    pub fn rendered_message(&self) -> String {
        self.template.render(&self.properties)
    }
}
