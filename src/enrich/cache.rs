//! Per-property memoization.
//!
//! A property moves `Uncomputed → Cached` on first use. `invalidate` moves a
//! cached value to `Invalidated`, which recomputes on the next access.

use std::collections::HashMap;

use crate::event::LogEventProperty;

/// Cache state of a single property.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Slot<T> {
    #[default]
    Uncomputed,
    Cached(T),
    Invalidated,
}

impl<T: Clone> Slot<T> {
    /// Return the cached value, computing and storing it if needed.
    pub fn get_or_compute(&mut self, compute: impl FnOnce() -> T) -> T {
        match self {
            Slot::Cached(value) => value.clone(),
            Slot::Uncomputed | Slot::Invalidated => {
                let value = compute();
                *self = Slot::Cached(value.clone());
                value
            }
        }
    }
}

impl<T> Slot<T> {
    /// Drop a cached value. Uncomputed slots are left alone.
    pub fn invalidate(&mut self) {
        if matches!(self, Slot::Cached(_)) {
            *self = Slot::Invalidated;
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Slot::Cached(_))
    }
}

/// Named property slots for one enricher instance.
#[derive(Debug, Default)]
pub struct PropertyCache {
    slots: HashMap<&'static str, Slot<LogEventProperty>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the property for `name`, creating it on first use or after invalidation.
    pub fn get_or_create(
        &mut self,
        name: &'static str,
        create: impl FnOnce() -> LogEventProperty,
    ) -> LogEventProperty {
        self.slots.entry(name).or_default().get_or_compute(create)
    }

    /// Invalidate the named slots.
    pub fn invalidate(&mut self, names: &[&'static str]) {
        for name in names {
            if let Some(slot) = self.slots.get_mut(name) {
                slot.invalidate();
            }
        }
    }

    /// Current state of a slot, if it was ever touched.
    pub fn slot(&self, name: &str) -> Option<&Slot<LogEventProperty>> {
        self.slots.get(name)
    }
}
