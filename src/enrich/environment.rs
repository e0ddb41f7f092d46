//! Environment variable enricher.
//!
//! # Responsibilities
//! - Hold the tracked-variable set (variable name → output property name)
//! - Resolve each tracked variable through its fallback rule
//! - Attach the result as a single structured `Environment` property
//!
//! # Design Decisions
//! - The tracked set is copy-on-write (`ArcSwap`); readers never block
//! - The snapshot is computed once per enricher instance and reused
//! - A failed read degrades to an empty value plus a self-log diagnostic
//! - Unset and empty variables are indistinguishable after reading

use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::enrich::cache::Slot;
use crate::enrich::fallback::{is_blank, FallbackRegistry};
use crate::enrich::Enricher;
use crate::event::{LogEvent, LogEventProperty, PropertyFactory};
use crate::observability::selflog;

pub use crate::config::schema::TrackedVariable;

/// Name of the property carrying the snapshot.
pub const ENVIRONMENT_PROPERTY_NAME: &str = "Environment";

/// The tracked-variable set shared by all environment enrichers.
#[derive(Debug)]
pub struct TrackedVariables {
    inner: ArcSwap<Vec<TrackedVariable>>,
}

impl TrackedVariables {
    pub fn new(variables: impl IntoIterator<Item = TrackedVariable>) -> Self {
        Self {
            inner: ArcSwap::from_pointee(variables.into_iter().collect()),
        }
    }

    /// Replace the whole set. Last writer wins.
    pub fn track(&self, variables: impl IntoIterator<Item = TrackedVariable>) {
        self.inner.store(Arc::new(variables.into_iter().collect()));
    }

    /// The current set.
    pub fn snapshot(&self) -> Arc<Vec<TrackedVariable>> {
        self.inner.load_full()
    }
}

impl Default for TrackedVariables {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Errors reading a single environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvReadError {
    #[error("environment variable name {0:?} is not readable")]
    InvalidName(String),

    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// Where variable values come from.
pub trait EnvironmentSource: Send + Sync {
    /// Read a variable. `Ok(None)` means unset.
    fn read(&self, name: &str) -> Result<Option<String>, EnvReadError>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn read(&self, name: &str) -> Result<Option<String>, EnvReadError> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return Err(EnvReadError::InvalidName(name.to_string()));
        }
        std::env::var_os(name)
            .map(|value| {
                value
                    .into_string()
                    .map_err(|_| EnvReadError::NotUnicode(name.to_string()))
            })
            .transpose()
    }
}

/// A fixed set of variables, independent of the process environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl EnvironmentSource for MapEnvironment {
    fn read(&self, name: &str) -> Result<Option<String>, EnvReadError> {
        Ok(self.vars.get(name).cloned())
    }
}

/// Resolve every tracked variable into an output-name → value map.
///
/// Entries are evaluated in set order; when two variables share an output
/// name the later one wins.
pub fn compute_snapshot(
    tracked: &[TrackedVariable],
    fallbacks: &FallbackRegistry,
    source: &dyn EnvironmentSource,
) -> BTreeMap<String, String> {
    let mut snapshot = BTreeMap::new();

    for var in tracked {
        if is_blank(&var.property) {
            continue;
        }

        let raw = match source.read(&var.variable) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                selflog::report("Failed to read a tracked environment variable value", &var.variable, &e);
                String::new()
            }
        };

        let value = match fallbacks.lookup(&var.variable) {
            Some(rule) => rule.resolve(raw),
            None => raw,
        };

        snapshot.insert(var.property.clone(), value);
    }

    snapshot
}

/// Adds the `Environment` property to every event.
pub struct EnvironmentEnricher {
    tracked: Arc<TrackedVariables>,
    fallbacks: Arc<FallbackRegistry>,
    source: Arc<dyn EnvironmentSource>,
    cached: Mutex<Slot<LogEventProperty>>,
}

impl EnvironmentEnricher {
    /// Create an enricher reading the process environment.
    pub fn new(tracked: Arc<TrackedVariables>, fallbacks: Arc<FallbackRegistry>) -> Self {
        Self {
            tracked,
            fallbacks,
            source: Arc::new(ProcessEnvironment),
            cached: Mutex::new(Slot::Uncomputed),
        }
    }

    /// Read variables from `source` instead of the process environment.
    pub fn with_source(mut self, source: Arc<dyn EnvironmentSource>) -> Self {
        self.source = source;
        self
    }

    /// Compute a fresh snapshot, bypassing the cache.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        compute_snapshot(&self.tracked.snapshot(), &self.fallbacks, self.source.as_ref())
    }

    fn property(&self, factory: &dyn PropertyFactory) -> LogEventProperty {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        cached.get_or_compute(|| {
            let snapshot = self
                .snapshot()
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            factory.create_property(ENVIRONMENT_PROPERTY_NAME, Value::Object(snapshot), true)
        })
    }
}

impl Enricher for EnvironmentEnricher {
    fn enrich(&self, event: &mut LogEvent, factory: &dyn PropertyFactory) {
        let property = self.property(factory);
        event.add_property_if_absent(property);
    }
}
