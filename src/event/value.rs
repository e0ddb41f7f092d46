//! Property values and the factory that materializes them.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar or structured value attached to a log event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Sequence(Vec<PropertyValue>),
    Structure(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Convert a JSON value into a property value.
    ///
    /// With `capture_structure` set, objects and arrays keep their shape.
    /// Otherwise they are stringified as JSON text. Scalars are always kept.
    pub fn capture(value: Value, capture_structure: bool) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => PropertyValue::Text(s),
            Value::Array(items) if capture_structure => PropertyValue::Sequence(
                items
                    .into_iter()
                    .map(|item| PropertyValue::capture(item, true))
                    .collect(),
            ),
            Value::Object(map) if capture_structure => PropertyValue::Structure(
                map.into_iter()
                    .map(|(k, v)| (k, PropertyValue::capture(v, true)))
                    .collect(),
            ),
            other => PropertyValue::Text(other.to_string()),
        }
    }

    /// Borrow the text of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the entries of a `Structure` value.
    pub fn as_structure(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Structure(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Sequence(_) | PropertyValue::Structure(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<u16> for PropertyValue {
    fn from(i: u16) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<usize> for PropertyValue {
    fn from(i: usize) -> Self {
        i64::try_from(i)
            .map(PropertyValue::Int)
            .unwrap_or(PropertyValue::Float(i as f64))
    }
}

impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        PropertyValue::Float(x)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

/// A named value ready to be attached to a log event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEventProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl LogEventProperty {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Materializes named values into event properties.
///
/// Supplied by the logging pipeline to every enricher call.
pub trait PropertyFactory: Send + Sync {
    fn create_property(&self, name: &str, value: Value, capture_structure: bool) -> LogEventProperty;
}

/// Factory used by [`crate::pipeline::Logger`] unless another is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyFactory;

impl PropertyFactory for DefaultPropertyFactory {
    fn create_property(&self, name: &str, value: Value, capture_structure: bool) -> LogEventProperty {
        LogEventProperty::new(name, PropertyValue::capture(value, capture_structure))
    }
}
