//! Request ID enricher, supplied per exchange by the host's enricher factory.

use serde_json::Value;
use std::sync::Arc;

use crate::enrich::exchange::RequestFacts;
use crate::enrich::{Enricher, EnricherFactoryError};
use crate::event::{LogEvent, PropertyFactory};

pub const REQUEST_ID_PROPERTY_NAME: &str = "RequestId";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Adds the exchange's `x-request-id` as the `RequestId` property.
#[derive(Debug, Clone)]
pub struct RequestIdEnricher {
    request_id: String,
}

impl RequestIdEnricher {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Read the ID from captured request headers.
    pub fn from_request(facts: &RequestFacts) -> Option<Self> {
        facts
            .headers
            .get(REQUEST_ID_HEADER)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Enricher for RequestIdEnricher {
    fn enrich(&self, event: &mut LogEvent, factory: &dyn PropertyFactory) {
        event.add_property_if_absent(factory.create_property(
            REQUEST_ID_PROPERTY_NAME,
            Value::from(self.request_id.as_str()),
            false,
        ));
    }
}

/// Enricher factory for hosts that stamp every request with an ID.
///
/// Fails when the header is missing, so the exchange middleware's failure
/// policy decides whether such requests are rejected.
pub fn request_id_enricher_factory(
    facts: &RequestFacts,
) -> Result<Vec<Arc<dyn Enricher>>, EnricherFactoryError> {
    let enricher = RequestIdEnricher::from_request(facts)
        .ok_or_else(|| EnricherFactoryError::MissingHeader(REQUEST_ID_HEADER.to_string()))?;
    let enrichers: Vec<Arc<dyn Enricher>> = vec![Arc::new(enricher)];
    Ok(enrichers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DefaultPropertyFactory, PropertyValue};
    use tracing::Level;

    #[test]
    fn test_factory_reads_header() {
        let facts = RequestFacts::new("GET", "/").with_header(REQUEST_ID_HEADER, "abc-123");
        let enrichers = request_id_enricher_factory(&facts).unwrap();
        assert_eq!(enrichers.len(), 1);

        let mut event = LogEvent::new(Level::INFO, "hello", vec![]);
        enrichers[0].enrich(&mut event, &DefaultPropertyFactory);
        assert_eq!(event.property(REQUEST_ID_PROPERTY_NAME), Some(&PropertyValue::from("abc-123")));
    }

    #[test]
    fn test_factory_fails_without_header() {
        let facts = RequestFacts::new("GET", "/");
        let err = request_id_enricher_factory(&facts).err().unwrap();
        assert_eq!(err.to_string(), "required request header x-request-id is missing");

        let facts = facts.with_header(REQUEST_ID_HEADER, "");
        assert!(RequestIdEnricher::from_request(&facts).is_none());
    }
}
