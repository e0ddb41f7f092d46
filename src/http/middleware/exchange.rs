//! Exchange logging middleware.
//!
//! # Responsibilities
//! - Buffer the request body and capture request facts
//! - Run the optional enricher factory under the configured failure policy
//! - Hand handlers a `LogContext` through request extensions
//! - Log one event when the request arrives and one when the response leaves
//!
//! # Design Decisions
//! - The factory runs before anything is logged; a propagated failure
//!   aborts the exchange before the handler is called. It is the only
//!   way this middleware changes an exchange's outcome
//! - Bodies are captured up to `max_body_bytes` and always delivered in
//!   full; oversized or failing bodies are logged degraded
//! - Event-stream responses are passed through uncaptured

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::ExchangeConfig;
use crate::enrich::{Enricher, EnricherFactory, EnricherFactoryError, RequestFacts, RequestResponseEnricher};
use crate::http::middleware::capture::{capture_body, CaptureOutcome};
use crate::observability::{metrics, selflog};
use crate::pipeline::{LogContext, Logger};

/// What to do when the enricher factory fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactoryFailurePolicy {
    /// Fail the exchange.
    #[default]
    Propagate,
    /// Continue without factory enrichers.
    Swallow,
}

impl FactoryFailurePolicy {
    pub fn from_flag(propagate: bool) -> Self {
        if propagate {
            Self::Propagate
        } else {
            Self::Swallow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Swallow => "swallow",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    EnricherFactory(#[from] EnricherFactoryError),
}

impl ExchangeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EnricherFactory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Exchange aborted");
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Shared state for [`exchange_logging_middleware`].
#[derive(Clone)]
pub struct ExchangeLoggingState {
    logger: Arc<Logger>,
    factory: Option<EnricherFactory>,
    policy: FactoryFailurePolicy,
    enabled: bool,
    max_body_bytes: usize,
    capture_response_body: bool,
}

impl ExchangeLoggingState {
    pub fn new(logger: Arc<Logger>, config: &ExchangeConfig) -> Self {
        Self {
            logger,
            factory: None,
            policy: FactoryFailurePolicy::from_flag(config.propagate_factory_errors),
            enabled: config.enabled,
            max_body_bytes: config.max_body_bytes,
            capture_response_body: config.capture_response_body,
        }
    }

    pub fn with_enricher_factory(mut self, factory: EnricherFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_failure_policy(mut self, policy: FactoryFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FactoryFailurePolicy {
        self.policy
    }

    /// Run the factory, applying the failure policy.
    fn scoped_enrichers(&self, facts: &RequestFacts) -> Result<Vec<Arc<dyn Enricher>>, ExchangeError> {
        let Some(factory) = &self.factory else {
            return Ok(Vec::new());
        };

        match factory(facts) {
            Ok(enrichers) => Ok(enrichers),
            Err(e) => {
                metrics::record_factory_failure(self.policy.as_str());
                match self.policy {
                    FactoryFailurePolicy::Propagate => Err(e.into()),
                    FactoryFailurePolicy::Swallow => {
                        tracing::debug!(error = %e, path = %facts.path, "Enricher factory failed; continuing without");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}

const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(EVENT_STREAM_CONTENT_TYPE))
}

/// Wraps a single HTTP exchange with request/response logging.
pub async fn exchange_logging_middleware(
    State(state): State<ExchangeLoggingState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ExchangeError> {
    if !state.enabled {
        return Ok(next.run(request).await);
    }

    let start = Instant::now();

    let (parts, body) = request.into_parts();
    let captured = capture_body(body, state.max_body_bytes).await;
    if let CaptureOutcome::Failed(e) = &captured.outcome {
        selflog::report("Failed to read request body", parts.uri.path(), e);
    }

    let facts = RequestFacts::from_parts(&parts, &captured.bytes)
        .await
        .with_body(captured.logged_text());
    let scoped = state.scoped_enrichers(&facts)?;

    let exchange = Arc::new(RequestResponseEnricher::new(facts));
    let ctx = LogContext::new(state.logger.clone())
        .with_enrichers(scoped)
        .with_enricher(exchange.clone());

    ctx.info(exchange.request_message_template(), exchange.request_message_args());

    let mut request = Request::from_parts(parts, captured.body);
    request.extensions_mut().insert(ctx.clone());

    let response = next.run(request).await;
    let status = response.status().as_u16();

    let (response, body_text) = if state.capture_response_body && !is_event_stream(response.headers()) {
        let (parts, body) = response.into_parts();
        let captured = capture_body(body, state.max_body_bytes).await;
        if let CaptureOutcome::Failed(e) = &captured.outcome {
            selflog::report("Failed to read response body", &exchange.request().path, e);
        }
        let text = captured.logged_text();
        (Response::from_parts(parts, captured.body), text)
    } else {
        (response, String::new())
    };

    exchange.attach_response(status, start.elapsed(), body_text);
    ctx.info(exchange.response_message_template(), exchange.response_message_args());

    metrics::record_exchange(&exchange.request().method, status, start);

    Ok(response)
}
