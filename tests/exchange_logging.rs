//! End-to-end tests for the exchange logging middleware.

use axum::body::{to_bytes, Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use futures_util::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use log_enricher::config::EnricherConfig;
use log_enricher::enrich::{Enricher, EnricherFactory, EnricherFactoryError, RequestFacts, RequestIdEnricher};
use log_enricher::event::PropertyValue;
use log_enricher::http::{HttpServer, ExchangeLoggingState, FactoryFailurePolicy};

mod common;

fn text(value: &str) -> PropertyValue {
    PropertyValue::from(value)
}

#[tokio::test]
async fn test_echo_logs_request_handler_and_response() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);
    let (addr, shutdown) = common::start_server(config, logger).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/echo", addr))
        .header("x-request-id", "req-42")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
    assert_eq!(response.text().await.unwrap(), "hello");

    let events = sink.events();
    assert_eq!(events.len(), 3);

    assert_eq!(events[0].rendered_message(), "[In] HTTP/1.1 [POST] /echo requested...");
    assert_eq!(events[1].rendered_message(), "Echoing 5 bytes");
    assert!(events[2]
        .rendered_message()
        .starts_with("[Out] HTTP/1.1 [POST] /echo responded 200 in "));

    for event in &events {
        assert_eq!(event.property("RequestId"), Some(&text("req-42")));
        let env = event.property("Environment").and_then(PropertyValue::as_structure).unwrap();
        assert_eq!(env.get("Type"), Some(&text("integration")));
        assert_eq!(env.get("ApplicationName"), Some(&text("log-enricher")));
    }

    assert_eq!(events[0].property("RequestBody"), Some(&text("hello")));
    assert_eq!(events[1].property("MessageDirection"), Some(&text("In")));
    assert!(events[1].property("ResponseStatusCode").is_none());
    assert_eq!(events[2].property("ResponseStatusCode"), Some(&PropertyValue::Int(200)));
    assert_eq!(events[2].property("ResponseBody"), Some(&text("hello")));

    shutdown.trigger();
}

#[tokio::test]
async fn test_generated_request_id_is_logged() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);
    let (addr, shutdown) = common::start_server(config, logger).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let header = response.headers()["x-request-id"].to_str().unwrap().to_string();

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].property("RequestId"), Some(&text(&header)));
    assert_eq!(events[1].property("ResponseBody"), Some(&text("OK")));

    shutdown.trigger();
}

fn failing_factory(calls: Arc<AtomicUsize>) -> EnricherFactory {
    Arc::new(move |_facts: &RequestFacts| -> Result<Vec<Arc<dyn Enricher>>, EnricherFactoryError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(EnricherFactoryError::Failed("tenant lookup unavailable".into()))
    })
}

#[tokio::test]
async fn test_factory_failure_propagates_by_default() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);
    let calls = Arc::new(AtomicUsize::new(0));

    let state = ExchangeLoggingState::new(logger, &config.exchange)
        .with_enricher_factory(failing_factory(calls.clone()));
    assert_eq!(state.policy(), FactoryFailurePolicy::Propagate);
    let app = HttpServer::with_state(config, state).router();

    let response = app
        .oneshot(Request::builder().uri("/echo").body(Body::from("x")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_factory_failure_swallowed() {
    let mut config = EnricherConfig::default();
    config.exchange.propagate_factory_errors = false;
    let (logger, sink) = common::memory_logger(&config);
    let calls = Arc::new(AtomicUsize::new(0));

    let state = ExchangeLoggingState::new(logger, &config.exchange)
        .with_enricher_factory(failing_factory(calls.clone()));
    let app = HttpServer::with_state(config, state).router();

    let response = app
        .oneshot(Request::builder().uri("/echo").body(Body::from("abc")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.property("RequestId").is_none()));
    assert_eq!(events[1].rendered_message(), "Echoing 3 bytes");
}

#[tokio::test]
async fn test_factory_enrichers_scope_the_exchange() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);

    let factory: EnricherFactory = Arc::new(|facts: &RequestFacts| -> Result<Vec<Arc<dyn Enricher>>, EnricherFactoryError> {
        let tenant = facts
            .headers
            .get("x-tenant")
            .ok_or_else(|| EnricherFactoryError::MissingHeader("x-tenant".into()))?;
        let enrichers: Vec<Arc<dyn Enricher>> = vec![Arc::new(RequestIdEnricher::new(tenant.clone()))];
        Ok(enrichers)
    });
    let state = ExchangeLoggingState::new(logger, &config.exchange)
        .with_enricher_factory(factory)
        .with_failure_policy(FactoryFailurePolicy::Swallow);
    let app = HttpServer::with_state(config, state).router();

    let response = app
        .oneshot(Request::builder().uri("/health").header("x-tenant", "acme").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.property("RequestId") == Some(&text("acme"))));
}

#[tokio::test]
async fn test_disabled_middleware_passes_through() {
    let mut config = EnricherConfig::default();
    config.exchange.enabled = false;
    let (logger, sink) = common::memory_logger(&config);
    let app = HttpServer::new(config, logger).router();

    let response = app
        .oneshot(Request::builder().uri("/echo").body(Body::from("quiet")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_form_body_is_captured() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);
    let app = HttpServer::new(config, logger).router();

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("name=ada&tag=a&tag=b"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = sink.events();
    let form = events[0].property("RequestForm").and_then(PropertyValue::as_structure).unwrap();
    assert_eq!(form.get("name"), Some(&text("ada")));
    assert_eq!(form.get("tag"), Some(&text("a,b")));
    assert_eq!(events[0].property("RequestMethod"), Some(&text("POST")));
}

#[tokio::test]
async fn test_oversized_body_logged_truncated() {
    let mut config = EnricherConfig::default();
    config.exchange.max_body_bytes = 4;
    let (logger, sink) = common::memory_logger(&config);
    let app = HttpServer::new(config, logger).router();

    let response = app
        .oneshot(Request::builder().method("POST").uri("/echo").body(Body::from("oversized")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(echoed, "oversized");

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].property("RequestBody"), Some(&text("over [truncated]")));
    assert_eq!(events[1].rendered_message(), "Echoing 9 bytes");
    assert_eq!(events[2].property("ResponseBody"), Some(&text("over [truncated]")));
}

#[tokio::test]
async fn test_failing_response_body_keeps_status() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);

    let routes = Router::new().route(
        "/stream",
        get(|| async {
            let frames: Vec<Result<Bytes, std::io::Error>> = vec![Err(std::io::Error::other("upstream closed"))];
            (StatusCode::ACCEPTED, Body::from_stream(stream::iter(frames)))
        }),
    );
    let state = ExchangeLoggingState::new(logger, &config.exchange);
    let app = HttpServer::with_routes(config, state, routes).router();

    let response = app
        .oneshot(Request::builder().uri("/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(events[1]
        .rendered_message()
        .starts_with("[Out] HTTP/1.1 [GET] /stream responded 202 in "));
    assert_eq!(events[1].property("ResponseBody"), Some(&text("[incomplete]")));
}

#[tokio::test]
async fn test_event_stream_response_not_captured() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);

    let routes = Router::new().route(
        "/events",
        get(|| async { ([(CONTENT_TYPE, "text/event-stream")], "data: tick\n\n") }),
    );
    let state = ExchangeLoggingState::new(logger, &config.exchange);
    let app = HttpServer::with_routes(config, state, routes).router();

    let response = app
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(to_bytes(response.into_body(), usize::MAX).await.unwrap(), "data: tick\n\n");

    let events = sink.events();
    assert_eq!(events[1].property("ResponseBody"), Some(&text("")));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_exchange_logs_response() {
    let mut config = EnricherConfig::default();
    config.exchange.request_timeout_secs = 1;
    let (logger, sink) = common::memory_logger(&config);

    let routes = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "late"
        }),
    );
    let state = ExchangeLoggingState::new(logger, &config.exchange);
    let app = HttpServer::with_routes(config, state, routes).router();

    let response = app
        .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(events[1]
        .rendered_message()
        .starts_with("[Out] HTTP/1.1 [GET] /slow responded 408 in "));
}

#[tokio::test]
async fn test_multipart_form_captured() {
    let config = EnricherConfig::default();
    let (logger, sink) = common::memory_logger(&config);
    let app = HttpServer::new(config, logger).router();

    let body = "--B\r\nContent-Disposition: form-data; name=\"user\"\r\n\r\nana\r\n--B--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header("content-type", "multipart/form-data; boundary=B")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = sink.events();
    let form = events[0].property("RequestForm").and_then(PropertyValue::as_structure).unwrap();
    assert_eq!(form.get("user"), Some(&text("ana")));
}
