//! Request/response enricher.
//!
//! # Responsibilities
//! - Capture request facts once, at the start of an exchange
//! - Accept response facts once the downstream handler has finished
//! - Attach request properties always, response properties once available
//! - Provide the request/response message templates and their arguments
//!
//! # Phases
//! ```text
//! new(request)         attach_response(status, elapsed, body)
//!     ──▶ [Request] ───────────────────────────────▶ [Request+Response]
//!         direction "In"                              direction "Out"
//!         request properties                          request properties (unchanged)
//!                                                     + ElapsedTime, ResponseStatusCode,
//!                                                       ResponseBody
//! ```
//!
//! # Design Decisions
//! - Every property except the direction is memoized in a cache slot
//! - The direction is derived from the phase on every access
//! - A second `attach_response` overwrites the response facts and
//!   invalidates the response slots (last write wins)
//! - State sits behind a mutex so tasks spawned inside one exchange can
//!   share the enricher through an `Arc`

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::request::Parts;
use axum::http::{Request, Version};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::enrich::cache::PropertyCache;
use crate::enrich::Enricher;
use crate::event::{LogEvent, LogEventProperty, PropertyFactory, PropertyValue};

pub const REQUEST_MESSAGE_TEMPLATE: &str =
    "[{MessageDirection}] {RequestProtocol} [{RequestMethod}] {RequestPath} requested...";
pub const RESPONSE_MESSAGE_TEMPLATE: &str = "[{MessageDirection}] {RequestProtocol} [{RequestMethod}] {RequestPath} responded {ResponseStatusCode} in {ElapsedTime}ms";

pub const MESSAGE_DIRECTION: &str = "MessageDirection";
pub const REQUEST_HEADER: &str = "RequestHeader";
pub const REQUEST_METHOD: &str = "RequestMethod";
pub const REQUEST_PATH: &str = "RequestPath";
pub const REQUEST_FORM: &str = "RequestForm";
pub const REQUEST_BODY: &str = "RequestBody";
pub const REQUEST_HOST: &str = "RequestHost";
pub const REQUEST_PROTOCOL: &str = "RequestProtocol";
pub const ELAPSED_TIME: &str = "ElapsedTime";
pub const RESPONSE_STATUS_CODE: &str = "ResponseStatusCode";
pub const RESPONSE_BODY: &str = "ResponseBody";

const RESPONSE_PROPERTIES: [&str; 3] = [ELAPSED_TIME, RESPONSE_STATUS_CODE, RESPONSE_BODY];

const URLENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Which half of the exchange the enricher has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "In",
            Direction::Out => "Out",
        }
    }
}

/// Request data captured at the start of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFacts {
    pub method: String,
    pub path: String,
    pub host: String,
    pub protocol: String,
    /// Header name → values joined with `,`.
    pub headers: BTreeMap<String, String>,
    /// Present only for form-encoded requests.
    pub form: Option<BTreeMap<String, String>>,
    pub body: String,
}

impl RequestFacts {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            host: String::new(),
            protocol: "HTTP/1.1".to_string(),
            headers: BTreeMap::new(),
            form: None,
            body: String::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Capture facts from request head and buffered body.
    ///
    /// Form fields are read from `application/x-www-form-urlencoded` and
    /// `multipart/form-data` bodies; file parts are recorded by file name.
    pub async fn from_parts(parts: &Parts, body: &[u8]) -> Self {
        let mut headers = BTreeMap::new();
        for name in parts.headers.keys() {
            let joined = parts
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            headers.insert(name.as_str().to_string(), joined);
        }

        let host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let form = match content_type {
            Some(ct) => match form_kind(ct) {
                Some(FormKind::UrlEncoded) => Some(parse_urlencoded(body)),
                Some(FormKind::Multipart) => Some(parse_multipart(ct, body).await),
                None => None,
            },
            None => None,
        };

        Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            host,
            protocol: protocol_name(parts.version),
            headers,
            form,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

/// Protocol as reported in `RequestProtocol`.
fn protocol_name(version: Version) -> String {
    let name = match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        other => return format!("{:?}", other),
    };
    name.to_string()
}

enum FormKind {
    UrlEncoded,
    Multipart,
}

fn form_kind(content_type: &str) -> Option<FormKind> {
    let mime = content_type.split(';').next()?.trim();
    if mime.eq_ignore_ascii_case(URLENCODED_CONTENT_TYPE) {
        Some(FormKind::UrlEncoded)
    } else if mime.eq_ignore_ascii_case(MULTIPART_CONTENT_TYPE) {
        Some(FormKind::Multipart)
    } else {
        None
    }
}

/// Add a form field. Repeated keys are joined with `,`.
fn append_field(form: &mut BTreeMap<String, String>, key: String, value: &str) {
    form.entry(key)
        .and_modify(|existing| {
            existing.push(',');
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}

fn parse_urlencoded(body: &[u8]) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        append_field(&mut form, key.into_owned(), &value);
    }
    form
}

/// Read the named parts of a buffered multipart body.
///
/// Parsing stops at the first malformed part; fields read up to that point
/// are kept.
async fn parse_multipart(content_type: &str, body: &[u8]) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();

    let request = match Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(Bytes::copy_from_slice(body)))
    {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Unusable multipart content type");
            return form;
        }
    };

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::debug!(error = %e, "Multipart body rejected");
            return form;
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Multipart body ended early");
                break;
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let value = match file_name {
            Some(file_name) => file_name,
            None => match field.text().await {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(error = %e, field = %name, "Multipart field unreadable");
                    break;
                }
            },
        };
        append_field(&mut form, name, &value);
    }

    form
}

/// Enricher bound to a single HTTP exchange.
#[derive(Debug)]
pub struct RequestResponseEnricher {
    request: RequestFacts,
    state: Mutex<ExchangeState>,
}

impl RequestResponseEnricher {
    pub fn new(request: RequestFacts) -> Self {
        Self {
            request,
            state: Mutex::new(ExchangeState::default()),
        }
    }

    pub fn request(&self) -> &RequestFacts {
        &self.request
    }

    /// Move to the request+response phase.
    pub fn attach_response(&self, status_code: u16, elapsed: impl Into<Elapsed>, body: impl Into<String>) {
        let mut state = self.lock();
        if state.response.is_some() {
            tracing::debug!(path = %self.request.path, "Response data attached twice; overwriting");
            state.cache.invalidate(&RESPONSE_PROPERTIES);
        }
        state.response = Some(ResponseFacts {
            status_code,
            elapsed: elapsed.into(),
            body: body.into(),
        });
    }

    pub fn has_response_data(&self) -> bool {
        self.lock().response.is_some()
    }

    pub fn response(&self) -> Option<ResponseFacts> {
        self.lock().response.clone()
    }

    pub fn direction(&self) -> Direction {
        if self.has_response_data() {
            Direction::Out
        } else {
            Direction::In
        }
    }

    /// Template for the request-received message.
    pub fn request_message_template(&self) -> &'static str {
        REQUEST_MESSAGE_TEMPLATE
    }

    /// Arguments for [`REQUEST_MESSAGE_TEMPLATE`]: direction, protocol, method, path.
    pub fn request_message_args(&self) -> Vec<PropertyValue> {
        vec![
            self.direction().as_str().into(),
            self.request.protocol.clone().into(),
            self.request.method.clone().into(),
            self.request.path.clone().into(),
        ]
    }

    /// Template for the response-sent message.
    pub fn response_message_template(&self) -> &'static str {
        RESPONSE_MESSAGE_TEMPLATE
    }

    /// Arguments for [`RESPONSE_MESSAGE_TEMPLATE`]: the request arguments
    /// followed by status code and formatted elapsed time.
    ///
    /// Before a response is attached these are `0` and `"0.00"`.
    pub fn response_message_args(&self) -> Vec<PropertyValue> {
        let (status_code, elapsed) = self
            .response()
            .map(|r| (r.status_code, r.elapsed))
            .unwrap_or_default();

        let mut args = self.request_message_args();
        args.push(status_code.into());
        args.push(elapsed.formatted().into());
        args
    }

    fn lock(&self) -> MutexGuard<'_, ExchangeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

impl Enricher for RequestResponseEnricher {
    fn enrich(&self, event: &mut LogEvent, factory: &dyn PropertyFactory) {
        let mut state = self.lock();
        let ExchangeState { response, cache } = &mut *state;
        let request = &self.request;

        let direction = if response.is_some() { Direction::Out } else { Direction::In };
        event.add_property_if_absent(factory.create_property(
            MESSAGE_DIRECTION,
            Value::from(direction.as_str()),
            false,
        ));

        if let Some(response) = response.as_ref() {
            let mut add = |name: &'static str, value: &dyn Fn() -> Value| {
                let property = cache.get_or_create(name, || factory.create_property(name, value(), false));
                event.add_property_if_absent(property);
            };
            add(ELAPSED_TIME, &|| Value::from(response.elapsed.formatted()));
            add(RESPONSE_STATUS_CODE, &|| Value::from(response.status_code));
            add(RESPONSE_BODY, &|| Value::from(response.body.as_str()));
        }

        let mut add = |name: &'static str, create: &dyn Fn() -> LogEventProperty| {
            let property = cache.get_or_create(name, create);
            event.add_property_if_absent(property);
        };
        add(REQUEST_HEADER, &|| factory.create_property(REQUEST_HEADER, string_map(&request.headers), true));
        add(REQUEST_METHOD, &|| factory.create_property(REQUEST_METHOD, Value::from(request.method.as_str()), false));
        add(REQUEST_PATH, &|| factory.create_property(REQUEST_PATH, Value::from(request.path.as_str()), false));
        add(REQUEST_FORM, &|| {
            let form = request.form.as_ref().map(string_map).unwrap_or(Value::Null);
            factory.create_property(REQUEST_FORM, form, true)
        });
        add(REQUEST_BODY, &|| factory.create_property(REQUEST_BODY, Value::from(request.body.as_str()), false));
        add(REQUEST_HOST, &|| factory.create_property(REQUEST_HOST, Value::from(request.host.as_str()), false));
        add(REQUEST_PROTOCOL, &|| factory.create_property(REQUEST_PROTOCOL, Value::from(request.protocol.as_str()), false));
    }
}
