//! Outgoing response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is a status code plus a body that is either a structured
//! JSON value, raw bytes with a content type, or nothing. Handlers build it;
//! the router hands it back untouched.

use bytes::Bytes;
use http_body_util::Full;
use serde_json::{Value, json};

use crate::schema::FieldError;
use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Json, // application/json
    Text, // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// Response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Bytes { content_type: ContentType, data: Vec<u8> },
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use margin::{Response, Status};
/// use serde_json::json;
///
/// Response::json(json!({"id": 1}));
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use margin::{Response, Status};
/// use serde_json::json;
///
/// Response::builder()
///     .status(Status::Created)
///     .header("location", "/comments/doc-1")
///     .json(json!({"id": 42}));
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) body: Body,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK` with a JSON body.
    pub fn json(body: Value) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Body::Empty, headers: Vec::new(), status: code.code() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.code() }
    }

    /// The fixed answer when no route matches.
    pub fn not_found() -> Self {
        Self::builder()
            .status(Status::NotFound)
            .json(json!({ "error": "NotFound" }))
    }

    /// The fixed answer when a handler fails.
    pub fn internal_error() -> Self {
        Self::builder()
            .status(Status::InternalServerError)
            .json(json!({ "error": "InternalError" }))
    }

    /// `400` listing every field that failed validation.
    pub fn validation_failed(errors: &[FieldError]) -> Self {
        Self::builder()
            .status(Status::BadRequest)
            .json(json!({ "error": "ValidationFailed", "errors": errors }))
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn body(&self) -> &Body { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// The JSON body, if this response carries one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Converts into the wire representation served by hyper.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let (content_type, data) = match self.body {
            Body::Empty => (None, Vec::new()),
            // Serialising a `Value` cannot fail: every map key is a string.
            Body::Json(value) => (Some(ContentType::Json), value.to_string().into_bytes()),
            Body::Bytes { content_type, data } => (Some(content_type), data),
        };

        let mut builder = http::Response::builder().status(self.status);
        if let Some(content_type) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type.as_str());
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder.body(Full::new(Bytes::from(data))).unwrap_or_else(|e| {
            tracing::error!("invalid response head: {e}");
            let mut fallback = http::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.code();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Value) -> Response {
        self.finish(Body::Json(body))
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into().into_bytes())
    }

    /// Terminate with a raw body of the given type.
    pub fn bytes(self, content_type: ContentType, data: Vec<u8>) -> Response {
        self.finish(Body::Bytes { content_type, data })
    }

    fn finish(self, body: Body) -> Response {
        Response { body, headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into a [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for Value {
    fn into_response(self) -> Response { Response::json(self) }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Ok(Status::NoContent)`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}
