//! Incoming request type.
//!
//! A [`Request`] arrives already parsed and authenticated. Path variables are
//! bound by the router after matching; the parsed JSON body is attached by
//! the body validator.

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::Value;

use crate::method::Method;

/// An inbound API request.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Bytes>,
    pub(crate) params: HashMap<String, String>,
    pub(crate) parsed_body: Option<Value>,
}

impl Request {
    /// A request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            params: HashMap::new(),
            parsed_body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Raw payload, `None` when the caller sent no body.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path variable.
    ///
    /// For a route `/comments/{docid}`, `req.param("docid")` on
    /// `/comments/doc-123` returns `Some("doc-123")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The body as parsed by the body validator, if it ran.
    pub fn json_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Attaches a parsed body. Called by body-validating middleware.
    pub fn set_json_body(&mut self, value: Value) {
        self.parsed_body = Some(value);
    }

    /// Removes the parsed body, leaving `None` behind.
    pub fn take_json_body(&mut self) -> Option<Value> {
        self.parsed_body.take()
    }

    pub(crate) fn bind_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::Get, "/comments/doc-1")
            .with_header("X-Principal-Id", "user-7");

        assert_eq!(req.header("x-principal-id"), Some("user-7"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn fresh_request_has_no_variables_or_body() {
        let req = Request::new(Method::Post, "/comments/doc-1");

        assert!(req.params().is_empty());
        assert!(req.body().is_none());
        assert!(req.json_body().is_none());
    }
}
