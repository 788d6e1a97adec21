//! Schema-validating middleware.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use super::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::schema::{FieldError, Schema};

/// Validates the bound path variables, as a JSON object of strings.
pub struct ValidatePath {
    schema: Schema,
}

impl ValidatePath {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl Middleware for ValidatePath {
    fn handle(&self, req: &mut Request) -> ControlFlow<Response> {
        let variables: Map<String, Value> = req.params()
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let result = self.schema.validate(&Value::Object(variables));
        if result.is_ok() {
            return ControlFlow::Continue(());
        }
        warn!(path = req.path(), errors = ?result.errors, "path variables failed validation");
        ControlFlow::Break(Response::validation_failed(&result.errors))
    }
}

/// Parses the body as JSON, validates it and attaches it to the request.
///
/// A missing or unparsable body fails as a single error on field `body`.
pub struct ValidateJsonBody {
    schema: Schema,
}

impl ValidateJsonBody {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl Middleware for ValidateJsonBody {
    fn handle(&self, req: &mut Request) -> ControlFlow<Response> {
        let parsed = match req.body() {
            None => Err(FieldError::new("body", "is required")),
            Some(bytes) => serde_json::from_slice::<Value>(bytes)
                .map_err(|e| FieldError::new("body", format!("is not valid JSON: {e}"))),
        };
        let value = match parsed {
            Ok(value) => value,
            Err(error) => {
                warn!(path = req.path(), reason = %error.reason, "request body rejected");
                return ControlFlow::Break(Response::validation_failed(&[error]));
            }
        };

        let result = self.schema.validate(&value);
        if !result.is_ok() {
            warn!(path = req.path(), errors = ?result.errors, "request body failed validation");
            return ControlFlow::Break(Response::validation_failed(&result.errors));
        }
        req.set_json_body(value);
        ControlFlow::Continue(())
    }
}

/// Shorthand for an [`Arc`]ed [`ValidatePath`].
pub fn validate_path(schema: Schema) -> BoxedMiddleware {
    Arc::new(ValidatePath::new(schema))
}

/// Shorthand for an [`Arc`]ed [`ValidateJsonBody`].
pub fn validate_json_body(schema: Schema) -> BoxedMiddleware {
    Arc::new(ValidateJsonBody::new(schema))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::method::Method;
    use crate::schema::{FieldType, Format};

    fn text_schema() -> Schema {
        Schema::object()
            .required("text", FieldType::String)
            .with_format("text", Format::NonEmpty)
    }

    fn rejected(outcome: ControlFlow<Response>) -> Response {
        match outcome {
            ControlFlow::Break(response) => response,
            ControlFlow::Continue(()) => panic!("expected the request to be rejected"),
        }
    }

    #[test]
    fn path_validation_sees_bound_variables() {
        let schema = Schema::object()
            .required("docid", FieldType::String)
            .with_format("docid", Format::NonEmpty);
        let mut req = Request::new(Method::Get, "/comments/doc-1");
        req.bind_params([("docid".to_owned(), "doc-1".to_owned())].into());

        assert!(ValidatePath::new(schema.clone()).handle(&mut req).is_continue());

        let mut unbound = Request::new(Method::Get, "/comments/doc-1");
        let response = rejected(ValidatePath::new(schema).handle(&mut unbound));
        assert_eq!(response.status_code(), 400);
    }

    #[test]
    fn valid_body_is_attached() {
        let mut req = Request::new(Method::Post, "/comments/doc-1")
            .with_body(r#"{"text":"hello"}"#);

        assert!(ValidateJsonBody::new(text_schema()).handle(&mut req).is_continue());
        assert_eq!(req.json_body(), Some(&json!({ "text": "hello" })));
    }

    #[test]
    fn malformed_body_is_a_single_error() {
        let mut req = Request::new(Method::Post, "/comments/doc-1").with_body("{not json");
        let response = rejected(ValidateJsonBody::new(text_schema()).handle(&mut req));

        let errors = response.json_body().unwrap()["errors"].as_array().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["field"], "body");
        assert!(req.json_body().is_none());
    }

    #[test]
    fn missing_body_is_rejected() {
        let mut req = Request::new(Method::Post, "/comments/doc-1");
        let response = rejected(ValidateJsonBody::new(text_schema()).handle(&mut req));

        assert_eq!(
            response.json_body().unwrap()["errors"],
            json!([{ "field": "body", "reason": "is required" }]),
        );
    }

    #[test]
    fn schema_failure_reports_fields() {
        let mut req = Request::new(Method::Post, "/comments/doc-1").with_body(r#"{"text":""}"#);
        let response = rejected(ValidateJsonBody::new(text_schema()).handle(&mut req));

        assert_eq!(
            response.json_body().unwrap()["errors"],
            json!([{ "field": "text", "reason": "must not be empty" }]),
        );
    }
}
