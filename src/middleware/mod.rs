//! Middleware layer.
//!
//! Middleware runs after a route matched and before its handler. Each step
//! sees the request with path variables bound and may either let it through
//! (`ControlFlow::Continue`) or answer it immediately
//! (`ControlFlow::Break(response)`), in which case no later step and not the
//! handler run.
//!
//! Built-in middleware:
//! - [`validate_path`]: checks bound path variables against a [`Schema`](crate::schema::Schema)
//! - [`validate_json_body`]: parses the body as JSON and checks it against a schema

mod validate;

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

pub use validate::{ValidateJsonBody, ValidatePath, validate_json_body, validate_path};

/// One step of a route's pre-handler chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request) -> ControlFlow<Response>;
}

/// Shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(&mut Request) -> ControlFlow<Response> + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request) -> ControlFlow<Response> {
        self(req)
    }
}

/// Runs `chain` in order, stopping at the first step that answers.
pub(crate) fn run_chain(chain: &[BoxedMiddleware], req: &mut Request) -> ControlFlow<Response> {
    for step in chain {
        step.handle(req)?;
    }
    ControlFlow::Continue(())
}
