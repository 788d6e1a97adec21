//! Ordered request router.
//!
//! Routes are tried in registration order and the first full match wins.
//! A matched request runs through its route's middleware chain and then its
//! handler. Every path through [`Router::dispatch`] ends in a response:
//! no match is a fixed `404`, a failing or panicking handler a fixed `500`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, error, info, info_span};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::matcher::{PathMatcher, PathVariables};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, run_chain};
use crate::request::Request;
use crate::response::Response;

/// A `(method, pattern)` binding with its middleware chain and handler.
pub struct Route {
    matcher: PathMatcher,
    chain: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
}

impl Route {
    /// Starts a route. Fails if `pattern` is malformed.
    ///
    /// ```rust,no_run
    /// # use margin::{Error, Method, Request, Response, Route, Router};
    /// # use margin::middleware::validate_path;
    /// # use margin::schema::{FieldType, Schema};
    /// # async fn list(_: Request) -> Result<Response, Error> { Ok(Response::text("")) }
    /// # fn main() -> Result<(), Error> {
    /// let router = Router::new().register(
    ///     Route::new(Method::Get, "/comments/{docid}")?
    ///         .with(validate_path(Schema::object().required("docid", FieldType::String)))
    ///         .to(list),
    /// )?;
    /// # Ok(()) }
    /// ```
    pub fn new(method: Method, pattern: &str) -> Result<RouteBuilder, Error> {
        Ok(RouteBuilder { matcher: PathMatcher::new(method, pattern)?, chain: Vec::new() })
    }

    pub fn method(&self) -> Method { self.matcher.method() }
    pub fn pattern(&self) -> &str { self.matcher.pattern() }
}

/// A route still missing its handler.
pub struct RouteBuilder {
    matcher: PathMatcher,
    chain: Vec<BoxedMiddleware>,
}

impl RouteBuilder {
    /// Appends a middleware step. Steps run in the order they were added.
    pub fn with(mut self, middleware: BoxedMiddleware) -> Self {
        self.chain.push(middleware);
        self
    }

    /// Terminates the route with its handler.
    pub fn to(self, handler: impl Handler) -> Route {
        Route {
            matcher: self.matcher,
            chain: self.chain,
            handler: handler.into_boxed_handler(),
        }
    }
}

/// The application router.
///
/// Build it once at startup and share it; dispatch takes `&self` and keeps
/// no state between calls.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends `route`. Returns `self` for chaining.
    ///
    /// Fails with [`Error::DuplicateRoute`] if the same method and pattern
    /// are already registered.
    pub fn register(mut self, route: Route) -> Result<Self, Error> {
        let duplicate = self.routes.iter()
            .any(|r| r.method() == route.method() && r.pattern() == route.pattern());
        if duplicate {
            return Err(Error::DuplicateRoute {
                method: route.method(),
                pattern: route.pattern().to_owned(),
            });
        }
        self.routes.push(route);
        Ok(self)
    }

    /// Registers a handler with no middleware.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Route::new(method, pattern)?.to(handler))
    }

    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.routes.iter().map(|r| (r.method(), r.pattern()))
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<(&Route, PathVariables)> {
        self.routes.iter().find_map(|route| {
            route.matcher.match_path(method, path).map(|variables| (route, variables))
        })
    }

    /// Routes one request and produces one response.
    pub async fn dispatch(&self, req: Request) -> Response {
        let span = info_span!("dispatch", method = %req.method(), path = req.path());
        async move {
            let started = Instant::now();
            let response = self.run(req).await;
            info!(
                status = response.status_code(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "request completed"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn run(&self, mut req: Request) -> Response {
        let Some((route, variables)) = self.lookup(req.method(), req.path()) else {
            debug!("no route matched");
            return Response::not_found();
        };
        debug!(pattern = route.pattern(), "route matched");
        req.bind_params(variables);

        if let ControlFlow::Break(response) = run_chain(&route.chain, &mut req) {
            return response;
        }

        // Run the handler on its own task so a panic is contained as a JoinError.
        let handler = Arc::clone(&route.handler);
        match tokio::spawn(handler.call(req).in_current_span()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, "handler failed");
                Response::internal_error()
            }
            Err(e) => {
                error!(error = %e, "handler aborted");
                Response::internal_error()
            }
        }
    }
}
