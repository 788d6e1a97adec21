//! # margin
//!
//! Request dispatcher for a document-comment service.
//!
//! An inbound request is matched against registered routes in registration
//! order, its path variables and JSON body are validated against declared
//! schemas, and the matching handler runs a domain operation against an
//! injected [`Storage`] and, for creates, an injected [`EventPublisher`].
//!
//! ## The contract
//!
//! Authentication, TLS and request limits happen upstream. margin receives
//! an already authenticated request and always answers it:
//!
//! - no matching route: `404 {"error":"NotFound"}`
//! - failed validation: `400 {"error":"ValidationFailed","errors":[…]}`
//! - failed storage call or handler panic: `500 {"error":"InternalError"}`
//! - failed event publish after a write: logged, response unchanged
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use margin::comments::{self, CommentOptions, CommentService};
//! use margin::events::LogPublisher;
//! use margin::principal::FixedOwner;
//! use margin::storage::MemoryStorage;
//! use margin::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), margin::Error> {
//!     let service = CommentService::new(
//!         Arc::new(MemoryStorage::new()),
//!         Arc::new(LogPublisher),
//!         Arc::new(FixedOwner("user-1".into())),
//!         CommentOptions::default(),
//!     );
//!     let router = comments::router(Arc::new(service))?;
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).serve(router).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod comments;
pub mod config;
pub mod events;
pub mod matcher;
pub mod middleware;
pub mod principal;
pub mod schema;
pub mod storage;
pub mod telemetry;

pub use error::Error;
pub use events::EventPublisher;
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{Body, ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Route, RouteBuilder, Router};
pub use server::{Server, serve_listener};
pub use status::Status;
pub use storage::Storage;
