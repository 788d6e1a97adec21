//! Comment resource: list, create and delete comments on a document.
//!
//! | Route | Middleware | Handler |
//! |---|---|---|
//! | `GET /comments/{docid}` | path schema | [`CommentService::list`] |
//! | `POST /comments/{docid}` | path schema, JSON body schema | [`CommentService::create`] |
//! | `DELETE /comments/{docid}/{commentid}` | path schema | [`CommentService::delete`] |
//!
//! Comments live in the document's partition under sort keys of the form
//! `Comment#<id>`, so they can share the partition with other item types.

mod handlers;
pub mod schemas;

use std::sync::Arc;

use crate::error::Error;
use crate::method::Method;
use crate::middleware::{validate_json_body, validate_path};
use crate::request::Request;
use crate::router::{Route, Router};

pub use handlers::CommentService;

/// Sort-key prefix of comment items.
pub const COMMENT_PREFIX: &str = "Comment";

/// Attribute stamped with the creation time.
pub const DATE_ADDED: &str = "DateAdded";

/// Attribute stamped with the creator's identity.
pub const OWNER: &str = "Owner";

/// Path variable naming the parent document.
pub const DOC_ID: &str = "docid";

/// Path variable naming the comment, without its prefix.
pub const COMMENT_ID: &str = "commentid";

/// Detail type of the event emitted after a create.
pub const COMMENT_ADDED: &str = "CommentAdded";

pub const DEFAULT_EVENT_BUS: &str = "com.globomantics.dms";
pub const DEFAULT_EVENT_SOURCE: &str = "com.globomantics.dms.comments";

/// How body fields are merged over the server-stamped attributes on create.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MergePolicy {
    /// Body fields win on key collision, including `PK`, `SK`, `DateAdded`
    /// and `Owner`.
    #[default]
    Permissive,
    /// Body fields named like a server-stamped attribute are dropped.
    ProtectSystemFields,
}

/// Tunables for [`CommentService`].
#[derive(Clone, Debug)]
pub struct CommentOptions {
    pub event_bus: String,
    pub event_source: String,
    pub merge_policy: MergePolicy,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            event_bus: DEFAULT_EVENT_BUS.to_owned(),
            event_source: DEFAULT_EVENT_SOURCE.to_owned(),
            merge_policy: MergePolicy::default(),
        }
    }
}

/// Registers the three comment routes on `router`, in list, create, delete order.
pub fn register(router: Router, service: Arc<CommentService>) -> Result<Router, Error> {
    let list = Arc::clone(&service);
    let create = Arc::clone(&service);
    let delete = service;

    router
        .register(
            Route::new(Method::Get, "/comments/{docid}")?
                .with(validate_path(schemas::get_comments()))
                .to(move |req: Request| {
                    let service = Arc::clone(&list);
                    async move { service.list(req).await }
                }),
        )?
        .register(
            Route::new(Method::Post, "/comments/{docid}")?
                .with(validate_path(schemas::get_comments()))
                .with(validate_json_body(schemas::create_comment()))
                .to(move |req: Request| {
                    let service = Arc::clone(&create);
                    async move { service.create(req).await }
                }),
        )?
        .register(
            Route::new(Method::Delete, "/comments/{docid}/{commentid}")?
                .with(validate_path(schemas::delete_comment()))
                .to(move |req: Request| {
                    let service = Arc::clone(&delete);
                    async move { service.delete(req).await }
                }),
        )
}

/// A router serving only the comment routes.
pub fn router(service: Arc<CommentService>) -> Result<Router, Error> {
    register(Router::new(), service)
}
