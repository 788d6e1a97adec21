use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    COMMENT_ADDED, COMMENT_ID, COMMENT_PREFIX, CommentOptions, DATE_ADDED, DOC_ID, MergePolicy,
    OWNER,
};
use crate::error::Error;
use crate::events::{DomainEvent, EventPublisher};
use crate::principal::OwnerResolver;
use crate::request::Request;
use crate::response::Response;
use crate::schema::FieldError;
use crate::storage::{Item, PARTITION_KEY, SORT_KEY, Storage};

const SYSTEM_FIELDS: [&str; 4] = [PARTITION_KEY, SORT_KEY, DATE_ADDED, OWNER];

/// The comment operations, with their collaborators injected.
///
/// Each operation is one pass of validate, execute, respond. Nothing is
/// retried here; retries belong to the collaborators.
pub struct CommentService {
    storage: Arc<dyn Storage>,
    publisher: Arc<dyn EventPublisher>,
    owner: Arc<dyn OwnerResolver>,
    options: CommentOptions,
}

impl CommentService {
    pub fn new(
        storage: Arc<dyn Storage>,
        publisher: Arc<dyn EventPublisher>,
        owner: Arc<dyn OwnerResolver>,
        options: CommentOptions,
    ) -> Self {
        Self { storage, publisher, owner, options }
    }

    /// `GET /comments/{docid}`: every comment of the document, in sort-key
    /// order. An empty list is still `200`.
    pub async fn list(&self, req: Request) -> Result<Response, Error> {
        let doc_id = match path_variable(&req, DOC_ID) {
            Ok(doc_id) => doc_id,
            Err(response) => return Ok(response),
        };
        let items = self.storage.query(doc_id, COMMENT_PREFIX).await?;
        debug!(doc_id, count = items.len(), "listed comments");
        Ok(Response::json(Value::Array(items.into_iter().map(Value::Object).collect())))
    }

    /// `POST /comments/{docid}`: stamps a new comment, writes it, then
    /// announces it.
    ///
    /// The write is blind and happens before the event. A failed publish is
    /// logged and the created item is still returned.
    pub async fn create(&self, mut req: Request) -> Result<Response, Error> {
        let doc_id = match path_variable(&req, DOC_ID) {
            Ok(doc_id) => doc_id.to_owned(),
            Err(response) => return Ok(response),
        };
        let fields = match comment_fields(&mut req) {
            Ok(fields) => fields,
            Err(response) => return Ok(response),
        };

        let comment_id = format!("{COMMENT_PREFIX}#{}", Uuid::new_v4());
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_owned(), Value::String(doc_id.clone()));
        item.insert(SORT_KEY.to_owned(), Value::String(comment_id.clone()));
        item.insert(
            DATE_ADDED.to_owned(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        item.insert(OWNER.to_owned(), Value::String(self.owner.resolve(&req)));
        self.merge(&mut item, fields);

        self.storage.put(item.clone()).await?;
        info!(doc_id = %doc_id, comment_id = %comment_id, "comment created");

        let event = DomainEvent {
            bus: self.options.event_bus.clone(),
            source: self.options.event_source.clone(),
            detail_type: COMMENT_ADDED.to_owned(),
            detail: json!({ "documentId": &doc_id, "commentId": &comment_id }),
        };
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(error = %e, comment_id = %comment_id, "comment stored but event was not published");
        }

        Ok(Response::json(Value::Object(item)))
    }

    /// `DELETE /comments/{docid}/{commentid}`: removes the comment if it
    /// exists. Always `200` with `{}`.
    pub async fn delete(&self, req: Request) -> Result<Response, Error> {
        let (doc_id, comment_id) =
            match (path_variable(&req, DOC_ID), path_variable(&req, COMMENT_ID)) {
                (Ok(doc_id), Ok(comment_id)) => (doc_id, comment_id),
                (Err(response), _) | (_, Err(response)) => return Ok(response),
            };
        let sort_key = format!("{COMMENT_PREFIX}#{comment_id}");
        self.storage.delete(doc_id, &sort_key).await?;
        debug!(doc_id, sort_key = %sort_key, "comment deleted");
        Ok(Response::json(json!({})))
    }

    fn merge(&self, item: &mut Item, fields: Item) {
        for (key, value) in fields {
            if self.options.merge_policy == MergePolicy::ProtectSystemFields
                && SYSTEM_FIELDS.contains(&key.as_str())
            {
                warn!(field = %key, "ignoring body field that names a system attribute");
                continue;
            }
            item.insert(key, value);
        }
    }
}

fn path_variable<'r>(req: &'r Request, name: &str) -> Result<&'r str, Response> {
    req.param(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Response::validation_failed(&[FieldError::new(name, "is required")]))
}

/// The body as an object. Uses the validator's parse when present.
fn comment_fields(req: &mut Request) -> Result<Item, Response> {
    let value = match req.take_json_body() {
        Some(value) => value,
        None => {
            let bytes = req.body().unwrap_or_default();
            serde_json::from_slice(bytes).map_err(|e| {
                Response::validation_failed(&[FieldError::new(
                    "body",
                    format!("is not valid JSON: {e}"),
                )])
            })?
        }
    };
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(Response::validation_failed(&[FieldError::new("", "must be an object")])),
    }
}
