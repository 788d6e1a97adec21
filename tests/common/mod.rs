//! Collaborator doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use margin::comments::{self, CommentOptions, CommentService};
use margin::events::{DomainEvent, EventPublisher, PublishError};
use margin::principal::FixedOwner;
use margin::storage::{Item, MemoryStorage, Storage, StorageError};
use margin::{Method, Request, Router};

pub const OWNER: &str = "owner-42";

/// Wraps [`MemoryStorage`] and counts every call.
#[derive(Default)]
pub struct RecordingStorage {
    inner: MemoryStorage,
    pub queries: AtomicUsize,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl RecordingStorage {
    pub fn puts(&self) -> usize { self.puts.load(Ordering::SeqCst) }
    pub fn deletes(&self) -> usize { self.deletes.load(Ordering::SeqCst) }
    pub fn len(&self) -> usize { self.inner.len() }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn query(&self, partition: &str, sort_prefix: &str) -> Result<Vec<Item>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(partition, sort_prefix).await
    }

    async fn put(&self, item: Item) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(item).await
    }

    async fn delete(&self, partition: &str, sort: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(partition, sort).await
    }
}

/// Every call fails.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn query(&self, _: &str, _: &str) -> Result<Vec<Item>, StorageError> {
        Err(StorageError::Unavailable("table offline".into()))
    }

    async fn put(&self, _: Item) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("table offline".into()))
    }

    async fn delete(&self, _: &str, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("table offline".into()))
    }
}

/// Records published events; optionally fails after recording.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DomainEvent>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self { events: Mutex::default(), fail: true }
    }

    pub fn published(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        self.events.lock().push(event.clone());
        if self.fail {
            return Err(PublishError::Unavailable("bus offline".into()));
        }
        Ok(())
    }
}

pub fn router_with(storage: Arc<dyn Storage>, publisher: Arc<dyn EventPublisher>) -> Router {
    let service = CommentService::new(
        storage,
        publisher,
        Arc::new(FixedOwner(OWNER.into())),
        CommentOptions::default(),
    );
    comments::router(Arc::new(service)).expect("comment routes register")
}

pub fn get(path: &str) -> Request {
    Request::new(Method::Get, path)
}

pub fn post(path: &str, body: &str) -> Request {
    Request::new(Method::Post, path).with_body(body.to_owned())
}

pub fn delete(path: &str) -> Request {
    Request::new(Method::Delete, path)
}
