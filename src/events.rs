//! Event publisher collaborator: fire-and-forget domain events.
//!
//! A publish failure is reported to the caller as a [`PublishError`] so it
//! can be logged, but it never undoes work that already completed.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// A completed state change, addressed to a named bus.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub bus: String,
    pub source: String,
    pub detail_type: String,
    pub detail: Value,
}

/// Errors raised by an [`EventPublisher`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event bus `{bus}` rejected the event: {reason}")]
    Rejected { bus: String, reason: String },

    #[error("event bus unavailable: {0}")]
    Unavailable(String),
}

/// Emits domain events. Must be safe under concurrent calls.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;
}

/// Writes each event as a structured log record and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        info!(
            bus = %event.bus,
            source = %event.source,
            detail_type = %event.detail_type,
            detail = %event.detail,
            "domain event"
        );
        Ok(())
    }
}

/// Fans events out to in-process subscribers over a tokio broadcast channel.
///
/// Publishing while nobody is subscribed drops the event and succeeds.
#[derive(Clone, Debug)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => debug!(receivers, detail_type = %event.detail_type, "event broadcast"),
            Err(_) => debug!(detail_type = %event.detail_type, "no subscribers, event dropped"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event() -> DomainEvent {
        DomainEvent {
            bus: "com.globomantics.dms".into(),
            source: "com.globomantics.dms.comments".into(),
            detail_type: "CommentAdded".into(),
            detail: json!({ "documentId": "doc-1", "commentId": "Comment#1" }),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher.publish(&event()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), event());
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_succeeds() {
        BroadcastPublisher::new(8).publish(&event()).await.unwrap();
    }

    #[test]
    fn serialises_with_camel_case_keys() {
        let value = serde_json::to_value(event()).unwrap();
        assert_eq!(value["detailType"], "CommentAdded");
        assert_eq!(value["detail"]["commentId"], "Comment#1");
    }
}
