//! Queue transport abstraction and the in-process broker
//!
//! `QueueTransport` is the seam to whatever broker carries the queue leg. It
//! offers point-to-point send with an optional correlation id and reply-to
//! address, and a blocking receive.
//!
//! # Thread Safety
//!
//! `InMemoryBroker` keeps one unbounded channel per queue name in a `DashMap`.
//! Sends never block. Each queue's receiver sits behind an async mutex so any
//! number of consumers can compete for messages; every message is delivered
//! to exactly one of them.

use super::correlation::CorrelationId;
use crate::codec::WireEncoding;
use crate::types::PaymentError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// A message on the queue leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Encoded payload
    pub body: Vec<u8>,
    /// Encoding of `body`
    pub encoding: WireEncoding,
    /// Links a request to its reply
    pub correlation_id: Option<CorrelationId>,
    /// Queue the reply should be published to
    pub reply_to: Option<String>,
}

impl Message {
    pub fn new(body: Vec<u8>, encoding: WireEncoding) -> Self {
        Self {
            body,
            encoding,
            correlation_id: None,
            reply_to: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.reply_to = Some(queue.into());
        self
    }
}

/// Point-to-point queue transport
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Publish a message to `queue`
    async fn send(&self, queue: &str, message: Message) -> Result<(), PaymentError>;

    /// Wait for the next message on `queue`
    ///
    /// Returns `None` once the transport is closed.
    async fn receive(&self, queue: &str) -> Option<Message>;
}

struct Queue {
    tx: mpsc::UnboundedSender<Message>,
    rx: Mutex<mpsc::UnboundedReceiver<Message>>,
}

impl Queue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

/// In-process broker with named queues created on first use
#[derive(Default)]
pub struct InMemoryBroker {
    queues: DashMap<String, Arc<Queue>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    // clone the Arc out so no shard lock is held across an await
    fn queue(&self, name: &str) -> Arc<Queue> {
        self.queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Queue::new()))
            .value()
            .clone()
    }
}

#[async_trait]
impl QueueTransport for InMemoryBroker {
    async fn send(&self, queue: &str, message: Message) -> Result<(), PaymentError> {
        self.queue(queue)
            .tx
            .send(message)
            .map_err(|_| PaymentError::transport(format!("queue '{}' is closed", queue)))
    }

    async fn receive(&self, queue: &str) -> Option<Message> {
        let queue = self.queue(queue);
        let mut rx = queue.rx.lock().await;
        rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_are_delivered_in_order() {
        let broker = InMemoryBroker::new();
        broker
            .send("q", Message::new(b"first".to_vec(), WireEncoding::Markup))
            .await
            .unwrap();
        broker
            .send("q", Message::new(b"second".to_vec(), WireEncoding::Markup))
            .await
            .unwrap();

        assert_eq!(broker.receive("q").await.unwrap().body, b"first");
        assert_eq!(broker.receive("q").await.unwrap().body, b"second");
    }

    #[tokio::test]
    async fn test_queues_are_independent() {
        let broker = Arc::new(InMemoryBroker::new());
        let id = CorrelationId::random();
        broker
            .send(
                "replies",
                Message::new(Vec::new(), WireEncoding::KeyValue)
                    .with_correlation_id(id.clone())
                    .with_reply_to("elsewhere"),
            )
            .await
            .unwrap();

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            broker.receive("requests"),
        )
        .await;
        assert!(pending.is_err());

        let message = broker.receive("replies").await.unwrap();
        assert_eq!(message.correlation_id, Some(id));
        assert_eq!(message.reply_to.as_deref(), Some("elsewhere"));
    }
}
