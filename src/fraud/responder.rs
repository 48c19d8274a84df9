//! Queue-side fraud check service
//!
//! `FraudCheckResponder` consumes the fraud request queue, evaluates each
//! request and publishes the verdict to the message's reply-to queue under the
//! same correlation id. The reply uses the encoding the request came in.

use super::evaluator::FraudEvaluator;
use crate::codec;
use crate::dispatch::{Message, QueueTransport};
use crate::types::{PaymentError, PaymentRequest};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fraud evaluation behind a queue
pub struct FraudCheckResponder {
    transport: Arc<dyn QueueTransport>,
    evaluator: Arc<FraudEvaluator>,
    request_queue: String,
}

impl FraudCheckResponder {
    /// Create a responder
    ///
    /// # Arguments
    ///
    /// * `transport` - Queue transport to consume from and reply on
    /// * `evaluator` - Screening engine
    /// * `request_queue` - Queue carrying fraud check requests
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        evaluator: Arc<FraudEvaluator>,
        request_queue: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            evaluator,
            request_queue: request_queue.into(),
        }
    }

    /// Start consuming the request queue until `cancel` fires
    ///
    /// A message that cannot be answered is logged and dropped; the loop keeps
    /// going.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(queue = %self.request_queue, "Fraud check responder started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = self.transport.receive(&self.request_queue) => match received {
                        Some(message) => {
                            if let Err(error) = self.handle(message).await {
                                warn!(error = %error, "Dropping fraud check request");
                            }
                        }
                        None => break,
                    },
                }
            }
            info!(queue = %self.request_queue, "Fraud check responder stopped");
        })
    }

    /// Answer one request message
    ///
    /// # Errors
    ///
    /// - `TransportFailure` if the message has no reply-to or correlation id,
    ///   or the reply cannot be published
    /// - `DecodeFailure` if the body is not a valid request
    pub async fn handle(&self, message: Message) -> Result<(), PaymentError> {
        let reply_to = message
            .reply_to
            .ok_or_else(|| PaymentError::transport("request message has no reply-to address"))?;
        let correlation_id = message
            .correlation_id
            .ok_or_else(|| PaymentError::transport("request message has no correlation id"))?;

        let request: PaymentRequest = codec::decode(&message.body, message.encoding)?;
        let verdict = self.evaluator.evaluate(&request);
        debug!(
            transaction_id = %request.transaction_id,
            correlation_id = %correlation_id,
            status = %verdict.status,
            "Replying to fraud check request"
        );

        let reply = Message::new(codec::encode(&verdict, message.encoding)?, message.encoding)
            .with_correlation_id(correlation_id);
        self.transport.send(&reply_to, reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireEncoding;
    use crate::core::clock::FixedClock;
    use crate::dispatch::{CorrelationId, InMemoryBroker};
    use crate::fraud::Blacklists;
    use crate::test_support::{at, sample_request};
    use crate::types::{FraudStatus, FraudVerdict};

    fn responder(broker: Arc<InMemoryBroker>) -> Arc<FraudCheckResponder> {
        let evaluator = Arc::new(FraudEvaluator::new(
            Blacklists::default(),
            Arc::new(FixedClock::new(at(120))),
        ));
        Arc::new(FraudCheckResponder::new(broker, evaluator, "requests"))
    }

    fn request_message(encoding: WireEncoding, id: &CorrelationId) -> Message {
        let body = codec::encode(&sample_request("Munster Muller", "Artillery Procurement"), encoding).unwrap();
        Message::new(body, encoding)
            .with_correlation_id(id.clone())
            .with_reply_to("replies")
    }

    #[tokio::test]
    async fn test_reply_keeps_correlation_id_and_encoding() {
        let broker = Arc::new(InMemoryBroker::new());
        let id = CorrelationId::random();

        for encoding in [WireEncoding::Markup, WireEncoding::KeyValue] {
            responder(Arc::clone(&broker))
                .handle(request_message(encoding, &id))
                .await
                .unwrap();

            let reply = broker.receive("replies").await.unwrap();
            assert_eq!(reply.correlation_id.as_ref(), Some(&id));
            assert_eq!(reply.encoding, encoding);
            let verdict: FraudVerdict = codec::decode(&reply.body, encoding).unwrap();
            assert_eq!(verdict.status, FraudStatus::Suspicious);
            assert_eq!(verdict.validation_timestamp, at(120));
        }
    }

    #[tokio::test]
    async fn test_message_without_reply_to_is_refused() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut message = request_message(WireEncoding::Markup, &CorrelationId::random());
        message.reply_to = None;

        let error = responder(broker).handle(message).await.unwrap_err();
        assert_eq!(error.code(), "TRANSPORT_ERROR");
    }

    #[tokio::test]
    async fn test_loop_survives_bad_messages() {
        let broker = Arc::new(InMemoryBroker::new());
        let cancel = CancellationToken::new();
        let handle = responder(Arc::clone(&broker)).start(cancel.clone());

        let garbage = Message::new(b"<notARequest/>".to_vec(), WireEncoding::Markup)
            .with_correlation_id("x".into())
            .with_reply_to("replies");
        broker.send("requests", garbage).await.unwrap();
        let id = CorrelationId::random();
        broker.send("requests", request_message(WireEncoding::Markup, &id)).await.unwrap();

        let reply = broker.receive("replies").await.unwrap();
        assert_eq!(reply.correlation_id, Some(id));

        cancel.cancel();
        handle.await.unwrap();
    }
}
