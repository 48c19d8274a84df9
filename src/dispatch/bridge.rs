//! Dispatch bridge
//!
//! `DispatchBridge::send` takes a canonical request and a `TransportKind` and
//! returns the fraud verdict, blocking the calling flow for at most the
//! configured reply timeout.
//!
//! # Design
//!
//! - **Direct**: the request is key-value encoded and handed to a
//!   `DirectEndpoint`. Endpoint errors come back as `TransportFailure`.
//! - **Queued**: a fresh correlation id is registered in the
//!   `CorrelationTable` before the markup-encoded request is published, so a
//!   fast reply can never arrive ahead of its waiter. The reply listener
//!   (`spawn_reply_listener`) drains the reply queue and completes waiters by
//!   id. Replies nobody waits for are logged and discarded.
//!
//! On timeout the waiter guard is dropped, which removes the table entry,
//! and the caller gets `DispatchTimeout`.

use super::correlation::{CorrelationId, CorrelationTable};
use super::direct::DirectEndpoint;
use super::queue::{Message, QueueTransport};
use super::TransportKind;
use crate::codec::{self, WireEncoding};
use crate::types::{FraudVerdict, PaymentError, PaymentRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default bound on waiting for a fraud check reply
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default queue fraud check requests are published to
pub const DEFAULT_REQUEST_QUEUE: &str = "fraud.check.requests";

/// Default queue fraud check replies come back on
pub const DEFAULT_REPLY_QUEUE: &str = "fraud.check.responses";

/// Settings of a dispatch bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// How long `send` waits for a verdict on either leg
    pub reply_timeout: Duration,
    /// Queue requests are published to
    pub request_queue: String,
    /// Queue replies are expected on, sent as the reply-to address
    pub reply_queue: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            request_queue: DEFAULT_REQUEST_QUEUE.to_string(),
            reply_queue: DEFAULT_REPLY_QUEUE.to_string(),
        }
    }
}

/// Transport-agnostic request/reply to the fraud-check boundary
pub struct DispatchBridge {
    config: DispatchConfig,
    transport: Arc<dyn QueueTransport>,
    direct: Arc<dyn DirectEndpoint>,
    correlations: Arc<CorrelationTable>,
}

impl DispatchBridge {
    /// Create a bridge over both legs
    ///
    /// # Arguments
    ///
    /// * `config` - Timeout and queue names
    /// * `transport` - Queue transport for the queued leg
    /// * `direct` - Endpoint for the direct leg
    pub fn new(
        config: DispatchConfig,
        transport: Arc<dyn QueueTransport>,
        direct: Arc<dyn DirectEndpoint>,
    ) -> Self {
        Self {
            config,
            transport,
            direct,
            correlations: Arc::new(CorrelationTable::new()),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Number of queued requests still waiting for a reply
    pub fn outstanding(&self) -> usize {
        self.correlations.outstanding()
    }

    /// Dispatch a request over `transport` and return its verdict
    ///
    /// # Returns
    ///
    /// * `Ok(FraudVerdict)` - Verdict for exactly this request
    /// * `Err(PaymentError::DispatchTimeout)` - If no reply came in time
    /// * `Err(PaymentError::TransportFailure)` - If the remote side failed or
    ///   answered for another transaction
    pub async fn send(
        &self,
        request: &PaymentRequest,
        transport: TransportKind,
    ) -> Result<FraudVerdict, PaymentError> {
        let verdict = match transport {
            TransportKind::Direct => self.send_direct(request).await?,
            TransportKind::Queued => self.send_queued(request).await?,
        };

        if verdict.transaction_id != request.transaction_id {
            return Err(PaymentError::transport(format!(
                "fraud check for transaction {} answered for transaction {}",
                request.transaction_id, verdict.transaction_id
            )));
        }
        Ok(verdict)
    }

    /// Direct leg: synchronous call, key-value encoded
    pub async fn send_direct(&self, request: &PaymentRequest) -> Result<FraudVerdict, PaymentError> {
        let body = codec::encode(request, WireEncoding::KeyValue)?;
        debug!(transaction_id = %request.transaction_id, "Calling fraud check endpoint");

        let response = match tokio::time::timeout(self.config.reply_timeout, self.direct.call(body)).await {
            Ok(Ok(response)) => response,
            Ok(Err(error @ PaymentError::DispatchTimeout { .. })) => return Err(error),
            Ok(Err(error)) => {
                warn!(transaction_id = %request.transaction_id, error = %error, "Fraud check endpoint failed");
                return Err(PaymentError::transport(format!(
                    "fraud check endpoint failed: {}",
                    error
                )));
            }
            Err(_) => {
                warn!(transaction_id = %request.transaction_id, "Fraud check endpoint timed out");
                return Err(PaymentError::dispatch_timeout(
                    request.transaction_id,
                    self.config.reply_timeout,
                ));
            }
        };

        codec::decode(&response, WireEncoding::KeyValue).map_err(|error| {
            PaymentError::transport(format!("invalid fraud check response: {}", error))
        })
    }

    /// Queued leg: publish, then wait for the correlated reply
    pub async fn send_queued(&self, request: &PaymentRequest) -> Result<FraudVerdict, PaymentError> {
        let correlation_id = CorrelationId::random();
        let mut pending = self.correlations.register(correlation_id.clone())?;

        let message = Message::new(codec::encode(request, WireEncoding::Markup)?, WireEncoding::Markup)
            .with_correlation_id(correlation_id.clone())
            .with_reply_to(self.config.reply_queue.as_str());
        self.transport.send(&self.config.request_queue, message).await?;
        debug!(
            transaction_id = %request.transaction_id,
            correlation_id = %correlation_id,
            queue = %self.config.request_queue,
            "Published fraud check request"
        );

        match tokio::time::timeout(self.config.reply_timeout, pending.wait()).await {
            Ok(Some(reply)) => codec::decode(&reply.body, reply.encoding).map_err(|error| {
                PaymentError::transport(format!("invalid fraud check reply: {}", error))
            }),
            Ok(None) => Err(PaymentError::transport("reply waiter was closed without a reply")),
            Err(_) => {
                warn!(
                    transaction_id = %request.transaction_id,
                    correlation_id = %correlation_id,
                    timeout_secs = self.config.reply_timeout.as_secs(),
                    "Timed out waiting for fraud check reply"
                );
                Err(PaymentError::dispatch_timeout(
                    request.transaction_id,
                    self.config.reply_timeout,
                ))
            }
        }
    }

    /// Route one message from the reply queue to its waiter
    ///
    /// # Returns
    ///
    /// `true` if a waiter took the reply. Replies without a correlation id or
    /// for an id nobody waits on are discarded and yield `false`.
    pub fn handle_reply(&self, reply: Message) -> bool {
        let Some(correlation_id) = reply.correlation_id.clone() else {
            warn!("Discarding fraud check reply without correlation id");
            return false;
        };

        let matched = self.correlations.complete(&correlation_id, reply);
        if !matched {
            info!(correlation_id = %correlation_id, "Discarding fraud check reply with no waiter");
        }
        matched
    }

    /// Start the task draining the reply queue
    ///
    /// The task stops when `cancel` fires or the transport closes.
    pub fn spawn_reply_listener(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            let queue = bridge.config.reply_queue.clone();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = bridge.transport.receive(&queue) => match received {
                        Some(reply) => {
                            bridge.handle_reply(reply);
                        }
                        None => break,
                    },
                }
            }
            debug!(queue = %queue, "Reply listener stopped");
        })
    }
}
