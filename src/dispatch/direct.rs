//! Synchronous fraud-check endpoints
//!
//! A `DirectEndpoint` takes a key-value encoded `PaymentRequest` and returns
//! a key-value encoded `FraudVerdict`, the contract of the remote fraud-check
//! route. Two implementations ship with the crate:
//! - `LocalFraudEndpoint` evaluates in process
//! - `QueueRelayEndpoint` relays the call over the queue leg and answers
//!   once the queued reply is in
//!
//! `DirectBinding` selects which of the two a pipeline binds.

use super::bridge::DispatchBridge;
use crate::codec::{self, WireEncoding};
use crate::fraud::FraudEvaluator;
use crate::types::{PaymentError, PaymentRequest};
use async_trait::async_trait;
use clap::ValueEnum;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Endpoint bound to the direct leg of a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum DirectBinding {
    /// Evaluate in process with `LocalFraudEndpoint`
    #[default]
    Local,
    /// Relay over the queue leg with `QueueRelayEndpoint`
    QueueRelay,
}

impl fmt::Display for DirectBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectBinding::Local => write!(f, "local"),
            DirectBinding::QueueRelay => write!(f, "queue-relay"),
        }
    }
}

/// Remote endpoint reachable by a synchronous call
#[async_trait]
pub trait DirectEndpoint: Send + Sync {
    /// Submit a key-value encoded request, returning the encoded verdict
    async fn call(&self, body: Vec<u8>) -> Result<Vec<u8>, PaymentError>;
}

/// Endpoint evaluating requests in process
pub struct LocalFraudEndpoint {
    evaluator: Arc<FraudEvaluator>,
}

impl LocalFraudEndpoint {
    pub fn new(evaluator: Arc<FraudEvaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl DirectEndpoint for LocalFraudEndpoint {
    async fn call(&self, body: Vec<u8>) -> Result<Vec<u8>, PaymentError> {
        let request: PaymentRequest = codec::decode(&body, WireEncoding::KeyValue)?;
        let verdict = self.evaluator.evaluate(&request);
        codec::encode(&verdict, WireEncoding::KeyValue)
    }
}

/// Endpoint that answers a direct call through a queue round-trip
///
/// The request is decoded from key-value, sent over the bridge's queue leg
/// (markup on the wire) and the verdict re-encoded as key-value.
pub struct QueueRelayEndpoint {
    bridge: Arc<DispatchBridge>,
}

impl QueueRelayEndpoint {
    pub fn new(bridge: Arc<DispatchBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl DirectEndpoint for QueueRelayEndpoint {
    async fn call(&self, body: Vec<u8>) -> Result<Vec<u8>, PaymentError> {
        let request: PaymentRequest = codec::decode(&body, WireEncoding::KeyValue)?;
        debug!(transaction_id = %request.transaction_id, "Relaying direct call over the queue leg");
        let verdict = self.bridge.send_queued(&request).await?;
        codec::encode(&verdict, WireEncoding::KeyValue)
    }
}
