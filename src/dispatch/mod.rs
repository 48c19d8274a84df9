//! Dispatch bridge module
//!
//! Transport-agnostic request/reply between the lifecycle manager and the
//! fraud-evaluation boundary:
//! - `bridge` - `DispatchBridge`, the single `send` entry point
//! - `correlation` - Correlation ids and the table of outstanding waiters
//! - `queue` - Queue transport trait and the in-process broker
//! - `direct` - Synchronous endpoint trait and its implementations

pub mod bridge;
pub mod correlation;
pub mod direct;
pub mod queue;

pub use bridge::{DispatchBridge, DispatchConfig};
pub use correlation::{CorrelationId, CorrelationTable, PendingReply};
pub use direct::{DirectBinding, DirectEndpoint, LocalFraudEndpoint, QueueRelayEndpoint};
pub use queue::{InMemoryBroker, Message, QueueTransport};

use clap::ValueEnum;
use std::fmt;

/// Transport binding a request is dispatched over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TransportKind {
    /// Synchronous call, key-value encoded
    Direct,
    /// Queue round-trip with correlation, markup encoded
    Queued,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Direct => write!(f, "direct"),
            TransportKind::Queued => write!(f, "queued"),
        }
    }
}
