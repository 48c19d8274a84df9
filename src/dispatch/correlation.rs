//! Correlation table for the queue round-trip
//!
//! Maps a correlation id to the single-use completion handle of the flow
//! waiting for that reply.
//!
//! # Design
//!
//! - `register` inserts a waiter and hands back a `PendingReply` guard.
//!   An id that already has a waiter is refused, so at most one waiter
//!   exists per id.
//! - `complete` removes the waiter and fulfils it. A reply for an unknown or
//!   already-satisfied id finds nothing to remove and is reported as
//!   unmatched.
//! - Dropping the guard removes its entry. A flow that times out or is
//!   cancelled therefore frees its slot at once, and a late reply can neither
//!   leak memory nor wake a finished flow.
//!
//! # Thread Safety
//!
//! The table is a `DashMap`; registration, completion and removal only lock
//! the shard holding the id.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::queue::Message;
use crate::types::PaymentError;

/// Opaque token linking a request to its reply
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Fresh random id
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outstanding waiters keyed by correlation id
#[derive(Debug, Default)]
pub struct CorrelationTable {
    waiters: DashMap<CorrelationId, oneshot::Sender<Message>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `id`
    ///
    /// # Returns
    ///
    /// * `Ok(PendingReply)` - Guard to await the reply on
    /// * `Err(PaymentError::CorrelationConflict)` - If `id` already has a waiter
    pub fn register(self: &Arc<Self>, id: CorrelationId) -> Result<PendingReply, PaymentError> {
        match self.waiters.entry(id.clone()) {
            Entry::Occupied(_) => Err(PaymentError::correlation_conflict(id.as_str())),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(tx);
                Ok(PendingReply {
                    id,
                    rx,
                    table: Arc::clone(self),
                })
            }
        }
    }

    /// Hand a reply to the waiter registered for `id`
    ///
    /// # Returns
    ///
    /// `true` if a waiter took the reply, `false` if there was none (unknown,
    /// already satisfied, or the waiter gave up in the meantime).
    pub fn complete(&self, id: &CorrelationId, reply: Message) -> bool {
        match self.waiters.remove(id) {
            Some((_, tx)) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Number of waiters still outstanding
    pub fn outstanding(&self) -> usize {
        self.waiters.len()
    }

    // only removes a waiter whose receiver is gone, never a newer one
    fn release(&self, id: &CorrelationId) {
        self.waiters.remove_if(id, |_, tx| tx.is_closed());
    }
}

/// A registered waiter
///
/// Await it with [`PendingReply::wait`]. Dropping it, awaited or not,
/// deregisters the id.
#[derive(Debug)]
pub struct PendingReply {
    id: CorrelationId,
    rx: oneshot::Receiver<Message>,
    table: Arc<CorrelationTable>,
}

impl PendingReply {
    /// Wait for the reply
    ///
    /// Returns `None` if the sender was dropped without replying.
    pub async fn wait(&mut self) -> Option<Message> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.rx.close();
        self.table.release(&self.id);
    }
}
