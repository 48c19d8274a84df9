//! Thread-safe payment record storage
//!
//! This module provides the `RecordStore` struct, which keeps every payment
//! record for the lifetime of the process.
//!
//! # Design
//!
//! `RecordStore` uses `DashMap` (a concurrent HashMap) keyed by transaction id.
//! Each entry also carries an insertion sequence number, which breaks ties when
//! two records share a submission instant so listings are fully deterministic.
//!
//! # Thread Safety
//!
//! All operations are safe to call from any number of tasks without external
//! locking. Writes to one transaction lock only the shard holding it. Scans
//! (listings, the expiry sweep) visit one shard at a time under a read lock,
//! so saves of unrelated records keep going while a sweep runs.

use crate::types::{PaymentError, PaymentRecord, PaymentStatus, TransactionId};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct StoredRecord {
    sequence: u64,
    record: PaymentRecord,
}

/// Concurrent in-memory store of payment records
///
/// Every read returns a clone, so callers hold snapshots that later mutations
/// never touch.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: DashMap<TransactionId, StoredRecord>,
    next_sequence: AtomicU64,
}

impl RecordStore {
    /// Create a new empty RecordStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a new record (atomic, first write wins)
    ///
    /// # Arguments
    ///
    /// * `record` - The record to insert, keyed by its transaction id
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If no record existed for the id
    /// * `Err(PaymentError::DuplicateTransaction)` - If one did; the existing
    ///   record is left untouched
    pub fn save(&self, record: PaymentRecord) -> Result<(), PaymentError> {
        match self.records.entry(record.transaction_id) {
            Entry::Occupied(_) => Err(PaymentError::duplicate_transaction(record.transaction_id)),
            Entry::Vacant(slot) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredRecord { sequence, record });
                Ok(())
            }
        }
    }

    /// Update a record with a closure (atomic operation)
    ///
    /// The closure works on a copy while the entry lock is held. The copy is
    /// written back only if the closure succeeds, so an error leaves the stored
    /// record exactly as it was.
    ///
    /// # Returns
    ///
    /// * `Ok(record)` - A snapshot of the updated record
    /// * `Err(PaymentError::RecordNotFound)` - If the record doesn't exist
    /// * `Err(...)` - If the closure returns an error
    pub fn update<F>(&self, id: TransactionId, f: F) -> Result<PaymentRecord, PaymentError>
    where
        F: FnOnce(&mut PaymentRecord) -> Result<(), PaymentError>,
    {
        match self.records.get_mut(&id) {
            Some(mut entry) => {
                let mut draft = entry.value().record.clone();
                f(&mut draft)?;
                entry.value_mut().record = draft.clone();
                Ok(draft)
            }
            None => Err(PaymentError::record_not_found(id)),
        }
    }

    /// Snapshot of one record
    pub fn get(&self, id: TransactionId) -> Option<PaymentRecord> {
        self.records.get(&id).map(|entry| entry.value().record.clone())
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.records.contains_key(&id)
    }

    /// All records, newest submission first
    pub fn all(&self) -> Vec<PaymentRecord> {
        self.collect_newest_first(|_| true)
    }

    /// Records in `status`, newest submission first
    pub fn by_status(&self, status: PaymentStatus) -> Vec<PaymentRecord> {
        self.collect_newest_first(|record| record.status == status)
    }

    /// Pending records submitted strictly before `cutoff`, oldest first
    pub fn pending_older_than(&self, cutoff: DateTime<Utc>) -> Vec<PaymentRecord> {
        let mut matches = self.snapshot(|record| {
            record.status == PaymentStatus::PendingFraudCheck && record.submitted_timestamp < cutoff
        });
        matches.sort_by_key(|stored| (stored.record.submitted_timestamp, stored.sequence));
        matches.into_iter().map(|stored| stored.record).collect()
    }

    /// Number of records per status, only statuses that occur
    pub fn status_counts(&self) -> BTreeMap<PaymentStatus, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.records.iter() {
            *counts.entry(entry.value().record.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn snapshot(&self, keep: impl Fn(&PaymentRecord) -> bool) -> Vec<StoredRecord> {
        self.records
            .iter()
            .filter(|entry| keep(&entry.value().record))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn collect_newest_first(&self, keep: impl Fn(&PaymentRecord) -> bool) -> Vec<PaymentRecord> {
        let mut matches = self.snapshot(keep);
        matches.sort_by(|a, b| {
            b.record
                .submitted_timestamp
                .cmp(&a.record.submitted_timestamp)
                .then(b.sequence.cmp(&a.sequence))
        });
        matches.into_iter().map(|stored| stored.record).collect()
    }
}
