//! Payment lifecycle orchestration
//!
//! This module provides the `PaymentLifecycleManager`, which owns the status
//! transition rules and drives the record store.
//!
//! # Design
//!
//! ```text
//! PaymentLifecycleManager
//!     ├── PaymentValidator        (field rules, checked before any mutation)
//!     ├── Arc<RecordStore>        (thread-safe record state)
//!     ├── Arc<DispatchBridge>     (fraud check over either transport)
//!     └── Arc<dyn Clock>          (submission and transition instants)
//! ```
//!
//! A submission is validated, saved as PENDING_FRAUD_CHECK, dispatched, and
//! finally moved to APPROVED or REJECTED by the verdict. A dispatch failure
//! moves it to FAILED instead. The periodic sweep moves pending records that
//! outlived the pending timeout to EXPIRED.
//!
//! # Thread Safety
//!
//! The manager is cloneable and safe to share across tasks. Every mutation
//! goes through `RecordStore::update`, which serializes writers per record;
//! a transition that lost a race against another one fails with
//! `InvalidTransition` instead of overwriting a terminal status.

use super::clock::Clock;
use super::record_store::RecordStore;
use super::validation::PaymentValidator;
use crate::dispatch::{DispatchBridge, TransportKind};
use crate::types::{
    FraudVerdict, PaymentError, PaymentRecord, PaymentRequest, PaymentStatus, TransactionId,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Orchestrator of the payment lifecycle
#[derive(Clone)]
pub struct PaymentLifecycleManager {
    validator: PaymentValidator,
    store: Arc<RecordStore>,
    bridge: Arc<DispatchBridge>,
    clock: Arc<dyn Clock>,
}

impl PaymentLifecycleManager {
    /// Create a new PaymentLifecycleManager
    ///
    /// # Arguments
    ///
    /// * `validator` - Field rules applied to every submission
    /// * `store` - Arc-wrapped record store
    /// * `bridge` - Arc-wrapped dispatch bridge to the fraud check
    /// * `clock` - Source of record timestamps
    pub fn new(
        validator: PaymentValidator,
        store: Arc<RecordStore>,
        bridge: Arc<DispatchBridge>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            validator,
            store,
            bridge,
            clock,
        }
    }

    /// Run a payment through validation, fraud check and status tracking
    ///
    /// This method processes a submission by:
    /// 1. Validating the request (no store mutation on failure)
    /// 2. Saving a PENDING_FRAUD_CHECK record
    /// 3. Dispatching the fraud check over `transport`
    /// 4. Applying the verdict
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentRecord)` - The record in its terminal status
    /// * `Err(PaymentError::ValidationFailed)` - If a field rule was broken
    /// * `Err(PaymentError::DuplicateTransaction)` - If the id was seen before
    /// * `Err(PaymentError::DispatchTimeout)` - If no verdict came in time; the
    ///   record is marked FAILED
    /// * `Err(PaymentError::TransportFailure)` - If the fraud check failed; the
    ///   record is marked FAILED
    pub async fn submit(
        &self,
        request: PaymentRequest,
        transport: TransportKind,
    ) -> Result<PaymentRecord, PaymentError> {
        let transaction_id = request.transaction_id;
        self.validator.validate(&request)?;

        self.store
            .save(PaymentRecord::pending(request.clone(), self.clock.now()))?;
        info!(
            transaction_id = %transaction_id,
            transport = %transport,
            "Payment accepted, awaiting fraud check"
        );

        match self.bridge.send(&request, transport).await {
            Ok(verdict) => self.apply_verdict(&verdict),
            Err(dispatch_error) => {
                if let Err(mark_error) = self.mark_failed(transaction_id, &dispatch_error.to_string()) {
                    warn!(
                        transaction_id = %transaction_id,
                        error = %mark_error,
                        "Could not mark payment as failed"
                    );
                }
                Err(dispatch_error)
            }
        }
    }

    /// Resolve a pending record with a fraud verdict
    ///
    /// APPROVED maps to APPROVED, SUSPICIOUS to REJECTED.
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentRecord)` - The updated record
    /// * `Err(PaymentError::RecordNotFound)` - If no record exists for the
    ///   verdict's id; nothing is mutated
    /// * `Err(PaymentError::InvalidTransition)` - If the record is no longer
    ///   pending
    pub fn apply_verdict(&self, verdict: &FraudVerdict) -> Result<PaymentRecord, PaymentError> {
        let next = PaymentStatus::from_fraud_status(verdict.status);
        let now = self.clock.now();

        let result = self
            .store
            .update(verdict.transaction_id, |record| record.transition(next, now));

        match &result {
            Ok(record) => info!(
                transaction_id = %record.transaction_id,
                fraud_status = %verdict.status,
                status = %record.status,
                "Fraud verdict applied"
            ),
            Err(PaymentError::RecordNotFound { .. }) => error!(
                transaction_id = %verdict.transaction_id,
                "Fraud verdict for unknown payment"
            ),
            Err(other) => warn!(
                transaction_id = %verdict.transaction_id,
                error = %other,
                "Fraud verdict not applied"
            ),
        }
        result
    }

    /// Move a pending record to FAILED after a technical failure
    pub fn mark_failed(&self, id: TransactionId, reason: &str) -> Result<PaymentRecord, PaymentError> {
        let now = self.clock.now();
        let record = self
            .store
            .update(id, |record| record.transition(PaymentStatus::Failed, now))?;
        warn!(transaction_id = %id, reason = reason, "Payment marked as failed");
        Ok(record)
    }

    /// Snapshot of one record
    pub fn get_by_id(&self, id: TransactionId) -> Option<PaymentRecord> {
        self.store.get(id)
    }

    /// Records in `status`, newest submission first
    pub fn get_by_status(&self, status: PaymentStatus) -> Vec<PaymentRecord> {
        self.store.by_status(status)
    }

    /// All records, newest submission first
    pub fn get_all(&self) -> Vec<PaymentRecord> {
        self.store.all()
    }

    /// Expire pending records submitted before `now - timeout`
    ///
    /// Records are processed oldest first. A record that left
    /// PENDING_FRAUD_CHECK after the scan is skipped.
    ///
    /// # Returns
    ///
    /// The ids that were expired, in processing order.
    pub fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Vec<TransactionId>, PaymentError> {
        let Some(cutoff) = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout))
        else {
            return Ok(Vec::new());
        };

        let mut expired = Vec::new();
        for candidate in self.store.pending_older_than(cutoff) {
            let id = candidate.transaction_id;
            match self
                .store
                .update(id, |record| record.transition(PaymentStatus::Expired, now))
            {
                Ok(_) => {
                    info!(transaction_id = %id, submitted = %candidate.submitted_timestamp, "Pending payment expired");
                    expired.push(id);
                }
                Err(PaymentError::InvalidTransition { from, .. }) => {
                    debug!(transaction_id = %id, status = %from, "Payment resolved before expiry");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(expired)
    }

    /// Total number of records
    pub fn payment_count(&self) -> usize {
        self.store.len()
    }

    /// Number of records per status, only statuses that occur
    pub fn status_counts(&self) -> BTreeMap<PaymentStatus, usize> {
        self.store.status_counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::dispatch::{DispatchConfig, InMemoryBroker, LocalFraudEndpoint};
    use crate::fraud::{Blacklists, FraudEvaluator};
    use crate::test_support::{at, sample_request};
    use crate::types::FraudStatus;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    struct Fixture {
        manager: PaymentLifecycleManager,
        store: Arc<RecordStore>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(at(0)));
        let evaluator = Arc::new(FraudEvaluator::new(Blacklists::default(), clock.clone()));
        let bridge = Arc::new(DispatchBridge::new(
            DispatchConfig::default(),
            Arc::new(InMemoryBroker::new()),
            Arc::new(LocalFraudEndpoint::new(evaluator)),
        ));
        let store = Arc::new(RecordStore::new());
        let manager = PaymentLifecycleManager::new(
            PaymentValidator::new(),
            Arc::clone(&store),
            bridge,
            clock.clone(),
        );
        Fixture { manager, store, clock }
    }

    fn request_with_id(id: u128, payer: &str) -> PaymentRequest {
        let mut request = sample_request(payer, "Rent");
        request.transaction_id = Uuid::from_u128(id);
        request
    }

    #[tokio::test]
    async fn test_blacklisted_payer_is_rejected() {
        let fx = fixture();
        let mut request = request_with_id(1, "Mark Imaginary");
        request.amount = Decimal::from_str("100.00").unwrap();
        request.currency = "USD".into();

        let record = fx.manager.submit(request, TransportKind::Direct).await.unwrap();
        assert_eq!(record.status, PaymentStatus::Rejected);
        assert_eq!(fx.manager.get_by_id(Uuid::from_u128(1)).unwrap().status, PaymentStatus::Rejected);
    }

    #[tokio::test]
    async fn test_clean_payment_is_approved() {
        let fx = fixture();
        let mut request = request_with_id(1, "Munster Muller");
        request.amount = Decimal::from_str("2500.75").unwrap();

        let record = fx.manager.submit(request, TransportKind::Direct).await.unwrap();
        assert_eq!(record.status, PaymentStatus::Approved);
        assert_eq!(record.payment_request.amount.to_string(), "2500.75");
    }

    #[tokio::test]
    async fn test_invalid_amount_never_reaches_store() {
        let fx = fixture();
        let mut request = request_with_id(1, "Munster Muller");
        request.amount = Decimal::from_str("100.123").unwrap();

        let error = fx.manager.submit(request, TransportKind::Direct).await.unwrap_err();
        assert!(matches!(error, PaymentError::ValidationFailed { .. }));
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected() {
        let fx = fixture();
        fx.manager
            .submit(request_with_id(1, "Munster Muller"), TransportKind::Direct)
            .await
            .unwrap();

        let error = fx
            .manager
            .submit(request_with_id(1, "Mark Imaginary"), TransportKind::Direct)
            .await
            .unwrap_err();
        assert_eq!(error, PaymentError::duplicate_transaction(Uuid::from_u128(1)));
        assert_eq!(fx.manager.payment_count(), 1);
        assert_eq!(fx.manager.get_by_id(Uuid::from_u128(1)).unwrap().status, PaymentStatus::Approved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_timeout_marks_failed() {
        let fx = fixture();
        // no reply listener or responder on the queue leg
        let error = fx
            .manager
            .submit(request_with_id(1, "Munster Muller"), TransportKind::Queued)
            .await
            .unwrap_err();

        assert_eq!(error.code(), "GATEWAY_TIMEOUT");
        assert_eq!(fx.manager.get_by_id(Uuid::from_u128(1)).unwrap().status, PaymentStatus::Failed);
    }

    #[test]
    fn test_verdict_for_unknown_record() {
        let fx = fixture();
        let verdict = FraudVerdict {
            transaction_id: Uuid::from_u128(9),
            status: FraudStatus::Approved,
            validation_timestamp: at(1),
        };

        let error = fx.manager.apply_verdict(&verdict).unwrap_err();
        assert_eq!(error, PaymentError::record_not_found(Uuid::from_u128(9)));
        assert!(fx.store.is_empty());
    }

    #[test]
    fn test_verdict_refreshes_last_updated() {
        let fx = fixture();
        fx.store.save(PaymentRecord::pending(request_with_id(1, "a"), at(0))).unwrap();
        fx.clock.set(at(45));

        let record = fx
            .manager
            .apply_verdict(&FraudVerdict {
                transaction_id: Uuid::from_u128(1),
                status: FraudStatus::Suspicious,
                validation_timestamp: at(44),
            })
            .unwrap();

        assert_eq!(record.status, PaymentStatus::Rejected);
        assert_eq!(record.submitted_timestamp, at(0));
        assert_eq!(record.last_updated_timestamp, at(45));
    }

    #[test]
    fn test_terminal_record_ignores_second_verdict() {
        let fx = fixture();
        fx.store.save(PaymentRecord::pending(request_with_id(1, "a"), at(0))).unwrap();
        let verdict = FraudVerdict {
            transaction_id: Uuid::from_u128(1),
            status: FraudStatus::Approved,
            validation_timestamp: at(1),
        };
        fx.manager.apply_verdict(&verdict).unwrap();

        let error = fx
            .manager
            .apply_verdict(&FraudVerdict {
                status: FraudStatus::Suspicious,
                ..verdict
            })
            .unwrap_err();
        assert!(matches!(error, PaymentError::InvalidTransition { .. }));
        assert_eq!(fx.manager.get_by_id(Uuid::from_u128(1)).unwrap().status, PaymentStatus::Approved);
    }

    #[test]
    fn test_sweep_expires_only_stale_pending_records() {
        let fx = fixture();
        let minute = 60;
        fx.store.save(PaymentRecord::pending(request_with_id(1, "a"), at(0))).unwrap();
        fx.store.save(PaymentRecord::pending(request_with_id(2, "a"), at(5 * minute))).unwrap();
        fx.store.save(PaymentRecord::pending(request_with_id(3, "a"), at(20 * minute))).unwrap();
        fx.store.save(PaymentRecord::pending(request_with_id(4, "a"), at(1))).unwrap();
        fx.manager.mark_failed(Uuid::from_u128(4), "test").unwrap();

        let now = at(40 * minute);
        let expired = fx
            .manager
            .sweep_expired(now, Duration::from_secs(30 * 60))
            .unwrap();

        assert_eq!(expired, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
        let status = |id| fx.manager.get_by_id(Uuid::from_u128(id)).unwrap().status;
        assert_eq!(status(1), PaymentStatus::Expired);
        assert_eq!(status(2), PaymentStatus::Expired);
        assert_eq!(status(3), PaymentStatus::PendingFraudCheck);
        assert_eq!(status(4), PaymentStatus::Failed);
        assert_eq!(fx.manager.get_by_id(Uuid::from_u128(1)).unwrap().last_updated_timestamp, now);
    }

    #[test]
    fn test_sweep_with_huge_timeout_is_a_no_op() {
        let fx = fixture();
        fx.store.save(PaymentRecord::pending(request_with_id(1, "a"), at(0))).unwrap();
        assert!(fx.manager.sweep_expired(at(10), Duration::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_queries_order_newest_first() {
        let fx = fixture();
        for (id, submitted) in [(1, 10), (2, 30), (3, 20)] {
            fx.store
                .save(PaymentRecord::pending(request_with_id(id, "a"), at(submitted)))
                .unwrap();
        }
        fx.manager.mark_failed(Uuid::from_u128(3), "test").unwrap();

        let all: Vec<u128> = fx.manager.get_all().iter().map(|r| r.transaction_id.as_u128()).collect();
        assert_eq!(all, vec![2, 3, 1]);
        let pending: Vec<u128> = fx
            .manager
            .get_by_status(PaymentStatus::PendingFraudCheck)
            .iter()
            .map(|r| r.transaction_id.as_u128())
            .collect();
        assert_eq!(pending, vec![2, 1]);
        assert_eq!(fx.manager.status_counts().get(&PaymentStatus::Failed), Some(&1));
    }
}
