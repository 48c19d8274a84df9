//! Payment record and lifecycle status types
//!
//! A `PaymentRecord` is what the record store keeps per transaction. Its status
//! follows a small state machine:
//!
//! ```text
//! NEW ──► PENDING_FRAUD_CHECK ──┬──► APPROVED
//!                               ├──► REJECTED
//!                               ├──► FAILED
//!                               └──► EXPIRED
//! ```
//!
//! NEW is implicit (the record does not exist yet). The four right-hand
//! statuses are terminal.

use super::error::PaymentError;
use super::request::{PaymentRequest, TransactionId};
use super::verdict::FraudStatus;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaymentStatus {
    New,
    PendingFraudCheck,
    Approved,
    Rejected,
    Failed,
    Expired,
}

impl PaymentStatus {
    /// All statuses in declaration order
    pub const ALL: [PaymentStatus; 6] = [
        PaymentStatus::New,
        PaymentStatus::PendingFraudCheck,
        PaymentStatus::Approved,
        PaymentStatus::Rejected,
        PaymentStatus::Failed,
        PaymentStatus::Expired,
    ];

    /// Literal code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            PaymentStatus::New => "NEW",
            PaymentStatus::PendingFraudCheck => "PENDING_FRAUD_CHECK",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Expired => "EXPIRED",
        }
    }

    /// Whether no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Approved
                | PaymentStatus::Rejected
                | PaymentStatus::Failed
                | PaymentStatus::Expired
        )
    }

    /// Transition table of the payment lifecycle
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match (self, next) {
            (PaymentStatus::New, PaymentStatus::PendingFraudCheck) => true,
            (PaymentStatus::PendingFraudCheck, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Payment status a fraud verdict resolves to
    pub fn from_fraud_status(status: FraudStatus) -> Self {
        match status {
            FraudStatus::Approved => PaymentStatus::Approved,
            FraudStatus::Suspicious => PaymentStatus::Rejected,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.code() == s)
            .ok_or_else(|| {
                let codes: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.code()).collect();
                format!(
                    "unknown payment status '{}', expected one of [{}]",
                    s,
                    codes.join(", ")
                )
            })
    }
}

/// Tracked state of one payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// Primary key, equal to `payment_request.transaction_id`
    pub transaction_id: TransactionId,

    /// The request as accepted
    pub payment_request: PaymentRequest,

    /// Current lifecycle status
    pub status: PaymentStatus,

    /// Instant the record was first accepted
    pub submitted_timestamp: DateTime<Utc>,

    /// Instant of the last status transition
    pub last_updated_timestamp: DateTime<Utc>,
}

impl PaymentRecord {
    /// Create the initial PENDING_FRAUD_CHECK record for an accepted request
    pub fn pending(request: PaymentRequest, at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: request.transaction_id,
            payment_request: request,
            status: PaymentStatus::PendingFraudCheck,
            submitted_timestamp: at,
            last_updated_timestamp: at,
        }
    }

    /// Move to `next`, refreshing `last_updated_timestamp`
    ///
    /// # Errors
    ///
    /// `PaymentError::InvalidTransition` if the lifecycle forbids the move.
    /// The record is left untouched in that case.
    pub fn transition(&mut self, next: PaymentStatus, at: DateTime<Utc>) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::invalid_transition(
                self.transaction_id,
                self.status,
                next,
            ));
        }
        self.status = next;
        self.last_updated_timestamp = at;
        Ok(())
    }
}
