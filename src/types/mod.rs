//! Types module
//!
//! Contains the canonical entities shared by every transport leg.
//! This module organizes types into logical submodules:
//! - `request`: Payment request and transaction identifiers
//! - `verdict`: Fraud verdict and fraud status
//! - `record`: Payment record and lifecycle status
//! - `error`: Error types for the payments bridge

pub mod error;
pub mod record;
pub mod request;
pub mod verdict;

pub use error::{ErrorResponse, FieldViolation, PaymentError, GENERIC_ERROR_MESSAGE};
pub use record::{PaymentRecord, PaymentStatus};
pub use request::{PaymentRequest, TransactionId};
pub use verdict::{FraudStatus, FraudVerdict};
