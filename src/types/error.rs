//! Error types for the payments bridge
//!
//! This module defines every failure a caller of the pipeline can observe.
//! Each variant maps to a stable machine-readable code, so callers branch on
//! the variant (or the code) instead of parsing messages.
//!
//! # Error Categories
//!
//! - **Input Errors**: validation failures, malformed wire payloads
//! - **Idempotency Errors**: duplicate transaction ids
//! - **Lifecycle Errors**: unknown records, forbidden status transitions
//! - **Dispatch Errors**: reply timeouts, remote transport failures
//! - **Internal Errors**: encoding failures, correlation id clashes

use super::record::PaymentStatus;
use super::request::TransactionId;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Message surfaced for failures that must not leak internal detail
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Unable to process the request";

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    /// Wire name of the offending field
    pub field: String,
    /// Value that was rejected, if there was one
    pub rejected_value: Option<String>,
    /// Why the value was rejected
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, rejected_value: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            rejected_value: rejected_value.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Main error type for the payments bridge
///
/// Each variant includes the context needed to diagnose the failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// The request failed field-level validation
    ///
    /// Raised before any store mutation.
    #[error("Request validation failed with {} error(s)", violations.len())]
    ValidationFailed {
        /// Every rule the request broke
        violations: Vec<FieldViolation>,
    },

    /// A payload could not be decoded from its wire encoding
    #[error("Malformed payload{}: {message}", field.as_ref().map(|f| format!(" at field '{}'", f)).unwrap_or_default())]
    DecodeFailure {
        /// Dotted path of the offending field, when derivable
        field: Option<String>,
        /// Description of the decoding problem
        message: String,
    },

    /// A record already exists for this id (first write wins)
    #[error("Payment with transaction ID {transaction_id} already exists")]
    DuplicateTransaction {
        /// The id that was submitted twice
        transaction_id: TransactionId,
    },

    /// No record exists for this id
    #[error("Payment record not found for transaction: {transaction_id}")]
    RecordNotFound {
        /// The id that was looked up
        transaction_id: TransactionId,
    },

    /// The lifecycle forbids moving from `from` to `to`
    #[error("Payment {transaction_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Record the transition was attempted on
        transaction_id: TransactionId,
        /// Current status
        from: PaymentStatus,
        /// Requested status
        to: PaymentStatus,
    },

    /// No reply arrived within the bound
    #[error("Timeout waiting for fraud check response for transaction {transaction_id} after {}s", timeout.as_secs())]
    DispatchTimeout {
        /// Request that went unanswered
        transaction_id: TransactionId,
        /// How long the bridge waited
        timeout: Duration,
    },

    /// The transport or the remote endpoint reported an error
    #[error("Transport failure: {message}")]
    TransportFailure {
        /// Description of the remote failure
        message: String,
    },

    /// A canonical value could not be written to its wire encoding
    #[error("Encoding failure: {message}")]
    EncodeFailure {
        /// Description of the encoding problem
        message: String,
    },

    /// A waiter is already registered for this correlation id
    #[error("Correlation id {correlation_id} already has an outstanding waiter")]
    CorrelationConflict {
        /// The clashing id
        correlation_id: String,
    },
}

// Helper functions for creating common errors

impl PaymentError {
    /// Create a ValidationFailed error
    pub fn validation_failed(violations: Vec<FieldViolation>) -> Self {
        PaymentError::ValidationFailed { violations }
    }

    /// Create a DecodeFailure error bound to a field
    pub fn decode_field(field: &str, message: impl Into<String>) -> Self {
        PaymentError::DecodeFailure {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    /// Create a DecodeFailure error not attributable to a single field
    pub fn decode(message: impl Into<String>) -> Self {
        PaymentError::DecodeFailure {
            field: None,
            message: message.into(),
        }
    }

    /// Create a DuplicateTransaction error
    pub fn duplicate_transaction(transaction_id: TransactionId) -> Self {
        PaymentError::DuplicateTransaction { transaction_id }
    }

    /// Create a RecordNotFound error
    pub fn record_not_found(transaction_id: TransactionId) -> Self {
        PaymentError::RecordNotFound { transaction_id }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(
        transaction_id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Self {
        PaymentError::InvalidTransition {
            transaction_id,
            from,
            to,
        }
    }

    /// Create a DispatchTimeout error
    pub fn dispatch_timeout(transaction_id: TransactionId, timeout: Duration) -> Self {
        PaymentError::DispatchTimeout {
            transaction_id,
            timeout,
        }
    }

    /// Create a TransportFailure error
    pub fn transport(message: impl Into<String>) -> Self {
        PaymentError::TransportFailure {
            message: message.into(),
        }
    }

    /// Create an EncodeFailure error
    pub fn encode(message: impl Into<String>) -> Self {
        PaymentError::EncodeFailure {
            message: message.into(),
        }
    }

    /// Create a CorrelationConflict error
    pub fn correlation_conflict(correlation_id: &str) -> Self {
        PaymentError::CorrelationConflict {
            correlation_id: correlation_id.to_string(),
        }
    }

    /// Stable machine-readable code of the error
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::ValidationFailed { .. } | PaymentError::DecodeFailure { .. } => {
                "VALIDATION_ERROR"
            }
            PaymentError::DuplicateTransaction { .. } => "DUPLICATE_PAYMENT",
            PaymentError::RecordNotFound { .. } => "PAYMENT_NOT_FOUND",
            PaymentError::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            PaymentError::DispatchTimeout { .. } => "GATEWAY_TIMEOUT",
            PaymentError::TransportFailure { .. } => "TRANSPORT_ERROR",
            PaymentError::EncodeFailure { .. } | PaymentError::CorrelationConflict { .. } => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// HTTP-style status class of the error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::ValidationFailed { .. } | PaymentError::DecodeFailure { .. } => 400,
            PaymentError::RecordNotFound { .. } => 404,
            PaymentError::DuplicateTransaction { .. } | PaymentError::InvalidTransition { .. } => {
                409
            }
            PaymentError::TransportFailure { .. } => 502,
            PaymentError::DispatchTimeout { .. } => 504,
            PaymentError::EncodeFailure { .. } | PaymentError::CorrelationConflict { .. } => 500,
        }
    }

    /// Whether the error is unclassified and must hide its detail
    pub fn is_internal(&self) -> bool {
        self.status_code() == 500
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(error: serde_json::Error) -> Self {
        PaymentError::decode(format!(
            "invalid JSON at line {}, column {}: {}",
            error.line(),
            error.column(),
            error
        ))
    }
}

impl From<quick_xml::Error> for PaymentError {
    fn from(error: quick_xml::Error) -> Self {
        PaymentError::decode(format!("invalid XML: {}", error))
    }
}

/// Client-facing error body
///
/// Carries the stable code plus a message. Internal errors only ever expose
/// `GENERIC_ERROR_MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

impl From<&PaymentError> for ErrorResponse {
    fn from(error: &PaymentError) -> Self {
        let message = if error.is_internal() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            error.to_string()
        };

        let errors = match error {
            PaymentError::ValidationFailed { violations } => violations.clone(),
            PaymentError::DecodeFailure {
                field: Some(field),
                message,
            } => vec![FieldViolation::new(field, None, message.clone())],
            _ => Vec::new(),
        };

        ErrorResponse {
            code: error.code().to_string(),
            message,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    const ID: Uuid = Uuid::from_u128(0x123e4567_e89b_12d3_a456_426614174000);

    #[rstest]
    #[case::validation(
        PaymentError::validation_failed(vec![FieldViolation::new("amount", Some("100.123"), "too many decimals")]),
        "Request validation failed with 1 error(s)"
    )]
    #[case::decode_with_field(
        PaymentError::decode_field("paymentRequest.amount", "missing required field"),
        "Malformed payload at field 'paymentRequest.amount': missing required field"
    )]
    #[case::decode_without_field(
        PaymentError::decode("unexpected end of input"),
        "Malformed payload: unexpected end of input"
    )]
    #[case::duplicate(
        PaymentError::duplicate_transaction(ID),
        "Payment with transaction ID 123e4567-e89b-12d3-a456-426614174000 already exists"
    )]
    #[case::not_found(
        PaymentError::record_not_found(ID),
        "Payment record not found for transaction: 123e4567-e89b-12d3-a456-426614174000"
    )]
    #[case::invalid_transition(
        PaymentError::invalid_transition(ID, PaymentStatus::Approved, PaymentStatus::Expired),
        "Payment 123e4567-e89b-12d3-a456-426614174000 cannot move from APPROVED to EXPIRED"
    )]
    #[case::timeout(
        PaymentError::dispatch_timeout(ID, Duration::from_secs(30)),
        "Timeout waiting for fraud check response for transaction 123e4567-e89b-12d3-a456-426614174000 after 30s"
    )]
    fn test_error_display(#[case] error: PaymentError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::validation(PaymentError::validation_failed(vec![]), "VALIDATION_ERROR", 400)]
    #[case::decode(PaymentError::decode("bad"), "VALIDATION_ERROR", 400)]
    #[case::duplicate(PaymentError::duplicate_transaction(ID), "DUPLICATE_PAYMENT", 409)]
    #[case::not_found(PaymentError::record_not_found(ID), "PAYMENT_NOT_FOUND", 404)]
    #[case::timeout(PaymentError::dispatch_timeout(ID, Duration::from_secs(30)), "GATEWAY_TIMEOUT", 504)]
    #[case::transport(PaymentError::transport("connection refused"), "TRANSPORT_ERROR", 502)]
    #[case::encode(PaymentError::encode("writer closed"), "INTERNAL_ERROR", 500)]
    #[case::correlation(PaymentError::correlation_conflict("abc"), "INTERNAL_ERROR", 500)]
    fn test_codes_are_stable(
        #[case] error: PaymentError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.status_code(), status);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let response = ErrorResponse::from(&PaymentError::encode("buffer at 0x7ff closed"));
        assert_eq!(response.code, "INTERNAL_ERROR");
        assert_eq!(response.message, GENERIC_ERROR_MESSAGE);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_decode_failure_exposes_field() {
        let response = ErrorResponse::from(&PaymentError::decode_field(
            "creationTimestamp",
            "fractional seconds are not allowed",
        ));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].field, "creationTimestamp");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"][0]["field"], "creationTimestamp");
    }
}
