//! Payment request and identifier types
//!
//! A `PaymentRequest` is the canonical, transport-independent description of a
//! payment submitted by a caller. Both wire encodings carry exactly these fields.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Transaction identifier
///
/// Generated by the caller, unique across the system and used as the
/// primary key of the record store.
pub type TransactionId = Uuid;

/// Canonical payment request
///
/// Constructed once (from a caller or a decoder) and never mutated by the
/// pipeline. The record store embeds a copy of it in every `PaymentRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Caller-generated unique id, also the correlation key for the record
    pub transaction_id: TransactionId,

    /// Payer's full name, for example "Munster Muller"
    pub payer_name: String,

    /// Name of the payer's bank
    pub payer_bank: String,

    /// ISO 3166-1 alpha-3 country code of the payer
    pub payer_country_code: String,

    /// Payer's account number (IBAN or local account number)
    pub payer_account: String,

    /// Payee's full name
    pub payee_name: String,

    /// Name of the payee's bank
    pub payee_bank: String,

    /// ISO 3166-1 alpha-3 country code of the payee
    pub payee_country_code: String,

    /// Payee's account number
    pub payee_account: String,

    /// Optional free text, for example "Loan Repayment"
    pub payment_instruction: Option<String>,

    /// Requested execution date
    pub execution_date: NaiveDate,

    /// Transaction amount
    ///
    /// The decimal scale is exactly what was supplied on the wire, so
    /// `100.10` stays `100.10` through every encoding.
    pub amount: Decimal,

    /// ISO 4217 currency code
    pub currency: String,

    /// Creation instant, whole seconds in UTC
    pub creation_timestamp: DateTime<Utc>,
}
