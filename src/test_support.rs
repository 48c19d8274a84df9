//! Shared fixtures for unit tests

use crate::types::PaymentRequest;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// `2025-09-15T14:47:19Z` plus `seconds`
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 15, 14, 47, 19).unwrap() + chrono::Duration::seconds(seconds)
}

/// A request that passes validation unless `payer_name` or `instruction`
/// break a rule
pub fn sample_request(payer_name: &str, instruction: &str) -> PaymentRequest {
    PaymentRequest {
        transaction_id: Uuid::from_u128(0x123e4567_e89b_12d3_a456_426614174000),
        payer_name: payer_name.to_string(),
        payer_bank: "Barclays".to_string(),
        payer_country_code: "GBR".to_string(),
        payer_account: "GB29NWBK60161331926819".to_string(),
        payee_name: "Sanne Lund".to_string(),
        payee_bank: "Deutsche Bank".to_string(),
        payee_country_code: "DEU".to_string(),
        payee_account: "DE89370400440532013000".to_string(),
        payment_instruction: Some(instruction.to_string()),
        execution_date: NaiveDate::from_ymd_opt(2020, 2, 21).unwrap(),
        amount: Decimal::new(1745, 2),
        currency: "EUR".to_string(),
        creation_timestamp: at(0),
    }
}
