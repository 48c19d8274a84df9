//! Field-level validation of inbound payment requests
//!
//! Every rule is checked and every violation collected, so a caller sees all
//! problems with a request at once. Country and currency codes must be
//! three uppercase letters and present in the ISO registries.

use super::iso_codes;
use crate::types::{FieldViolation, PaymentError, PaymentRequest};
use rust_decimal::Decimal;

const MAX_NAME_LENGTH: usize = 70;
const MIN_ACCOUNT_LENGTH: usize = 8;
const MAX_ACCOUNT_LENGTH: usize = 34;
const MAX_INSTRUCTION_LENGTH: usize = 140;
const MAX_INTEGER_DIGITS: usize = 12;
const MAX_FRACTION_DIGITS: u32 = 2;

/// Validator for `PaymentRequest` values
#[derive(Debug, Default, Clone, Copy)]
pub struct PaymentValidator;

impl PaymentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a request against every field rule
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the request is acceptable
    /// * `Err(PaymentError::ValidationFailed)` - Carrying one violation per
    ///   broken rule, in field order
    pub fn validate(&self, request: &PaymentRequest) -> Result<(), PaymentError> {
        let mut violations = Vec::new();

        check_name(&mut violations, "payerName", &request.payer_name);
        check_name(&mut violations, "payerBank", &request.payer_bank);
        check_code(&mut violations, "payerCountryCode", &request.payer_country_code, COUNTRY);
        check_account(&mut violations, "payerAccount", &request.payer_account);
        check_name(&mut violations, "payeeName", &request.payee_name);
        check_name(&mut violations, "payeeBank", &request.payee_bank);
        check_code(&mut violations, "payeeCountryCode", &request.payee_country_code, COUNTRY);
        check_account(&mut violations, "payeeAccount", &request.payee_account);

        if let Some(instruction) = &request.payment_instruction {
            if instruction.chars().count() > MAX_INSTRUCTION_LENGTH {
                violations.push(FieldViolation::new(
                    "paymentInstruction",
                    Some(instruction),
                    format!("must be at most {} characters", MAX_INSTRUCTION_LENGTH),
                ));
            }
        }

        check_amount(&mut violations, &request.amount);
        check_code(&mut violations, "currency", &request.currency, CURRENCY);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PaymentError::validation_failed(violations))
        }
    }
}

fn check_name(violations: &mut Vec<FieldViolation>, field: &str, value: &str) {
    let length = value.chars().count();
    if value.trim().is_empty() || length > MAX_NAME_LENGTH {
        violations.push(FieldViolation::new(
            field,
            Some(value),
            format!(
                "is required, cannot be blank and must be between 1 and {} characters",
                MAX_NAME_LENGTH
            ),
        ));
    }
}

/// A code registry and how to describe it in violations
struct Registry {
    format: &'static str,
    name: &'static str,
    contains: fn(&str) -> bool,
}

const COUNTRY: Registry = Registry {
    format: "ISO 3166-1 alpha-3 format like DEU, GBR, USA",
    name: "ISO 3166-1 alpha-3 country code",
    contains: iso_codes::is_country_code,
};

const CURRENCY: Registry = Registry {
    format: "ISO 4217 format like USD, EUR, GBP",
    name: "ISO 4217 currency code",
    contains: iso_codes::is_currency_code,
};

fn check_code(violations: &mut Vec<FieldViolation>, field: &str, value: &str, registry: Registry) {
    if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_uppercase()) {
        violations.push(FieldViolation::new(
            field,
            Some(value),
            format!("must be three uppercase letters, {}", registry.format),
        ));
    } else if !(registry.contains)(value) {
        violations.push(FieldViolation::new(
            field,
            Some(value),
            format!("is not a known {}", registry.name),
        ));
    }
}

fn check_account(violations: &mut Vec<FieldViolation>, field: &str, value: &str) {
    if !(MIN_ACCOUNT_LENGTH..=MAX_ACCOUNT_LENGTH).contains(&value.len()) {
        violations.push(FieldViolation::new(
            field,
            Some(value),
            format!(
                "must be between {} and {} characters",
                MIN_ACCOUNT_LENGTH, MAX_ACCOUNT_LENGTH
            ),
        ));
    } else if !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        violations.push(FieldViolation::new(
            field,
            Some(value),
            "must contain only letters and digits",
        ));
    }
}

fn check_amount(violations: &mut Vec<FieldViolation>, amount: &Decimal) {
    let text = amount.to_string();
    if *amount < Decimal::new(1, 2) {
        violations.push(FieldViolation::new("amount", Some(&text), "must be >= 0.01"));
        return;
    }
    let integer_digits = amount.trunc().abs().to_string().len();
    if integer_digits > MAX_INTEGER_DIGITS || amount.scale() > MAX_FRACTION_DIGITS {
        violations.push(FieldViolation::new(
            "amount",
            Some(&text),
            format!(
                "can have up to {} integer digits and {} decimals",
                MAX_INTEGER_DIGITS, MAX_FRACTION_DIGITS
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_request;
    use rstest::rstest;
    use std::str::FromStr;

    fn violations_of(request: &PaymentRequest) -> Vec<FieldViolation> {
        match PaymentValidator::new().validate(request) {
            Ok(()) => Vec::new(),
            Err(PaymentError::ValidationFailed { violations }) => violations,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_clean_request_passes() {
        assert!(PaymentValidator::new()
            .validate(&sample_request("Munster Muller", "Loan Repayment"))
            .is_ok());
    }

    #[rstest]
    #[case::two_places("2500.75", true)]
    #[case::one_place("10.5", true)]
    #[case::integer("42", true)]
    #[case::minimum("0.01", true)]
    #[case::twelve_digits("999999999999.99", true)]
    #[case::three_places("100.123", false)]
    #[case::zero("0.00", false)]
    #[case::negative("-5.00", false)]
    #[case::thirteen_digits("1000000000000.00", false)]
    fn test_amount_rules(#[case] amount: &str, #[case] valid: bool) {
        let mut request = sample_request("Munster Muller", "Rent");
        request.amount = Decimal::from_str(amount).unwrap();

        let violations = violations_of(&request);
        assert_eq!(violations.is_empty(), valid, "{:?}", violations);
        if !valid {
            assert_eq!(violations[0].field, "amount");
            assert_eq!(violations[0].rejected_value.as_deref(), Some(amount));
        }
    }

    #[rstest]
    #[case::lowercase("deu")]
    #[case::two_letters("DE")]
    #[case::digits("123")]
    fn test_country_code_shape(#[case] code: &str) {
        let mut request = sample_request("Munster Muller", "Rent");
        request.payee_country_code = code.to_string();
        let violations = violations_of(&request);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "payeeCountryCode");
    }

    #[rstest]
    #[case::unknown_payer_country("payerCountryCode", "XYZ")]
    #[case::unknown_payee_country("payeeCountryCode", "QQQ")]
    #[case::unknown_currency("currency", "ABC")]
    #[case::placeholder_currency("currency", "XXX")]
    fn test_unregistered_code_rejected(#[case] field: &str, #[case] code: &str) {
        let mut request = sample_request("Munster Muller", "Rent");
        match field {
            "payerCountryCode" => request.payer_country_code = code.to_string(),
            "payeeCountryCode" => request.payee_country_code = code.to_string(),
            _ => request.currency = code.to_string(),
        }
        let violations = violations_of(&request);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, field);
        assert!(violations[0].message.starts_with("is not a known ISO"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut request = sample_request("   ", "x".repeat(141).as_str());
        request.payer_account = "short".into();
        request.payee_account = "DE89-3704-0044-0532".into();
        request.currency = "usd".into();

        let fields: Vec<String> = violations_of(&request).into_iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            vec!["payerName", "payerAccount", "payeeAccount", "paymentInstruction", "currency"]
        );
    }

    #[test]
    fn test_long_name_rejected() {
        let request = sample_request(&"A".repeat(71), "Rent");
        assert_eq!(violations_of(&request)[0].field, "payerName");
        let request = sample_request(&"A".repeat(70), "Rent");
        assert!(violations_of(&request).is_empty());
    }
}
