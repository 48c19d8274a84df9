//! Blacklist-based fraud screening
//!
//! A request is SUSPICIOUS when any of these is blacklisted:
//! - the payer or payee name
//! - the payer or payee country code
//! - the payer or payee bank
//! - the payment instruction, after trimming surrounding whitespace
//!
//! Matching is exact and case-sensitive.

use crate::core::clock::Clock;
use crate::types::{FraudStatus, FraudVerdict, PaymentRequest};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// The four membership sets screened against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blacklists {
    pub names: HashSet<String>,
    pub countries: HashSet<String>,
    pub banks: HashSet<String>,
    pub instructions: HashSet<String>,
}

fn set_of(values: &[&str]) -> HashSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for Blacklists {
    fn default() -> Self {
        Self {
            names: set_of(&["Mark Imaginary", "Govind Real", "Shakil Maybe", "Chang Imagine"]),
            countries: set_of(&["CUB", "IRQ", "IRN", "PRK", "SDN", "SYR"]),
            banks: set_of(&["BANK OF KUNLUN", "KARAMAY CITY COMMERCIAL BANK"]),
            instructions: set_of(&["Artillery Procurement", "Lethal Chemicals payment"]),
        }
    }
}

/// Fraud evaluation engine
pub struct FraudEvaluator {
    blacklists: Blacklists,
    clock: Arc<dyn Clock>,
}

impl FraudEvaluator {
    /// Create an evaluator over the given lists
    ///
    /// # Arguments
    ///
    /// * `blacklists` - Membership sets to screen against
    /// * `clock` - Source of the verdict's validation timestamp
    pub fn new(blacklists: Blacklists, clock: Arc<dyn Clock>) -> Self {
        Self { blacklists, clock }
    }

    /// Screen a request without stamping a verdict
    pub fn screen(&self, request: &PaymentRequest) -> FraudStatus {
        let lists = &self.blacklists;
        let hit = lists.names.contains(&request.payer_name)
            || lists.names.contains(&request.payee_name)
            || lists.countries.contains(&request.payer_country_code)
            || lists.countries.contains(&request.payee_country_code)
            || lists.banks.contains(&request.payer_bank)
            || lists.banks.contains(&request.payee_bank)
            || request
                .payment_instruction
                .as_deref()
                .is_some_and(|instruction| lists.instructions.contains(instruction.trim()));

        if hit {
            FraudStatus::Suspicious
        } else {
            FraudStatus::Approved
        }
    }

    /// Evaluate a request into a verdict stamped with the current instant
    pub fn evaluate(&self, request: &PaymentRequest) -> FraudVerdict {
        let status = self.screen(request);
        debug!(transaction_id = %request.transaction_id, status = %status, "Fraud screening complete");
        FraudVerdict {
            transaction_id: request.transaction_id,
            status,
            validation_timestamp: self.clock.now(),
        }
    }
}
