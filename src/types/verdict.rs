//! Fraud verdict types

use super::request::TransactionId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Outcome of a fraud screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FraudStatus {
    /// Nothing found, all okay
    Approved,
    /// At least one field matched a blacklist
    Suspicious,
}

impl FraudStatus {
    /// Literal code used on every wire encoding
    pub fn code(&self) -> &'static str {
        match self {
            FraudStatus::Approved => "APPROVED",
            FraudStatus::Suspicious => "SUSPICIOUS",
        }
    }
}

impl fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FraudStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(FraudStatus::Approved),
            "SUSPICIOUS" => Ok(FraudStatus::Suspicious),
            other => Err(format!(
                "unknown fraud status '{}', expected one of [APPROVED, SUSPICIOUS]",
                other
            )),
        }
    }
}

/// Answer of the fraud-evaluation boundary for one payment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudVerdict {
    /// Id of the request this verdict answers
    pub transaction_id: TransactionId,

    /// Screening outcome
    pub status: FraudStatus,

    /// Instant of evaluation, whole seconds in UTC
    pub validation_timestamp: DateTime<Utc>,
}
