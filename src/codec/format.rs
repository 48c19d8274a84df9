//! Scalar formatting rules shared by both wire encodings
//!
//! - instants: `yyyy-MM-ddTHH:mm:ssZ`, UTC, no fractional seconds
//! - dates: `yyyy-MM-dd`
//! - decimals: plain string tokens, scale preserved
//!
//! Parsers return `Err(String)` with a human message; the caller attaches the
//! field path.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;

const INSTANT_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Format an instant as `yyyy-MM-ddTHH:mm:ssZ`
///
/// Instants carrying fractional seconds are refused rather than truncated.
pub fn format_instant(instant: &DateTime<Utc>) -> Result<String, String> {
    if instant.nanosecond() != 0 {
        return Err(format!(
            "instant {} carries fractional seconds, which the wire format cannot represent",
            instant.to_rfc3339()
        ));
    }
    Ok(format!("{}Z", instant.format(INSTANT_LAYOUT)))
}

/// Parse a strict `yyyy-MM-ddTHH:mm:ssZ` instant
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>, String> {
    let bytes = text.as_bytes();
    if bytes.len() > 19 && bytes[19] == b'.' {
        return Err(format!(
            "expected format yyyy-MM-ddTHH:mm:ssZ (UTC, no fractional seconds), got '{}'. Remove the fractional seconds",
            text
        ));
    }
    if !has_shape(bytes, "dddd-dd-ddTdd:dd:ddZ") {
        return Err(format!(
            "expected format yyyy-MM-ddTHH:mm:ssZ (UTC, no fractional seconds), got '{}'",
            text
        ));
    }
    let naive = NaiveDateTime::parse_from_str(&text[..19], INSTANT_LAYOUT)
        .map_err(|e| format!("invalid instant '{}': {}", text, e))?;
    // chrono keeps a leap second as nanoseconds past 1e9
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(format!("invalid instant '{}': leap seconds are not supported", text));
    }
    Ok(naive.and_utc())
}

/// Format a calendar date as `yyyy-MM-dd`
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_LAYOUT).to_string()
}

/// Parse a strict `yyyy-MM-dd` date
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    if text.contains('T') {
        return Err(format!(
            "expected date only in format yyyy-MM-dd, got timestamp '{}'",
            text
        ));
    }
    if !has_shape(text.as_bytes(), "dddd-dd-dd") {
        return Err(format!("expected format yyyy-MM-dd, got '{}'", text));
    }
    NaiveDate::parse_from_str(text, DATE_LAYOUT)
        .map_err(|e| format!("invalid date '{}': {}", text, e))
}

/// Format a decimal with exactly the digits it carries
pub fn format_amount(amount: &Decimal) -> String {
    amount.to_string()
}

/// Parse a plain decimal token: optional sign, digits, optional fraction
///
/// Exponents, underscores, leading zeros and surrounding whitespace are
/// rejected, and no rounding ever happens.
pub fn parse_amount(text: &str) -> Result<Decimal, String> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits_only = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !fraction.map_or(true, digits_only) {
        return Err(format!(
            "expected a decimal string like 100.50, got '{}'",
            text
        ));
    }
    if whole.len() > 1 && whole.starts_with('0') {
        let trimmed = whole.trim_start_matches('0');
        let plain = if trimmed.is_empty() { "0" } else { trimmed };
        return Err(format!(
            "leading zeros are not allowed in '{}', send it as '{}'",
            text,
            text.replacen(whole, plain, 1)
        ));
    }
    Decimal::from_str_exact(text).map_err(|e| format!("invalid decimal '{}': {}", text, e))
}

// 'd' matches an ASCII digit, anything else matches itself
fn has_shape(bytes: &[u8], shape: &str) -> bool {
    bytes.len() == shape.len()
        && bytes
            .iter()
            .zip(shape.bytes())
            .all(|(&b, s)| if s == b'd' { b.is_ascii_digit() } else { b == s })
}
