//! Outcome serialization
//!
//! One line per processed input: the key-value encoded `PaymentRecord` on
//! success, the `ErrorResponse` body on failure.

use crate::codec::{self, WireEncoding};
use crate::types::{ErrorResponse, PaymentError, PaymentRecord, GENERIC_ERROR_MESSAGE};
use std::io::Write;

/// Render one outcome as a single JSON line, without the newline
pub fn render_outcome(outcome: &Result<PaymentRecord, PaymentError>) -> Vec<u8> {
    let rendered = match outcome {
        Ok(record) => codec::encode(record, WireEncoding::KeyValue),
        Err(error) => render_error(error),
    };
    // a record that cannot be rendered is reported as an internal error
    rendered.unwrap_or_else(|error| {
        render_error(&error).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, GENERIC_ERROR_MESSAGE).into_bytes()
        })
    })
}

fn render_error(error: &PaymentError) -> Result<Vec<u8>, PaymentError> {
    serde_json::to_vec(&ErrorResponse::from(error)).map_err(|e| PaymentError::encode(e.to_string()))
}

/// Write one outcome line
///
/// # Returns
///
/// * `Ok(())` - If the line was written
/// * `Err(String)` - If the output could not be written
pub fn write_outcome(
    outcome: &Result<PaymentRecord, PaymentError>,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut line = render_outcome(outcome);
    line.push(b'\n');
    output
        .write_all(&line)
        .map_err(|e| format!("Failed to write output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, sample_request};

    #[test]
    fn test_record_line_is_key_value_record() {
        let record = PaymentRecord::pending(sample_request("Munster Muller", "Rent"), at(0));
        let mut output = Vec::new();
        write_outcome(&Ok(record.clone()), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with('\n'));
        let decoded: PaymentRecord = codec::decode(text.trim_end().as_bytes(), WireEncoding::KeyValue).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_error_line_is_error_response() {
        let mut output = Vec::new();
        write_outcome(&Err(PaymentError::decode_field("amount", "bad")), &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["code"], "VALIDATION_ERROR");
        assert_eq!(value["errors"][0]["field"], "amount");
    }

    #[test]
    fn test_unrenderable_record_becomes_internal_error() {
        let mut record = PaymentRecord::pending(sample_request("a", "b"), at(0));
        record.last_updated_timestamp = at(0) + chrono::Duration::milliseconds(1);

        let value: serde_json::Value = serde_json::from_slice(&render_outcome(&Ok(record))).unwrap();
        assert_eq!(value["code"], "INTERNAL_ERROR");
        assert_eq!(value["message"], GENERIC_ERROR_MESSAGE);
    }
}
