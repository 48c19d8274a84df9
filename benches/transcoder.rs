//! Benchmark suite for the protocol transcoder
//!
//! Compares encoding, decoding and cross-encoding conversion of a payment
//! request over the key-value (JSON) and markup (XML) encodings using the
//! divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use payments_bridge::codec::{self, WireEncoding};
use payments_bridge::{PaymentRecord, PaymentRequest};
use rust_decimal::Decimal;
use uuid::Uuid;

fn main() {
    divan::main();
}

const ENCODINGS: [WireEncoding; 2] = [WireEncoding::KeyValue, WireEncoding::Markup];

fn request() -> PaymentRequest {
    let created = Utc
        .with_ymd_and_hms(2025, 9, 15, 14, 47, 19)
        .single()
        .expect("valid instant");
    PaymentRequest {
        transaction_id: Uuid::from_u128(0x123e4567_e89b_12d3_a456_426614174000),
        payer_name: "Munster Muller".to_string(),
        payer_bank: "Barclays".to_string(),
        payer_country_code: "GBR".to_string(),
        payer_account: "GB29NWBK60161331926819".to_string(),
        payee_name: "Sanne Lund".to_string(),
        payee_bank: "Deutsche Bank".to_string(),
        payee_country_code: "DEU".to_string(),
        payee_account: "DE89370400440532013000".to_string(),
        payment_instruction: Some("Loan Repayment".to_string()),
        execution_date: NaiveDate::from_ymd_opt(2020, 2, 21).expect("valid date"),
        amount: Decimal::new(150075, 2),
        currency: "EUR".to_string(),
        creation_timestamp: created,
    }
}

/// Encode a payment request
#[divan::bench(args = ENCODINGS)]
fn encode_request(encoding: WireEncoding) -> Vec<u8> {
    codec::encode(divan::black_box(&request()), encoding).expect("Encoding failed")
}

/// Decode a payment request
#[divan::bench(args = ENCODINGS)]
fn decode_request(bencher: divan::Bencher, encoding: WireEncoding) {
    let bytes = codec::encode(&request(), encoding).expect("Encoding failed");
    bencher.bench(|| {
        codec::decode::<PaymentRequest>(divan::black_box(&bytes), encoding).expect("Decoding failed")
    });
}

/// Convert a payment record from one encoding to the other
#[divan::bench(args = ENCODINGS)]
fn transcode_record(bencher: divan::Bencher, from: WireEncoding) {
    let to = match from {
        WireEncoding::KeyValue => WireEncoding::Markup,
        WireEncoding::Markup => WireEncoding::KeyValue,
    };
    let record = PaymentRecord::pending(request(), request().creation_timestamp);
    let bytes = codec::encode(&record, from).expect("Encoding failed");
    bencher.bench(|| {
        codec::transcode::<PaymentRecord>(divan::black_box(&bytes), from, to)
            .expect("Transcoding failed")
    });
}
