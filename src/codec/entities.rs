//! Field mappings of the canonical entities
//!
//! The element order written here is the order both encoders emit.

use super::fields::{FieldReader, Fields};
use super::format;
use super::Canonical;
use crate::types::{
    FraudStatus, FraudVerdict, PaymentError, PaymentRecord, PaymentRequest, PaymentStatus,
};

fn instant_text(name: &str, instant: &chrono::DateTime<chrono::Utc>) -> Result<String, PaymentError> {
    format::format_instant(instant)
        .map_err(|message| PaymentError::encode(format!("field '{}': {}", name, message)))
}

impl Canonical for PaymentRequest {
    const ROOT: &'static str = "fraudCheckRequest";

    fn to_fields(&self) -> Result<Fields, PaymentError> {
        let mut fields = Fields::new();
        fields.push_text("transactionId", self.transaction_id.to_string());
        fields.push_text("payerName", self.payer_name.as_str());
        fields.push_text("payerBank", self.payer_bank.as_str());
        fields.push_text("payerCountryCode", self.payer_country_code.as_str());
        fields.push_text("payerAccount", self.payer_account.as_str());
        fields.push_text("payeeName", self.payee_name.as_str());
        fields.push_text("payeeBank", self.payee_bank.as_str());
        fields.push_text("payeeCountryCode", self.payee_country_code.as_str());
        fields.push_text("payeeAccount", self.payee_account.as_str());
        fields.push_optional("paymentInstruction", self.payment_instruction.as_deref());
        fields.push_text("executionDate", format::format_date(&self.execution_date));
        fields.push_text("amount", format::format_amount(&self.amount));
        fields.push_text("currency", self.currency.as_str());
        fields.push_text(
            "creationTimestamp",
            instant_text("creationTimestamp", &self.creation_timestamp)?,
        );
        Ok(fields)
    }

    fn from_fields(reader: &FieldReader<'_>) -> Result<Self, PaymentError> {
        Ok(PaymentRequest {
            transaction_id: reader.uuid("transactionId")?,
            payer_name: reader.string("payerName")?,
            payer_bank: reader.string("payerBank")?,
            payer_country_code: reader.string("payerCountryCode")?,
            payer_account: reader.string("payerAccount")?,
            payee_name: reader.string("payeeName")?,
            payee_bank: reader.string("payeeBank")?,
            payee_country_code: reader.string("payeeCountryCode")?,
            payee_account: reader.string("payeeAccount")?,
            payment_instruction: reader
                .optional_text("paymentInstruction")?
                .map(str::to_string),
            execution_date: reader.date("executionDate")?,
            amount: reader.decimal("amount")?,
            currency: reader.string("currency")?,
            creation_timestamp: reader.instant("creationTimestamp")?,
        })
    }
}

impl Canonical for FraudVerdict {
    const ROOT: &'static str = "fraudCheckResponse";

    fn to_fields(&self) -> Result<Fields, PaymentError> {
        let mut fields = Fields::new();
        fields.push_text("transactionId", self.transaction_id.to_string());
        fields.push_text("status", self.status.code());
        fields.push_text(
            "validationTimestamp",
            instant_text("validationTimestamp", &self.validation_timestamp)?,
        );
        Ok(fields)
    }

    fn from_fields(reader: &FieldReader<'_>) -> Result<Self, PaymentError> {
        Ok(FraudVerdict {
            transaction_id: reader.uuid("transactionId")?,
            status: reader.parse("status", str::parse::<FraudStatus>)?,
            validation_timestamp: reader.instant("validationTimestamp")?,
        })
    }
}

impl Canonical for PaymentRecord {
    const ROOT: &'static str = "paymentRecord";

    fn to_fields(&self) -> Result<Fields, PaymentError> {
        let mut fields = Fields::new();
        fields.push_text("transactionId", self.transaction_id.to_string());
        fields.push_group("paymentRequest", self.payment_request.to_fields()?);
        fields.push_text("status", self.status.code());
        fields.push_text(
            "submittedTimestamp",
            instant_text("submittedTimestamp", &self.submitted_timestamp)?,
        );
        fields.push_text(
            "lastUpdatedTimestamp",
            instant_text("lastUpdatedTimestamp", &self.last_updated_timestamp)?,
        );
        Ok(fields)
    }

    fn from_fields(reader: &FieldReader<'_>) -> Result<Self, PaymentError> {
        let transaction_id = reader.uuid("transactionId")?;
        let payment_request = PaymentRequest::from_fields(&reader.group("paymentRequest")?)?;
        if payment_request.transaction_id != transaction_id {
            return Err(PaymentError::decode_field(
                "paymentRequest.transactionId",
                format!(
                    "embedded request id {} does not match record id {}",
                    payment_request.transaction_id, transaction_id
                ),
            ));
        }
        Ok(PaymentRecord {
            transaction_id,
            payment_request,
            status: reader.parse("status", str::parse::<PaymentStatus>)?,
            submitted_timestamp: reader.instant("submittedTimestamp")?,
            last_updated_timestamp: reader.instant("lastUpdatedTimestamp")?,
        })
    }
}
