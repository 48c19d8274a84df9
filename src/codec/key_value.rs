//! Key-value (JSON) encoding
//!
//! Documents are JSON objects whose leaves are all JSON strings. Numbers are
//! refused outright so a decimal amount can never pass through a binary float.
//! `null` is read as an absent field.

use super::fields::{Fields, Node};
use crate::types::PaymentError;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Serialize a field tree as a JSON object
pub fn write(fields: &Fields) -> Result<Vec<u8>, PaymentError> {
    serde_json::to_vec(&to_object(fields)).map_err(|e| PaymentError::encode(e.to_string()))
}

/// Parse a JSON object into a field tree
///
/// Keys are read straight off the token stream, so a key that appears twice
/// in one object is rejected instead of silently keeping the last value.
pub fn read(bytes: &[u8]) -> Result<Fields, PaymentError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let node = NodeSeed { path: None }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    match node? {
        Some(Node::Group(fields)) => Ok(fields),
        Some(Node::Text(_)) => Err(unexpected(None, "a string")),
        None => Err(unexpected(None, "null")),
    }
}

fn to_object(fields: &Fields) -> Value {
    let mut object = Map::with_capacity(fields.len());
    for (name, node) in fields.iter() {
        let value = match node {
            Node::Text(text) => Value::String(text.clone()),
            Node::Group(group) => to_object(group),
        };
        object.insert(name.to_string(), value);
    }
    Value::Object(object)
}

// `path` is None for the document itself
fn unexpected(path: Option<&str>, kind: &str) -> PaymentError {
    match path {
        Some(path) => PaymentError::decode_field(path, format!("expected a string, found {}", kind)),
        None => PaymentError::decode(format!("expected a JSON object, found {}", kind)),
    }
}

/// Decoded value of one JSON node
///
/// The outer `Result` is the syntax layer (serde); the inner one carries the
/// first field-level problem. `None` is a `null`.
type Decoded = Result<Option<Node>, PaymentError>;

struct NodeSeed {
    path: Option<String>,
}

impl<'de> DeserializeSeed<'de> for NodeSeed {
    type Value = Decoded;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decoded, D::Error> {
        deserializer.deserialize_any(NodeVisitor { path: self.path })
    }
}

struct NodeVisitor {
    path: Option<String>,
}

impl NodeVisitor {
    fn numeric(&self, number: String) -> Decoded {
        match &self.path {
            Some(path) => Err(PaymentError::decode_field(
                path,
                format!(
                    "numeric literal {} is not allowed, send the value as a string token (e.g. \"{}\")",
                    number, number
                ),
            )),
            None => Err(unexpected(None, "a number")),
        }
    }

    fn child_path(&self, name: &str) -> String {
        match &self.path {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.to_string(),
        }
    }
}

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Decoded;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object of string fields")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Decoded, E> {
        Ok(Ok(Some(Node::Text(value.to_string()))))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Decoded, E> {
        Ok(Ok(Some(Node::Text(value))))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Decoded, E> {
        Ok(Ok(None))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Decoded, E> {
        Ok(Err(unexpected(self.path.as_deref(), "a boolean")))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decoded, E> {
        Ok(self.numeric(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decoded, E> {
        Ok(self.numeric(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decoded, E> {
        Ok(self.numeric(value.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Decoded, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Err(unexpected(self.path.as_deref(), "an array")))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Decoded, A::Error> {
        let mut fields = Fields::new();
        let mut seen = HashSet::new();
        let mut failure = None;

        // the whole object is consumed even after a failure so the
        // syntax layer can still check the rest of the document
        while let Some(name) = map.next_key::<String>()? {
            let path = self.child_path(&name);
            if failure.is_some() {
                map.next_value::<IgnoredAny>()?;
                continue;
            }
            if !seen.insert(name.clone()) {
                map.next_value::<IgnoredAny>()?;
                failure = Some(PaymentError::decode_field(&path, "field appears more than once"));
                continue;
            }
            match map.next_value_seed(NodeSeed { path: Some(path.clone()) })? {
                Ok(Some(node)) => {
                    if let Err(e) = fields.insert_unique(name, node, &path) {
                        failure = Some(e);
                    }
                }
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        }

        Ok(match failure {
            Some(e) => Err(e),
            None => Ok(Some(Node::Group(fields))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_groups_survive() {
        let mut inner = Fields::new();
        inner.push_text("amount", "17.45");
        let mut fields = Fields::new();
        fields.push_text("status", "APPROVED");
        fields.push_group("paymentRequest", inner);

        let bytes = write(&fields).unwrap();
        let decoded = read(&bytes).unwrap();

        assert_eq!(decoded.get("status"), Some(&Node::Text("APPROVED".into())));
        match decoded.get("paymentRequest") {
            Some(Node::Group(group)) => {
                assert_eq!(group.get("amount"), Some(&Node::Text("17.45".into())))
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_literal_rejected_with_path() {
        let error = read(br#"{"paymentRequest": {"amount": 100.10}}"#).unwrap_err();
        match error {
            PaymentError::DecodeFailure { field, message } => {
                assert_eq!(field.as_deref(), Some("paymentRequest.amount"));
                assert!(message.contains("string token"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_null_is_absent() {
        let fields = read(br#"{"paymentInstruction": null, "currency": "EUR"}"#).unwrap();
        assert!(fields.get("paymentInstruction").is_none());
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            read(b"[1, 2]"),
            Err(PaymentError::DecodeFailure { field: None, .. })
        ));
        assert!(matches!(
            read(b"{not json"),
            Err(PaymentError::DecodeFailure { field: None, .. })
        ));
    }

    #[test]
    fn test_boolean_rejected() {
        let error = read(br#"{"currency": true}"#).unwrap_err();
        assert!(matches!(error, PaymentError::DecodeFailure { field: Some(f), .. } if f == "currency"));
    }

    #[test]
    fn test_repeated_key_rejected() {
        let json = br#"{"transactionId":"123e4567-e89b-12d3-a456-426614174000","status":"SUSPICIOUS","status":"APPROVED","validationTimestamp":"2025-09-15T14:47:19Z"}"#;
        let error = read(json).unwrap_err();
        assert_eq!(error, PaymentError::decode_field("status", "field appears more than once"));
    }

    #[test]
    fn test_repeated_key_in_group_names_path() {
        let error = read(br#"{"paymentRequest": {"amount": "1.00", "amount": "2.00"}}"#).unwrap_err();
        assert_eq!(
            error,
            PaymentError::decode_field("paymentRequest.amount", "field appears more than once")
        );
    }

    #[test]
    fn test_repeated_key_after_null_rejected() {
        let error = read(br#"{"paymentInstruction": null, "paymentInstruction": "Rent"}"#).unwrap_err();
        assert!(matches!(error, PaymentError::DecodeFailure { field: Some(f), .. } if f == "paymentInstruction"));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(
            read(br#"{"currency": "EUR"} extra"#),
            Err(PaymentError::DecodeFailure { field: None, .. })
        ));
    }
}
