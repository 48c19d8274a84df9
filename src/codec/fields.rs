//! Encoding-neutral field tree
//!
//! Both wire encodings are flat-ish documents of named string leaves and
//! nested groups. `Fields` is that shape, independent of syntax: the entity
//! mappings build and read `Fields`, and each encoding only converts between
//! `Fields` and bytes. Typed parsing and field-path error reporting therefore
//! behave identically for JSON and XML.

use super::format;
use crate::types::PaymentError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A field value: a string leaf or a nested group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Group(Fields),
}

/// Ordered collection of named nodes
///
/// Insertion order is the order the encoders write fields in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, Node)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text leaf
    pub fn push_text(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), Node::Text(value.into())));
    }

    /// Append a text leaf when a value is present
    pub fn push_optional(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push_text(name, value);
        }
    }

    /// Append a nested group
    pub fn push_group(&mut self, name: &str, group: Fields) {
        self.entries.push((name.to_string(), Node::Group(group)));
    }

    /// Insert a decoded node, rejecting a name seen before
    ///
    /// `path` is the dotted path of the node, used in the error.
    pub fn insert_unique(&mut self, name: String, node: Node, path: &str) -> Result<(), PaymentError> {
        if self.get(&name).is_some() {
            return Err(PaymentError::decode_field(path, "field appears more than once"));
        }
        self.entries.push((name, node));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Typed, path-aware view over a decoded `Fields` group
///
/// Every error produced here names the full dotted path of the field, for
/// example `paymentRequest.amount`.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    fields: &'a Fields,
    prefix: Option<String>,
}

impl<'a> FieldReader<'a> {
    /// Reader over a document's top-level group
    pub fn root(fields: &'a Fields) -> Self {
        Self {
            fields,
            prefix: None,
        }
    }

    fn path(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.to_string(),
        }
    }

    /// Required text leaf
    pub fn text(&self, name: &str) -> Result<&'a str, PaymentError> {
        self.optional_text(name)?
            .ok_or_else(|| PaymentError::decode_field(&self.path(name), "missing required field"))
    }

    /// Optional text leaf
    pub fn optional_text(&self, name: &str) -> Result<Option<&'a str>, PaymentError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(Node::Text(text)) => Ok(Some(text.as_str())),
            Some(Node::Group(_)) => Err(PaymentError::decode_field(
                &self.path(name),
                "expected a text value, found a nested group",
            )),
        }
    }

    /// Required owned string
    pub fn string(&self, name: &str) -> Result<String, PaymentError> {
        self.text(name).map(str::to_string)
    }

    /// Required nested group
    pub fn group(&self, name: &str) -> Result<FieldReader<'a>, PaymentError> {
        let path = self.path(name);
        match self.fields.get(name) {
            Some(Node::Group(fields)) => Ok(FieldReader {
                fields,
                prefix: Some(path),
            }),
            Some(Node::Text(_)) => Err(PaymentError::decode_field(
                &path,
                "expected a nested group, found a text value",
            )),
            None => Err(PaymentError::decode_field(&path, "missing required field")),
        }
    }

    /// Required leaf parsed with `parser`
    pub fn parse<T>(
        &self,
        name: &str,
        parser: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, PaymentError> {
        let text = self.text(name)?;
        parser(text).map_err(|message| PaymentError::decode_field(&self.path(name), message))
    }

    pub fn uuid(&self, name: &str) -> Result<Uuid, PaymentError> {
        self.parse(name, |text| {
            Uuid::parse_str(text).map_err(|_| {
                format!(
                    "invalid UUID '{}', expected xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
                    text
                )
            })
        })
    }

    pub fn instant(&self, name: &str) -> Result<DateTime<Utc>, PaymentError> {
        self.parse(name, format::parse_instant)
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, PaymentError> {
        self.parse(name, format::parse_date)
    }

    pub fn decimal(&self, name: &str) -> Result<Decimal, PaymentError> {
        self.parse(name, format::parse_amount)
    }
}
