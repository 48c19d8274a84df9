//! Tagged-markup (XML) encoding
//!
//! Documents look like:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
//! <fraudCheckRequest xmlns="urn:example:fraudcheck:v1">
//!     <transactionId>123e4567-e89b-12d3-a456-426614174000</transactionId>
//!     <amount>1500.75</amount>
//!     ...
//! </fraudCheckRequest>
//! ```
//!
//! One child element per field, nested elements for nested groups. Element
//! names are matched by local name, so prefixed elements decode as well.
//! Leaf text is kept verbatim; whitespace-only text between child elements
//! is insignificant.

use super::fields::{Fields, Node};
use crate::types::PaymentError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;

/// Namespace carried by every root element
pub const NAMESPACE: &str = "urn:example:fraudcheck:v1";

fn encode_error(error: impl Display) -> PaymentError {
    PaymentError::encode(format!("XML write failed: {}", error))
}

/// Serialize a field tree under `root`
pub fn write(root: &str, fields: &Fields) -> Result<Vec<u8>, PaymentError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(encode_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new(root).with_attributes([("xmlns", NAMESPACE)]),
        ))
        .map_err(encode_error)?;
    write_group(&mut writer, fields)?;
    writer
        .write_event(Event::End(BytesEnd::new(root)))
        .map_err(encode_error)?;
    Ok(writer.into_inner())
}

fn write_group(writer: &mut Writer<Vec<u8>>, fields: &Fields) -> Result<(), PaymentError> {
    for (name, node) in fields.iter() {
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(encode_error)?;
        match node {
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(encode_error)?,
            Node::Group(group) => write_group(writer, group)?,
        }
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(encode_error)?;
    }
    Ok(())
}

/// Element being assembled while reading
struct Frame {
    name: String,
    path: Option<String>,
    text: String,
    children: Option<Fields>,
}

impl Frame {
    fn new(name: String, parent: Option<&Frame>) -> Self {
        // the root element contributes no path segment
        let path = parent.map(|parent| match &parent.path {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.clone(),
        });
        Self {
            name,
            path,
            text: String::new(),
            children: None,
        }
    }

    fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    fn add_child(&mut self, child: Frame) -> Result<(), PaymentError> {
        let path = child.path().to_string();
        let name = child.name.clone();
        let node = child.into_node()?;
        self.children
            .get_or_insert_with(Fields::new)
            .insert_unique(name, node, &path)
    }

    fn into_node(mut self) -> Result<Node, PaymentError> {
        match self.children.take() {
            Some(children) => {
                if !self.text.trim().is_empty() {
                    return Err(PaymentError::decode_field(
                        self.path(),
                        "element mixes text with child elements",
                    ));
                }
                Ok(Node::Group(children))
            }
            None => Ok(Node::Text(self.text)),
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> Result<String, PaymentError> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| PaymentError::decode(format!("element name is not valid UTF-8: {}", e)))
}

/// Parse a document whose root element must be `root`
pub fn read(root: &str, bytes: &[u8]) -> Result<Fields, PaymentError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PaymentError::decode(format!("payload is not valid UTF-8: {}", e)))?;
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = Vec::new();
    let mut document: Option<Fields> = None;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(start) => {
                let name = element_name(&start)?;
                if stack.is_empty() {
                    check_root(root, &name, document.is_some())?;
                }
                let frame = Frame::new(name, stack.last());
                stack.push(frame);
            }
            Event::Empty(start) => {
                let name = element_name(&start)?;
                match stack.last_mut() {
                    Some(parent) => {
                        let child = Frame::new(name, Some(&*parent));
                        parent.add_child(child)?;
                    }
                    None => {
                        check_root(root, &name, document.is_some())?;
                        document = Some(Fields::new());
                    }
                }
            }
            Event::Text(content) => {
                let unescaped = content.unescape().map_err(|e| {
                    PaymentError::decode(format!("invalid character reference: {}", e))
                })?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&unescaped),
                    None if unescaped.trim().is_empty() => {}
                    None => {
                        return Err(PaymentError::decode(
                            "text outside of the root element",
                        ))
                    }
                }
            }
            Event::CData(content) => {
                let frame = stack
                    .last_mut()
                    .ok_or_else(|| PaymentError::decode("CDATA outside of the root element"))?;
                let raw = content.into_inner();
                let text = std::str::from_utf8(&raw).map_err(|e| {
                    PaymentError::decode_field(frame.path(), format!("CDATA is not valid UTF-8: {}", e))
                })?;
                frame.text.push_str(text);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| PaymentError::decode("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.add_child(frame)?,
                    None => {
                        document = Some(match frame.into_node()? {
                            Node::Group(fields) => fields,
                            Node::Text(text) if text.trim().is_empty() => Fields::new(),
                            Node::Text(_) => {
                                return Err(PaymentError::decode(format!(
                                    "root element '{}' must contain child elements",
                                    root
                                )))
                            }
                        })
                    }
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(PaymentError::decode(format!(
            "document ended inside element '{}'",
            open.name
        )));
    }
    document.ok_or_else(|| PaymentError::decode("document has no root element"))
}

fn check_root(expected: &str, found: &str, seen_root: bool) -> Result<(), PaymentError> {
    if seen_root {
        return Err(PaymentError::decode("content after the root element"));
    }
    if found != expected {
        return Err(PaymentError::decode(format!(
            "expected root element '{}', found '{}'",
            expected, found
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of<'a>(fields: &'a Fields, name: &str) -> &'a str {
        match fields.get(name) {
            Some(Node::Text(text)) => text.as_str(),
            other => panic!("expected text for {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_write_emits_namespace_and_declaration() {
        let mut fields = Fields::new();
        fields.push_text("status", "APPROVED");
        let xml = String::from_utf8(write("fraudCheckResponse", &fields).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("<fraudCheckResponse xmlns=\"urn:example:fraudcheck:v1\">"));
        assert!(xml.contains("<status>APPROVED</status>"));
    }

    #[test]
    fn test_special_characters_round_trip() {
        let mut fields = Fields::new();
        fields.push_text("paymentInstruction", "  Rent <March> & \"utilities\"  ");
        let bytes = write("fraudCheckRequest", &fields).unwrap();
        let decoded = read("fraudCheckRequest", &bytes).unwrap();

        assert_eq!(
            text_of(&decoded, "paymentInstruction"),
            "  Rent <March> & \"utilities\"  "
        );
    }

    #[test]
    fn test_pretty_printed_and_prefixed_input() {
        let xml = r#"<?xml version="1.0"?>
            <ns2:fraudCheckResponse xmlns:ns2="urn:example:fraudcheck:v1">
                <!-- produced upstream -->
                <ns2:status>SUSPICIOUS</ns2:status>
                <validationTimestamp>2025-09-15T14:47:20Z</validationTimestamp>
                <note/>
            </ns2:fraudCheckResponse>"#;
        let fields = read("fraudCheckResponse", xml.as_bytes()).unwrap();

        assert_eq!(text_of(&fields, "status"), "SUSPICIOUS");
        assert_eq!(text_of(&fields, "validationTimestamp"), "2025-09-15T14:47:20Z");
        assert_eq!(text_of(&fields, "note"), "");
    }

    #[test]
    fn test_nested_group_paths() {
        let xml = "<paymentRecord><paymentRequest><amount>1</amount><amount>2</amount></paymentRequest></paymentRecord>";
        let error = read("paymentRecord", xml.as_bytes()).unwrap_err();
        assert!(
            matches!(error, PaymentError::DecodeFailure { field: Some(ref f), .. } if f == "paymentRequest.amount"),
            "unexpected {:?}",
            error
        );
    }

    #[test]
    fn test_wrong_root_rejected() {
        let error = read("fraudCheckRequest", b"<fraudCheckResponse/>").unwrap_err();
        assert!(error.to_string().contains("expected root element 'fraudCheckRequest'"));
    }

    #[test]
    fn test_truncated_document_rejected() {
        assert!(read("fraudCheckRequest", b"<fraudCheckRequest><amount>1</amount>").is_err());
        assert!(read("fraudCheckRequest", b"").is_err());
    }

    #[test]
    fn test_mixed_content_rejected() {
        let xml = "<paymentRecord><paymentRequest>oops<amount>1</amount></paymentRequest></paymentRecord>";
        assert!(read("paymentRecord", xml.as_bytes()).is_err());
    }
}
