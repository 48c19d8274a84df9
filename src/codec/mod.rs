//! Protocol transcoder
//!
//! Converts canonical entities to and from the two wire encodings:
//! - `WireEncoding::KeyValue`: JSON, used on the direct leg
//! - `WireEncoding::Markup`: XML, used on the queue leg
//!
//! # Design
//!
//! Each entity maps itself to an encoding-neutral `Fields` tree through the
//! `Canonical` trait. The encodings only translate between `Fields` and bytes,
//! so field names, scalar formats and decode errors are identical across both.
//! Decoding either encoding and re-encoding into the other is lossless.

mod entities;
pub mod fields;
pub mod format;
pub mod key_value;
pub mod markup;

use crate::types::PaymentError;
use fields::{FieldReader, Fields};
use std::fmt;

/// Wire encoding of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireEncoding {
    /// JSON object with string leaves
    KeyValue,
    /// XML document with one element per field
    Markup,
}

impl WireEncoding {
    /// MIME type of the encoding
    pub fn content_type(&self) -> &'static str {
        match self {
            WireEncoding::KeyValue => "application/json",
            WireEncoding::Markup => "application/xml",
        }
    }
}

impl fmt::Display for WireEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

/// An entity with a wire representation
pub trait Canonical: Sized {
    /// Root element name in the markup encoding
    const ROOT: &'static str;

    /// Map the entity to a field tree, in wire order
    fn to_fields(&self) -> Result<Fields, PaymentError>;

    /// Rebuild the entity from a decoded field tree
    fn from_fields(reader: &FieldReader<'_>) -> Result<Self, PaymentError>;
}

/// Encode a canonical entity
///
/// # Arguments
///
/// * `value` - The entity to encode
/// * `encoding` - Target wire encoding
///
/// # Returns
///
/// The encoded bytes, or `EncodeFailure` if a value cannot be represented
/// (for example an instant with fractional seconds).
pub fn encode<T: Canonical>(value: &T, encoding: WireEncoding) -> Result<Vec<u8>, PaymentError> {
    let fields = value.to_fields()?;
    match encoding {
        WireEncoding::KeyValue => key_value::write(&fields),
        WireEncoding::Markup => markup::write(T::ROOT, &fields),
    }
}

/// Decode a canonical entity
///
/// # Returns
///
/// The entity, or `DecodeFailure` naming the offending field where one is
/// derivable.
pub fn decode<T: Canonical>(bytes: &[u8], encoding: WireEncoding) -> Result<T, PaymentError> {
    let fields = match encoding {
        WireEncoding::KeyValue => key_value::read(bytes)?,
        WireEncoding::Markup => markup::read(T::ROOT, bytes)?,
    };
    T::from_fields(&FieldReader::root(&fields))
}

/// Re-encode a payload from one encoding into another
pub fn transcode<T: Canonical>(
    bytes: &[u8],
    from: WireEncoding,
    to: WireEncoding,
) -> Result<Vec<u8>, PaymentError> {
    let value: T = decode(bytes, from)?;
    encode(&value, to)
}
