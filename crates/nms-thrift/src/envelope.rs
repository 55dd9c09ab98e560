// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Outer message envelope
//!
//! Every request and reply is the compact struct `{1: i32 mType, 2: binary value}`.
//! The value holds a second, independently encoded struct (or the one-byte
//! [`NO_BODY`] sentinel) that this layer never looks into.

use crate::compact::{self, CompactReader, CompactWriter, FieldType, ThriftStruct};
use crate::error::{ProtocolError, Result};
use crate::framing;

/// Body sent with argument-less requests
pub const NO_BODY: &[u8] = b"\0";

const MESSAGE_TYPE_FIELD: i16 = 1;
const VALUE_FIELD: i16 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope {
    pub message_type: i32,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(message_type: i32, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    /// Request that carries no arguments
    pub fn empty_body(message_type: i32) -> Self {
        Self::new(message_type, NO_BODY)
    }

    /// Serialize `body` on its own and carry the bare bytes as the payload
    pub fn wrap<T: ThriftStruct>(message_type: i32, body: &T) -> Self {
        Self::new(message_type, compact::serialize(body))
    }

    /// Bare compact bytes, ready to send
    pub fn encode(&self) -> Vec<u8> {
        compact::serialize(self)
    }

    /// Bytes as the framed transport would flush them, header included
    pub fn encode_framed(&self) -> Vec<u8> {
        framing::frame(&self.encode())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        compact::deserialize(bytes)
    }

    /// Fail unless this envelope has the expected message type
    pub fn expect_type(&self, expected: i32) -> Result<&Self> {
        if self.message_type != expected {
            return Err(ProtocolError::UnexpectedMessageType {
                expected,
                actual: self.message_type,
            });
        }
        Ok(self)
    }

    /// Decode the nested struct carried in the payload
    pub fn decode_payload<T: ThriftStruct>(&self) -> Result<T> {
        compact::deserialize(&self.payload)
    }
}

impl ThriftStruct for Envelope {
    const NAME: &'static str = "Message";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_i32_field(MESSAGE_TYPE_FIELD, self.message_type);
        out.write_binary_field(VALUE_FIELD, &self.payload);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut message_type = None;
        let mut payload = Vec::new();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (MESSAGE_TYPE_FIELD, FieldType::I32) => message_type = Some(input.read_i32()?),
                (VALUE_FIELD, FieldType::Binary) => payload = input.read_binary()?.to_vec(),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        let message_type = message_type.ok_or(ProtocolError::MissingField {
            structure: Self::NAME,
            field: "mType",
            offset: input.position(),
        })?;
        Ok(Self {
            message_type,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_wire_bytes() {
        let bytes = Envelope::empty_body(301).encode();
        // i32 field 1 = 301, binary field 2 of length 1 holding NUL, STOP
        assert_eq!(bytes, vec![0x15, 0xda, 0x04, 0x18, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_framed_encoding_adds_header_only() {
        let envelope = Envelope::new(101, b"payload".to_vec());
        let framed = envelope.encode_framed();
        assert_eq!(
            framing::strip_frame_header(&framed).unwrap(),
            envelope.encode().as_slice()
        );
    }

    #[test]
    fn test_missing_message_type() {
        let err = Envelope::decode(&[0x28, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingField {
                structure: "Message",
                field: "mType",
                offset: 3
            }
        );
    }

    #[test]
    fn test_missing_value_decodes_as_empty() {
        let envelope = Envelope::decode(&[0x15, 0x02, 0x00]).unwrap();
        assert_eq!(envelope.message_type, 1);
        assert!(envelope.payload.is_empty());
    }

    #[test]
    fn test_expect_type() {
        let envelope = Envelope::empty_body(321);
        assert!(envelope.expect_type(321).is_ok());
        assert_eq!(
            envelope.expect_type(121).unwrap_err(),
            ProtocolError::UnexpectedMessageType {
                expected: 121,
                actual: 321
            }
        );
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut out = CompactWriter::new();
        out.write_struct_begin();
        out.write_string_field(7, "future field");
        out.write_i32_field(MESSAGE_TYPE_FIELD, 601);
        out.write_binary_field(VALUE_FIELD, b"x");
        out.write_struct_end();
        let envelope = Envelope::decode(&out.into_bytes()).unwrap();
        assert_eq!(envelope, Envelope::new(601, b"x".to_vec()));
    }
}
