// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for decoding wire bytes

use crate::compact::FieldType;

/// Result type alias using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Malformed, truncated or mismatched bytes received from a remote.
///
/// Every variant produced while parsing carries the byte offset at which
/// parsing stopped, so a version mismatch can be diagnosed from the logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Input ended in the middle of a value
    #[error("unexpected end of input at byte {offset}: {needed} more byte(s) needed")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Varint longer than its type allows or out of range
    #[error("malformed varint at byte {offset} (limit {bits} bits)")]
    InvalidVarint { offset: usize, bits: u32 },

    /// Compact type nibble that does not name a thrift type
    #[error("unknown compact type code {code:#04x} at byte {offset}")]
    InvalidType { offset: usize, code: u8 },

    /// Declared length or element count cannot fit in the remaining input or
    /// the reader's decode budget
    #[error("invalid length {length} at byte {offset} ({remaining} byte(s) remaining)")]
    InvalidLength {
        offset: usize,
        length: u64,
        remaining: usize,
    },

    /// Structs or containers nested beyond the reader limit
    #[error("nesting exceeds {limit} levels at byte {offset}")]
    DepthLimitExceeded { offset: usize, limit: usize },

    /// Container whose element type does not match the schema
    #[error("container at byte {offset} holds {found:?} elements, expected {expected:?}")]
    ElementTypeMismatch {
        offset: usize,
        expected: FieldType,
        found: FieldType,
    },

    /// Required field absent from a decoded struct
    #[error("required field {structure}.{field} missing (struct ended at byte {offset})")]
    MissingField {
        structure: &'static str,
        field: &'static str,
        offset: usize,
    },

    /// Framed-transport header disagrees with the bytes that follow it
    #[error("frame header declares {declared} byte(s) but {actual} follow")]
    FrameLength { declared: usize, actual: usize },

    /// Remote answered with a different envelope type than the operation expects
    #[error("expected reply message type {expected}, received {actual}")]
    UnexpectedMessageType { expected: i32, actual: i32 },
}

impl ProtocolError {
    /// Byte offset where parsing stopped, when the error came from the reader
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { offset, .. }
            | Self::InvalidVarint { offset, .. }
            | Self::InvalidType { offset, .. }
            | Self::InvalidLength { offset, .. }
            | Self::DepthLimitExceeded { offset, .. }
            | Self::ElementTypeMismatch { offset, .. }
            | Self::MissingField { offset, .. } => Some(*offset),
            Self::FrameLength { .. } | Self::UnexpectedMessageType { .. } => None,
        }
    }
}
