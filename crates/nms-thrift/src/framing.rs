// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Framed transport header
//!
//! Thrift's framed transport prefixes every flushed message with its length as
//! a 4-byte big-endian integer. Remotes read the bare compact bytes from the
//! ZMQ frame, so the header is removed before anything is sent.

use crate::error::{ProtocolError, Result};
use byteorder::{BigEndian, ByteOrder};

pub const FRAME_HEADER_LEN: usize = 4;

/// Prefix `body` with its big-endian length
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut framed = vec![0u8; FRAME_HEADER_LEN + body.len()];
    BigEndian::write_u32(&mut framed[..FRAME_HEADER_LEN], body.len() as u32);
    framed[FRAME_HEADER_LEN..].copy_from_slice(body);
    framed
}

/// Validate and remove the length header, returning the body
pub fn strip_frame_header(framed: &[u8]) -> Result<&[u8]> {
    if framed.len() < FRAME_HEADER_LEN {
        return Err(ProtocolError::UnexpectedEof {
            offset: 0,
            needed: FRAME_HEADER_LEN - framed.len(),
        });
    }
    let declared = BigEndian::read_u32(&framed[..FRAME_HEADER_LEN]) as usize;
    let body = &framed[FRAME_HEADER_LEN..];
    if declared != body.len() {
        return Err(ProtocolError::FrameLength {
            declared,
            actual: body.len(),
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prepends_big_endian_length() {
        let framed = frame(b"abc");
        assert_eq!(framed, vec![0, 0, 0, 3, b'a', b'b', b'c']);
        assert_eq!(strip_frame_header(&framed).unwrap(), b"abc");
    }

    #[test]
    fn test_empty_body_frame() {
        let framed = frame(&[]);
        assert_eq!(framed, vec![0, 0, 0, 0]);
        assert!(strip_frame_header(&framed).unwrap().is_empty());
    }

    #[test]
    fn test_short_header_rejected() {
        assert_eq!(
            strip_frame_header(&[0, 0]).unwrap_err(),
            ProtocolError::UnexpectedEof {
                offset: 0,
                needed: 2
            }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert_eq!(
            strip_frame_header(&[0, 0, 0, 9, 1]).unwrap_err(),
            ProtocolError::FrameLength {
                declared: 9,
                actual: 1
            }
        );
    }
}
