// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NMS Thrift
//!
//! Wire codec for talking to controllers and aggregators. Everything here is
//! pure: bytes in, typed values (or a [`ProtocolError`] with the offending byte
//! offset) out.
//!
//! ## Core Components
//!
//! - **[`compact`]** - thrift compact protocol reader/writer and the [`ThriftStruct`] trait
//! - **[`framing`]** - 4-byte big-endian framed-transport header
//! - **[`Envelope`]** - outer `{message_type, payload}` message; the payload stays opaque
//! - **[`schema`]** - topology, controller status, aggregator status and alert schemas
//!
//! ## Basic Usage
//!
//! ```rust
//! use nms_thrift::{Envelope, schema::controller::ControllerMessageType};
//!
//! let request = Envelope::empty_body(ControllerMessageType::GetTopology.into());
//! let bytes = request.encode();
//! let decoded = Envelope::decode(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! assert_eq!(decoded.payload, b"\0");
//! ```

pub mod compact;
pub mod envelope;
pub mod error;
pub mod framing;
pub mod schema;

pub use compact::{deserialize, serialize, CompactReader, CompactWriter, FieldType, ThriftStruct};
pub use envelope::{Envelope, NO_BODY};
pub use error::{ProtocolError, Result};
