// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common error types for all transports

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-agnostic error type
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Endpoint could not be reached
    #[error("connect to {endpoint} failed: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Session was already closed
    #[error("session closed")]
    ConnectionClosed,

    /// Socket identity rejected by the transport
    #[error("invalid socket identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    /// Reply without any frame
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[cfg(feature = "zmq-client")]
    #[error("ZMQ error: {0}")]
    Zmq(#[from] zeromq::ZmqError),
}
