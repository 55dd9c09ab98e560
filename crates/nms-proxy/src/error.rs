// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the NMS proxy

use crate::target::ServiceKind;
use nms_thrift::ProtocolError;
use nms_transports::TransportError;
use std::time::Duration;

/// Result type alias using ProxyError
pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The remote did not answer before the operation's deadline
    #[error("No reply from {target} within {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    /// Socket-level failure (connect, send, receive)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote answered with bytes that do not decode
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No configured target with this name
    #[error("Unknown {kind} target: {name}")]
    UnknownTarget { kind: ServiceKind, name: String },

    /// The remote answered but refused the request
    #[error("{target} rejected the request: {message}")]
    Rejected { target: String, message: String },

    /// Alert rows coming from the UI could not be converted
    #[error("Invalid alert configuration: {0}")]
    InvalidAlert(String),

    #[error("Poller already running")]
    AlreadyRunning,
}

impl ProxyError {
    /// Expected in normal operation (a remote being down), not worth more than `debug`
    pub fn is_routine(&self) -> bool {
        matches!(self, ProxyError::Timeout { .. })
    }

    /// Whether the failure means the target must be shown offline
    pub fn marks_offline(&self) -> bool {
        matches!(
            self,
            ProxyError::Timeout { .. } | ProxyError::Transport(_) | ProxyError::Protocol(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let timeout = ProxyError::Timeout {
            target: "lab".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(timeout.is_routine());
        assert!(timeout.marks_offline());

        let protocol = ProxyError::from(ProtocolError::UnexpectedEof { offset: 3, needed: 1 });
        assert!(!protocol.is_routine());
        assert!(protocol.marks_offline());

        let rejected = ProxyError::Rejected {
            target: "lab".to_string(),
            message: "bad key".to_string(),
        };
        assert!(!rejected.marks_offline());
        assert_eq!(rejected.to_string(), "lab rejected the request: bad key");
    }
}
