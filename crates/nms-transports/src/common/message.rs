// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routed request message

use crate::common::{TransportError, TransportResult};
use uuid::Uuid;

/// Request addressed to one app behind a remote broker
///
/// On the wire it is the four frames
/// `["", destination, caller_identity, body]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedMessage {
    /// App id the broker routes to (e.g. `ctrl-app-TOPOLOGY_APP`)
    pub destination: String,

    /// Name the remote app replies to
    pub caller_identity: String,

    pub body: Vec<u8>,
}

impl RoutedMessage {
    pub fn new(
        destination: impl Into<String>,
        caller_identity: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            destination: destination.into(),
            caller_identity: caller_identity.into(),
            body,
        }
    }

    pub fn to_frames(&self) -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            self.destination.as_bytes().to_vec(),
            self.caller_identity.as_bytes().to_vec(),
            self.body.clone(),
        ]
    }

    /// Parse the four request frames as seen by a broker
    pub fn from_frames(mut frames: Vec<Vec<u8>>) -> TransportResult<Self> {
        if frames.len() != 4 || !frames[0].is_empty() {
            return Err(TransportError::InvalidMessage(format!(
                "expected [\"\", destination, identity, body], got {} frame(s)",
                frames.len()
            )));
        }
        let body = frames.remove(3);
        let caller_identity = String::from_utf8_lossy(&frames[2]).into_owned();
        let destination = String::from_utf8_lossy(&frames[1]).into_owned();
        Ok(Self {
            destination,
            caller_identity,
            body,
        })
    }

    pub fn size(&self) -> usize {
        self.destination.len() + self.caller_identity.len() + self.body.len()
    }
}

/// Locally unique socket identity derived from the caller identity
///
/// Overlapping requests from the same caller must not share a routing id on
/// the remote ROUTER.
pub fn unique_socket_identity(caller_identity: &str) -> String {
    format!("{caller_identity}-{}", Uuid::now_v7())
}

/// Keep only the payload of a reply; routing frames come first
pub fn reply_payload(mut frames: Vec<Vec<u8>>) -> TransportResult<Vec<u8>> {
    frames
        .pop()
        .ok_or_else(|| TransportError::InvalidMessage("reply without frames".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_layout() {
        let message = RoutedMessage::new("ctrl-app-TOPOLOGY_APP", "NMS_WEB_TOPO_REFRESH", vec![1, 2]);
        let frames = message.to_frames();
        assert_eq!(frames.len(), 4);
        assert!(frames[0].is_empty());
        assert_eq!(frames[1], b"ctrl-app-TOPOLOGY_APP");
        assert_eq!(frames[2], b"NMS_WEB_TOPO_REFRESH");
        assert_eq!(frames[3], vec![1, 2]);
        assert_eq!(RoutedMessage::from_frames(frames).unwrap(), message);
    }

    #[test]
    fn test_missing_delimiter_rejected() {
        let frames = vec![b"x".to_vec(), b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        assert!(RoutedMessage::from_frames(frames).is_err());
    }

    #[test]
    fn test_socket_identities_are_unique() {
        let a = unique_socket_identity("NMS_WEB_TOPO_REFRESH");
        let b = unique_socket_identity("NMS_WEB_TOPO_REFRESH");
        assert_ne!(a, b);
        assert!(a.starts_with("NMS_WEB_TOPO_REFRESH-"));
    }

    #[test]
    fn test_reply_payload_takes_last_frame() {
        let frames = vec![Vec::new(), b"ctrl-app-TOPOLOGY_APP".to_vec(), vec![9, 9]];
        assert_eq!(reply_payload(frames).unwrap(), vec![9, 9]);
        assert!(reply_payload(Vec::new()).is_err());
    }
}
