// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ DEALER sessions (client-side request-reply)
//!
//! Every request gets its own DEALER socket with a fresh identity, so a late
//! reply to an abandoned request can never be read by a newer one. Connecting
//! happens lazily on the first send, inside the caller's deadline.

use crate::common::{
    reply_payload, unique_socket_identity, RoutedMessage, SessionConfig, TransportError,
    TransportResult,
};
use crate::traits::{Session, SessionConnector};
use async_trait::async_trait;
use tracing::{debug, trace};
use zeromq::util::PeerIdentity;
use zeromq::{DealerSocket, Socket, SocketOptions, SocketRecv, SocketSend, ZmqMessage};

/// Opens one DEALER socket per request
#[derive(Debug, Clone, Default)]
pub struct ZmqDealerConnector {
    config: SessionConfig,
}

impl ZmqDealerConnector {
    pub fn new(config: SessionConfig) -> TransportResult<Self> {
        config.validate()?;
        // zeromq closes without lingering
        if !config.linger.is_zero() {
            return Err(TransportError::InvalidConfig(format!(
                "zeromq transport does not support a linger period (linger={:?})",
                config.linger
            )));
        }
        Ok(Self { config })
    }
}

impl SessionConnector for ZmqDealerConnector {
    fn open(&self, endpoint: &str, identity: &str) -> TransportResult<Box<dyn Session>> {
        let socket_identity = unique_socket_identity(identity);
        let peer_identity = PeerIdentity::try_from(socket_identity.as_bytes().to_vec())
            .map_err(|e| TransportError::InvalidIdentity(e.to_string()))?;

        let mut options = SocketOptions::default();
        options.peer_identity(peer_identity);

        trace!("[ZMQ-DEALER] Opened session {} for {}", socket_identity, endpoint);

        Ok(Box::new(ZmqDealerSession {
            endpoint: endpoint.to_string(),
            socket_identity,
            config: self.config.clone(),
            socket: Some(DealerSocket::with_options(options)),
            connected: false,
        }))
    }

    fn transport_type(&self) -> &str {
        "zmq-dealer"
    }
}

/// Single-use DEALER socket
pub struct ZmqDealerSession {
    endpoint: String,
    socket_identity: String,
    config: SessionConfig,
    socket: Option<DealerSocket>,
    connected: bool,
}

impl ZmqDealerSession {
    async fn ensure_connected(&mut self) -> TransportResult<&mut DealerSocket> {
        let socket = self.socket.as_mut().ok_or(TransportError::ConnectionClosed)?;
        if !self.connected {
            socket
                .connect(&self.endpoint)
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    endpoint: self.endpoint.clone(),
                    reason: e.to_string(),
                })?;
            self.connected = true;
            debug!("[ZMQ-DEALER] {} connected to {}", self.socket_identity, self.endpoint);
        }
        Ok(socket)
    }
}

#[async_trait]
impl Session for ZmqDealerSession {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn socket_identity(&self) -> &str {
        &self.socket_identity
    }

    async fn send(&mut self, message: &RoutedMessage) -> TransportResult<()> {
        self.config.check_size(message.size())?;

        // Build [delimiter, destination, identity, body] back to front
        let mut zmq_message = ZmqMessage::from(message.body.clone());
        zmq_message.prepend(&ZmqMessage::from(message.caller_identity.as_bytes().to_vec()));
        zmq_message.prepend(&ZmqMessage::from(message.destination.as_bytes().to_vec()));
        zmq_message.prepend(&ZmqMessage::from(Vec::new()));

        let socket = self.ensure_connected().await?;
        socket
            .send(zmq_message)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        trace!(
            "[ZMQ-DEALER] Sent {} byte(s) to {} via {}",
            message.body.len(),
            message.destination,
            self.endpoint
        );
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<Vec<u8>> {
        let socket = self.socket.as_mut().ok_or(TransportError::ConnectionClosed)?;
        let reply = socket
            .recv()
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;

        let frames: Vec<Vec<u8>> = reply.into_vec().into_iter().map(|frame| frame.to_vec()).collect();
        trace!("[ZMQ-DEALER] Received {} frame(s) from {}", frames.len(), self.endpoint);

        let payload = reply_payload(frames)?;
        self.config.check_size(payload.len())?;
        Ok(payload)
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            for error in socket.close().await {
                debug!("[ZMQ-DEALER] Error while closing {}: {}", self.socket_identity, error);
            }
            trace!("[ZMQ-DEALER] Closed session {}", self.socket_identity);
        }
    }

    fn is_closed(&self) -> bool {
        self.socket.is_none()
    }
}
