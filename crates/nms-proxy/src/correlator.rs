// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Request correlator
//!
//! Runs one request against one target: open a session, send the envelope,
//! race the reply against the operation's deadline, then record exactly one
//! outcome and close the session exactly once.
//!
//! ```text
//!            ┌──────────► Replied         (decoded, live)
//! Pending ───┼──────────► TimedOut        (placeholder, offline)
//!            ├──────────► TransportError  (placeholder, offline)
//!            └──────────► ProtocolError   (placeholder, offline)
//! ```
//!
//! A reply arriving after the deadline is never read: the receive future is
//! dropped with the session.

use crate::error::ProxyError;
use crate::payload::Payload;
use crate::registry::{Operation, OperationKind};
use crate::results::{RequestState, ResultSlot, SlotEntry};
use crate::target::Target;
use nms_thrift::Envelope;
use nms_transports::{RoutedMessage, Session, SessionConnector};
use std::time::{Duration, SystemTime};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// What one request produced
#[derive(Debug)]
pub struct Outcome {
    /// Position of the target in the dispatched list
    pub index: usize,
    pub target: String,
    pub operation: OperationKind,
    pub result: Result<Payload, ProxyError>,
    pub response_time: Duration,
}

impl Outcome {
    pub fn state(&self) -> RequestState {
        match &self.result {
            Ok(_) => RequestState::Replied,
            Err(ProxyError::Timeout { .. }) => RequestState::TimedOut,
            Err(ProxyError::Protocol(_)) => RequestState::ProtocolError,
            Err(_) => RequestState::TransportError,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// One in-flight request
pub struct PendingRequest<'a> {
    target: &'a Target,
    operation: &'a Operation,
    deadline: Instant,
    started: Instant,
}

impl<'a> PendingRequest<'a> {
    pub fn new(target: &'a Target, operation: &'a Operation) -> Self {
        let started = Instant::now();
        Self {
            target,
            operation,
            deadline: started + operation.timeout,
            started,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Drive the request to its terminal state and record it in `slot`
    pub async fn run(
        self,
        connector: &dyn SessionConnector,
        request: &Envelope,
        slot: &ResultSlot,
        index: usize,
    ) -> Outcome {
        let result = self.exchange(connector, request).await;
        self.finish(result, slot, index)
    }

    async fn exchange(
        &self,
        connector: &dyn SessionConnector,
        request: &Envelope,
    ) -> Result<Payload, ProxyError> {
        let mut session =
            connector.open(self.target.endpoint(), self.operation.caller_identity)?;
        let message = RoutedMessage::new(
            self.operation.destination,
            self.operation.caller_identity,
            request.encode(),
        );

        let reply = tokio::time::timeout_at(
            self.deadline,
            send_and_receive(session.as_mut(), &message),
        )
        .await;
        session.close().await;

        let bytes = match reply {
            Ok(bytes) => bytes?,
            Err(_) => {
                return Err(ProxyError::Timeout {
                    target: self.target.name().to_string(),
                    timeout: self.operation.timeout,
                })
            }
        };
        trace!(
            "[CORRELATOR] {} {} reply: {} bytes",
            self.operation.kind,
            self.target.name(),
            bytes.len()
        );
        let envelope = Envelope::decode(&bytes)?;
        Ok(self.operation.decode_reply(&envelope)?)
    }

    fn finish(self, result: Result<Payload, ProxyError>, slot: &ResultSlot, index: usize) -> Outcome {
        let response_time = self.started.elapsed();
        let live = result.is_ok();
        let was_live = self.target.set_live(live);

        if let Err(error) = &result {
            self.log_failure(error, was_live);
        } else if !was_live {
            info!(
                "[CORRELATOR] {} {} is back online",
                self.target.kind(),
                self.target.name()
            );
        }

        let outcome = Outcome {
            index,
            target: self.target.name().to_string(),
            operation: self.operation.kind,
            result,
            response_time,
        };
        slot.write(SlotEntry {
            payload: outcome.result.as_ref().ok().cloned(),
            state: outcome.state(),
            response_time: Some(response_time),
            error: outcome.result.as_ref().err().map(ToString::to_string),
            completed_at: Some(SystemTime::now()),
        });
        outcome
    }

    fn log_failure(&self, error: &ProxyError, was_live: bool) {
        let kind = self.target.kind();
        let name = self.target.name();
        match error {
            ProxyError::Timeout { .. } if was_live => {
                info!("[CORRELATOR] {} {} timed out on {}", kind, name, self.operation.kind)
            }
            ProxyError::Timeout { .. } => {
                debug!("[CORRELATOR] {} {} timed out on {}", kind, name, self.operation.kind)
            }
            ProxyError::Protocol(protocol) => warn!(
                "[CORRELATOR] {} {} sent an undecodable {} reply (expected type {:?}, failed at byte {:?}): {}",
                kind,
                name,
                self.operation.kind,
                self.operation.reply_type,
                protocol.offset(),
                protocol
            ),
            other => warn!(
                "[CORRELATOR] {} {} {} failed: {}",
                kind, name, self.operation.kind, other
            ),
        }
    }
}

async fn send_and_receive(
    session: &mut dyn Session,
    message: &RoutedMessage,
) -> Result<Vec<u8>, ProxyError> {
    session.send(message).await?;
    Ok(session.receive().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OperationRegistry;
    use crate::target::{ServiceKind, TargetSpec};
    use nms_thrift::schema::topology::Topology;
    use nms_transports::memory::{MemoryConnector, Responder};

    fn controller(name: &str, address: &str) -> Target {
        Target::new(ServiceKind::Controller, TargetSpec::new(name, address), 17077)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_marks_live() {
        let connector = MemoryConnector::new();
        let target = controller("a", "::1");
        let topology = Topology {
            name: "a".to_string(),
            ..Topology::default()
        };
        connector.set_responder(
            target.endpoint(),
            Responder::reply(Duration::from_millis(20), Envelope::wrap(321, &topology).encode()),
        );

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::Topology);
        let slot = ResultSlot::default();
        let outcome = PendingRequest::new(&target, operation)
            .run(&connector, &operation.empty_request(), &slot, 0)
            .await;

        assert_eq!(outcome.state(), RequestState::Replied);
        assert!(outcome.response_time >= Duration::from_millis(20));
        assert!(outcome.response_time < Duration::from_millis(25));
        assert!(target.is_live());
        assert_eq!(slot.read().payload, Some(Payload::Topology(topology)));
        assert_eq!(connector.closed_sessions(), 1);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_writes_placeholder() {
        let connector = MemoryConnector::new();
        let target = controller("b", "::2");
        target.set_live(true);
        connector.set_responder(target.endpoint(), Responder::Silent);

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::Topology);
        let slot = ResultSlot::default();
        let request = PendingRequest::new(&target, operation);
        let deadline = request.deadline();
        let outcome = request.run(&connector, &operation.empty_request(), &slot, 0).await;

        assert!(Instant::now() >= deadline);
        assert!(Instant::now() - deadline < Duration::from_millis(5));
        assert_eq!(outcome.state(), RequestState::TimedOut);
        assert!(!target.is_live());
        let entry = slot.read();
        assert!(entry.is_empty());
        assert_eq!(entry.state, RequestState::TimedOut);
        assert_eq!(slot.writes(), 1);
        assert_eq!(connector.closed_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_reply_is_protocol_error() {
        let connector = MemoryConnector::new();
        let target = controller("c", "::3");
        connector.set_responder(target.endpoint(), Responder::reply(Duration::ZERO, vec![0xff, 0x01]));

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::ControllerStatus);
        let slot = ResultSlot::default();
        let outcome = PendingRequest::new(&target, operation)
            .run(&connector, &operation.empty_request(), &slot, 3)
            .await;

        assert_eq!(outcome.index, 3);
        assert_eq!(outcome.state(), RequestState::ProtocolError);
        assert!(!target.is_live());
        assert!(slot.read().error.is_some());
        assert_eq!(connector.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let connector = MemoryConnector::new();
        let target = controller("d", "::4");
        connector.set_responder(target.endpoint(), Responder::Refuse);

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::Topology);
        let slot = ResultSlot::default();
        let outcome = PendingRequest::new(&target, operation)
            .run(&connector, &operation.empty_request(), &slot, 0)
            .await;

        assert_eq!(outcome.state(), RequestState::TransportError);
        assert_eq!(connector.closed_sessions(), 1);
        assert_eq!(connector.open_sessions(), 0);
    }
}
