// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process transport with scripted remotes
//!
//! Each endpoint is given a [`Responder`] describing how the remote behaves:
//! reply after a delay, never reply, or refuse the connection. Delays run on
//! tokio time, so tests using a paused clock stay deterministic. The network
//! counts every session it opens and closes.

use crate::common::{
    unique_socket_identity, RoutedMessage, SessionConfig, TransportError, TransportResult,
};
use crate::traits::{Session, SessionConnector};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

type ReplyFn = dyn Fn(&RoutedMessage) -> Vec<u8> + Send + Sync;

/// Scripted behaviour of one remote endpoint
#[derive(Clone)]
pub enum Responder {
    /// Answer every request with the same bytes
    Reply { after: Duration, body: Vec<u8> },
    /// Answer computed from the request
    Respond { after: Duration, handler: Arc<ReplyFn> },
    /// Accept requests and never answer
    Silent,
    /// Fail on connect
    Refuse,
}

impl Responder {
    pub fn reply(after: Duration, body: Vec<u8>) -> Self {
        Self::Reply { after, body }
    }

    pub fn respond(
        after: Duration,
        handler: impl Fn(&RoutedMessage) -> Vec<u8> + Send + Sync + 'static,
    ) -> Self {
        Self::Respond {
            after,
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reply { after, body } => f
                .debug_struct("Reply")
                .field("after", after)
                .field("len", &body.len())
                .finish(),
            Self::Respond { after, .. } => f.debug_struct("Respond").field("after", after).finish(),
            Self::Silent => f.write_str("Silent"),
            Self::Refuse => f.write_str("Refuse"),
        }
    }
}

/// Request as observed by a scripted remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub endpoint: String,
    pub socket_identity: String,
    pub frames: Vec<Vec<u8>>,
}

#[derive(Default)]
struct MemoryNetwork {
    responders: RwLock<HashMap<String, Responder>>,
    requests: Mutex<Vec<ReceivedRequest>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    dropped_open: AtomicUsize,
}

/// Connector for the in-process network; clones share the same network
#[derive(Clone, Default)]
pub struct MemoryConnector {
    network: Arc<MemoryNetwork>,
    config: SessionConfig,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            network: Arc::default(),
            config,
        }
    }

    /// Script the remote at `endpoint`; unscripted endpoints stay silent
    pub fn set_responder(&self, endpoint: impl Into<String>, responder: Responder) {
        self.network.responders.write().insert(endpoint.into(), responder);
    }

    /// Every request delivered so far, in send order
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.network.requests.lock().clone()
    }

    pub fn opened_sessions(&self) -> usize {
        self.network.opened.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.network.closed.load(Ordering::SeqCst)
    }

    /// Sessions released by drop without an explicit close
    pub fn dropped_sessions(&self) -> usize {
        self.network.dropped_open.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet released
    pub fn open_sessions(&self) -> usize {
        self.opened_sessions() - self.closed_sessions() - self.dropped_sessions()
    }
}

impl fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnector")
            .field("opened", &self.opened_sessions())
            .field("closed", &self.closed_sessions())
            .finish()
    }
}

impl SessionConnector for MemoryConnector {
    fn open(&self, endpoint: &str, identity: &str) -> TransportResult<Box<dyn Session>> {
        self.network.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            endpoint: endpoint.to_string(),
            socket_identity: unique_socket_identity(identity),
            network: Arc::clone(&self.network),
            config: self.config.clone(),
            pending: Vec::new(),
            closed: false,
        }))
    }

    fn transport_type(&self) -> &str {
        "memory"
    }
}

struct MemorySession {
    endpoint: String,
    socket_identity: String,
    network: Arc<MemoryNetwork>,
    config: SessionConfig,
    /// Replies owed to this session, in send order
    pending: Vec<Option<(Duration, Vec<u8>)>>,
    closed: bool,
}

#[async_trait]
impl Session for MemorySession {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn socket_identity(&self) -> &str {
        &self.socket_identity
    }

    async fn send(&mut self, message: &RoutedMessage) -> TransportResult<()> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        self.config.check_size(message.size())?;

        let responder = self.network.responders.read().get(&self.endpoint).cloned();
        let reply = match responder {
            Some(Responder::Refuse) => {
                return Err(TransportError::ConnectFailed {
                    endpoint: self.endpoint.clone(),
                    reason: "connection refused".to_string(),
                })
            }
            Some(Responder::Reply { after, body }) => Some((after, body)),
            Some(Responder::Respond { after, handler }) => Some((after, handler(message))),
            Some(Responder::Silent) | None => None,
        };

        self.network.requests.lock().push(ReceivedRequest {
            endpoint: self.endpoint.clone(),
            socket_identity: self.socket_identity.clone(),
            frames: message.to_frames(),
        });
        self.pending.push(reply);
        trace!("[MEMORY] {} sent to {}", self.socket_identity, self.endpoint);
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<Vec<u8>> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        if self.pending.is_empty() {
            // nothing was requested, nothing will arrive
            return std::future::pending().await;
        }
        match self.pending.remove(0) {
            Some((after, body)) => {
                tokio::time::sleep(after).await;
                self.config.check_size(body.len())?;
                Ok(body)
            }
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.pending.clear();
            self.network.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if !self.closed {
            self.network.dropped_open.fetch_add(1, Ordering::SeqCst);
        }
    }
}
