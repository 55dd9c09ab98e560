// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! A [`SessionConnector`] hands out one [`Session`] per request. Sessions are
//! short-lived: open, send once, receive at most once, close.

use crate::common::{RoutedMessage, TransportResult};
use async_trait::async_trait;

/// Factory for per-request sessions
pub trait SessionConnector: Send + Sync {
    /// Prepare a session towards `endpoint`
    ///
    /// Never waits on the remote. `identity` is the caller identity; the
    /// connector derives a locally unique socket identity from it.
    fn open(&self, endpoint: &str, identity: &str) -> TransportResult<Box<dyn Session>>;

    /// Get transport name/type
    fn transport_type(&self) -> &str;
}

/// One request/reply exchange with a remote broker
#[async_trait]
pub trait Session: Send {
    fn endpoint(&self) -> &str;

    /// Socket identity presented to the remote
    fn socket_identity(&self) -> &str;

    /// Send the four request frames, connecting first if needed
    async fn send(&mut self, message: &RoutedMessage) -> TransportResult<()>;

    /// Wait for the next reply and return its last frame
    async fn receive(&mut self) -> TransportResult<Vec<u8>>;

    /// Release the endpoint; calling it again is a no-op
    async fn close(&mut self);

    fn is_closed(&self) -> bool;
}
