// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nms-transports
//!
//! Transport layer for the NMS proxy: one short-lived request/reply session
//! per request towards a controller or aggregator broker.
//!
//! ## Transports
//!
//! - **ZMQ DEALER** (`zmq-client` feature, default): pure-Rust `zeromq`
//!   sockets talking to the remote ROUTER
//! - **Memory**: in-process scripted remotes for tests and dry runs
//!
//! ## Example
//!
//! ```no_run
//! use nms_transports::prelude::*;
//!
//! # async fn run() -> TransportResult<()> {
//! let connector = ZmqDealerConnector::new(SessionConfig::default())?;
//! let mut session = connector.open("tcp://[::1]:17077", "NMS_WEB_TOPO_REFRESH")?;
//! session
//!     .send(&RoutedMessage::new("ctrl-app-TOPOLOGY_APP", "NMS_WEB_TOPO_REFRESH", b"...".to_vec()))
//!     .await?;
//! let reply = session.receive().await?;
//! session.close().await;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Common**: errors, session config, routed messages
//! 2. **Traits**: [`SessionConnector`] and [`Session`]
//! 3. **Implementations**: [`zmq`] and [`memory`]

pub mod common;
pub mod memory;
pub mod traits;

#[cfg(feature = "zmq-client")]
pub mod zmq;

pub use common::{
    reply_payload, unique_socket_identity, RoutedMessage, SessionConfig, TransportError,
    TransportResult,
};
pub use traits::{Session, SessionConnector};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::memory::{MemoryConnector, Responder};
    pub use crate::traits::*;

    #[cfg(feature = "zmq-client")]
    pub use crate::zmq::*;
}
