// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NMS - Network Management proxy
//!
//! Bounded-time RPC from the network management system to the controller and
//! aggregator of every managed network. Each request opens its own DEALER
//! session, carries a Thrift compact-protocol envelope, and completes with a
//! reply or a placeholder once its deadline passes.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! nms = "0.1"
//! ```
//!
//! ```rust,no_run
//! use nms::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = nms::config::load_config(None, None)?;
//! let proxy = Arc::new(NmsProxy::connect_zmq(&config)?);
//!
//! let mut poller = Poller::new(Arc::clone(&proxy), config.proxy.poll_interval());
//! poller.start()?;
//!
//! let status = proxy.get_result(OperationKind::ControllerStatus, "lab");
//! println!("{:?} after {:?}", status.state, status.response_time);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - **[`config`]**: TOML configuration with environment and CLI overrides
//! - **[`observability`]**: logging setup and per-crate debug flags
//! - **[`thrift`]**: compact protocol, envelope and controller/aggregator schemas
//! - **[`transports`]**: per-request DEALER sessions and the in-memory transport
//! - **[`proxy`]**: operation registry, correlator, fleet fan-out and poller
//!
//! ## Feature Flags
//!
//! - **`zmq-client`** (default): the ZMQ DEALER transport and
//!   [`proxy::NmsProxy::connect_zmq`]

pub use nms_config as config;
pub use nms_observability as observability;
pub use nms_proxy as proxy;
pub use nms_thrift as thrift;
pub use nms_transports as transports;

/// Prelude with the types most callers need
pub mod prelude {
    pub use crate::config::{NmsConfig, TopologyConfig};
    pub use crate::proxy::prelude::*;
    pub use crate::proxy::{LivenessSummary, Payload};
    pub use crate::thrift::Envelope;
}
