// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nms-proxy
//!
//! Bounded-time RPC from the NMS to the controllers and aggregators of every
//! managed network.
//!
//! ## Components
//!
//! - **[`registry`]**: the fixed operation table (destination app, identity,
//!   message types, deadline)
//! - **[`correlator`]**: one request, one session, one deadline, one outcome
//! - **[`multiplexer`]**: one operation fanned out to the whole fleet
//! - **[`results`]**: per-target slots read by the web layer
//! - **[`proxy`]**: the [`NmsProxy`] facade, single-target alert calls and
//!   reconfiguration
//! - **[`poller`]**: the periodic refresh
//!
//! ## Example
//!
//! ```no_run
//! use nms_proxy::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(config: nms_config::NmsConfig) -> nms_proxy::Result<()> {
//! let proxy = Arc::new(NmsProxy::connect_zmq(&config)?);
//! let mut poller = Poller::new(Arc::clone(&proxy), config.proxy.poll_interval());
//! poller.start()?;
//!
//! // later, from a request handler
//! let topology = proxy.get_result(OperationKind::Topology, "lab");
//! let online = proxy.is_live(ServiceKind::Controller, "lab");
//! # let _ = (topology, online);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod correlator;
pub mod error;
pub mod multiplexer;
pub mod payload;
pub mod poller;
pub mod proxy;
pub mod registry;
pub mod results;
pub mod target;

pub use correlator::{Outcome, PendingRequest};
pub use error::{ProxyError, Result};
pub use multiplexer::{Dispatch, FleetMultiplexer};
pub use payload::Payload;
pub use poller::Poller;
pub use proxy::{ConfigProvider, LivenessSummary, NmsProxy};
pub use registry::{Operation, OperationKind, OperationRegistry};
pub use results::{RequestState, ResultSlot, ResultsCollection, SlotEntry};
pub use target::{ServiceKind, Target, TargetSpec};

pub mod prelude {
    pub use crate::alerts::AlertRow;
    pub use crate::error::{ProxyError, Result};
    pub use crate::poller::Poller;
    pub use crate::proxy::{ConfigProvider, NmsProxy};
    pub use crate::registry::OperationKind;
    pub use crate::results::{RequestState, SlotEntry};
    pub use crate::target::{ServiceKind, TargetSpec};
}
