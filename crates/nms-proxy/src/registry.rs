// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Operation registry
//!
//! Fixed table of the RPCs the proxy knows how to make: which app on the
//! remote broker handles it, which identity the request carries, the
//! request/reply message types and the reply deadline. Only the deadlines
//! come from configuration.

use crate::payload::Payload;
use crate::target::ServiceKind;
use nms_config::TimeoutsConfig;
use nms_thrift::schema::aggregator::{
    AggrAlertConfList, AggrMessageType, AggrSetAlertsConfigResp, AggrStatusDump,
};
use nms_thrift::schema::controller::{ControllerMessageType, StatusDump};
use nms_thrift::schema::topology::Topology;
use nms_thrift::{Envelope, ProtocolError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Topology,
    ControllerStatus,
    AggregatorStatus,
    GetAlertsConfig,
    SetAlertsConfig,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Topology,
        OperationKind::ControllerStatus,
        OperationKind::AggregatorStatus,
        OperationKind::GetAlertsConfig,
        OperationKind::SetAlertsConfig,
    ];

    /// Operations refreshed by the periodic poller
    pub const POLLED: [OperationKind; 3] = [
        OperationKind::Topology,
        OperationKind::ControllerStatus,
        OperationKind::AggregatorStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Topology => "topology",
            OperationKind::ControllerStatus => "controller_status",
            OperationKind::AggregatorStatus => "aggregator_status",
            OperationKind::GetAlertsConfig => "get_alerts_config",
            OperationKind::SetAlertsConfig => "set_alerts_config",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub service: ServiceKind,
    /// Routing id of the app behind the remote ROUTER
    pub destination: &'static str,
    pub caller_identity: &'static str,
    pub request_type: i32,
    /// Expected reply type; `None` accepts whatever type the remote answers with
    pub reply_type: Option<i32>,
    pub timeout: Duration,
}

impl Operation {
    /// Request without arguments (the NUL sentinel body)
    pub fn empty_request(&self) -> Envelope {
        Envelope::empty_body(self.request_type)
    }

    /// Check the reply type, when the operation has one, and decode the nested body
    pub fn decode_reply(&self, reply: &Envelope) -> Result<Payload, ProtocolError> {
        if let Some(expected) = self.reply_type {
            reply.expect_type(expected)?;
        }
        let payload = match self.kind {
            OperationKind::Topology => Payload::Topology(reply.decode_payload::<Topology>()?),
            OperationKind::ControllerStatus => {
                Payload::ControllerStatus(reply.decode_payload::<StatusDump>()?)
            }
            OperationKind::AggregatorStatus => {
                Payload::AggregatorStatus(reply.decode_payload::<AggrStatusDump>()?)
            }
            OperationKind::GetAlertsConfig => {
                Payload::AlertsConfig(reply.decode_payload::<AggrAlertConfList>()?)
            }
            OperationKind::SetAlertsConfig => {
                Payload::SetAlertsConfigResp(reply.decode_payload::<AggrSetAlertsConfigResp>()?)
            }
        };
        Ok(payload)
    }
}

/// All operations, indexed by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRegistry {
    operations: [Operation; 5],
}

impl OperationRegistry {
    pub fn new(timeouts: &TimeoutsConfig) -> Self {
        let millis = Duration::from_millis;
        Self {
            operations: [
                Operation {
                    kind: OperationKind::Topology,
                    service: ServiceKind::Controller,
                    destination: "ctrl-app-TOPOLOGY_APP",
                    caller_identity: "NMS_WEB_TOPO_REFRESH",
                    request_type: ControllerMessageType::GetTopology.into(),
                    reply_type: Some(ControllerMessageType::Topology.into()),
                    timeout: millis(timeouts.topology_ms),
                },
                Operation {
                    kind: OperationKind::ControllerStatus,
                    service: ServiceKind::Controller,
                    destination: "ctrl-app-STATUS_APP",
                    caller_identity: "NMS_WEB_STATUS_REFRESH",
                    request_type: ControllerMessageType::GetStatusDump.into(),
                    reply_type: Some(ControllerMessageType::StatusDump.into()),
                    timeout: millis(timeouts.controller_status_ms),
                },
                Operation {
                    kind: OperationKind::AggregatorStatus,
                    service: ServiceKind::Aggregator,
                    destination: "aggr-app-STATUS_APP",
                    caller_identity: "NMS_WEB_AGGR_STATUS_REFRESH",
                    request_type: AggrMessageType::GetStatusDump.into(),
                    reply_type: Some(AggrMessageType::StatusDump.into()),
                    timeout: millis(timeouts.aggregator_status_ms),
                },
                Operation {
                    kind: OperationKind::GetAlertsConfig,
                    service: ServiceKind::Aggregator,
                    destination: "aggr-app-STATS_APP",
                    caller_identity: "NMS_WEB_ALERTS",
                    request_type: AggrMessageType::GetAlertsConfig.into(),
                    reply_type: Some(AggrMessageType::GetAlertsConfigResp.into()),
                    timeout: millis(timeouts.alerts_ms),
                },
                Operation {
                    kind: OperationKind::SetAlertsConfig,
                    service: ServiceKind::Aggregator,
                    destination: "aggr-app-STATS_APP",
                    caller_identity: "NMS_WEB_ALERTS",
                    request_type: AggrMessageType::SetAlertsConfig.into(),
                    // the stats app answers alert writes without a fixed type
                    reply_type: None,
                    timeout: millis(timeouts.alerts_ms),
                },
            ],
        }
    }

    pub fn get(&self, kind: OperationKind) -> &Operation {
        &self.operations[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new(&TimeoutsConfig::default())
    }
}
