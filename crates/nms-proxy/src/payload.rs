// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Decoded reply bodies

use nms_thrift::schema::aggregator::{AggrAlertConfList, AggrSetAlertsConfigResp, AggrStatusDump};
use nms_thrift::schema::controller::StatusDump;
use nms_thrift::schema::topology::Topology;
use serde::Serialize;

/// Body of a successful reply, one variant per operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Topology(Topology),
    ControllerStatus(StatusDump),
    AggregatorStatus(AggrStatusDump),
    AlertsConfig(AggrAlertConfList),
    SetAlertsConfigResp(AggrSetAlertsConfigResp),
}

impl Payload {
    pub fn as_topology(&self) -> Option<&Topology> {
        match self {
            Payload::Topology(topology) => Some(topology),
            _ => None,
        }
    }

    pub fn as_controller_status(&self) -> Option<&StatusDump> {
        match self {
            Payload::ControllerStatus(dump) => Some(dump),
            _ => None,
        }
    }

    pub fn as_aggregator_status(&self) -> Option<&AggrStatusDump> {
        match self {
            Payload::AggregatorStatus(dump) => Some(dump),
            _ => None,
        }
    }

    pub fn into_alerts_config(self) -> Option<AggrAlertConfList> {
        match self {
            Payload::AlertsConfig(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_set_alerts_resp(self) -> Option<AggrSetAlertsConfigResp> {
        match self {
            Payload::SetAlertsConfigResp(resp) => Some(resp),
            _ => None,
        }
    }
}
