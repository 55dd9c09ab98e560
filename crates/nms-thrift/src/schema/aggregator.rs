// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Aggregator message types, status dump, stats and alert configuration

use super::network::UnicastRoute;
use crate::compact::{CompactReader, CompactWriter, FieldType, ThriftStruct};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

thrift_enum! {
    /// Envelope message types understood by the aggregator apps
    pub enum AggrMessageType {
        GetStatusDump = 101,
        GetRoutingAdj = 102,
        StatusDump = 201,
        RoutingAdj = 202,
        StatusReport = 401,
        StatsReport = 402,
        GetAlertsConfig = 501,
        GetAlertsConfigResp = 502,
        SetAlertsConfig = 503,
        SetAlertsConfigResp = 504,
        Ack = 601,
    }
}

thrift_enum! {
    pub enum AggrAlertComparator {
        Gt = 0,
        Gte = 1,
        Lt = 2,
        Lte = 3,
    }
}

thrift_enum! {
    pub enum AggrAlertLevel {
        Info = 0,
        Warning = 1,
        Critical = 2,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggrStatusReport {
    pub time_stamp: i64,
    pub ipv6_address: String,
    pub routes: Vec<UnicastRoute>,
}

impl ThriftStruct for AggrStatusReport {
    const NAME: &'static str = "AggrStatusReport";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_i64_field(1, self.time_stamp);
        out.write_string_field(2, &self.ipv6_address);
        out.write_struct_list_field(3, &self.routes);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::I64) => value.time_stamp = input.read_i64()?,
                (2, FieldType::Binary) => value.ipv6_address = input.read_string()?,
                (3, FieldType::List) => value.routes = input.read_struct_list()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

/// Aggregator view of the network, keyed by node MAC address
///
/// Field 1 (the routing adjacency map) is not modelled and is skipped when
/// decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggrStatusDump {
    pub status_reports: BTreeMap<String, AggrStatusReport>,
}

impl ThriftStruct for AggrStatusDump {
    const NAME: &'static str = "AggrStatusDump";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_map_field(2, FieldType::Struct, &self.status_reports, |out, report| {
            report.write(out)
        });
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (2, FieldType::Map) => {
                    value.status_reports =
                        input.read_string_map(FieldType::Struct, AggrStatusReport::read)?
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggrStat {
    pub key: String,
    pub timestamp: i64,
    pub value: f64,
}

impl ThriftStruct for AggrStat {
    const NAME: &'static str = "AggrStat";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.key);
        out.write_i64_field(2, self.timestamp);
        out.write_double_field(3, self.value);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.key = input.read_string()?,
                (2, FieldType::I64) => value.timestamp = input.read_i64()?,
                (3, FieldType::Double) => value.value = input.read_double()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggrStatsReport {
    pub stats: Vec<AggrStat>,
}

impl ThriftStruct for AggrStatsReport {
    const NAME: &'static str = "AggrStatsReport";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_struct_list_field(1, &self.stats);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            if (field.id, field.field_type) != (1, FieldType::List) {
                return Ok(false);
            }
            value.stats = input.read_struct_list()?;
            Ok(true)
        })?;
        Ok(value)
    }
}

/// One threshold alert rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggrAlertConf {
    pub id: String,
    pub key: String,
    pub threshold: f64,
    pub comp: AggrAlertComparator,
    pub level: AggrAlertLevel,
    pub node_mac: Option<String>,
}

impl Default for AggrAlertConf {
    fn default() -> Self {
        Self {
            id: String::new(),
            key: String::new(),
            threshold: 0.0,
            comp: AggrAlertComparator::Gt,
            level: AggrAlertLevel::Info,
            node_mac: None,
        }
    }
}

impl ThriftStruct for AggrAlertConf {
    const NAME: &'static str = "AggrAlertConf";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.id);
        out.write_string_field(2, &self.key);
        out.write_double_field(3, self.threshold);
        out.write_i32_field(4, self.comp.as_i32());
        out.write_i32_field(5, self.level.as_i32());
        if let Some(node_mac) = &self.node_mac {
            out.write_string_field(6, node_mac);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.id = input.read_string()?,
                (2, FieldType::Binary) => value.key = input.read_string()?,
                (3, FieldType::Double) => value.threshold = input.read_double()?,
                (4, FieldType::I32) => value.comp = input.read_i32()?.into(),
                (5, FieldType::I32) => value.level = input.read_i32()?.into(),
                (6, FieldType::Binary) => value.node_mac = Some(input.read_string()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggrAlertConfList {
    pub alerts: Vec<AggrAlertConf>,
}

impl ThriftStruct for AggrAlertConfList {
    const NAME: &'static str = "AggrAlertConfList";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_struct_list_field(1, &self.alerts);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            if (field.id, field.field_type) != (1, FieldType::List) {
                return Ok(false);
            }
            value.alerts = input.read_struct_list()?;
            Ok(true)
        })?;
        Ok(value)
    }
}

/// Acknowledgement of a configuration write
/// Outcome of an alert-configuration write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggrSetAlertsConfigResp {
    pub success: bool,
}

impl ThriftStruct for AggrSetAlertsConfigResp {
    const NAME: &'static str = "AggrSetAlertsConfigResp";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_bool_field(1, self.success);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            if (field.id, field.field_type) != (1, FieldType::Bool) {
                return Ok(false);
            }
            value.success = input.read_bool()?;
            Ok(true)
        })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::{deserialize, serialize};
    use crate::schema::network::{BinaryAddress, IpPrefix};

    #[test]
    fn test_aggr_status_dump_round_trip() {
        let route = UnicastRoute {
            dest: IpPrefix {
                prefix_address: BinaryAddress {
                    addr: vec![0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                    port: None,
                    if_name: None,
                },
                prefix_length: 64,
            },
            nexthops: vec![BinaryAddress {
                addr: vec![0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                port: Some(0),
                if_name: Some("terra0".into()),
            }],
        };
        let mut dump = AggrStatusDump::default();
        dump.status_reports.insert(
            "00:00:00:10:0d:40".into(),
            AggrStatusReport {
                time_stamp: 42,
                ipv6_address: "2001:db8::1".into(),
                routes: vec![route],
            },
        );

        let decoded: AggrStatusDump = deserialize(&serialize(&dump)).unwrap();
        assert_eq!(decoded, dump);
    }

    #[test]
    fn test_adjacency_map_is_skipped() {
        let mut out = CompactWriter::new();
        out.write_struct_begin();
        let mut adjacency = BTreeMap::new();
        adjacency.insert("node".to_string(), "opaque".to_string());
        out.write_string_map_field(1, FieldType::Binary, &adjacency, |out, v| {
            out.write_string(v)
        });
        out.write_string_map_field(2, FieldType::Struct, &BTreeMap::<String, AggrStatusReport>::new(), |out, r| {
            r.write(out)
        });
        out.write_struct_end();

        let decoded: AggrStatusDump = deserialize(&out.into_bytes()).unwrap();
        assert!(decoded.status_reports.is_empty());
    }

    #[test]
    fn test_alert_list_round_trip() {
        let list = AggrAlertConfList {
            alerts: vec![
                AggrAlertConf {
                    id: "a1".into(),
                    key: "snr".into(),
                    threshold: 12.5,
                    comp: AggrAlertComparator::Lt,
                    level: AggrAlertLevel::Critical,
                    node_mac: Some("00:00:00:10:0d:40".into()),
                },
                AggrAlertConf::default(),
            ],
        };
        let decoded: AggrAlertConfList = deserialize(&serialize(&list)).unwrap();
        assert_eq!(decoded, list);

        let empty: AggrAlertConfList = deserialize(&serialize(&AggrAlertConfList::default())).unwrap();
        assert!(empty.alerts.is_empty());
    }

    #[test]
    fn test_set_alerts_resp_round_trip() {
        let resp = AggrSetAlertsConfigResp { success: true };
        assert_eq!(serialize(&resp), vec![0x11, 0x00]);
        assert_eq!(deserialize::<AggrSetAlertsConfigResp>(&serialize(&resp)).unwrap(), resp);
        assert_eq!(i32::from(AggrMessageType::SetAlertsConfigResp), 504);
    }

    #[test]
    fn test_set_alerts_resp_ignores_extra_fields() {
        let mut out = CompactWriter::new();
        out.write_struct_begin();
        out.write_bool_field(1, true);
        out.write_string_field(2, "saved");
        out.write_struct_end();
        let resp: AggrSetAlertsConfigResp = deserialize(&out.into_bytes()).unwrap();
        assert!(resp.success);
    }

    #[test]
    fn test_stats_report_round_trip() {
        let report = AggrStatsReport {
            stats: vec![AggrStat {
                key: "tgf.00:00:00:10:0d:40.phystatus.ssnrEst".into(),
                timestamp: 1_508_000_000,
                value: 17.0,
            }],
        };
        assert_eq!(deserialize::<AggrStatsReport>(&serialize(&report)).unwrap(), report);
    }
}
