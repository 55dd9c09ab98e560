// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Controller message types and status dump

use super::topology::NodeStatusType;
use crate::compact::{CompactReader, CompactWriter, FieldType, ThriftStruct};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

thrift_enum! {
    /// Envelope message types understood by the controller apps
    pub enum ControllerMessageType {
        GetStatusDump = 101,
        StatusDump = 121,
        GetTopology = 301,
        Topology = 321,
    }
}

/// Last report a node sent to its controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub time_stamp: i64,
    pub ipv6_address: String,
    pub version: String,
    pub uboot_version: String,
    pub status: NodeStatusType,
    pub config_md5: String,
    pub node_is_primary: Option<bool>,
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            time_stamp: 0,
            ipv6_address: String::new(),
            version: String::new(),
            uboot_version: String::new(),
            status: NodeStatusType::Offline,
            config_md5: String::new(),
            node_is_primary: None,
        }
    }
}

impl ThriftStruct for StatusReport {
    const NAME: &'static str = "StatusReport";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_i64_field(1, self.time_stamp);
        out.write_string_field(2, &self.ipv6_address);
        out.write_string_field(3, &self.version);
        out.write_string_field(4, &self.uboot_version);
        out.write_i32_field(5, self.status.as_i32());
        out.write_string_field(7, &self.config_md5);
        if let Some(primary) = self.node_is_primary {
            out.write_bool_field(8, primary);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::I64) => value.time_stamp = input.read_i64()?,
                (2, FieldType::Binary) => value.ipv6_address = input.read_string()?,
                (3, FieldType::Binary) => value.version = input.read_string()?,
                (4, FieldType::Binary) => value.uboot_version = input.read_string()?,
                (5, FieldType::I32) => value.status = input.read_i32()?.into(),
                (7, FieldType::Binary) => value.config_md5 = input.read_string()?,
                (8, FieldType::Bool) => value.node_is_primary = Some(input.read_bool()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

/// Controller-wide status, keyed by node MAC address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDump {
    pub time_stamp: i64,
    pub status_reports: BTreeMap<String, StatusReport>,
    pub version: Option<String>,
}

impl ThriftStruct for StatusDump {
    const NAME: &'static str = "StatusDump";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_i64_field(1, self.time_stamp);
        out.write_string_map_field(2, FieldType::Struct, &self.status_reports, |out, report| {
            report.write(out)
        });
        if let Some(version) = &self.version {
            out.write_string_field(3, version);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::I64) => value.time_stamp = input.read_i64()?,
                (2, FieldType::Map) => {
                    value.status_reports =
                        input.read_string_map(FieldType::Struct, StatusReport::read)?
                }
                (3, FieldType::Binary) => value.version = Some(input.read_string()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::{deserialize, serialize};

    #[test]
    fn test_status_dump_round_trip() {
        let mut dump = StatusDump {
            time_stamp: 1_508_000_000,
            version: Some("RELEASE_M16".into()),
            ..StatusDump::default()
        };
        dump.status_reports.insert(
            "00:00:00:10:0d:40".into(),
            StatusReport {
                time_stamp: 1_508_000_001,
                ipv6_address: "2001:db8::1".into(),
                version: "RELEASE_M16".into(),
                status: NodeStatusType::Online,
                node_is_primary: Some(true),
                ..StatusReport::default()
            },
        );
        dump.status_reports
            .insert("00:00:00:10:0d:41".into(), StatusReport::default());

        let decoded: StatusDump = deserialize(&serialize(&dump)).unwrap();
        assert_eq!(decoded, dump);
    }

    #[test]
    fn test_empty_status_dump_round_trip() {
        let decoded: StatusDump = deserialize(&serialize(&StatusDump::default())).unwrap();
        assert_eq!(decoded, StatusDump::default());
    }

    #[test]
    fn test_status_report_json_uses_camel_case() {
        let json = serde_json::to_value(StatusReport::default()).unwrap();
        assert!(json.get("ipv6Address").is_some());
        assert_eq!(json["status"], serde_json::json!(1));
    }

    #[test]
    fn test_message_type_codes() {
        assert_eq!(i32::from(ControllerMessageType::GetTopology), 301);
        assert_eq!(ControllerMessageType::from(121), ControllerMessageType::StatusDump);
    }
}
