// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network topology as reported by a controller

use crate::compact::{CompactReader, CompactWriter, FieldType, ThriftStruct};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Location accuracy reported when a site was never surveyed (metres)
pub const UNKNOWN_ACCURACY: f64 = 40_000_000.0;

thrift_enum! {
    pub enum NodeType {
        Cn = 1,
        Dn = 2,
    }
}

thrift_enum! {
    pub enum PolarityType {
        Odd = 1,
        Even = 2,
    }
}

thrift_enum! {
    pub enum LinkType {
        Wireless = 1,
        Ethernet = 2,
    }
}

thrift_enum! {
    pub enum NodeStatusType {
        Offline = 1,
        Online = 2,
        OnlineInitiator = 3,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolayIdx {
    pub tx_golay_idx: i64,
    pub rx_golay_idx: i64,
}

impl ThriftStruct for GolayIdx {
    const NAME: &'static str = "GolayIdx";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_i64_field(1, self.tx_golay_idx);
        out.write_i64_field(2, self.rx_golay_idx);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::I64) => value.tx_golay_idx = input.read_i64()?,
                (2, FieldType::I64) => value.rx_golay_idx = input.read_i64()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            accuracy: UNKNOWN_ACCURACY,
        }
    }
}

impl ThriftStruct for Location {
    const NAME: &'static str = "Location";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_double_field(2, self.latitude);
        out.write_double_field(3, self.longitude);
        out.write_double_field(4, self.altitude);
        out.write_double_field(5, self.accuracy);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (2, FieldType::Double) => value.latitude = input.read_double()?,
                (3, FieldType::Double) => value.longitude = input.read_double()?,
                (4, FieldType::Double) => value.altitude = input.read_double()?,
                (5, FieldType::Double) => value.accuracy = input.read_double()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub location: Location,
}

impl ThriftStruct for Site {
    const NAME: &'static str = "Site";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.name);
        out.write_struct_field(2, &self.location);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.name = input.read_string()?,
                (2, FieldType::Struct) => value.location = Location::read(input)?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub node_type: NodeType,
    pub is_primary: bool,
    pub mac_addr: String,
    pub pop_node: bool,
    pub polarity: Option<PolarityType>,
    pub golay_idx: Option<GolayIdx>,
    pub status: NodeStatusType,
    pub site_name: String,
    pub ant_azimuth: f64,
    pub ant_elevation: f64,
    pub has_cpe: Option<bool>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            node_type: NodeType::Dn,
            is_primary: false,
            mac_addr: String::new(),
            pop_node: false,
            polarity: None,
            golay_idx: None,
            status: NodeStatusType::Offline,
            site_name: String::new(),
            ant_azimuth: 0.0,
            ant_elevation: 0.0,
            has_cpe: None,
        }
    }
}

impl ThriftStruct for Node {
    const NAME: &'static str = "Node";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.name);
        out.write_i32_field(2, self.node_type.as_i32());
        out.write_bool_field(3, self.is_primary);
        out.write_string_field(4, &self.mac_addr);
        out.write_bool_field(5, self.pop_node);
        if let Some(polarity) = self.polarity {
            out.write_i32_field(7, polarity.as_i32());
        }
        if let Some(golay_idx) = &self.golay_idx {
            out.write_struct_field(8, golay_idx);
        }
        out.write_i32_field(9, self.status.as_i32());
        out.write_string_field(100, &self.site_name);
        out.write_double_field(101, self.ant_azimuth);
        out.write_double_field(102, self.ant_elevation);
        if let Some(has_cpe) = self.has_cpe {
            out.write_bool_field(103, has_cpe);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.name = input.read_string()?,
                (2, FieldType::I32) => value.node_type = input.read_i32()?.into(),
                (3, FieldType::Bool) => value.is_primary = input.read_bool()?,
                (4, FieldType::Binary) => value.mac_addr = input.read_string()?,
                (5, FieldType::Bool) => value.pop_node = input.read_bool()?,
                (7, FieldType::I32) => value.polarity = Some(input.read_i32()?.into()),
                (8, FieldType::Struct) => value.golay_idx = Some(GolayIdx::read(input)?),
                (9, FieldType::I32) => value.status = input.read_i32()?.into(),
                (100, FieldType::Binary) => value.site_name = input.read_string()?,
                (101, FieldType::Double) => value.ant_azimuth = input.read_double()?,
                (102, FieldType::Double) => value.ant_elevation = input.read_double()?,
                (103, FieldType::Bool) => value.has_cpe = Some(input.read_bool()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub a_node_name: String,
    pub z_node_name: String,
    pub link_type: LinkType,
    pub is_alive: bool,
    pub linkup_attempts: i64,
    pub golay_idx: Option<GolayIdx>,
    pub control_superframe: Option<i64>,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            name: String::new(),
            a_node_name: String::new(),
            z_node_name: String::new(),
            link_type: LinkType::Wireless,
            is_alive: false,
            linkup_attempts: 0,
            golay_idx: None,
            control_superframe: None,
        }
    }
}

impl ThriftStruct for Link {
    const NAME: &'static str = "Link";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.name);
        out.write_string_field(2, &self.a_node_name);
        out.write_string_field(3, &self.z_node_name);
        out.write_i32_field(4, self.link_type.as_i32());
        out.write_bool_field(5, self.is_alive);
        out.write_i64_field(6, self.linkup_attempts);
        if let Some(golay_idx) = &self.golay_idx {
            out.write_struct_field(7, golay_idx);
        }
        if let Some(superframe) = self.control_superframe {
            out.write_i64_field(8, superframe);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.name = input.read_string()?,
                (2, FieldType::Binary) => value.a_node_name = input.read_string()?,
                (3, FieldType::Binary) => value.z_node_name = input.read_string()?,
                (4, FieldType::I32) => value.link_type = input.read_i32()?.into(),
                (5, FieldType::Bool) => value.is_alive = input.read_bool()?,
                (6, FieldType::I64) => value.linkup_attempts = input.read_i64()?,
                (7, FieldType::Struct) => value.golay_idx = Some(GolayIdx::read(input)?),
                (8, FieldType::I64) => value.control_superframe = Some(input.read_i64()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub name: String,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub sites: Vec<Site>,
}

impl Topology {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Nodes currently reporting an online status
    pub fn online_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| {
            matches!(
                node.status,
                NodeStatusType::Online | NodeStatusType::OnlineInitiator
            )
        })
    }
}

impl ThriftStruct for Topology {
    const NAME: &'static str = "Topology";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_string_field(1, &self.name);
        out.write_struct_list_field(2, &self.nodes);
        out.write_struct_list_field(3, &self.links);
        out.write_struct_list_field(4, &self.sites);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.name = input.read_string()?,
                (2, FieldType::List) => value.nodes = input.read_struct_list()?,
                (3, FieldType::List) => value.links = input.read_struct_list()?,
                (4, FieldType::List) => value.sites = input.read_struct_list()?,
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

    fn sample_topology() -> Topology {
        Topology {
            name: "lab".into(),
            nodes: vec![
                Node {
                    name: "pop".into(),
                    node_type: NodeType::Dn,
                    is_primary: true,
                    mac_addr: "00:00:00:10:0d:40".into(),
                    pop_node: true,
                    polarity: Some(PolarityType::Odd),
                    golay_idx: Some(GolayIdx {
                        tx_golay_idx: 2,
                        rx_golay_idx: 2,
                    }),
                    status: NodeStatusType::OnlineInitiator,
                    site_name: "roof".into(),
                    ant_azimuth: 123.5,
                    ant_elevation: -1.25,
                    has_cpe: Some(false),
                },
                Node {
                    name: "cn".into(),
                    node_type: NodeType::Cn,
                    site_name: "street".into(),
                    ..Node::default()
                },
            ],
            links: vec![Link {
                name: "link-pop-cn".into(),
                a_node_name: "pop".into(),
                z_node_name: "cn".into(),
                is_alive: true,
                linkup_attempts: 17,
                control_superframe: Some(1),
                ..Link::default()
            }],
            sites: vec![Site {
                name: "roof".into(),
                location: Location {
                    latitude: 37.48,
                    longitude: -122.15,
                    altitude: 30.0,
                    accuracy: 5.0,
                },
            }],
        }
    }

    #[test]
    fn test_topology_round_trip() {
        let topology = sample_topology();
        let decoded: Topology = deserialize(&serialize(&topology)).unwrap();
        assert_eq!(decoded, topology);
        assert_eq!(decoded.online_nodes().count(), 1);
        assert_eq!(decoded.node("cn").unwrap().node_type, NodeType::Cn);
    }

    #[test]
    fn test_empty_topology_round_trip() {
        let decoded: Topology = deserialize(&serialize(&Topology::default())).unwrap();
        assert_eq!(decoded, Topology::default());
    }

    #[test]
    fn test_location_defaults_to_unknown_accuracy() {
        // Site with name only
        let mut out = CompactWriter::new();
        out.write_struct_begin();
        out.write_string_field(1, "bare");
        out.write_struct_end();
        let site: Site = deserialize(&out.into_bytes()).unwrap();
        assert_eq!(site.location.accuracy, UNKNOWN_ACCURACY);
    }

    #[test]
    fn test_unknown_enum_values_preserved() {
        let node = Node {
            node_type: NodeType::from(9),
            ..Node::default()
        };
        let decoded: Node = deserialize(&serialize(&node)).unwrap();
        assert_eq!(decoded.node_type, NodeType::Unknown(9));
        assert_eq!(decoded.node_type.name(), None);
        assert_eq!(NodeType::Cn.name(), Some("Cn"));
    }

    #[test]
    fn test_enums_serialize_as_numbers() {
        let json = serde_json::to_value(NodeStatusType::Online).unwrap();
        assert_eq!(json, serde_json::json!(2));
    }
}
