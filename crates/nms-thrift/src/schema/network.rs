// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routing primitives shared by aggregator status reports

use crate::compact::{CompactReader, CompactWriter, FieldType, ThriftStruct};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAddress {
    /// Raw address bytes (4 or 16)
    pub addr: Vec<u8>,
    pub port: Option<i64>,
    pub if_name: Option<String>,
}

impl ThriftStruct for BinaryAddress {
    const NAME: &'static str = "BinaryAddress";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_binary_field(1, &self.addr);
        if let Some(port) = self.port {
            out.write_i64_field(2, port);
        }
        if let Some(if_name) = &self.if_name {
            out.write_string_field(3, if_name);
        }
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Binary) => value.addr = input.read_binary()?.to_vec(),
                (2, FieldType::I64) => value.port = Some(input.read_i64()?),
                (3, FieldType::Binary) => value.if_name = Some(input.read_string()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPrefix {
    pub prefix_address: BinaryAddress,
    pub prefix_length: i16,
}

impl ThriftStruct for IpPrefix {
    const NAME: &'static str = "IpPrefix";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_struct_field(1, &self.prefix_address);
        out.write_i16_field(2, self.prefix_length);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Struct) => value.prefix_address = BinaryAddress::read(input)?,
                (2, FieldType::I16) => value.prefix_length = input.read_i16()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicastRoute {
    pub dest: IpPrefix,
    pub nexthops: Vec<BinaryAddress>,
}

impl ThriftStruct for UnicastRoute {
    const NAME: &'static str = "UnicastRoute";

    fn write(&self, out: &mut CompactWriter) {
        out.write_struct_begin();
        out.write_struct_field(1, &self.dest);
        out.write_struct_list_field(2, &self.nexthops);
        out.write_struct_end();
    }

    fn read(input: &mut CompactReader<'_>) -> Result<Self> {
        let mut value = Self::default();
        input.read_struct(|input, field| {
            match (field.id, field.field_type) {
                (1, FieldType::Struct) => value.dest = IpPrefix::read(input)?,
                (2, FieldType::List) => value.nexthops = input.read_struct_list()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(value)
    }
}
