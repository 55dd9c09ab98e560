// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thrift compact protocol
//!
//! Byte-exact implementation of the compact encoding spoken by controllers and
//! aggregators:
//! - field headers carry a 4-bit id delta and the type nibble, falling back to
//!   a zigzag varint id when the delta does not fit
//! - booleans in field position are folded into the type nibble
//! - integers are zigzag varints, doubles are 8 bytes little-endian
//! - list headers pack sizes below 15 into the high nibble
//!
//! The reader never panics on arbitrary input. Lengths and element counts are
//! checked against the remaining bytes before anything is allocated, nesting
//! is capped at [`MAX_NESTING_DEPTH`], and the memory taken by decoded
//! container elements is bounded by a budget proportional to the input size.

use crate::error::{ProtocolError, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::collections::BTreeMap;

/// Deepest struct/container nesting the reader accepts
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decoded container memory allowed per input byte
pub const MAX_DECODE_EXPANSION: usize = 16;

/// Decoded container memory allowed regardless of input size
pub const MIN_DECODE_BUDGET: usize = 64 * 1024;

/// Elements reserved up front for a list; larger lists grow as they decode
const MAX_LIST_PREALLOCATION: usize = 1024;

/// Thrift value types as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Stop,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl FieldType {
    fn compact_code(self) -> u8 {
        match self {
            FieldType::Stop => 0x00,
            FieldType::Bool => 0x01,
            FieldType::Byte => 0x03,
            FieldType::I16 => 0x04,
            FieldType::I32 => 0x05,
            FieldType::I64 => 0x06,
            FieldType::Double => 0x07,
            FieldType::Binary => 0x08,
            FieldType::List => 0x09,
            FieldType::Set => 0x0a,
            FieldType::Map => 0x0b,
            FieldType::Struct => 0x0c,
        }
    }

    fn from_compact(code: u8, offset: usize) -> Result<Self> {
        match code {
            0x00 => Ok(FieldType::Stop),
            // 0x01 = true, 0x02 = false
            0x01 | 0x02 => Ok(FieldType::Bool),
            0x03 => Ok(FieldType::Byte),
            0x04 => Ok(FieldType::I16),
            0x05 => Ok(FieldType::I32),
            0x06 => Ok(FieldType::I64),
            0x07 => Ok(FieldType::Double),
            0x08 => Ok(FieldType::Binary),
            0x09 => Ok(FieldType::List),
            0x0a => Ok(FieldType::Set),
            0x0b => Ok(FieldType::Map),
            0x0c => Ok(FieldType::Struct),
            code => Err(ProtocolError::InvalidType { offset, code }),
        }
    }
}

/// Decoded field header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub id: i16,
    pub field_type: FieldType,
}

impl FieldHeader {
    pub fn is_stop(&self) -> bool {
        self.field_type == FieldType::Stop
    }
}

/// A struct that can be written to and read from the compact protocol
pub trait ThriftStruct: Sized {
    /// Struct name, used in diagnostics
    const NAME: &'static str;

    fn write(&self, out: &mut CompactWriter);

    fn read(input: &mut CompactReader<'_>) -> Result<Self>;
}

/// Serialize a struct into bare compact bytes (no frame header)
pub fn serialize<T: ThriftStruct>(value: &T) -> Vec<u8> {
    let mut out = CompactWriter::new();
    value.write(&mut out);
    out.into_bytes()
}

/// Deserialize a struct from bare compact bytes
///
/// Bytes after the struct's STOP marker are ignored, as thrift readers do.
pub fn deserialize<T: ThriftStruct>(bytes: &[u8]) -> Result<T> {
    T::read(&mut CompactReader::new(bytes))
}

fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn unzigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

fn unzigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

//region Writer

/// Compact protocol encoder writing into an owned buffer
#[derive(Debug, Default)]
pub struct CompactWriter {
    buf: Vec<u8>,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
}

impl CompactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    /// Write the STOP marker and restore the enclosing struct's field id
    pub fn write_struct_end(&mut self) {
        self.buf.push(FieldType::Stop.compact_code());
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    fn write_field_header(&mut self, code: u8, id: i16) {
        let delta = i32::from(id) - i32::from(self.last_field_id);
        if (1..=15).contains(&delta) {
            self.buf.push(((delta as u8) << 4) | code);
        } else {
            self.buf.push(code);
            self.write_i16(id);
        }
        self.last_field_id = id;
    }

    /// Begin a non-boolean field; booleans go through [`Self::write_bool_field`]
    pub fn write_field_begin(&mut self, field_type: FieldType, id: i16) {
        debug_assert!(!matches!(field_type, FieldType::Bool | FieldType::Stop));
        self.write_field_header(field_type.compact_code(), id);
    }

    pub fn write_bool_field(&mut self, id: i16, value: bool) {
        self.write_field_header(if value { 0x01 } else { 0x02 }, id);
    }

    /// Boolean in container position
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(if value { 0x01 } else { 0x02 });
    }

    pub fn write_byte(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_varint(u64::from(zigzag32(i32::from(value))));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_varint(u64::from(zigzag32(value)));
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_varint(zigzag64(value));
    }

    pub fn write_double(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_f64(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_binary(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_binary(value.as_bytes());
    }

    pub fn write_list_begin(&mut self, element: FieldType, size: usize) {
        if size < 15 {
            self.buf.push(((size as u8) << 4) | element.compact_code());
        } else {
            self.buf.push(0xf0 | element.compact_code());
            self.write_varint(size as u64);
        }
    }

    pub fn write_map_begin(&mut self, key: FieldType, value: FieldType, size: usize) {
        if size == 0 {
            self.buf.push(0);
        } else {
            self.write_varint(size as u64);
            self.buf
                .push((key.compact_code() << 4) | value.compact_code());
        }
    }

    fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_i16_field(&mut self, id: i16, value: i16) {
        self.write_field_begin(FieldType::I16, id);
        self.write_i16(value);
    }

    pub fn write_i32_field(&mut self, id: i16, value: i32) {
        self.write_field_begin(FieldType::I32, id);
        self.write_i32(value);
    }

    pub fn write_i64_field(&mut self, id: i16, value: i64) {
        self.write_field_begin(FieldType::I64, id);
        self.write_i64(value);
    }

    pub fn write_double_field(&mut self, id: i16, value: f64) {
        self.write_field_begin(FieldType::Double, id);
        self.write_double(value);
    }

    pub fn write_binary_field(&mut self, id: i16, value: &[u8]) {
        self.write_field_begin(FieldType::Binary, id);
        self.write_binary(value);
    }

    pub fn write_string_field(&mut self, id: i16, value: &str) {
        self.write_field_begin(FieldType::Binary, id);
        self.write_string(value);
    }

    pub fn write_struct_field<T: ThriftStruct>(&mut self, id: i16, value: &T) {
        self.write_field_begin(FieldType::Struct, id);
        value.write(self);
    }

    pub fn write_list_field<T>(
        &mut self,
        id: i16,
        element: FieldType,
        items: &[T],
        mut write_element: impl FnMut(&mut Self, &T),
    ) {
        self.write_field_begin(FieldType::List, id);
        self.write_list_begin(element, items.len());
        for item in items {
            write_element(self, item);
        }
    }

    pub fn write_struct_list_field<T: ThriftStruct>(&mut self, id: i16, items: &[T]) {
        self.write_list_field(id, FieldType::Struct, items, |out, item| item.write(out));
    }

    /// `map<string, V>` field
    pub fn write_string_map_field<V>(
        &mut self,
        id: i16,
        value_type: FieldType,
        map: &BTreeMap<String, V>,
        mut write_value: impl FnMut(&mut Self, &V),
    ) {
        self.write_field_begin(FieldType::Map, id);
        self.write_map_begin(FieldType::Binary, value_type, map.len());
        for (key, value) in map {
            self.write_string(key);
            write_value(self, value);
        }
    }
}

//endregion

//region Reader

/// Compact protocol decoder over a borrowed buffer
#[derive(Debug)]
pub struct CompactReader<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
    pending_bool: Option<bool>,
    depth: usize,
    budget: usize,
}

impl<'a> CompactReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_field_id: 0,
            field_id_stack: Vec::new(),
            pending_bool: None,
            depth: 0,
            budget: buf
                .len()
                .saturating_mul(MAX_DECODE_EXPANSION)
                .max(MIN_DECODE_BUDGET),
        }
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Container memory the reader may still hand out
    pub fn remaining_budget(&self) -> usize {
        self.budget
    }

    /// Charge `count` decoded elements of `T` against the budget
    fn charge<T>(&mut self, offset: usize, count: usize) -> Result<()> {
        let cost = count.saturating_mul(std::mem::size_of::<T>().max(1));
        if cost > self.budget {
            return Err(ProtocolError::InvalidLength {
                offset,
                length: count as u64,
                remaining: self.budget,
            });
        }
        self.budget -= cost;
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if remaining < count {
            return Err(ProtocolError::UnexpectedEof {
                offset: self.pos,
                needed: count - remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_varint(&mut self, bits: u32) -> Result<u64> {
        let start = self.pos;
        let max_bytes = (bits as usize + 6) / 7;
        let mut value = 0u64;
        for index in 0..max_bytes {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                if bits < 64 && value >> bits != 0 {
                    break;
                }
                return Ok(value);
            }
        }
        Err(ProtocolError::InvalidVarint {
            offset: start,
            bits,
        })
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ProtocolError::DepthLimitExceeded {
                offset: self.pos,
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn read_struct_begin(&mut self) -> Result<()> {
        self.enter()?;
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
        Ok(())
    }

    pub fn read_struct_end(&mut self) {
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
        self.leave();
    }

    /// Read one struct, handing each field to `on_field`
    ///
    /// `on_field` returns `Ok(false)` for fields it does not recognise (unknown
    /// id or unexpected type); those are skipped.
    pub fn read_struct(
        &mut self,
        mut on_field: impl FnMut(&mut Self, FieldHeader) -> Result<bool>,
    ) -> Result<()> {
        self.read_struct_begin()?;
        loop {
            let field = self.read_field_begin()?;
            if field.is_stop() {
                break;
            }
            if !on_field(self, field)? {
                self.skip(field.field_type)?;
            }
        }
        self.read_struct_end();
        Ok(())
    }

    pub fn read_field_begin(&mut self) -> Result<FieldHeader> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        if byte == 0 {
            return Ok(FieldHeader {
                id: 0,
                field_type: FieldType::Stop,
            });
        }

        let code = byte & 0x0f;
        let field_type = FieldType::from_compact(code, offset)?;
        let delta = byte >> 4;
        let id = if delta == 0 {
            self.read_i16()?
        } else {
            self.last_field_id.wrapping_add(i16::from(delta))
        };
        if field_type == FieldType::Bool {
            self.pending_bool = Some(code == 0x01);
        }
        self.last_field_id = id;

        Ok(FieldHeader { id, field_type })
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.pending_bool.take() {
            Some(value) => Ok(value),
            None => Ok(self.read_u8()? == 0x01),
        }
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let raw = self.read_varint(16)?;
        Ok(unzigzag32(raw as u32) as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(unzigzag32(self.read_varint(32)? as u32))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(unzigzag64(self.read_varint(64)?))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    fn read_length(&mut self) -> Result<usize> {
        let offset = self.pos;
        let length = self.read_varint(32)?;
        let remaining = self.remaining();
        if length > remaining as u64 {
            return Err(ProtocolError::InvalidLength {
                offset,
                length,
                remaining,
            });
        }
        Ok(length as usize)
    }

    pub fn read_binary(&mut self) -> Result<&'a [u8]> {
        let length = self.read_length()?;
        self.take(length)
    }

    /// Strings decode lossily; a bad code point never fails a whole reply
    pub fn read_string(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.read_binary()?).into_owned())
    }

    pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        let element = FieldType::from_compact(byte & 0x0f, offset)?;
        let mut size = u64::from(byte >> 4);
        if size == 15 {
            size = self.read_varint(32)?;
        }
        // every element occupies at least one byte
        let remaining = self.remaining();
        if size > remaining as u64 {
            return Err(ProtocolError::InvalidLength {
                offset,
                length: size,
                remaining,
            });
        }
        if size > 0 && element == FieldType::Stop {
            return Err(ProtocolError::InvalidType { offset, code: 0 });
        }
        Ok((element, size as usize))
    }

    pub fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, usize)> {
        let offset = self.pos;
        let size = self.read_varint(32)?;
        if size == 0 {
            return Ok((FieldType::Stop, FieldType::Stop, 0));
        }
        let types_offset = self.pos;
        let types = self.read_u8()?;
        let key = FieldType::from_compact(types >> 4, types_offset)?;
        let value = FieldType::from_compact(types & 0x0f, types_offset)?;
        let remaining = self.remaining();
        if size.saturating_mul(2) > remaining as u64 {
            return Err(ProtocolError::InvalidLength {
                offset,
                length: size,
                remaining,
            });
        }
        if key == FieldType::Stop || value == FieldType::Stop {
            return Err(ProtocolError::InvalidType {
                offset: types_offset,
                code: types,
            });
        }
        Ok((key, value, size as usize))
    }

    /// Discard a value of the given type, including nested containers
    pub fn skip(&mut self, field_type: FieldType) -> Result<()> {
        match field_type {
            FieldType::Stop => Ok(()),
            FieldType::Bool => self.read_bool().map(drop),
            FieldType::Byte => self.read_byte().map(drop),
            FieldType::I16 => self.read_i16().map(drop),
            FieldType::I32 => self.read_i32().map(drop),
            FieldType::I64 => self.read_i64().map(drop),
            FieldType::Double => self.read_double().map(drop),
            FieldType::Binary => self.read_binary().map(drop),
            FieldType::Struct => self.read_struct(|_, _| Ok(false)),
            FieldType::List | FieldType::Set => {
                self.enter()?;
                let (element, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip(element)?;
                }
                self.leave();
                Ok(())
            }
            FieldType::Map => {
                self.enter()?;
                let (key, value, size) = self.read_map_begin()?;
                for _ in 0..size {
                    self.skip(key)?;
                    self.skip(value)?;
                }
                self.leave();
                Ok(())
            }
        }
    }

    /// Read a list whose elements must be of `expected` type
    pub fn read_list<T>(
        &mut self,
        expected: FieldType,
        mut read_element: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let offset = self.pos;
        self.enter()?;
        let (element, size) = self.read_list_begin()?;
        if size > 0 && element != expected {
            return Err(ProtocolError::ElementTypeMismatch {
                offset,
                expected,
                found: element,
            });
        }
        self.charge::<T>(offset, size)?;
        let mut items = Vec::with_capacity(size.min(MAX_LIST_PREALLOCATION));
        for _ in 0..size {
            items.push(read_element(self)?);
        }
        self.leave();
        Ok(items)
    }

    pub fn read_struct_list<T: ThriftStruct>(&mut self) -> Result<Vec<T>> {
        self.read_list(FieldType::Struct, T::read)
    }

    /// Read a `map<string, V>`; duplicate keys keep the last value
    pub fn read_string_map<V>(
        &mut self,
        value_type: FieldType,
        mut read_value: impl FnMut(&mut Self) -> Result<V>,
    ) -> Result<BTreeMap<String, V>> {
        let offset = self.pos;
        self.enter()?;
        let (key, value, size) = self.read_map_begin()?;
        if size > 0 && key != FieldType::Binary {
            return Err(ProtocolError::ElementTypeMismatch {
                offset,
                expected: FieldType::Binary,
                found: key,
            });
        }
        if size > 0 && value != value_type {
            return Err(ProtocolError::ElementTypeMismatch {
                offset,
                expected: value_type,
                found: value,
            });
        }
        self.charge::<(String, V)>(offset, size)?;
        let mut map = BTreeMap::new();
        for _ in 0..size {
            let key = self.read_string()?;
            let value = read_value(self)?;
            map.insert(key, value);
        }
        self.leave();
        Ok(map)
    }
}

//endregion
