//! Compact binary protocol: tagged-field structs, typed lists and maps.
//!
//! A field header packs the field-id delta (high nibble) and the type tag (low nibble)
//! into one byte. A zero delta means the absolute id follows as a zigzag varint.
//! Booleans carried as struct fields live in the type nibble and have no payload.

use log::warn;

use super::varint;
use crate::parquet::error::{fmt_err, ParquetResult};

const COMPACT_STOP: u8 = 0x00;
const COMPACT_BOOLEAN_TRUE: u8 = 0x01;
const COMPACT_BOOLEAN_FALSE: u8 = 0x02;
const COMPACT_BYTE: u8 = 0x03;
const COMPACT_I16: u8 = 0x04;
const COMPACT_I32: u8 = 0x05;
const COMPACT_I64: u8 = 0x06;
const COMPACT_DOUBLE: u8 = 0x07;
const COMPACT_BINARY: u8 = 0x08;
const COMPACT_LIST: u8 = 0x09;
const COMPACT_SET: u8 = 0x0A;
const COMPACT_MAP: u8 = 0x0B;
const COMPACT_STRUCT: u8 = 0x0C;

/// Counts up to this value are stored in the list header nibble.
const MAX_INLINE_LIST_SIZE: usize = 14;
const LIST_SIZE_FOLLOWS: u8 = 0x0F;

/// Nesting limit while skipping content of unknown fields.
const MAX_SKIP_DEPTH: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldType {
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
    fn compact_id(self) -> u8 {
        match self {
            // Element type for lists; struct fields encode their value instead.
            FieldType::Bool => COMPACT_BOOLEAN_TRUE,
            FieldType::Byte => COMPACT_BYTE,
            FieldType::I16 => COMPACT_I16,
            FieldType::I32 => COMPACT_I32,
            FieldType::I64 => COMPACT_I64,
            FieldType::Double => COMPACT_DOUBLE,
            FieldType::Binary => COMPACT_BINARY,
            FieldType::List => COMPACT_LIST,
            FieldType::Set => COMPACT_SET,
            FieldType::Map => COMPACT_MAP,
            FieldType::Struct => COMPACT_STRUCT,
        }
    }

    fn from_compact_id(id: u8) -> ParquetResult<Self> {
        match id {
            COMPACT_BOOLEAN_TRUE | COMPACT_BOOLEAN_FALSE => Ok(FieldType::Bool),
            COMPACT_BYTE => Ok(FieldType::Byte),
            COMPACT_I16 => Ok(FieldType::I16),
            COMPACT_I32 => Ok(FieldType::I32),
            COMPACT_I64 => Ok(FieldType::I64),
            COMPACT_DOUBLE => Ok(FieldType::Double),
            COMPACT_BINARY => Ok(FieldType::Binary),
            COMPACT_LIST => Ok(FieldType::List),
            COMPACT_SET => Ok(FieldType::Set),
            COMPACT_MAP => Ok(FieldType::Map),
            COMPACT_STRUCT => Ok(FieldType::Struct),
            other => Err(fmt_err!(OutOfSpec, "unknown compact type id {other}")),
        }
    }
}

/// Writes the compact protocol into a growable buffer.
pub struct TCompactOutputProtocol<'a> {
    buf: &'a mut Vec<u8>,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
}

impl<'a> TCompactOutputProtocol<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self {
            buf,
            last_field_id: 0,
            field_id_stack: Vec::new(),
        }
    }

    pub fn write_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn write_struct_end(&mut self) {
        self.buf.push(COMPACT_STOP);
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    fn write_field_header(&mut self, compact_type: u8, field_id: i16) {
        let delta = field_id.wrapping_sub(self.last_field_id);
        if delta > 0 && delta <= 15 {
            self.buf.push(((delta as u8) << 4) | compact_type);
        } else {
            self.buf.push(compact_type);
            varint::write_varint(self.buf, field_id as i64);
        }
        self.last_field_id = field_id;
    }

    /// Starts a non-boolean field. Use [`Self::write_bool_field`] for booleans.
    pub fn write_field_begin(&mut self, field_type: FieldType, field_id: i16) {
        debug_assert!(field_type != FieldType::Bool);
        self.write_field_header(field_type.compact_id(), field_id);
    }

    pub fn write_bool_field(&mut self, field_id: i16, value: bool) {
        let compact_type = if value { COMPACT_BOOLEAN_TRUE } else { COMPACT_BOOLEAN_FALSE };
        self.write_field_header(compact_type, field_id);
    }

    pub fn write_i32_field(&mut self, field_id: i16, value: i32) {
        self.write_field_begin(FieldType::I32, field_id);
        self.write_i32(value);
    }

    pub fn write_i64_field(&mut self, field_id: i16, value: i64) {
        self.write_field_begin(FieldType::I64, field_id);
        self.write_i64(value);
    }

    pub fn write_string_field(&mut self, field_id: i16, value: &str) {
        self.write_field_begin(FieldType::Binary, field_id);
        self.write_binary(value.as_bytes());
    }

    pub fn write_byte(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        varint::write_varint(self.buf, value as i64);
    }

    pub fn write_i32(&mut self, value: i32) {
        varint::write_varint(self.buf, value as i64);
    }

    pub fn write_i64(&mut self, value: i64) {
        varint::write_varint(self.buf, value);
    }

    pub fn write_double(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_binary(&mut self, value: &[u8]) {
        varint::write_uvarint(self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    /// Boolean list elements take one byte each.
    pub fn write_bool_element(&mut self, value: bool) {
        self.buf
            .push(if value { COMPACT_BOOLEAN_TRUE } else { COMPACT_BOOLEAN_FALSE });
    }

    pub fn write_list_begin(&mut self, element_type: FieldType, size: usize) -> ParquetResult<()> {
        if size > i32::MAX as usize {
            return Err(fmt_err!(Overflow, "list of {size} elements is too long"));
        }
        let element_type = element_type.compact_id();
        if size <= MAX_INLINE_LIST_SIZE {
            self.buf.push(((size as u8) << 4) | element_type);
        } else {
            self.buf.push((LIST_SIZE_FOLLOWS << 4) | element_type);
            varint::write_uvarint(self.buf, size as u64);
        }
        Ok(())
    }

    pub fn write_map_begin(
        &mut self,
        key_type: FieldType,
        value_type: FieldType,
        size: usize,
    ) -> ParquetResult<()> {
        if size > i32::MAX as usize {
            return Err(fmt_err!(Overflow, "map of {size} entries is too long"));
        }
        if size == 0 {
            self.buf.push(0);
        } else {
            varint::write_uvarint(self.buf, size as u64);
            self.buf.push((key_type.compact_id() << 4) | value_type.compact_id());
        }
        Ok(())
    }
}

/// Reads the compact protocol from a byte slice.
///
/// Every read is bounds checked; container sizes are validated against the
/// remaining input before the caller allocates for them.
pub struct TCompactInputProtocol<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
    pending_bool: Option<bool>,
}

impl<'a> TCompactInputProtocol<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_field_id: 0,
            field_id_stack: Vec::new(),
            pending_bool: None,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> ParquetResult<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| fmt_err!(OutOfSpec, "unexpected end of input at byte {}", self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> ParquetResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(fmt_err!(
                OutOfSpec,
                "{len} bytes requested at byte {} but only {} remain",
                self.pos,
                self.remaining()
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_uvarint(&mut self) -> ParquetResult<u64> {
        let (value, consumed) = varint::read_uvarint(&self.buf[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn read_struct_end(&mut self) {
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    /// Returns the next field's type and id, or `None` at the stop marker.
    pub fn read_field_begin(&mut self) -> ParquetResult<Option<(FieldType, i16)>> {
        let header = self.read_u8()?;
        if header == COMPACT_STOP {
            return Ok(None);
        }
        let compact_type = header & 0x0F;
        let field_type = FieldType::from_compact_id(compact_type)?;
        let delta = (header >> 4) as i16;
        let field_id = if delta == 0 {
            self.read_i16()?
        } else {
            self.last_field_id
                .checked_add(delta)
                .ok_or_else(|| fmt_err!(OutOfSpec, "field id overflows i16"))?
        };
        self.last_field_id = field_id;
        self.pending_bool = match compact_type {
            COMPACT_BOOLEAN_TRUE => Some(true),
            COMPACT_BOOLEAN_FALSE => Some(false),
            _ => None,
        };
        Ok(Some((field_type, field_id)))
    }

    pub fn read_bool(&mut self) -> ParquetResult<bool> {
        if let Some(value) = self.pending_bool.take() {
            return Ok(value);
        }
        match self.read_u8()? {
            COMPACT_BOOLEAN_TRUE => Ok(true),
            // Some writers use 0 for false inside collections.
            COMPACT_BOOLEAN_FALSE | 0 => Ok(false),
            other => Err(fmt_err!(OutOfSpec, "invalid boolean byte {other}")),
        }
    }

    pub fn read_byte(&mut self) -> ParquetResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> ParquetResult<i16> {
        let value = varint::zigzag_decode(self.read_uvarint()?);
        i16::try_from(value).map_err(|_| fmt_err!(OutOfSpec, "value {value} does not fit i16"))
    }

    pub fn read_i32(&mut self) -> ParquetResult<i32> {
        let value = varint::zigzag_decode(self.read_uvarint()?);
        i32::try_from(value).map_err(|_| fmt_err!(OutOfSpec, "value {value} does not fit i32"))
    }

    pub fn read_i64(&mut self) -> ParquetResult<i64> {
        Ok(varint::zigzag_decode(self.read_uvarint()?))
    }

    pub fn read_double(&mut self) -> ParquetResult<f64> {
        let bytes = self.read_bytes(8)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(le))
    }

    pub fn read_binary(&mut self) -> ParquetResult<&'a [u8]> {
        let len = self.read_uvarint()?;
        let len = usize::try_from(len)
            .map_err(|_| fmt_err!(OutOfSpec, "binary length {len} is not addressable"))?;
        self.read_bytes(len)
    }

    pub fn read_string(&mut self) -> ParquetResult<String> {
        let bytes = self.read_binary()?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    /// Returns the element type and element count of a list or set.
    pub fn read_list_begin(&mut self) -> ParquetResult<(FieldType, usize)> {
        let header = self.read_u8()?;
        let element_type = FieldType::from_compact_id(header & 0x0F)?;
        let inline_size = header >> 4;
        let size = if inline_size == LIST_SIZE_FOLLOWS {
            self.read_uvarint()?
        } else {
            inline_size as u64
        };
        // Every element occupies at least one byte.
        if size > self.remaining() as u64 {
            return Err(fmt_err!(
                OutOfSpec,
                "list declares {size} elements but only {} bytes remain",
                self.remaining()
            ));
        }
        Ok((element_type, size as usize))
    }

    /// Returns key type, value type and entry count of a map.
    pub fn read_map_begin(&mut self) -> ParquetResult<(FieldType, FieldType, usize)> {
        let size = self.read_uvarint()?;
        if size == 0 {
            return Ok((FieldType::Byte, FieldType::Byte, 0));
        }
        let types = self.read_u8()?;
        let key_type = FieldType::from_compact_id(types >> 4)?;
        let value_type = FieldType::from_compact_id(types & 0x0F)?;
        if size > (self.remaining() / 2) as u64 {
            return Err(fmt_err!(
                OutOfSpec,
                "map declares {size} entries but only {} bytes remain",
                self.remaining()
            ));
        }
        Ok((key_type, value_type, size as usize))
    }

    /// Skips one value of the given type, descending into containers.
    pub fn skip(&mut self, field_type: FieldType) -> ParquetResult<()> {
        self.skip_till_depth(field_type, MAX_SKIP_DEPTH)
    }

    fn skip_till_depth(&mut self, field_type: FieldType, depth: usize) -> ParquetResult<()> {
        if depth == 0 {
            return Err(fmt_err!(OutOfSpec, "nesting exceeds {MAX_SKIP_DEPTH} levels"));
        }
        match field_type {
            FieldType::Bool => self.read_bool().map(|_| ()),
            FieldType::Byte => self.read_u8().map(|_| ()),
            FieldType::I16 | FieldType::I32 | FieldType::I64 => self.read_uvarint().map(|_| ()),
            FieldType::Double => self.read_bytes(8).map(|_| ()),
            FieldType::Binary => self.read_binary().map(|_| ()),
            FieldType::List | FieldType::Set => {
                let (element_type, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_till_depth(element_type, depth - 1)?;
                }
                Ok(())
            }
            FieldType::Map => {
                let (key_type, value_type, size) = self.read_map_begin()?;
                for _ in 0..size {
                    self.skip_till_depth(key_type, depth - 1)?;
                    self.skip_till_depth(value_type, depth - 1)?;
                }
                Ok(())
            }
            FieldType::Struct => {
                self.read_struct_begin();
                while let Some((field_type, _)) = self.read_field_begin()? {
                    self.skip_till_depth(field_type, depth - 1)?;
                }
                self.read_struct_end();
                Ok(())
            }
        }
    }

    /// Skips a field the caller does not recognise.
    pub fn skip_unknown(
        &mut self,
        struct_name: &str,
        field_type: FieldType,
        field_id: i16,
    ) -> ParquetResult<()> {
        warn!("skipping unknown field {field_id} ({field_type:?}) in {struct_name}");
        self.skip(field_type)
    }
}

/// Checks that a recognised field id arrived with the expected type.
pub fn expect_type(
    struct_name: &str,
    field_id: i16,
    actual: FieldType,
    expected: FieldType,
) -> ParquetResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(fmt_err!(
            OutOfSpec,
            "{struct_name} field {field_id} has type {actual:?}, expected {expected:?}"
        ))
    }
}

/// Fails when a required field was never seen.
pub fn required<T>(value: Option<T>, struct_name: &str, field_name: &str) -> ParquetResult<T> {
    value.ok_or_else(|| fmt_err!(OutOfSpec, "{struct_name} is missing required field {field_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_field_headers() {
        let mut buf = vec![];
        let mut prot = TCompactOutputProtocol::new(&mut buf);
        prot.write_struct_begin();
        prot.write_i32_field(1, 7);
        prot.write_i32_field(17, -1);
        prot.write_bool_field(18, true);
        prot.write_struct_end();
        // (delta 1, i32) 7 -> zigzag 14; long form id 17 -> zigzag 34; (delta 1, true); stop
        assert_eq!(buf, vec![0x15, 14, 0x05, 34, 1, 0x11, 0x00]);

        let mut input = TCompactInputProtocol::new(&buf);
        input.read_struct_begin();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I32, 1)));
        assert_eq!(input.read_i32().unwrap(), 7);
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I32, 17)));
        assert_eq!(input.read_i32().unwrap(), -1);
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::Bool, 18)));
        assert!(input.read_bool().unwrap());
        assert_eq!(input.read_field_begin().unwrap(), None);
        input.read_struct_end();
        assert_eq!(input.position(), buf.len());
    }

    #[test]
    fn nested_structs_restore_last_field_id() {
        let mut buf = vec![];
        let mut prot = TCompactOutputProtocol::new(&mut buf);
        prot.write_struct_begin();
        prot.write_i32_field(4, 1);
        prot.write_field_begin(FieldType::Struct, 5);
        prot.write_struct_begin();
        prot.write_i64_field(1, 2);
        prot.write_struct_end();
        prot.write_i32_field(6, 3);
        prot.write_struct_end();

        let mut input = TCompactInputProtocol::new(&buf);
        input.read_struct_begin();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I32, 4)));
        input.read_i32().unwrap();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::Struct, 5)));
        input.read_struct_begin();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I64, 1)));
        assert_eq!(input.read_i64().unwrap(), 2);
        assert_eq!(input.read_field_begin().unwrap(), None);
        input.read_struct_end();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I32, 6)));
        assert_eq!(input.read_i32().unwrap(), 3);
    }

    #[test]
    fn list_sizes_inline_and_varint() {
        for size in [0usize, 3, 14, 15, 300] {
            let mut buf = vec![];
            let mut prot = TCompactOutputProtocol::new(&mut buf);
            prot.write_list_begin(FieldType::I32, size).unwrap();
            for i in 0..size {
                prot.write_i32(i as i32);
            }
            let header_len = if size <= 14 { 1 } else { 1 + (size > 127) as usize + 1 };
            assert_eq!(buf.len(), header_len + size.min(64) + size.saturating_sub(64) * 2);

            let mut input = TCompactInputProtocol::new(&buf);
            let (element_type, read_size) = input.read_list_begin().unwrap();
            assert_eq!((element_type, read_size), (FieldType::I32, size));
            for i in 0..size {
                assert_eq!(input.read_i32().unwrap(), i as i32);
            }
        }
    }

    #[test]
    fn skips_unknown_nested_content() {
        let mut buf = vec![];
        let mut prot = TCompactOutputProtocol::new(&mut buf);
        prot.write_struct_begin();
        prot.write_field_begin(FieldType::List, 1);
        prot.write_list_begin(FieldType::Struct, 2).unwrap();
        for i in 0..2 {
            prot.write_struct_begin();
            prot.write_string_field(1, "abc");
            prot.write_field_begin(FieldType::Double, 2);
            prot.write_double(i as f64);
            prot.write_bool_field(3, false);
            prot.write_struct_end();
        }
        prot.write_field_begin(FieldType::Map, 2);
        prot.write_map_begin(FieldType::Binary, FieldType::I64, 1).unwrap();
        prot.write_binary(b"k");
        prot.write_i64(-5);
        prot.write_i32_field(3, 42);
        prot.write_struct_end();

        let mut input = TCompactInputProtocol::new(&buf);
        input.read_struct_begin();
        let (ty, id) = input.read_field_begin().unwrap().unwrap();
        assert_eq!(id, 1);
        input.skip(ty).unwrap();
        let (ty, id) = input.read_field_begin().unwrap().unwrap();
        assert_eq!(id, 2);
        input.skip(ty).unwrap();
        assert_eq!(input.read_field_begin().unwrap(), Some((FieldType::I32, 3)));
        assert_eq!(input.read_i32().unwrap(), 42);
        assert_eq!(input.read_field_begin().unwrap(), None);
    }

    #[test]
    fn truncated_input_never_panics() {
        let mut buf = vec![];
        let mut prot = TCompactOutputProtocol::new(&mut buf);
        prot.write_struct_begin();
        prot.write_string_field(1, "hello world");
        prot.write_i64_field(2, i64::MIN);
        prot.write_struct_end();

        for cut in 0..buf.len() {
            let mut input = TCompactInputProtocol::new(&buf[..cut]);
            input.read_struct_begin();
            let res = (|| -> ParquetResult<()> {
                while let Some((ty, _)) = input.read_field_begin()? {
                    input.skip(ty)?;
                }
                Ok(())
            })();
            assert!(res.is_err(), "cut at {cut} should fail");
        }
    }

    #[test]
    fn oversized_list_is_rejected_before_allocation() {
        // 0xF5: inline size nibble 15 (size follows), i32 elements; size = 2^32.
        let buf = [0xF5, 0x80, 0x80, 0x80, 0x80, 0x10];
        let mut input = TCompactInputProtocol::new(&buf);
        assert!(input.read_list_begin().is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        // A struct field (id delta 1) that opens another struct, repeated.
        let buf = vec![0x1C; 200];
        let mut input = TCompactInputProtocol::new(&buf);
        assert!(input.skip(FieldType::Struct).is_err());
    }
}
