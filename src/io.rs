//! Byte-level input and output.
//!
//! [`DsonOutput`] is the growable staging buffer of the binary writer: it
//! supports in-place patching of length prefixes. [`DsonInput`] is a forward
//! cursor over a byte slice used by the binary reader. Both speak LEB128
//! varints and little-endian fixed-width integers.

use crate::types::WireType;
use crate::wire;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Longest legal varint (a full 64-bit value).
pub const MAX_VARINT_LEN: usize = 10;

/// Growable output buffer.
#[derive(Debug, Default, Clone)]
pub struct DsonOutput {
    buf: Vec<u8>,
}

impl DsonOutput {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        DsonOutput {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_fixed16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn write_fixed64(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn write_int32(&mut self, value: i32, wire_type: WireType) {
        match wire_type {
            WireType::Varint => self.write_varint(value as i64 as u64),
            WireType::Uint => self.write_varint(u64::from(value as u32)),
            WireType::Sint => self.write_varint(u64::from(wire::zigzag_encode32(value))),
            WireType::Fixed => self.write_fixed32(value as u32),
        }
    }

    pub fn write_int64(&mut self, value: i64, wire_type: WireType) {
        match wire_type {
            WireType::Varint | WireType::Uint => self.write_varint(value as u64),
            WireType::Sint => self.write_varint(wire::zigzag_encode64(value)),
            WireType::Fixed => self.write_fixed64(value as u64),
        }
    }

    /// Writes the high `4 - trim` bytes of a float's little-endian bit pattern.
    pub fn write_float(&mut self, value: f32, trim: u8) {
        let bytes = value.to_bits().to_le_bytes();
        self.write_bytes(&bytes[usize::from(trim)..]);
    }

    /// Writes the high `8 - trim` bytes of a double's little-endian bit pattern.
    pub fn write_double(&mut self, value: f64, trim: u8) {
        let bytes = value.to_bits().to_le_bytes();
        self.write_bytes(&bytes[usize::from(trim)..]);
    }

    /// Writes a varint length followed by the UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_varint(value.len() as u64);
        self.write_bytes(value.as_bytes());
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_binary(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u64);
        self.write_bytes(value);
    }

    /// Overwrites two bytes at `pos`.
    pub fn set_fixed16(&mut self, pos: usize, value: u16) -> Result<()> {
        let slot = self
            .buf
            .get_mut(pos..pos + 2)
            .ok_or_else(|| Error::invalid_format(pos, "length placeholder out of range"))?;
        LittleEndian::write_u16(slot, value);
        Ok(())
    }

    /// Overwrites four bytes at `pos`.
    pub fn set_fixed32(&mut self, pos: usize, value: u32) -> Result<()> {
        let slot = self
            .buf
            .get_mut(pos..pos + 4)
            .ok_or_else(|| Error::invalid_format(pos, "length placeholder out of range"))?;
        LittleEndian::write_u32(slot, value);
        Ok(())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Forward cursor over an encoded byte slice.
#[derive(Debug, Clone)]
pub struct DsonInput<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DsonInput<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        DsonInput { buf, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left before the end of the slice.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Moves the cursor to an absolute offset within the slice.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(Error::unexpected_eof(self.pos, pos - self.buf.len()));
        }
        self.pos = pos;
        Ok(())
    }

    /// Drops the borrowed slice; every later read reports end of input.
    pub fn release(&mut self) {
        self.buf = &[];
        self.pos = 0;
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| Error::unexpected_eof(self.pos, 1))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::unexpected_eof(self.pos, 1))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::unexpected_eof(self.pos, len - self.remaining()));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Reads an unsigned LEB128 varint of at most ten bytes.
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut result: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            result |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::invalid_format(
            start,
            "varint longer than 10 bytes, possible corruption",
        ))
    }

    /// Reads a varint that must fit in 32 bits.
    pub fn read_varint32(&mut self) -> Result<u32> {
        let start = self.pos;
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| Error::invalid_format(start, "varint exceeds 32 bits"))
    }

    pub fn skip_varint(&mut self) -> Result<()> {
        self.read_varint().map(|_| ())
    }

    pub fn read_fixed16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    pub fn read_fixed32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    pub fn read_fixed64(&mut self) -> Result<u64> {
        self.read_bytes(8).map(LittleEndian::read_u64)
    }

    pub fn read_int32(&mut self, wire_type: WireType) -> Result<i32> {
        Ok(match wire_type {
            WireType::Varint => self.read_varint()? as i32,
            WireType::Uint => self.read_varint32()? as i32,
            WireType::Sint => wire::zigzag_decode32(self.read_varint32()?),
            WireType::Fixed => self.read_fixed32()? as i32,
        })
    }

    pub fn read_int64(&mut self, wire_type: WireType) -> Result<i64> {
        Ok(match wire_type {
            WireType::Varint | WireType::Uint => self.read_varint()? as i64,
            WireType::Sint => wire::zigzag_decode64(self.read_varint()?),
            WireType::Fixed => self.read_fixed64()? as i64,
        })
    }

    /// Reads a float whose `trim` low bytes were dropped.
    pub fn read_float(&mut self, trim: u8) -> Result<f32> {
        let trim = usize::from(trim);
        let mut bytes = [0u8; 4];
        bytes[trim..].copy_from_slice(self.read_bytes(4 - trim)?);
        Ok(f32::from_bits(u32::from_le_bytes(bytes)))
    }

    /// Reads a double whose `trim` low bytes were dropped.
    pub fn read_double(&mut self, trim: u8) -> Result<f64> {
        let trim = usize::from(trim);
        let mut bytes = [0u8; 8];
        bytes[trim..].copy_from_slice(self.read_bytes(8 - trim)?);
        Ok(f64::from_bits(u64::from_le_bytes(bytes)))
    }

    fn read_len(&mut self) -> Result<usize> {
        self.read_varint32().map(|len| len as usize)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let start = self.pos;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid_format(start, &e.to_string()))
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_bytes(len).map(<[u8]>::to_vec)
    }

    /// Skips a varint-length-prefixed string or binary payload.
    pub fn skip_length_prefixed(&mut self) -> Result<()> {
        let len = self.read_len()?;
        self.skip(len)
    }
}
