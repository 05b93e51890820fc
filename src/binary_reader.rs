//! Sequential reader over an encoded byte slice.
//!
//! The cursor only moves forward. There is no end marker on the wire: a
//! container ends when the cursor reaches the end of the body declared by its
//! length prefix, and the top level ends with the input. Skipping uses the
//! length prefix or the per-type size rule and never materializes values.

use crate::context::{Context, ContextType, Cursor, DsonState, Entry, Node};
use crate::io::DsonInput;
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::reader::{ReadSource, Reader};
use crate::types::{DsonType, FieldNumber, WireType};
use crate::value::{DsonValue, ExtDateTime, ObjectLitePtr, ObjectPtr, Timestamp};
use crate::wire;
use crate::{Error, Result};
use std::sync::Arc;

/// Reader over document-style (string-named) bytes.
pub type DsonBinaryReader<'a> = Reader<String, BinarySource<'a>>;
/// Reader over lite-style (field-number-named) bytes.
pub type DsonLiteBinaryReader<'a> = Reader<FieldNumber, BinarySource<'a>>;

/// Byte-slice backend of the sequential reader.
#[derive(Debug)]
pub struct BinarySource<'a> {
    input: DsonInput<'a>,
}

impl<'a> BinarySource<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        BinarySource {
            input: DsonInput::new(bytes),
        }
    }

    fn read_prefix(&mut self, dson_type: DsonType) -> Result<usize> {
        match dson_type {
            DsonType::Header => self.input.read_fixed16().map(usize::from),
            _ => self.input.read_fixed32().map(|len| len as usize),
        }
    }
}

impl crate::sealed::Sealed for BinarySource<'_> {}

impl<'a, K: FieldKey> ReadSource<K> for BinarySource<'a> {
    fn open(&mut self, top: &mut Context<K>) {
        top.cursor = Cursor::Body {
            start: 0,
            end: self.input.len(),
        };
    }

    fn read_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>> {
        let (_, end) = ctx.body()?;
        let pos = self.input.position();
        if pos >= end {
            return Ok(None);
        }
        let (number, wire_bits) = wire::split_tag(self.input.read_u8()?);
        let dson_type = DsonType::from_number(number)
            .map_err(|_| Error::invalid_format(pos, &format!("unknown type ordinal {}", number)))?;
        if dson_type == DsonType::EndOfObject {
            return Err(Error::invalid_format(pos, "END_OF_OBJECT tag in stream"));
        }
        if !wire::wire_bits_valid(dson_type, wire_bits) {
            return Err(Error::invalid_format(
                pos,
                &format!("illegal wire bits {} for {}", wire_bits, dson_type),
            ));
        }
        Ok(Some((dson_type, wire_bits)))
    }

    fn peek_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>> {
        let pos = self.input.position();
        let tag = ReadSource::<K>::read_tag(self, ctx);
        self.input.seek(pos)?;
        tag
    }

    fn read_name(&mut self, _ctx: &mut Context<K>) -> Result<K> {
        K::decode(&mut self.input)
    }

    fn skip_name(&mut self, _ctx: &mut Context<K>) -> Result<()> {
        K::skip(&mut self.input)
    }

    fn read_scalar(&mut self, ctx: &mut Context<K>) -> Result<DsonValue<K>> {
        let bits = ctx.wire_bits;
        let input = &mut self.input;
        let value = match ctx.dson_type {
            DsonType::Int32 => DsonValue::Int32(input.read_int32(WireType::from_bits(bits)?)?),
            DsonType::Int64 => DsonValue::Int64(input.read_int64(WireType::from_bits(bits)?)?),
            DsonType::Float => DsonValue::Float(input.read_float(bits)?),
            DsonType::Double => DsonValue::Double(input.read_double(bits)?),
            DsonType::Bool => DsonValue::Bool(bits != 0),
            DsonType::String => DsonValue::String(input.read_string()?),
            DsonType::Null => DsonValue::Null,
            DsonType::Binary => DsonValue::Binary(input.read_binary()?),
            DsonType::Pointer => {
                let mut ptr = ObjectPtr::new(input.read_string()?);
                if bits & wire::POINTER_NAMESPACE != 0 {
                    ptr.namespace = input.read_string()?;
                }
                if bits & wire::POINTER_TYPE != 0 {
                    ptr.ptr_type = input.read_u8()?;
                }
                if bits & wire::POINTER_POLICY != 0 {
                    ptr.policy = input.read_u8()?;
                }
                DsonValue::Pointer(ptr)
            }
            DsonType::LitePointer => {
                let mut ptr = ObjectLitePtr::new(input.read_varint()?);
                if bits & wire::POINTER_NAMESPACE != 0 {
                    ptr.namespace = input.read_string()?;
                }
                if bits & wire::POINTER_TYPE != 0 {
                    ptr.ptr_type = input.read_u8()?;
                }
                if bits & wire::POINTER_POLICY != 0 {
                    ptr.policy = input.read_u8()?;
                }
                DsonValue::LitePointer(ptr)
            }
            DsonType::DateTime => {
                let seconds = input.read_varint()? as i64;
                let nanos = input.read_varint32()?;
                let offset = wire::zigzag_decode32(input.read_varint32()?);
                DsonValue::DateTime(ExtDateTime::new(seconds, nanos, offset, bits))
            }
            DsonType::Timestamp => {
                let seconds = input.read_varint()? as i64;
                let nanos = input.read_varint32()?;
                DsonValue::Timestamp(Timestamp::new(seconds, nanos))
            }
            other => {
                return Err(Error::custom(format!("{} is not a scalar type", other)));
            }
        };
        Ok(value)
    }

    fn skip_value(&mut self, ctx: &mut Context<K>) -> Result<()> {
        let bits = ctx.wire_bits;
        let input = &mut self.input;
        match ctx.dson_type {
            DsonType::Int32 | DsonType::Int64 => match WireType::from_bits(bits)? {
                WireType::Fixed if ctx.dson_type == DsonType::Int32 => input.skip(4),
                WireType::Fixed => input.skip(8),
                _ => input.skip_varint(),
            },
            DsonType::Float => input.skip(4 - usize::from(bits)),
            DsonType::Double => input.skip(8 - usize::from(bits)),
            DsonType::Bool | DsonType::Null | DsonType::EndOfObject => Ok(()),
            DsonType::String | DsonType::Binary => input.skip_length_prefixed(),
            DsonType::Pointer | DsonType::LitePointer => {
                if ctx.dson_type == DsonType::Pointer {
                    input.skip_length_prefixed()?;
                } else {
                    input.skip_varint()?;
                }
                if bits & wire::POINTER_NAMESPACE != 0 {
                    input.skip_length_prefixed()?;
                }
                let flag_bytes = usize::from(bits & wire::POINTER_TYPE != 0)
                    + usize::from(bits & wire::POINTER_POLICY != 0);
                input.skip(flag_bytes)
            }
            DsonType::DateTime => {
                input.skip_varint()?;
                input.skip_varint()?;
                input.skip_varint()
            }
            DsonType::Timestamp => {
                input.skip_varint()?;
                input.skip_varint()
            }
            container @ (DsonType::Header | DsonType::Array | DsonType::Object) => {
                let len = self.read_prefix(container)?;
                self.input.skip(len)
            }
        }
    }

    fn read_value_bytes(&mut self, ctx: &mut Context<K>) -> Result<Vec<u8>> {
        let start = self.input.position();
        let len = self.read_prefix(ctx.dson_type)?;
        self.input.seek(start)?;
        self.input
            .read_bytes(wire::prefix_size(ctx.dson_type) + len)
            .map(<[u8]>::to_vec)
    }

    fn enter(&mut self, parent: &mut Context<K>, child: &mut Context<K>) -> Result<()> {
        let container = match child.context_type {
            ContextType::Header => DsonType::Header,
            ContextType::Array => DsonType::Array,
            _ => DsonType::Object,
        };
        let len = self.read_prefix(container)?;
        let start = self.input.position();
        let end = start + len;
        if end > self.input.len() {
            return Err(Error::unexpected_eof(start, end - self.input.len()));
        }
        let (_, parent_end) = parent.body()?;
        if end > parent_end {
            return Err(Error::invalid_format(
                start,
                "container body extends past its parent",
            ));
        }
        child.cursor = Cursor::Body { start, end };
        Ok(())
    }

    fn exit(&mut self, child: &mut Context<K>) -> Result<()> {
        let (start, end) = child.body()?;
        let pos = self.input.position();
        if pos != end {
            tracing::warn!(declared = end - start, consumed = pos - start, "container length mismatch");
            return Err(Error::trailing_data(end - start, pos - start));
        }
        Ok(())
    }

    fn skip_to_end(&mut self, ctx: &mut Context<K>) -> Result<()> {
        let (_, end) = ctx.body()?;
        if self.input.position() < end {
            self.input.seek(end)?;
        }
        Ok(())
    }

    fn position(&self) -> usize {
        self.input.position()
    }

    fn close(&mut self, auto_close: bool) {
        if auto_close {
            self.input.release();
        }
    }
}

impl<'a, K: FieldKey> Reader<K, BinarySource<'a>> {
    /// Creates a reader over `bytes` with default options.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_options(bytes, DsonOptions::default())
    }

    #[must_use]
    pub fn with_options(bytes: &'a [u8], options: DsonOptions) -> Self {
        Reader::with_source(
            BinarySource::new(bytes),
            options,
            Arc::clone(K::shared_pool()),
        )
    }

    /// Current byte offset in the input.
    #[must_use]
    pub fn position(&self) -> usize {
        self.source.input.position()
    }
}

/// Splits the body `start..end` of encoded bytes into buffered entries.
///
/// Scalars are decoded. Nested containers keep their encoded span and are
/// split in turn when the tree reader enters them.
pub(crate) fn scan_entries<K: FieldKey>(
    bytes: &Arc<[u8]>,
    context_type: ContextType,
    start: usize,
    end: usize,
    items: &mut Vec<Entry<K>>,
) -> Result<()> {
    let mut source = BinarySource::new(&bytes[..]);
    source.input.seek(start)?;
    let mut ctx: Context<K> = Context::default();
    ctx.init(context_type, DsonState::Type);
    ctx.cursor = Cursor::Body { start, end };

    while let Some((dson_type, wire_bits)) = ReadSource::<K>::read_tag(&mut source, &mut ctx)? {
        let name = if dson_type != DsonType::Header && context_type.is_like_object() {
            Some(K::decode(&mut source.input)?)
        } else {
            None
        };
        ctx.dson_type = dson_type;
        ctx.wire_bits = wire_bits;
        let node = if dson_type.is_container_or_header() {
            let value_start = source.input.position();
            ReadSource::<K>::skip_value(&mut source, &mut ctx)?;
            let value_end = source.input.position();
            if value_end > end {
                return Err(Error::invalid_format(
                    value_start,
                    "container body extends past its parent",
                ));
            }
            Node::Encoded {
                dson_type,
                bytes: Arc::clone(bytes),
                start: value_start,
                end: value_end,
            }
        } else {
            Node::Value(ReadSource::<K>::read_scalar(&mut source, &mut ctx)?)
        };
        items.push(Entry::new(name, node));
    }

    let pos = source.input.position();
    if pos != end {
        return Err(Error::trailing_data(end - start, pos - start));
    }
    Ok(())
}
