//! Binary encoder.
//!
//! Values are staged in a [`DsonOutput`] buffer. A container's length prefix
//! is written as a zero placeholder when it opens and patched when it closes.
//! Whenever a top-level value completes, the staged bytes are handed to the
//! destination in one `write_all`, so a sink never sees a partial value.

use crate::context::{Context, ContextType, Cursor};
use crate::io::{DsonInput, DsonOutput};
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::types::{DsonType, FieldNumber};
use crate::value::DsonValue;
use crate::wire;
use crate::writer::{write_value, Scalar, WriteSink, Writer};
use crate::{Error, Result};
use std::io;
use std::sync::Arc;

/// Writer producing document-style (string-named) bytes.
pub type DsonBinaryWriter<W> = Writer<String, BinarySink<W>>;
/// Writer producing lite-style (field-number-named) bytes.
pub type DsonLiteBinaryWriter<W> = Writer<FieldNumber, BinarySink<W>>;

/// Byte backend of the encoder.
#[derive(Debug)]
pub struct BinarySink<W> {
    out: DsonOutput,
    sink: Option<W>,
}

impl<W: io::Write> BinarySink<W> {
    #[must_use]
    pub fn new(sink: W, capacity: usize) -> Self {
        BinarySink {
            out: DsonOutput::with_capacity(capacity),
            sink: Some(sink),
        }
    }

    fn write_tag<K: FieldKey>(&mut self, dson_type: DsonType, wire_bits: u8, name: Option<&K::Ref>) {
        self.out.write_u8(wire::make_tag(dson_type, wire_bits));
        if let Some(name) = name {
            K::encode(name, &mut self.out);
        }
    }
}

impl<W> crate::sealed::Sealed for BinarySink<W> {}

impl<K: FieldKey, W: io::Write> WriteSink<K> for BinarySink<W> {
    fn write_scalar(&mut self, _ctx: &mut Context<K>, name: Option<&K::Ref>, value: Scalar<'_>) -> Result<()> {
        self.write_tag::<K>(value.dson_type(), value.wire_bits(), name);
        let out = &mut self.out;
        match value {
            Scalar::Int32(v, wire_type) => out.write_int32(v, wire_type),
            Scalar::Int64(v, wire_type) => out.write_int64(v, wire_type),
            Scalar::Float(v) => out.write_float(v, wire::float_wire_bits(v)),
            Scalar::Double(v) => out.write_double(v, wire::double_wire_bits(v)),
            Scalar::Bool(_) | Scalar::Null => {}
            Scalar::String(v) => out.write_string(v),
            Scalar::Binary(v) => out.write_binary(v),
            Scalar::Pointer(ptr) => {
                out.write_string(&ptr.local_id);
                if !ptr.namespace.is_empty() {
                    out.write_string(&ptr.namespace);
                }
                if ptr.ptr_type != 0 {
                    out.write_u8(ptr.ptr_type);
                }
                if ptr.policy != 0 {
                    out.write_u8(ptr.policy);
                }
            }
            Scalar::LitePointer(ptr) => {
                out.write_varint(ptr.local_id);
                if !ptr.namespace.is_empty() {
                    out.write_string(&ptr.namespace);
                }
                if ptr.ptr_type != 0 {
                    out.write_u8(ptr.ptr_type);
                }
                if ptr.policy != 0 {
                    out.write_u8(ptr.policy);
                }
            }
            Scalar::DateTime(dt) => {
                out.write_varint(dt.seconds as u64);
                out.write_varint(u64::from(dt.nanos));
                out.write_varint(u64::from(wire::zigzag_encode32(dt.offset)));
            }
            Scalar::Timestamp(ts) => {
                out.write_varint(ts.seconds as u64);
                out.write_varint(u64::from(ts.nanos));
            }
        }
        Ok(())
    }

    fn start_container(
        &mut self,
        _parent: &mut Context<K>,
        child: &mut Context<K>,
        name: Option<&K::Ref>,
    ) -> Result<()> {
        self.write_tag::<K>(child.dson_type, 0, name);
        let pos = self.out.position();
        if child.context_type == ContextType::Header {
            self.out.write_fixed16(0);
        } else {
            self.out.write_fixed32(0);
        }
        child.cursor = Cursor::Prefix { pos };
        Ok(())
    }

    fn end_container(&mut self, _parent: &mut Context<K>, child: &mut Context<K>) -> Result<()> {
        let pos = match child.cursor {
            Cursor::Prefix { pos } => pos,
            _ => return Err(Error::custom("container has no length placeholder")),
        };
        let size = self.out.position() - pos - wire::prefix_size(child.dson_type);
        if child.context_type == ContextType::Header {
            if size > wire::HEADER_MAX_BODY {
                tracing::warn!(size, "header body exceeds its length prefix");
                return Err(Error::OversizedHeader { size });
            }
            self.out.set_fixed16(pos, size as u16)
        } else {
            let len = u32::try_from(size)
                .map_err(|_| Error::invalid_format(pos, "container body exceeds 4 GiB"))?;
            self.out.set_fixed32(pos, len)
        }
    }

    fn write_value_bytes(
        &mut self,
        _ctx: &mut Context<K>,
        name: Option<&K::Ref>,
        dson_type: DsonType,
        bytes: &[u8],
    ) -> Result<()> {
        let mut input = DsonInput::new(bytes);
        let declared = if dson_type == DsonType::Header {
            usize::from(input.read_fixed16()?)
        } else {
            input.read_fixed32()? as usize
        };
        if declared != input.remaining() {
            return Err(Error::invalid_format(
                0,
                "encoded container length does not match its prefix",
            ));
        }
        self.write_tag::<K>(dson_type, 0, name);
        self.out.write_bytes(bytes);
        Ok(())
    }

    fn top_level_done(&mut self) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::Closed)?;
        sink.write_all(self.out.as_slice())?;
        tracing::trace!(bytes = self.out.position(), "top-level value written");
        self.out.clear();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.as_mut().ok_or(Error::Closed)?.flush()?;
        Ok(())
    }

    fn position(&self) -> usize {
        self.out.position()
    }

    fn close(&mut self, auto_close: bool) -> Result<()> {
        if self.out.position() > 0 {
            tracing::warn!(bytes = self.out.position(), "discarding incomplete top-level value");
            self.out.clear();
        }
        if auto_close {
            if let Some(mut sink) = self.sink.take() {
                sink.flush()?;
            }
        } else if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl<K: FieldKey, W: io::Write> Writer<K, BinarySink<W>> {
    /// Creates a writer over `sink` with default options.
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, DsonOptions::default())
    }

    #[must_use]
    pub fn with_options(sink: W, options: DsonOptions) -> Self {
        let binary = BinarySink::new(sink, options.buffer_capacity);
        Writer::with_sink(binary, options, Arc::clone(K::shared_pool()))
    }

    /// The destination, unless `close` with `auto_close` already dropped it.
    #[must_use]
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.sink.as_ref()
    }

    /// Flushes and returns the destination.
    ///
    /// A top-level value still being written is discarded.
    pub fn into_inner(mut self) -> Result<W> {
        let mut sink = self.sink.sink.take().ok_or(Error::Closed)?;
        sink.flush()?;
        Ok(sink)
    }
}

/// Encodes a container and strips its tag, leaving the length prefix and body.
pub(crate) fn encode_container<K: FieldKey>(value: &DsonValue<K>, options: &DsonOptions) -> Result<Vec<u8>> {
    let mut writer = Writer::<K, BinarySink<Vec<u8>>>::with_options(Vec::new(), options.clone());
    write_value(&mut writer, None, value)?;
    let mut bytes = writer.into_inner()?;
    if bytes.is_empty() {
        return Err(Error::custom("container encoded to nothing"));
    }
    bytes.remove(0);
    Ok(bytes)
}
