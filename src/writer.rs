//! The writer state machine.
//!
//! [`DsonWriter`] mirrors [`DsonReader`](crate::DsonReader): each value is
//! written with an optional name, containers are opened and closed
//! explicitly, and the writer rejects calls that do not fit the current
//! frame. Every concrete writer is a [`Writer`] over a [`WriteSink`]:
//!
//! - [`BinarySink`](crate::binary_writer::BinarySink) encodes bytes;
//! - [`TreeSink`](crate::tree_writer::TreeSink) builds [`DsonValue`] trees.
//!
//! ## Naming
//!
//! Inside an object or header every value except a header needs a name. It
//! can be given with the value, or beforehand with
//! [`write_name`](DsonWriter::write_name); in the latter case a name passed
//! with the value must match it. Arrays and the top level take no names and
//! ignore any that are passed.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{DsonBinaryWriter, DsonWriter, WireType};
//!
//! let mut writer = DsonBinaryWriter::new(Vec::new());
//! writer.write_start_object(None).unwrap();
//! writer.write_int32(Some("a"), -1, WireType::Sint).unwrap();
//! writer.write_name("b").unwrap();
//! writer.write_bool(None, true).unwrap();
//! writer.write_end_object().unwrap();
//!
//! let bytes = writer.into_inner().unwrap();
//! assert_eq!(bytes, [0xF8, 0x07, 0, 0, 0, 0x0A, 0x01, b'a', 0x01, 0x29, 0x01, b'b']);
//! ```

use crate::context::{Context, ContextPool, ContextType, DsonState};
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::reader::top_mut;
use crate::types::{DsonType, WireType};
use crate::value::{
    DsonArray, DsonHeader, DsonObject, DsonValue, ExtDateTime, ObjectLitePtr, ObjectPtr,
    Timestamp,
};
use crate::wire;
use crate::{Error, Result};
use std::any::Any;
use std::sync::Arc;

/// Push-based writing contract shared by every writer.
pub trait DsonWriter<K: FieldKey> {
    /// Kind of the innermost open container.
    fn context_type(&self) -> ContextType;

    fn state(&self) -> DsonState;

    /// Announces the name of the next value in an object or header.
    fn write_name(&mut self, name: &K::Ref) -> Result<()>;

    fn write_int32(&mut self, name: Option<&K::Ref>, value: i32, wire_type: WireType) -> Result<()>;
    fn write_int64(&mut self, name: Option<&K::Ref>, value: i64, wire_type: WireType) -> Result<()>;
    fn write_float(&mut self, name: Option<&K::Ref>, value: f32) -> Result<()>;
    fn write_double(&mut self, name: Option<&K::Ref>, value: f64) -> Result<()>;
    fn write_bool(&mut self, name: Option<&K::Ref>, value: bool) -> Result<()>;
    fn write_string(&mut self, name: Option<&K::Ref>, value: &str) -> Result<()>;
    fn write_null(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn write_binary(&mut self, name: Option<&K::Ref>, value: &[u8]) -> Result<()>;
    fn write_pointer(&mut self, name: Option<&K::Ref>, value: &ObjectPtr) -> Result<()>;
    fn write_lite_pointer(&mut self, name: Option<&K::Ref>, value: &ObjectLitePtr) -> Result<()>;
    fn write_datetime(&mut self, name: Option<&K::Ref>, value: &ExtDateTime) -> Result<()>;
    fn write_timestamp(&mut self, name: Option<&K::Ref>, value: &Timestamp) -> Result<()>;

    fn write_start_object(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn write_end_object(&mut self) -> Result<()>;
    fn write_start_array(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;

    /// Opens the header of the enclosing object or array, or a top-level header.
    ///
    /// Inside an object or array the header must be the first value; a later
    /// or second header fails with [`Error::InvalidFormat`].
    fn write_start_header(&mut self) -> Result<()>;

    /// Closes a header.
    ///
    /// Fails with [`Error::OversizedHeader`] when the encoded body does not
    /// fit its two-byte length prefix.
    fn write_end_header(&mut self) -> Result<()>;

    /// Writes an already encoded container: the length prefix and body
    /// returned by [`DsonReader::read_value_as_bytes`](crate::DsonReader::read_value_as_bytes).
    fn write_value_bytes(&mut self, name: Option<&K::Ref>, dson_type: DsonType, bytes: &[u8]) -> Result<()>;

    /// Stores caller data on the current frame, returning the previous value.
    fn attach(&mut self, value: Box<dyn Any + Send>) -> Option<Box<dyn Any + Send>>;

    fn attachment(&self) -> Option<&(dyn Any + Send)>;

    /// Pushes completed top-level values to the destination.
    fn flush(&mut self) -> Result<()>;

    /// Releases every frame; later calls fail with [`Error::Closed`].
    ///
    /// Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// A scalar on its way to a [`WriteSink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'v> {
    Int32(i32, WireType),
    Int64(i64, WireType),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(&'v str),
    Null,
    Binary(&'v [u8]),
    Pointer(&'v ObjectPtr),
    LitePointer(&'v ObjectLitePtr),
    DateTime(&'v ExtDateTime),
    Timestamp(&'v Timestamp),
}

impl Scalar<'_> {
    #[must_use]
    pub const fn dson_type(&self) -> DsonType {
        match self {
            Scalar::Int32(..) => DsonType::Int32,
            Scalar::Int64(..) => DsonType::Int64,
            Scalar::Float(_) => DsonType::Float,
            Scalar::Double(_) => DsonType::Double,
            Scalar::Bool(_) => DsonType::Bool,
            Scalar::String(_) => DsonType::String,
            Scalar::Null => DsonType::Null,
            Scalar::Binary(_) => DsonType::Binary,
            Scalar::Pointer(_) => DsonType::Pointer,
            Scalar::LitePointer(_) => DsonType::LitePointer,
            Scalar::DateTime(_) => DsonType::DateTime,
            Scalar::Timestamp(_) => DsonType::Timestamp,
        }
    }

    /// Low three bits of the tag.
    #[must_use]
    pub fn wire_bits(&self) -> u8 {
        match self {
            Scalar::Int32(_, wire_type) | Scalar::Int64(_, wire_type) => wire_type.bits(),
            Scalar::Float(v) => wire::float_wire_bits(*v),
            Scalar::Double(v) => wire::double_wire_bits(*v),
            Scalar::Bool(b) => u8::from(*b),
            Scalar::Pointer(ptr) => ptr.wire_bits(),
            Scalar::LitePointer(ptr) => ptr.wire_bits(),
            Scalar::DateTime(dt) => dt.enables & 0x07,
            _ => 0,
        }
    }

    #[must_use]
    pub fn to_value<K>(&self) -> DsonValue<K> {
        match *self {
            Scalar::Int32(v, _) => DsonValue::Int32(v),
            Scalar::Int64(v, _) => DsonValue::Int64(v),
            Scalar::Float(v) => DsonValue::Float(v),
            Scalar::Double(v) => DsonValue::Double(v),
            Scalar::Bool(v) => DsonValue::Bool(v),
            Scalar::String(v) => DsonValue::String(v.to_owned()),
            Scalar::Null => DsonValue::Null,
            Scalar::Binary(v) => DsonValue::Binary(v.to_vec()),
            Scalar::Pointer(v) => DsonValue::Pointer(v.clone()),
            Scalar::LitePointer(v) => DsonValue::LitePointer(v.clone()),
            Scalar::DateTime(v) => DsonValue::DateTime(*v),
            Scalar::Timestamp(v) => DsonValue::Timestamp(*v),
        }
    }
}

/// Byte or tree backend of a [`Writer`].
///
/// Names handed to a sink are already resolved: `Some` exactly when the value
/// must be written with a name.
pub trait WriteSink<K: FieldKey>: crate::sealed::Sealed {
    fn write_scalar(&mut self, ctx: &mut Context<K>, name: Option<&K::Ref>, value: Scalar<'_>) -> Result<()>;

    /// Opens `child` inside `parent`.
    fn start_container(
        &mut self,
        parent: &mut Context<K>,
        child: &mut Context<K>,
        name: Option<&K::Ref>,
    ) -> Result<()>;

    /// Completes `child`, whose frame has already been popped.
    fn end_container(&mut self, parent: &mut Context<K>, child: &mut Context<K>) -> Result<()>;

    fn write_value_bytes(
        &mut self,
        ctx: &mut Context<K>,
        name: Option<&K::Ref>,
        dson_type: DsonType,
        bytes: &[u8],
    ) -> Result<()>;

    /// Called after each complete top-level value.
    fn top_level_done(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Byte offset for diagnostics.
    fn position(&self) -> usize;

    fn close(&mut self, auto_close: bool) -> Result<()>;
}

enum FieldName<'n, K: FieldKey> {
    Anonymous,
    Given(&'n K::Ref),
    Pending(K),
}

impl<K: FieldKey> FieldName<'_, K> {
    fn get(&self) -> Option<&K::Ref> {
        match self {
            FieldName::Anonymous => None,
            FieldName::Given(name) => Some(*name),
            FieldName::Pending(key) => Some(key.key_ref()),
        }
    }
}

const HEADER_NOT_FIRST: &str = "a header must come before the other values of its container";

/// State machine shared by the binary and tree writers.
pub struct Writer<K: FieldKey, S: WriteSink<K>> {
    pub(crate) sink: S,
    pub(crate) stack: Vec<Context<K>>,
    pool: Arc<ContextPool<K>>,
    options: DsonOptions,
}

impl<K: FieldKey, S: WriteSink<K>> Writer<K, S> {
    /// Creates a writer over `sink` drawing frames from `pool`.
    pub fn with_sink(sink: S, options: DsonOptions, pool: Arc<ContextPool<K>>) -> Self {
        let mut top = pool.acquire();
        top.init(ContextType::TopLevel, DsonState::Initial);
        let mut stack = Vec::with_capacity(8);
        stack.push(top);
        Writer {
            sink,
            stack,
            pool,
            options,
        }
    }

    /// Number of containers currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    #[must_use]
    pub fn options(&self) -> &DsonOptions {
        &self.options
    }

    /// Validates a value of `dson_type` against the current frame and
    /// resolves the name it is written with.
    fn prepare<'n>(&mut self, name: Option<&'n K::Ref>, dson_type: DsonType) -> Result<FieldName<'n, K>> {
        let position = self.sink.position();
        let ctx = top_mut(&mut self.stack)?;
        match ctx.context_type {
            ContextType::TopLevel => {
                ctx.expect_state(&[DsonState::Initial, DsonState::Value])?;
                if !dson_type.is_container_or_header() {
                    return Err(Error::InvalidTopLevelType(dson_type));
                }
                Ok(FieldName::Anonymous)
            }
            ContextType::Array => {
                ctx.expect_state(&[DsonState::Value])?;
                if dson_type == DsonType::Header && ctx.written > 0 {
                    return Err(Error::invalid_format(position, HEADER_NOT_FIRST));
                }
                Ok(FieldName::Anonymous)
            }
            ContextType::Object | ContextType::Header if dson_type == DsonType::Header => {
                if ctx.context_type == ContextType::Header {
                    return Err(Error::invalid_format(
                        position,
                        "a header may not contain another header",
                    ));
                }
                ctx.expect_state(&[DsonState::Name])?;
                if ctx.written > 0 {
                    return Err(Error::invalid_format(position, HEADER_NOT_FIRST));
                }
                Ok(FieldName::Anonymous)
            }
            ContextType::Object | ContextType::Header => match ctx.state {
                DsonState::Name => match name {
                    Some(name) => Ok(FieldName::Given(name)),
                    None => Err(Error::invalid_state(&[DsonState::Value], DsonState::Name)),
                },
                DsonState::Value => {
                    if let (Some(pending), Some(name)) = (ctx.name.as_ref(), name) {
                        if pending.key_ref() != name {
                            return Err(Error::name_mismatch(pending, name));
                        }
                    }
                    ctx.name
                        .take()
                        .map(FieldName::Pending)
                        .ok_or_else(|| Error::invalid_state(&[DsonState::Name], DsonState::Value))
                }
                other => Err(Error::invalid_state(
                    &[DsonState::Name, DsonState::Value],
                    other,
                )),
            },
        }
    }

    fn finish_value(&mut self) -> Result<()> {
        let ctx = top_mut(&mut self.stack)?;
        ctx.name = None;
        ctx.written += 1;
        ctx.state = if ctx.context_type.is_like_object() {
            DsonState::Name
        } else {
            DsonState::Value
        };
        if ctx.context_type == ContextType::TopLevel {
            self.sink.top_level_done()?;
        }
        Ok(())
    }

    fn write_scalar(&mut self, name: Option<&K::Ref>, value: Scalar<'_>) -> Result<()> {
        let field = self.prepare(name, value.dson_type())?;
        let ctx = top_mut(&mut self.stack)?;
        self.sink.write_scalar(ctx, field.get(), value)?;
        self.finish_value()
    }

    fn write_start(&mut self, name: Option<&K::Ref>, container: ContextType) -> Result<()> {
        if self.stack.len() > self.options.recursion_limit {
            tracing::warn!(limit = self.options.recursion_limit, "recursion limit exceeded while writing");
            return Err(Error::recursion_limit(self.options.recursion_limit));
        }
        let dson_type = container.dson_type().unwrap_or(DsonType::Object);
        let field = self.prepare(name, dson_type)?;

        let mut child = self.pool.acquire();
        let state = if container.is_like_object() {
            DsonState::Name
        } else {
            DsonState::Value
        };
        child.init(container, state);
        child.dson_type = dson_type;
        let parent = top_mut(&mut self.stack)?;
        if let Err(err) = self.sink.start_container(parent, &mut child, field.get()) {
            self.pool.release(child);
            return Err(err);
        }
        self.stack.push(child);
        tracing::trace!(depth = self.depth(), context = ?container, "opened container");
        Ok(())
    }

    fn write_end(&mut self, container: ContextType) -> Result<()> {
        let expected = container.dson_type().unwrap_or(DsonType::Object);
        if self.stack.len() < 2 {
            return Err(Error::custom(format!("no open {} to end", expected)));
        }
        let ctx = top_mut(&mut self.stack)?;
        if ctx.context_type != container {
            let open = ctx.context_type.dson_type().unwrap_or(DsonType::EndOfObject);
            return Err(Error::type_mismatch(expected, open));
        }
        if ctx.context_type.is_like_object() {
            ctx.expect_state(&[DsonState::Name])?;
        }

        let mut child = self.stack.pop().ok_or(Error::Closed)?;
        let parent = top_mut(&mut self.stack)?;
        if let Err(err) = self.sink.end_container(parent, &mut child) {
            self.stack.push(child);
            return Err(err);
        }
        self.pool.release(child);
        tracing::trace!(depth = self.depth(), context = ?container, "closed container");
        self.finish_value()
    }

    fn release_frames(&mut self) -> usize {
        let released = self.stack.len();
        for ctx in self.stack.drain(..) {
            self.pool.release(ctx);
        }
        released
    }
}

impl<K: FieldKey, S: WriteSink<K>> DsonWriter<K> for Writer<K, S> {
    fn context_type(&self) -> ContextType {
        self.stack
            .last()
            .map_or(ContextType::TopLevel, |ctx| ctx.context_type)
    }

    fn state(&self) -> DsonState {
        self.stack
            .last()
            .map_or(DsonState::EndOfFile, |ctx| ctx.state)
    }

    fn write_name(&mut self, name: &K::Ref) -> Result<()> {
        let ctx = top_mut(&mut self.stack)?;
        if !ctx.context_type.is_like_object() {
            return Err(Error::custom(format!(
                "names are not written in a {:?} context",
                ctx.context_type
            )));
        }
        ctx.expect_state(&[DsonState::Name])?;
        ctx.name = Some(name.to_owned());
        ctx.state = DsonState::Value;
        Ok(())
    }

    fn write_int32(&mut self, name: Option<&K::Ref>, value: i32, wire_type: WireType) -> Result<()> {
        self.write_scalar(name, Scalar::Int32(value, wire_type))
    }

    fn write_int64(&mut self, name: Option<&K::Ref>, value: i64, wire_type: WireType) -> Result<()> {
        self.write_scalar(name, Scalar::Int64(value, wire_type))
    }

    fn write_float(&mut self, name: Option<&K::Ref>, value: f32) -> Result<()> {
        self.write_scalar(name, Scalar::Float(value))
    }

    fn write_double(&mut self, name: Option<&K::Ref>, value: f64) -> Result<()> {
        self.write_scalar(name, Scalar::Double(value))
    }

    fn write_bool(&mut self, name: Option<&K::Ref>, value: bool) -> Result<()> {
        self.write_scalar(name, Scalar::Bool(value))
    }

    fn write_string(&mut self, name: Option<&K::Ref>, value: &str) -> Result<()> {
        self.write_scalar(name, Scalar::String(value))
    }

    fn write_null(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.write_scalar(name, Scalar::Null)
    }

    fn write_binary(&mut self, name: Option<&K::Ref>, value: &[u8]) -> Result<()> {
        self.write_scalar(name, Scalar::Binary(value))
    }

    fn write_pointer(&mut self, name: Option<&K::Ref>, value: &ObjectPtr) -> Result<()> {
        self.write_scalar(name, Scalar::Pointer(value))
    }

    fn write_lite_pointer(&mut self, name: Option<&K::Ref>, value: &ObjectLitePtr) -> Result<()> {
        self.write_scalar(name, Scalar::LitePointer(value))
    }

    fn write_datetime(&mut self, name: Option<&K::Ref>, value: &ExtDateTime) -> Result<()> {
        self.write_scalar(name, Scalar::DateTime(value))
    }

    fn write_timestamp(&mut self, name: Option<&K::Ref>, value: &Timestamp) -> Result<()> {
        self.write_scalar(name, Scalar::Timestamp(value))
    }

    fn write_start_object(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.write_start(name, ContextType::Object)
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.write_end(ContextType::Object)
    }

    fn write_start_array(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.write_start(name, ContextType::Array)
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.write_end(ContextType::Array)
    }

    fn write_start_header(&mut self) -> Result<()> {
        self.write_start(None, ContextType::Header)
    }

    fn write_end_header(&mut self) -> Result<()> {
        self.write_end(ContextType::Header)
    }

    fn write_value_bytes(&mut self, name: Option<&K::Ref>, dson_type: DsonType, bytes: &[u8]) -> Result<()> {
        if !dson_type.is_container_or_header() {
            return Err(Error::InvalidTopLevelType(dson_type));
        }
        let field = self.prepare(name, dson_type)?;
        let ctx = top_mut(&mut self.stack)?;
        self.sink.write_value_bytes(ctx, field.get(), dson_type, bytes)?;
        self.finish_value()
    }

    fn attach(&mut self, value: Box<dyn Any + Send>) -> Option<Box<dyn Any + Send>> {
        self.stack
            .last_mut()
            .and_then(|ctx| ctx.attachment.replace(value))
    }

    fn attachment(&self) -> Option<&(dyn Any + Send)> {
        self.stack
            .last()
            .and_then(|ctx| ctx.attachment.as_deref())
    }

    fn flush(&mut self) -> Result<()> {
        if self.stack.is_empty() {
            return Err(Error::Closed);
        }
        self.sink.flush()
    }

    fn close(&mut self) -> Result<()> {
        if self.stack.is_empty() {
            return Ok(());
        }
        let open = self.depth();
        if open > 0 {
            tracing::warn!(open, "writer closed with open containers");
        }
        let released = self.release_frames();
        let result = self.sink.close(self.options.auto_close);
        tracing::debug!(frames = released, "writer closed");
        result
    }
}

impl<K: FieldKey, S: WriteSink<K>> Drop for Writer<K, S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "failed to close writer");
        }
    }
}

/// Writes `value` and everything below it.
///
/// Integers use [`WireType::Varint`]. Non-empty headers of objects and arrays
/// are written before their contents.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, write_value, DsonTreeWriter, DsonValue};
///
/// let value: DsonValue = dson!({ "id": 7, "tags": ["a", "b"] });
/// let mut writer = DsonTreeWriter::new();
/// write_value(&mut writer, None, &value).unwrap();
/// assert_eq!(writer.into_values(), vec![value]);
/// ```
pub fn write_value<K, W>(writer: &mut W, name: Option<&K::Ref>, value: &DsonValue<K>) -> Result<()>
where
    K: FieldKey,
    W: DsonWriter<K> + ?Sized,
{
    match value {
        DsonValue::Int32(v) => writer.write_int32(name, *v, WireType::Varint),
        DsonValue::Int64(v) => writer.write_int64(name, *v, WireType::Varint),
        DsonValue::Float(v) => writer.write_float(name, *v),
        DsonValue::Double(v) => writer.write_double(name, *v),
        DsonValue::Bool(v) => writer.write_bool(name, *v),
        DsonValue::String(v) => writer.write_string(name, v),
        DsonValue::Null => writer.write_null(name),
        DsonValue::Binary(v) => writer.write_binary(name, v),
        DsonValue::Pointer(v) => writer.write_pointer(name, v),
        DsonValue::LitePointer(v) => writer.write_lite_pointer(name, v),
        DsonValue::DateTime(v) => writer.write_datetime(name, v),
        DsonValue::Timestamp(v) => writer.write_timestamp(name, v),
        DsonValue::Header(header) => write_header(writer, header),
        DsonValue::Array(array) => write_array(writer, name, array),
        DsonValue::Object(object) => write_object(writer, name, object),
    }
}

fn write_header<K, W>(writer: &mut W, header: &DsonHeader<K>) -> Result<()>
where
    K: FieldKey,
    W: DsonWriter<K> + ?Sized,
{
    writer.write_start_header()?;
    for (key, value) in header.iter() {
        write_value(writer, Some(key.key_ref()), value)?;
    }
    writer.write_end_header()
}

fn write_array<K, W>(writer: &mut W, name: Option<&K::Ref>, array: &DsonArray<K>) -> Result<()>
where
    K: FieldKey,
    W: DsonWriter<K> + ?Sized,
{
    writer.write_start_array(name)?;
    if !array.header.is_empty() {
        write_header(writer, &array.header)?;
    }
    for value in array.iter() {
        if value.is_header() {
            return Err(Error::custom("array elements may not be headers"));
        }
        write_value(writer, None, value)?;
    }
    writer.write_end_array()
}

fn write_object<K, W>(writer: &mut W, name: Option<&K::Ref>, object: &DsonObject<K>) -> Result<()>
where
    K: FieldKey,
    W: DsonWriter<K> + ?Sized,
{
    writer.write_start_object(name)?;
    if !object.header.is_empty() {
        write_header(writer, &object.header)?;
    }
    for (key, value) in object.iter() {
        if value.is_header() {
            return Err(Error::custom(format!("field {:?} holds a header", key)));
        }
        write_value(writer, Some(key.key_ref()), value)?;
    }
    writer.write_end_object()
}

/// Writes each value at the top level.
pub fn write_top_level_values<K, W>(writer: &mut W, values: &[DsonValue<K>]) -> Result<()>
where
    K: FieldKey,
    W: DsonWriter<K> + ?Sized,
{
    for value in values {
        write_value(writer, None, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_wire_bits() {
        assert_eq!(Scalar::Int32(5, WireType::Sint).wire_bits(), 2);
        assert_eq!(Scalar::Float(1.0).wire_bits(), 2);
        assert_eq!(Scalar::Double(0.1).wire_bits(), 0);
        assert_eq!(Scalar::Bool(true).wire_bits(), 1);
        let ptr = ObjectPtr::new("id").with_namespace("ns").with_policy(3);
        assert_eq!(Scalar::Pointer(&ptr).wire_bits(), 0b101);
        assert_eq!(Scalar::String("x").wire_bits(), 0);
    }

    #[test]
    fn test_scalar_to_value() {
        let value: DsonValue = Scalar::Binary(&[1, 2]).to_value();
        assert_eq!(value, DsonValue::Binary(vec![1, 2]));
        assert_eq!(Scalar::Null.dson_type(), DsonType::Null);
    }
}
