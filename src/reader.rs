//! The reader state machine.
//!
//! [`DsonReader`] is the contract the object-codec layer drives: read a tag,
//! read a name, read a value or descend into a container, and repeat. Every
//! concrete reader is a [`Reader`] over a [`ReadSource`]:
//!
//! - [`BinarySource`](crate::binary_reader::BinarySource) walks an encoded
//!   byte slice strictly forward;
//! - [`TreeSource`](crate::tree_reader::TreeSource) replays materialized
//!   [`DsonValue`] trees and allows random access to object fields.
//!
//! The state machine below is shared, so both behave identically from the
//! caller's point of view.
//!
//! ## States
//!
//! ```text
//! INITIAL -> TYPE -> NAME -> VALUE -> TYPE ...
//!                 \_______/
//!          (arrays, headers and the top level skip NAME)
//! ```
//!
//! At the end of a container `read_type` returns
//! [`DsonType::EndOfObject`] and the frame moves to `WAIT_END_OBJECT`
//! (nested) or `END_OF_FILE` (top level).
//!
//! ## Examples
//!
//! ```rust
//! use dson::{dson, to_vec, DsonBinaryReader, DsonReader, DsonType, DsonValue};
//!
//! let value: DsonValue = dson!({ "x": 1, "y": "two" });
//! let bytes = to_vec(&[value]).unwrap();
//!
//! let mut reader = DsonBinaryReader::new(&bytes);
//! assert_eq!(reader.read_type().unwrap(), DsonType::Object);
//! reader.read_start_object(None).unwrap();
//! assert_eq!(reader.read_int32(Some("x")).unwrap(), 1);
//! assert_eq!(reader.read_string(Some("y")).unwrap(), "two");
//! assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
//! reader.read_end_object().unwrap();
//! assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
//! ```

use crate::context::{Context, ContextPool, ContextType, DsonState};
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::types::DsonType;
use crate::value::{
    DsonArray, DsonHeader, DsonObject, DsonValue, ExtDateTime, ObjectLitePtr, ObjectPtr,
    Timestamp,
};
use crate::{Error, Result};
use std::any::Any;
use std::sync::Arc;

/// Pull-based reading contract shared by every reader.
///
/// Scalar reads and `read_start_*` accept an optional field name. From the
/// `TYPE` state they read the tag first; from the `NAME` state they consume the
/// name, and a given name must equal the one present.
pub trait DsonReader<K: FieldKey> {
    /// Kind of the innermost open container.
    fn context_type(&self) -> ContextType;

    /// Type of the value at the cursor, as returned by the last `read_type`.
    fn current_type(&self) -> DsonType;

    /// Name of the value at the cursor, once it has been read.
    fn current_name(&self) -> Option<&K>;

    fn state(&self) -> DsonState;

    /// Reads the next tag.
    ///
    /// Returns [`DsonType::EndOfObject`] when the current container, or the
    /// whole input at the top level, is exhausted.
    fn read_type(&mut self) -> Result<DsonType>;

    /// Returns the next tag without consuming it.
    fn peek_type(&mut self) -> Result<DsonType>;

    fn read_name(&mut self) -> Result<K>;

    fn skip_name(&mut self) -> Result<()>;

    fn read_int32(&mut self, name: Option<&K::Ref>) -> Result<i32>;
    fn read_int64(&mut self, name: Option<&K::Ref>) -> Result<i64>;
    fn read_float(&mut self, name: Option<&K::Ref>) -> Result<f32>;
    fn read_double(&mut self, name: Option<&K::Ref>) -> Result<f64>;
    fn read_bool(&mut self, name: Option<&K::Ref>) -> Result<bool>;
    fn read_string(&mut self, name: Option<&K::Ref>) -> Result<String>;
    fn read_null(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn read_binary(&mut self, name: Option<&K::Ref>) -> Result<Vec<u8>>;
    fn read_pointer(&mut self, name: Option<&K::Ref>) -> Result<ObjectPtr>;
    fn read_lite_pointer(&mut self, name: Option<&K::Ref>) -> Result<ObjectLitePtr>;
    fn read_datetime(&mut self, name: Option<&K::Ref>) -> Result<ExtDateTime>;
    fn read_timestamp(&mut self, name: Option<&K::Ref>) -> Result<Timestamp>;

    /// Descends into an object.
    ///
    /// Also accepted from `WAIT_START_OBJECT`, re-entering a container
    /// previously handed back with [`back_to_wait_start`](Self::back_to_wait_start).
    fn read_start_object(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn read_end_object(&mut self) -> Result<()>;
    fn read_start_array(&mut self, name: Option<&K::Ref>) -> Result<()>;
    fn read_end_array(&mut self) -> Result<()>;
    fn read_start_header(&mut self) -> Result<()>;
    fn read_end_header(&mut self) -> Result<()>;

    /// Rewinds a freshly entered container to `WAIT_START_OBJECT`.
    fn back_to_wait_start(&mut self) -> Result<()>;

    /// Skips the value at the cursor without materializing it.
    fn skip_value(&mut self) -> Result<()>;

    /// Skips the rest of the current container.
    fn skip_to_end_of_object(&mut self) -> Result<()>;

    /// Returns the encoded container at the cursor (length prefix and body,
    /// without its tag), for passthrough to
    /// [`DsonWriter::write_value_bytes`](crate::DsonWriter::write_value_bytes).
    fn read_value_as_bytes(&mut self, name: Option<&K::Ref>) -> Result<Vec<u8>>;

    /// Stores caller data on the current frame, returning the previous value.
    fn attach(&mut self, value: Box<dyn Any + Send>) -> Option<Box<dyn Any + Send>>;

    fn attachment(&self) -> Option<&(dyn Any + Send)>;

    /// Releases every frame; later calls fail with [`Error::Closed`].
    fn close(&mut self);
}

/// Byte or tree backend of a [`Reader`].
///
/// The reader owns the state machine; a source only moves its cursor and
/// decodes what sits under it.
pub trait ReadSource<K: FieldKey>: crate::sealed::Sealed {
    /// Prepares the top-level frame.
    fn open(&mut self, top: &mut Context<K>);

    /// Consumes the next tag of `ctx`, `None` at the end of the container.
    fn read_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>>;

    /// Like [`read_tag`](Self::read_tag) without moving the cursor.
    fn peek_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>>;

    fn read_name(&mut self, ctx: &mut Context<K>) -> Result<K>;

    fn skip_name(&mut self, ctx: &mut Context<K>) -> Result<()>;

    /// Decodes the scalar whose tag was just read.
    fn read_scalar(&mut self, ctx: &mut Context<K>) -> Result<DsonValue<K>>;

    fn skip_value(&mut self, ctx: &mut Context<K>) -> Result<()>;

    /// Encoded length prefix and body of the container whose tag was just read.
    fn read_value_bytes(&mut self, ctx: &mut Context<K>) -> Result<Vec<u8>>;

    /// Positions `child` on the body of the container whose tag `parent` just read.
    fn enter(&mut self, parent: &mut Context<K>, child: &mut Context<K>) -> Result<()>;

    /// Verifies that `child` was consumed exactly.
    fn exit(&mut self, child: &mut Context<K>) -> Result<()>;

    fn skip_to_end(&mut self, ctx: &mut Context<K>) -> Result<()>;

    /// Moves the named field of an object-like frame to the cursor.
    ///
    /// `None` means the source reads strictly in order.
    fn seek(&mut self, _ctx: &mut Context<K>, _name: &K::Ref) -> Result<Option<bool>> {
        Ok(None)
    }

    /// Byte offset for diagnostics.
    fn position(&self) -> usize;

    fn close(&mut self, auto_close: bool);
}

/// State machine shared by the binary and tree readers.
pub struct Reader<K: FieldKey, S: ReadSource<K>> {
    pub(crate) source: S,
    pub(crate) stack: Vec<Context<K>>,
    pool: Arc<ContextPool<K>>,
    options: DsonOptions,
}

pub(crate) fn top_mut<K>(stack: &mut [Context<K>]) -> Result<&mut Context<K>> {
    stack.last_mut().ok_or(Error::Closed)
}

impl<K: FieldKey, S: ReadSource<K>> Reader<K, S> {
    /// Creates a reader over `source` drawing frames from `pool`.
    pub fn with_source(mut source: S, options: DsonOptions, pool: Arc<ContextPool<K>>) -> Self {
        let mut top = pool.acquire();
        top.init(ContextType::TopLevel, DsonState::Initial);
        source.open(&mut top);
        let mut stack = Vec::with_capacity(8);
        stack.push(top);
        Reader {
            source,
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

    fn advance_to_value(&mut self, name: Option<&K::Ref>) -> Result<()> {
        if let Some(wanted) = name {
            let ctx = top_mut(&mut self.stack)?;
            if ctx.context_type.is_like_object()
                && matches!(ctx.state, DsonState::Type | DsonState::Name)
                && self.source.seek(ctx, wanted)? == Some(false)
            {
                return Err(Error::field_not_found(wanted));
            }
        }

        if matches!(
            top_mut(&mut self.stack)?.state,
            DsonState::Initial | DsonState::Type
        ) {
            self.read_type()?;
        }

        let ctx = top_mut(&mut self.stack)?;
        if ctx.state == DsonState::Name {
            let found = self.source.read_name(ctx)?;
            if let Some(wanted) = name {
                if found.key_ref() != wanted {
                    return Err(Error::name_mismatch(wanted, &found));
                }
            }
            ctx.name = Some(found);
            ctx.state = DsonState::Value;
        } else if let (DsonState::Value, Some(wanted), Some(current)) =
            (ctx.state, name, ctx.name.as_ref())
        {
            if current.key_ref() != wanted {
                return Err(Error::name_mismatch(wanted, current));
            }
        }
        ctx.expect_state(&[DsonState::Value])
    }

    fn read_scalar_of(&mut self, name: Option<&K::Ref>, expected: DsonType) -> Result<DsonValue<K>> {
        self.advance_to_value(name)?;
        let ctx = top_mut(&mut self.stack)?;
        if ctx.dson_type != expected {
            return Err(Error::type_mismatch(expected, ctx.dson_type));
        }
        let value = self.source.read_scalar(ctx)?;
        ctx.state = DsonState::Type;
        Ok(value)
    }

    fn read_start(&mut self, name: Option<&K::Ref>, container: ContextType) -> Result<()> {
        let expected = container.dson_type().unwrap_or(DsonType::Object);
        {
            let ctx = top_mut(&mut self.stack)?;
            if ctx.state == DsonState::WaitStartObject {
                if ctx.context_type != container {
                    return Err(Error::type_mismatch(expected, ctx.dson_type));
                }
                ctx.state = DsonState::Type;
                return Ok(());
            }
        }

        self.advance_to_value(name)?;
        if self.stack.len() > self.options.recursion_limit {
            tracing::warn!(limit = self.options.recursion_limit, "recursion limit exceeded while reading");
            return Err(Error::recursion_limit(self.options.recursion_limit));
        }
        let parent = top_mut(&mut self.stack)?;
        if parent.dson_type != expected {
            return Err(Error::type_mismatch(expected, parent.dson_type));
        }

        let mut child = self.pool.acquire();
        child.init(container, DsonState::Type);
        if let Err(err) = self.source.enter(parent, &mut child) {
            self.pool.release(child);
            return Err(err);
        }
        self.stack.push(child);
        tracing::trace!(depth = self.depth(), context = ?container, "entered container");
        Ok(())
    }

    fn read_end(&mut self, container: ContextType) -> Result<()> {
        let expected = container.dson_type().unwrap_or(DsonType::Object);
        if self.stack.len() < 2 {
            return Err(Error::custom(format!("no open {} to end", expected)));
        }
        let ctx = top_mut(&mut self.stack)?;
        if ctx.context_type != container {
            let open = ctx.context_type.dson_type().unwrap_or(DsonType::EndOfObject);
            return Err(Error::type_mismatch(expected, open));
        }
        ctx.expect_state(&[DsonState::WaitEndObject])?;
        self.source.exit(ctx)?;

        if let Some(child) = self.stack.pop() {
            self.pool.release(child);
        }
        let parent = top_mut(&mut self.stack)?;
        parent.dson_type = expected;
        parent.state = DsonState::Type;
        tracing::trace!(depth = self.depth(), context = ?container, "left container");
        Ok(())
    }

    fn release_frames(&mut self) -> usize {
        let released = self.stack.len();
        for ctx in self.stack.drain(..) {
            self.pool.release(ctx);
        }
        released
    }
}

impl<K: FieldKey, S: ReadSource<K>> DsonReader<K> for Reader<K, S> {
    fn context_type(&self) -> ContextType {
        self.stack
            .last()
            .map_or(ContextType::TopLevel, |ctx| ctx.context_type)
    }

    fn current_type(&self) -> DsonType {
        self.stack
            .last()
            .map_or(DsonType::EndOfObject, |ctx| ctx.dson_type)
    }

    fn current_name(&self) -> Option<&K> {
        self.stack.last().and_then(|ctx| ctx.name.as_ref())
    }

    fn state(&self) -> DsonState {
        self.stack
            .last()
            .map_or(DsonState::EndOfFile, |ctx| ctx.state)
    }

    fn read_type(&mut self) -> Result<DsonType> {
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[DsonState::Initial, DsonState::Type])?;
        ctx.name = None;

        let (dson_type, wire_bits) = match self.source.read_tag(ctx)? {
            Some(tag) => tag,
            None => {
                ctx.dson_type = DsonType::EndOfObject;
                ctx.state = if ctx.context_type == ContextType::TopLevel {
                    DsonState::EndOfFile
                } else {
                    DsonState::WaitEndObject
                };
                return Ok(DsonType::EndOfObject);
            }
        };

        match ctx.context_type {
            ContextType::TopLevel if !dson_type.is_container_or_header() => {
                return Err(Error::InvalidTopLevelType(dson_type));
            }
            ContextType::Header if dson_type == DsonType::Header => {
                return Err(Error::invalid_format(
                    self.source.position(),
                    "a header may not contain another header",
                ));
            }
            _ => {}
        }

        ctx.dson_type = dson_type;
        ctx.wire_bits = wire_bits;
        ctx.state = if dson_type != DsonType::Header && ctx.context_type.is_like_object() {
            DsonState::Name
        } else {
            DsonState::Value
        };
        Ok(dson_type)
    }

    fn peek_type(&mut self) -> Result<DsonType> {
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[DsonState::Initial, DsonState::Type])?;
        Ok(self
            .source
            .peek_tag(ctx)?
            .map_or(DsonType::EndOfObject, |(dson_type, _)| dson_type))
    }

    fn read_name(&mut self) -> Result<K> {
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[DsonState::Name])?;
        let name = self.source.read_name(ctx)?;
        ctx.name = Some(name.clone());
        ctx.state = DsonState::Value;
        Ok(name)
    }

    fn skip_name(&mut self) -> Result<()> {
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[DsonState::Name])?;
        self.source.skip_name(ctx)?;
        ctx.state = DsonState::Value;
        Ok(())
    }

    fn read_int32(&mut self, name: Option<&K::Ref>) -> Result<i32> {
        i32::try_from(self.read_scalar_of(name, DsonType::Int32)?)
    }

    fn read_int64(&mut self, name: Option<&K::Ref>) -> Result<i64> {
        i64::try_from(self.read_scalar_of(name, DsonType::Int64)?)
    }

    fn read_float(&mut self, name: Option<&K::Ref>) -> Result<f32> {
        match self.read_scalar_of(name, DsonType::Float)? {
            DsonValue::Float(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Float, other.dson_type())),
        }
    }

    fn read_double(&mut self, name: Option<&K::Ref>) -> Result<f64> {
        f64::try_from(self.read_scalar_of(name, DsonType::Double)?)
    }

    fn read_bool(&mut self, name: Option<&K::Ref>) -> Result<bool> {
        bool::try_from(self.read_scalar_of(name, DsonType::Bool)?)
    }

    fn read_string(&mut self, name: Option<&K::Ref>) -> Result<String> {
        String::try_from(self.read_scalar_of(name, DsonType::String)?)
    }

    fn read_null(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.read_scalar_of(name, DsonType::Null).map(|_| ())
    }

    fn read_binary(&mut self, name: Option<&K::Ref>) -> Result<Vec<u8>> {
        match self.read_scalar_of(name, DsonType::Binary)? {
            DsonValue::Binary(bytes) => Ok(bytes),
            other => Err(Error::type_mismatch(DsonType::Binary, other.dson_type())),
        }
    }

    fn read_pointer(&mut self, name: Option<&K::Ref>) -> Result<ObjectPtr> {
        match self.read_scalar_of(name, DsonType::Pointer)? {
            DsonValue::Pointer(ptr) => Ok(ptr),
            other => Err(Error::type_mismatch(DsonType::Pointer, other.dson_type())),
        }
    }

    fn read_lite_pointer(&mut self, name: Option<&K::Ref>) -> Result<ObjectLitePtr> {
        match self.read_scalar_of(name, DsonType::LitePointer)? {
            DsonValue::LitePointer(ptr) => Ok(ptr),
            other => Err(Error::type_mismatch(DsonType::LitePointer, other.dson_type())),
        }
    }

    fn read_datetime(&mut self, name: Option<&K::Ref>) -> Result<ExtDateTime> {
        match self.read_scalar_of(name, DsonType::DateTime)? {
            DsonValue::DateTime(dt) => Ok(dt),
            other => Err(Error::type_mismatch(DsonType::DateTime, other.dson_type())),
        }
    }

    fn read_timestamp(&mut self, name: Option<&K::Ref>) -> Result<Timestamp> {
        match self.read_scalar_of(name, DsonType::Timestamp)? {
            DsonValue::Timestamp(ts) => Ok(ts),
            other => Err(Error::type_mismatch(DsonType::Timestamp, other.dson_type())),
        }
    }

    fn read_start_object(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.read_start(name, ContextType::Object)
    }

    fn read_end_object(&mut self) -> Result<()> {
        self.read_end(ContextType::Object)
    }

    fn read_start_array(&mut self, name: Option<&K::Ref>) -> Result<()> {
        self.read_start(name, ContextType::Array)
    }

    fn read_end_array(&mut self) -> Result<()> {
        self.read_end(ContextType::Array)
    }

    fn read_start_header(&mut self) -> Result<()> {
        self.read_start(None, ContextType::Header)
    }

    fn read_end_header(&mut self) -> Result<()> {
        self.read_end(ContextType::Header)
    }

    fn back_to_wait_start(&mut self) -> Result<()> {
        let nested = self.stack.len() > 1;
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[DsonState::Type])?;
        if !nested {
            return Err(Error::custom("back_to_wait_start requires an open container"));
        }
        ctx.state = DsonState::WaitStartObject;
        Ok(())
    }

    fn skip_value(&mut self) -> Result<()> {
        self.advance_to_value(None)?;
        let ctx = top_mut(&mut self.stack)?;
        self.source.skip_value(ctx)?;
        ctx.state = DsonState::Type;
        Ok(())
    }

    fn skip_to_end_of_object(&mut self) -> Result<()> {
        let nested = self.stack.len() > 1;
        let ctx = top_mut(&mut self.stack)?;
        ctx.expect_state(&[
            DsonState::Type,
            DsonState::Name,
            DsonState::Value,
            DsonState::WaitEndObject,
        ])?;
        if !nested {
            return Err(Error::custom("skip_to_end_of_object requires an open container"));
        }
        self.source.skip_to_end(ctx)?;
        ctx.name = None;
        ctx.dson_type = DsonType::EndOfObject;
        ctx.state = DsonState::WaitEndObject;
        Ok(())
    }

    fn read_value_as_bytes(&mut self, name: Option<&K::Ref>) -> Result<Vec<u8>> {
        self.advance_to_value(name)?;
        let ctx = top_mut(&mut self.stack)?;
        if !ctx.dson_type.is_container_or_header() {
            return Err(Error::InvalidTopLevelType(ctx.dson_type));
        }
        let bytes = self.source.read_value_bytes(ctx)?;
        ctx.state = DsonState::Type;
        Ok(bytes)
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

    fn close(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        let released = self.release_frames();
        self.source.close(self.options.auto_close);
        tracing::debug!(frames = released, "reader closed");
    }
}

impl<K: FieldKey, S: ReadSource<K>> Drop for Reader<K, S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reads the value at the cursor, descending into containers.
///
/// Reads the tag and the name first if the reader has not done so yet. A
/// header found inside an object or array is stored in its header slot.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, read_value, to_vec, DsonBinaryReader, DsonValue};
///
/// let value: DsonValue = dson!([1, "a", null]);
/// let bytes = to_vec(&[value.clone()]).unwrap();
///
/// let mut reader = DsonBinaryReader::new(&bytes);
/// assert_eq!(read_value(&mut reader).unwrap(), value);
/// ```
pub fn read_value<K, R>(reader: &mut R) -> Result<DsonValue<K>>
where
    K: FieldKey,
    R: DsonReader<K> + ?Sized,
{
    match reader.state() {
        DsonState::Initial | DsonState::Type => {
            reader.read_type()?;
        }
        _ => {}
    }
    if reader.state() == DsonState::Name {
        reader.skip_name()?;
    }

    let value = match reader.current_type() {
        DsonType::Int32 => DsonValue::Int32(reader.read_int32(None)?),
        DsonType::Int64 => DsonValue::Int64(reader.read_int64(None)?),
        DsonType::Float => DsonValue::Float(reader.read_float(None)?),
        DsonType::Double => DsonValue::Double(reader.read_double(None)?),
        DsonType::Bool => DsonValue::Bool(reader.read_bool(None)?),
        DsonType::String => DsonValue::String(reader.read_string(None)?),
        DsonType::Null => {
            reader.read_null(None)?;
            DsonValue::Null
        }
        DsonType::Binary => DsonValue::Binary(reader.read_binary(None)?),
        DsonType::Pointer => DsonValue::Pointer(reader.read_pointer(None)?),
        DsonType::LitePointer => DsonValue::LitePointer(reader.read_lite_pointer(None)?),
        DsonType::DateTime => DsonValue::DateTime(reader.read_datetime(None)?),
        DsonType::Timestamp => DsonValue::Timestamp(reader.read_timestamp(None)?),
        DsonType::Header => {
            reader.read_start_header()?;
            let mut header = DsonHeader::new();
            while reader.read_type()? != DsonType::EndOfObject {
                let name = reader.read_name()?;
                let value = read_value(reader)?;
                header.insert(name, value)?;
            }
            reader.read_end_header()?;
            DsonValue::Header(header)
        }
        DsonType::Array => {
            reader.read_start_array(None)?;
            let mut array = DsonArray::new();
            loop {
                match reader.read_type()? {
                    DsonType::EndOfObject => break,
                    DsonType::Header => {
                        if let DsonValue::Header(header) = read_value(reader)? {
                            array.header = header;
                        }
                    }
                    _ => array.push(read_value(reader)?),
                }
            }
            reader.read_end_array()?;
            DsonValue::Array(array)
        }
        DsonType::Object => {
            reader.read_start_object(None)?;
            let mut object = DsonObject::new();
            loop {
                match reader.read_type()? {
                    DsonType::EndOfObject => break,
                    DsonType::Header => {
                        if let DsonValue::Header(header) = read_value(reader)? {
                            object.header = header;
                        }
                    }
                    _ => {
                        let name = reader.read_name()?;
                        let value = read_value(reader)?;
                        object.insert(name, value);
                    }
                }
            }
            reader.read_end_object()?;
            DsonValue::Object(object)
        }
        DsonType::EndOfObject => {
            return Err(Error::invalid_state(&[DsonState::Value], reader.state()));
        }
    };
    Ok(value)
}

/// Reads every remaining top-level value.
pub fn read_top_level_values<K, R>(reader: &mut R) -> Result<Vec<DsonValue<K>>>
where
    K: FieldKey,
    R: DsonReader<K> + ?Sized,
{
    let mut values = Vec::new();
    while reader.read_type()? != DsonType::EndOfObject {
        values.push(read_value(reader)?);
    }
    Ok(values)
}
