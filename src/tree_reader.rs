//! Buffered reader over materialized value trees.
//!
//! Values are replayed through the same [`DsonReader`] contract as the
//! sequential reader. Because a whole container is in memory, object fields
//! may be requested in any order: each frame keeps its remaining entries in a
//! queue, and naming a field that is not at the front moves it there. Reading
//! in declaration order never moves anything.
//!
//! A reader built from bytes keeps nested containers encoded until they are
//! entered. Passthrough with `read_value_as_bytes` then returns the original
//! bytes, and the read sequence matches the sequential reader's, explicit
//! empty headers included.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{dson, to_vec, DsonReader, DsonTreeReader, DsonValue};
//!
//! let value: DsonValue = dson!({ "x": 1, "y": 2 });
//! let bytes = to_vec(&[value]).unwrap();
//!
//! let mut reader = DsonTreeReader::from_bytes(&bytes, Default::default()).unwrap();
//! reader.read_start_object(None).unwrap();
//! assert_eq!(reader.read_int32(Some("y")).unwrap(), 2);
//! assert_eq!(reader.read_int32(Some("x")).unwrap(), 1);
//! ```

use crate::binary_reader::scan_entries;
use crate::context::{Context, ContextType, Cursor, DsonState, Entries, Entry, Node};
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::reader::{top_mut, DsonReader, ReadSource, Reader};
use crate::types::{DsonType, FieldNumber};
use crate::value::DsonValue;
use crate::{binary_writer, wire, Error, Result};
use std::mem;
use std::sync::Arc;

/// Buffered reader over document-style values.
pub type DsonTreeReader = Reader<String, TreeSource<String>>;
/// Buffered reader over lite-style values.
pub type DsonLiteTreeReader = Reader<FieldNumber, TreeSource<FieldNumber>>;

/// In-memory backend of the buffered reader.
#[derive(Debug)]
pub struct TreeSource<K> {
    pending: Vec<Entry<K>>,
    options: DsonOptions,
}

impl<K> TreeSource<K> {
    /// Replays `values` as top-level values.
    ///
    /// `options` bound the writer used when a value is requested as bytes.
    /// Empty headers have nothing to replay and are not reported.
    #[must_use]
    pub fn new(values: Vec<DsonValue<K>>, options: DsonOptions) -> Self {
        let pending = values
            .into_iter()
            .map(|value| Entry::new(None, Node::Value(value)))
            .collect();
        TreeSource { pending, options }
    }
}

impl<K> crate::sealed::Sealed for TreeSource<K> {}

fn position_of<K: FieldKey>(items: &[Entry<K>], name: &K::Ref) -> Option<usize> {
    items
        .iter()
        .position(|entry| entry.name.as_ref().map(FieldKey::key_ref) == Some(name))
}

fn take_current<K>(ctx: &mut Context<K>) -> Result<Node<K>> {
    let entry = ctx.entries_mut()?.current_mut()?;
    Ok(mem::take(&mut entry.node))
}

fn push_children<K>(entries: &mut Entries<K>, value: DsonValue<K>) -> Result<()> {
    match value {
        DsonValue::Object(object) => {
            if !object.header.is_empty() {
                entries
                    .items
                    .push(Entry::new(None, Node::Value(DsonValue::Header(object.header))));
            }
            entries.items.extend(
                object
                    .fields
                    .into_iter()
                    .map(|(k, v)| Entry::new(Some(k), Node::Value(v))),
            );
        }
        DsonValue::Array(array) => {
            if !array.header.is_empty() {
                entries
                    .items
                    .push(Entry::new(None, Node::Value(DsonValue::Header(array.header))));
            }
            entries
                .items
                .extend(array.values.into_iter().map(|v| Entry::new(None, Node::Value(v))));
        }
        DsonValue::Header(header) => {
            entries.items.extend(
                header
                    .into_fields()
                    .into_iter()
                    .map(|(k, v)| Entry::new(Some(k), Node::Value(v))),
            );
        }
        other => {
            return Err(Error::custom(format!("{} is not a container", other.dson_type())));
        }
    }
    Ok(())
}

impl<K: FieldKey> ReadSource<K> for TreeSource<K> {
    fn open(&mut self, top: &mut Context<K>) {
        let mut entries = top.take_entries();
        entries.items.append(&mut self.pending);
        top.cursor = Cursor::Entries(entries);
    }

    fn read_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>> {
        let entries = ctx.entries_mut()?;
        match entries.items.get(entries.next) {
            Some(entry) => {
                let tag = entry.node.tag();
                entries.next += 1;
                Ok(Some(tag))
            }
            None => Ok(None),
        }
    }

    fn peek_tag(&mut self, ctx: &mut Context<K>) -> Result<Option<(DsonType, u8)>> {
        ctx.entries_mut()?.mark();
        let tag = self.read_tag(ctx);
        ctx.entries_mut()?.reset();
        tag
    }

    fn read_name(&mut self, ctx: &mut Context<K>) -> Result<K> {
        let entry = ctx.entries_mut()?.current_mut()?;
        entry
            .name
            .clone()
            .ok_or_else(|| Error::custom("buffered entry has no field name"))
    }

    fn skip_name(&mut self, _ctx: &mut Context<K>) -> Result<()> {
        Ok(())
    }

    fn read_scalar(&mut self, ctx: &mut Context<K>) -> Result<DsonValue<K>> {
        match take_current(ctx)? {
            Node::Value(value) => Ok(value),
            Node::Encoded { dson_type, .. } => {
                Err(Error::custom(format!("{} is not a scalar type", dson_type)))
            }
        }
    }

    fn skip_value(&mut self, ctx: &mut Context<K>) -> Result<()> {
        take_current(ctx).map(drop)
    }

    fn read_value_bytes(&mut self, ctx: &mut Context<K>) -> Result<Vec<u8>> {
        match take_current(ctx)? {
            Node::Encoded {
                bytes, start, end, ..
            } => Ok(bytes[start..end].to_vec()),
            Node::Value(value) => binary_writer::encode_container(&value, &self.options),
        }
    }

    fn enter(&mut self, parent: &mut Context<K>, child: &mut Context<K>) -> Result<()> {
        let node = take_current(parent)?;
        let mut entries: Entries<K> = child.take_entries();
        match node {
            Node::Value(value) => push_children(&mut entries, value)?,
            Node::Encoded {
                dson_type,
                bytes,
                start,
                end,
            } => {
                let body = start + wire::prefix_size(dson_type);
                scan_entries(&bytes, child.context_type, body, end, &mut entries.items)?;
            }
        }
        child.cursor = Cursor::Entries(entries);
        Ok(())
    }

    fn exit(&mut self, _child: &mut Context<K>) -> Result<()> {
        Ok(())
    }

    fn skip_to_end(&mut self, ctx: &mut Context<K>) -> Result<()> {
        let entries = ctx.entries_mut()?;
        entries.next = entries.items.len();
        Ok(())
    }

    fn seek(&mut self, ctx: &mut Context<K>, name: &K::Ref) -> Result<Option<bool>> {
        let reread = ctx.state == DsonState::Name;
        let entries = ctx.entries_mut()?;
        let start = if reread {
            entries.next.saturating_sub(1)
        } else {
            entries.next
        };
        let offset = match position_of(&entries.items[start..], name) {
            Some(offset) => offset,
            None => return Ok(Some(false)),
        };
        if reread && offset == 0 {
            return Ok(Some(true));
        }
        entries.items[start..=start + offset].rotate_right(1);
        entries.next = start;
        if reread {
            ctx.state = DsonState::Type;
        }
        Ok(Some(true))
    }

    fn position(&self) -> usize {
        0
    }

    fn close(&mut self, _auto_close: bool) {
        self.pending.clear();
    }
}

impl<K: FieldKey> Reader<K, TreeSource<K>> {
    /// Creates a reader replaying `values` as top-level values.
    #[must_use]
    pub fn new(values: Vec<DsonValue<K>>) -> Self {
        Self::with_options(values, DsonOptions::default())
    }

    #[must_use]
    pub fn with_options(values: Vec<DsonValue<K>>, options: DsonOptions) -> Self {
        let source = TreeSource::new(values, options.clone());
        Reader::with_source(source, options, Arc::clone(K::shared_pool()))
    }

    /// Buffers the whole stream in `bytes`, every top-level value included.
    ///
    /// The top level is split up front and must hold only containers and
    /// headers. Nested containers are checked as they are entered. Use
    /// [`buffer_next`](Self::buffer_next) to buffer one top-level value of a
    /// sequential reader at a time.
    pub fn from_bytes(bytes: &[u8], options: DsonOptions) -> Result<Self> {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let mut pending = Vec::new();
        scan_entries(&bytes, ContextType::TopLevel, 0, bytes.len(), &mut pending)?;
        if let Some(entry) = pending
            .iter()
            .find(|entry| !entry.node.tag().0.is_container_or_header())
        {
            return Err(Error::InvalidTopLevelType(entry.node.tag().0));
        }
        let source = TreeSource {
            pending,
            options: options.clone(),
        };
        Ok(Reader::with_source(source, options, Arc::clone(K::shared_pool())))
    }

    /// Buffers only the next top-level value of `reader`.
    ///
    /// The value is taken as encoded bytes, so passthrough from the buffered
    /// reader returns them unchanged. Returns `None` once `reader` is
    /// exhausted.
    pub fn buffer_next<R>(reader: &mut R, options: DsonOptions) -> Result<Option<Self>>
    where
        R: DsonReader<K> + ?Sized,
    {
        let dson_type = reader.read_type()?;
        if dson_type == DsonType::EndOfObject {
            return Ok(None);
        }
        let encoded = reader.read_value_as_bytes(None)?;
        let end = encoded.len();
        let node = Node::Encoded {
            dson_type,
            bytes: Arc::from(encoded),
            start: 0,
            end,
        };
        let source = TreeSource {
            pending: vec![Entry::new(None, node)],
            options: options.clone(),
        };
        Ok(Some(Reader::with_source(
            source,
            options,
            Arc::clone(K::shared_pool()),
        )))
    }

    /// Moves the named field of the current object to the cursor.
    ///
    /// Unlike a named read, a miss is not an error and leaves the cursor
    /// unchanged, so the caller may try another name. Headers carry no name
    /// and are never moved.
    pub fn seek_field(&mut self, name: &K::Ref) -> Result<bool> {
        let ctx = top_mut(&mut self.stack)?;
        if !ctx.context_type.is_like_object() {
            return Err(Error::custom("field lookup outside an object"));
        }
        ctx.expect_state(&[DsonState::Type, DsonState::Name])?;
        Ok(self.source.seek(ctx, name)?.unwrap_or(false))
    }

    /// Reorders the unread fields of the current object.
    ///
    /// Listed fields come first, in the given order; unknown names are ignored
    /// and unlisted fields follow in their previous relative order.
    pub fn set_field_order(&mut self, order: &[&K::Ref]) -> Result<()> {
        let ctx = top_mut(&mut self.stack)?;
        if ctx.context_type != ContextType::Object && ctx.context_type != ContextType::Header {
            return Err(Error::custom("field order outside an object"));
        }
        ctx.expect_state(&[DsonState::Type])?;
        let entries = ctx.entries_mut()?;
        let mut target = entries.next;
        for name in order {
            if let Some(offset) = position_of(&entries.items[target..], name) {
                entries.items[target..=target + offset].rotate_right(1);
                target += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DsonArray, DsonObject};
    use crate::{DsonBinaryReader, DsonBinaryWriter, DsonWriter, WireType};

    fn sample() -> DsonValue {
        let mut object = DsonObject::new();
        object
            .header
            .insert("kind".to_string(), DsonValue::from("sample"))
            .unwrap();
        object.insert("a".to_string(), DsonValue::Int32(1));
        object.insert("b".to_string(), DsonValue::Int32(2));
        object.insert("c".to_string(), DsonValue::Int32(3));
        DsonValue::Object(object)
    }

    #[test]
    fn test_header_is_first_entry() {
        let mut reader = DsonTreeReader::new(vec![sample()]);
        reader.read_start_object(None).unwrap();
        assert_eq!(reader.read_type().unwrap(), DsonType::Header);
        assert_eq!(reader.state(), DsonState::Value);
        reader.read_start_header().unwrap();
        assert_eq!(reader.read_string(Some("kind")).unwrap(), "sample");
        assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
        reader.read_end_header().unwrap();
        assert_eq!(reader.read_int32(Some("a")).unwrap(), 1);
    }

    #[test]
    fn test_out_of_order_and_miss() {
        let mut reader = DsonTreeReader::new(vec![sample()]);
        reader.read_start_object(None).unwrap();
        assert_eq!(reader.read_int32(Some("c")).unwrap(), 3);
        assert!(matches!(
            reader.read_int32(Some("zzz")),
            Err(Error::FieldNotFound(_))
        ));
        assert_eq!(reader.read_int32(Some("a")).unwrap(), 1);
        assert_eq!(reader.read_int32(Some("b")).unwrap(), 2);
        reader.skip_to_end_of_object().unwrap();
        reader.read_end_object().unwrap();
    }

    #[test]
    fn test_seek_after_name_read() {
        let mut reader = DsonTreeReader::new(vec![sample()]);
        reader.read_start_object(None).unwrap();
        reader.skip_value().unwrap(); // header
        assert_eq!(reader.read_type().unwrap(), DsonType::Int32);
        assert!(reader.seek_field("b").unwrap());
        assert_eq!(reader.state(), DsonState::Type);
        assert_eq!(reader.read_int32(Some("b")).unwrap(), 2);
        assert_eq!(reader.read_int32(Some("a")).unwrap(), 1);
        assert!(!reader.seek_field("b").unwrap());
    }

    #[test]
    fn test_set_field_order() {
        let mut reader = DsonTreeReader::new(vec![sample()]);
        reader.read_start_object(None).unwrap();
        reader.set_field_order(&["c", "missing", "a"]).unwrap();
        let mut seen = Vec::new();
        while reader.read_type().unwrap() != DsonType::EndOfObject {
            if reader.current_type() == DsonType::Header {
                reader.skip_value().unwrap();
                continue;
            }
            seen.push(reader.read_name().unwrap());
            reader.skip_value().unwrap();
        }
        assert_eq!(seen, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_peek_mark_reset() {
        let array = DsonValue::Array(DsonArray::with_values(vec![
            DsonValue::Bool(true),
            DsonValue::Null,
        ]));
        let mut reader = DsonTreeReader::new(vec![array]);
        reader.read_start_array(None).unwrap();
        assert_eq!(reader.peek_type().unwrap(), DsonType::Bool);
        assert_eq!(reader.peek_type().unwrap(), DsonType::Bool);
        assert!(reader.read_bool(None).unwrap());
        assert_eq!(reader.peek_type().unwrap(), DsonType::Null);
    }

    #[test]
    fn test_value_bytes_reencode() {
        let value = sample();
        let expected = crate::to_vec(&[value.clone()]).unwrap();
        let mut reader = DsonTreeReader::new(vec![value]);
        let bytes = reader.read_value_as_bytes(None).unwrap();
        assert_eq!(bytes, &expected[1..]);
    }

    fn nested_sint() -> Vec<u8> {
        let mut writer = DsonBinaryWriter::new(Vec::new());
        writer.write_start_object(None).unwrap();
        writer.write_start_object(Some("inner")).unwrap();
        writer.write_int32(Some("n"), -5, WireType::Sint).unwrap();
        writer.write_end_object().unwrap();
        writer.write_end_object().unwrap();
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_value_bytes_are_original_bytes() {
        let bytes = nested_sint();

        let mut sequential = DsonBinaryReader::new(&bytes);
        sequential.read_start_object(None).unwrap();
        let expected = sequential.read_value_as_bytes(Some("inner")).unwrap();
        assert_eq!(expected, [4, 0, 0, 0, 0x0A, 0x01, b'n', 0x09]);

        let mut buffered = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
        buffered.read_start_object(None).unwrap();
        assert_eq!(buffered.read_value_as_bytes(Some("inner")).unwrap(), expected);
    }

    #[test]
    fn test_explicit_empty_header_is_reported() {
        // OBJECT { HEADER {} }
        let bytes = [0xF8, 0x03, 0, 0, 0, 0xE8, 0x00, 0x00];

        fn walk<R: DsonReader<String>>(reader: &mut R) -> Vec<DsonType> {
            let mut seen = Vec::new();
            reader.read_start_object(None).unwrap();
            seen.push(reader.read_type().unwrap());
            reader.read_start_header().unwrap();
            seen.push(reader.read_type().unwrap());
            reader.read_end_header().unwrap();
            seen.push(reader.read_type().unwrap());
            reader.read_end_object().unwrap();
            seen
        }

        let sequential = walk(&mut DsonBinaryReader::new(&bytes));
        let buffered = walk(&mut DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap());
        assert_eq!(sequential, [DsonType::Header, DsonType::EndOfObject, DsonType::EndOfObject]);
        assert_eq!(buffered, sequential);
    }

    #[test]
    fn test_from_bytes_rejects_top_level_scalar() {
        assert!(matches!(
            DsonTreeReader::from_bytes(&[0xF0, 0, 0, 0, 0, 0x29], DsonOptions::default()),
            Err(Error::InvalidTopLevelType(DsonType::Bool))
        ));
    }

    #[test]
    fn test_malformed_child_found_on_enter() {
        // [ [ INT32 varint with a truncated payload ] ]
        let bytes = [0xF0, 0x07, 0, 0, 0, 0xF0, 0x02, 0, 0, 0, 0x08, 0xFF];
        let mut reader = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
        reader.read_start_array(None).unwrap();
        assert!(matches!(
            reader.read_start_array(None),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_from_bytes_takes_every_top_level_value() {
        let values = vec![crate::dson!({ "a": 1 }), crate::dson!([true])];
        let bytes = crate::to_vec(&values).unwrap();

        let mut whole = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
        assert_eq!(crate::read_top_level_values(&mut whole).unwrap(), values);

        let mut source = DsonBinaryReader::new(&bytes);
        let mut first = DsonTreeReader::buffer_next(&mut source, DsonOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(crate::read_top_level_values(&mut first).unwrap(), vec![values[0].clone()]);
        assert_eq!(source.read_type().unwrap(), DsonType::Array);
    }
}
