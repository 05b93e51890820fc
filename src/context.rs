//! Per-nesting-level frames of the reader and writer state machines.
//!
//! Every open container owns one [`Context`]. Frames live in a vector used as
//! a stack (index 0 is the top level) and are recycled through a
//! [`FramePool`](crate::pool::FramePool). The mode-specific part of a frame is
//! the [`Cursor`]: a length-prefix position for the binary writer, body bounds
//! for the binary reader, remaining entries for the tree reader, or the node
//! under construction for the tree writer.

use crate::pool::{FramePool, Poolable};
use crate::types::DsonType;
use crate::value::DsonValue;
use crate::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Pool of recycled frames shared by readers and writers of one key kind.
pub type ContextPool<K> = FramePool<Context<K>>;

/// Kind of container a frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ContextType {
    #[default]
    TopLevel,
    Object,
    Array,
    Header,
}

impl ContextType {
    /// Returns `true` for contexts whose values are preceded by names.
    #[inline]
    #[must_use]
    pub const fn is_like_object(self) -> bool {
        matches!(self, ContextType::Object | ContextType::Header)
    }

    /// The container type opening this context, `None` for the top level.
    #[must_use]
    pub const fn dson_type(self) -> Option<DsonType> {
        match self {
            ContextType::TopLevel => None,
            ContextType::Object => Some(DsonType::Object),
            ContextType::Array => Some(DsonType::Array),
            ContextType::Header => Some(DsonType::Header),
        }
    }
}

/// Position of a frame in the tag/name/value cycle.
///
/// Writers only use `Initial`, `Name` and `Value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DsonState {
    /// Nothing read or written yet at the top level.
    #[default]
    Initial,
    /// The next tag has not been read.
    Type,
    /// The tag is known; the field name comes next.
    Name,
    /// Ready for the value.
    Value,
    /// A container was identified and may be re-entered with `read_start_*`.
    WaitStartObject,
    /// The end of the current container was reached.
    WaitEndObject,
    /// The top level is exhausted.
    EndOfFile,
}

/// Buffered child in the tree reader.
///
/// Containers read from bytes stay encoded until they are entered, so their
/// original bytes can be handed out unchanged.
#[derive(Debug)]
pub(crate) enum Node<K> {
    Value(DsonValue<K>),
    /// Length prefix and body at `start..end` of `bytes`.
    Encoded {
        dson_type: DsonType,
        bytes: Arc<[u8]>,
        start: usize,
        end: usize,
    },
}

impl<K> Default for Node<K> {
    fn default() -> Self {
        Node::Value(DsonValue::Null)
    }
}

impl<K> Node<K> {
    /// Tag of the node as `(type, wire bits)`.
    pub(crate) fn tag(&self) -> (DsonType, u8) {
        match self {
            Node::Value(value) => (value.dson_type(), value.wire_bits()),
            Node::Encoded { dson_type, .. } => (*dson_type, 0),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Entry<K> {
    pub(crate) name: Option<K>,
    pub(crate) node: Node<K>,
}

impl<K> Entry<K> {
    pub(crate) fn new(name: Option<K>, node: Node<K>) -> Self {
        Entry { name, node }
    }
}

/// Remaining children of a container in the tree reader.
///
/// `items[next..]` is the queue of entries not yet visited; lookups rotate the
/// queue so the requested entry comes first. `mark` saves a cursor index for
/// non-consuming lookahead.
pub struct Entries<K> {
    pub(crate) items: Vec<Entry<K>>,
    pub(crate) next: usize,
    pub(crate) mark: usize,
}

impl<K> Default for Entries<K> {
    fn default() -> Self {
        Entries {
            items: Vec::new(),
            next: 0,
            mark: 0,
        }
    }
}

impl<K> Entries<K> {
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.next = 0;
        self.mark = 0;
    }

    #[inline]
    pub(crate) fn mark(&mut self) {
        self.mark = self.next;
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.next = self.mark;
    }

    /// Entry most recently returned by a tag read.
    pub(crate) fn current_mut(&mut self) -> Result<&mut Entry<K>> {
        self.next
            .checked_sub(1)
            .and_then(|index| self.items.get_mut(index))
            .ok_or_else(|| Error::custom("no current entry in buffered frame"))
    }
}

/// Mode-specific part of a frame.
#[derive(Default)]
pub enum Cursor<K> {
    #[default]
    Idle,
    /// Binary writer: offset of the length placeholder.
    Prefix { pos: usize },
    /// Binary reader: absolute offsets of the container body.
    Body { start: usize, end: usize },
    /// Tree reader: remaining children.
    Entries(Entries<K>),
    /// Tree writer: container being built and the name it is stored under.
    Building {
        value: DsonValue<K>,
        name: Option<K>,
    },
}

/// One level of the reader or writer stack.
pub struct Context<K> {
    pub(crate) context_type: ContextType,
    pub(crate) state: DsonState,
    pub(crate) dson_type: DsonType,
    pub(crate) wire_bits: u8,
    pub(crate) name: Option<K>,
    /// Values completed in this frame by a writer.
    pub(crate) written: usize,
    pub(crate) attachment: Option<Box<dyn Any + Send>>,
    pub(crate) cursor: Cursor<K>,
}

impl<K> Default for Context<K> {
    fn default() -> Self {
        Context {
            context_type: ContextType::TopLevel,
            state: DsonState::Initial,
            dson_type: DsonType::EndOfObject,
            wire_bits: 0,
            name: None,
            written: 0,
            attachment: None,
            cursor: Cursor::Idle,
        }
    }
}

impl<K> Poolable for Context<K> {
    fn reset(&mut self) {
        self.context_type = ContextType::TopLevel;
        self.state = DsonState::Initial;
        self.dson_type = DsonType::EndOfObject;
        self.wire_bits = 0;
        self.name = None;
        self.written = 0;
        self.attachment = None;
        // Keep the entry buffer so pooled tree frames reuse their allocation.
        match &mut self.cursor {
            Cursor::Entries(entries) => entries.clear(),
            cursor => *cursor = Cursor::Idle,
        }
    }
}

impl<K> Context<K> {
    pub(crate) fn init(&mut self, context_type: ContextType, state: DsonState) {
        self.context_type = context_type;
        self.state = state;
    }

    pub(crate) fn expect_state(&self, allowed: &[DsonState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::invalid_state(allowed, self.state))
        }
    }

    /// Takes the entry buffer out of the cursor, reusing a pooled one if present.
    pub(crate) fn take_entries(&mut self) -> Entries<K> {
        match std::mem::take(&mut self.cursor) {
            Cursor::Entries(mut entries) => {
                entries.clear();
                entries
            }
            _ => Entries::default(),
        }
    }

    pub(crate) fn entries_mut(&mut self) -> Result<&mut Entries<K>> {
        match &mut self.cursor {
            Cursor::Entries(entries) => Ok(entries),
            _ => Err(Error::custom("frame has no buffered entries")),
        }
    }

    pub(crate) fn body(&self) -> Result<(usize, usize)> {
        match self.cursor {
            Cursor::Body { start, end } => Ok((start, end)),
            _ => Err(Error::custom("frame has no body bounds")),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Context<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("context_type", &self.context_type)
            .field("state", &self.state)
            .field("dson_type", &self.dson_type)
            .field("name", &self.name)
            .field("attached", &self.attachment.is_some())
            .finish()
    }
}
