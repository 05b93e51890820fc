//! Field identities.
//!
//! A Dson stream names the fields of OBJECT and HEADER containers either with
//! UTF-8 strings (document style) or with packed [`FieldNumber`]s (lite
//! style). [`FieldKey`] abstracts over the two so that every reader, writer
//! and value type exists in both flavors without duplicated state machines.

use crate::context::ContextPool;
use crate::io::{DsonInput, DsonOutput};
use crate::types::FieldNumber;
use crate::Result;
use once_cell::sync::Lazy;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Number of idle frames kept by each shared pool.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

static DOCUMENT_POOL: Lazy<Arc<ContextPool<String>>> =
    Lazy::new(|| Arc::new(ContextPool::new(DEFAULT_POOL_CAPACITY)));

static LITE_POOL: Lazy<Arc<ContextPool<FieldNumber>>> =
    Lazy::new(|| Arc::new(ContextPool::new(DEFAULT_POOL_CAPACITY)));

/// A field name as stored in containers and written after a tag.
///
/// `Ref` is the borrowed form accepted by read and write operations, so that
/// document-style callers pass `&str` and lite callers pass `&FieldNumber`.
pub trait FieldKey:
    Clone + Eq + Hash + Debug + Send + Sync + Borrow<Self::Ref> + 'static
{
    type Ref: ?Sized + Eq + Hash + Debug + ToOwned<Owned = Self>;

    /// Appends the wire form of a name.
    fn encode(key: &Self::Ref, out: &mut DsonOutput);

    /// Reads a name from the wire.
    fn decode(input: &mut DsonInput<'_>) -> Result<Self>;

    /// Skips a name without materializing it.
    fn skip(input: &mut DsonInput<'_>) -> Result<()>;

    /// Process-wide frame pool used by readers and writers of this key kind.
    fn shared_pool() -> &'static Arc<ContextPool<Self>>;

    /// Borrowed form of this key.
    #[inline]
    fn key_ref(&self) -> &Self::Ref {
        self.borrow()
    }
}

impl FieldKey for String {
    type Ref = str;

    fn encode(key: &str, out: &mut DsonOutput) {
        out.write_string(key);
    }

    fn decode(input: &mut DsonInput<'_>) -> Result<Self> {
        input.read_string()
    }

    fn skip(input: &mut DsonInput<'_>) -> Result<()> {
        input.skip_length_prefixed()
    }

    fn shared_pool() -> &'static Arc<ContextPool<Self>> {
        &DOCUMENT_POOL
    }
}

impl FieldKey for FieldNumber {
    type Ref = FieldNumber;

    fn encode(key: &FieldNumber, out: &mut DsonOutput) {
        out.write_varint(u64::from(key.full()));
    }

    fn decode(input: &mut DsonInput<'_>) -> Result<Self> {
        input.read_varint32().map(FieldNumber::from_full)
    }

    fn skip(input: &mut DsonInput<'_>) -> Result<()> {
        input.skip_varint()
    }

    fn shared_pool() -> &'static Arc<ContextPool<Self>> {
        &LITE_POOL
    }
}
