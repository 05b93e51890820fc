//! # dson
//!
//! Encoding engine for Dson, a compact self-describing binary format for
//! tree-shaped data.
//!
//! ## What is Dson?
//!
//! A Dson stream is a sequence of top-level containers. Every value starts
//! with a one-byte tag: the high five bits name the type, the low three bits
//! (the *wire bits*) select an encoding variant. Containers carry a
//! little-endian length prefix, so any value can be skipped without decoding
//! it. Objects and arrays may carry a *header*, a small map of metadata
//! written before their contents.
//!
//! Field names come in two flavors:
//!
//! - **Document style**: UTF-8 strings, keyed by [`String`]
//! - **Lite style**: packed [`FieldNumber`]s, keyed by local index and depth
//!
//! ## Key Features
//!
//! - **Streaming**: [`DsonBinaryReader`] walks bytes strictly forward and
//!   never materializes what it skips
//! - **Random access**: [`DsonTreeReader`] buffers a container and reads its
//!   fields in any order
//! - **Compact numbers**: varint, zigzag and fixed integer encodings; floats
//!   and doubles drop their trailing zero bytes
//! - **One state machine**: byte and tree backends share the same
//!   [`DsonReader`] and [`DsonWriter`] contracts
//! - **No Unsafe Code**
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! dson = "0.1"
//! ```
//!
//! ### Writing and Reading
//!
//! ```rust
//! use dson::{DsonBinaryReader, DsonBinaryWriter, DsonReader, DsonWriter, WireType};
//!
//! let mut writer = DsonBinaryWriter::new(Vec::new());
//! writer.write_start_object(None).unwrap();
//! writer.write_string(Some("name"), "Alice").unwrap();
//! writer.write_int32(Some("age"), 30, WireType::Uint).unwrap();
//! writer.write_end_object().unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = DsonBinaryReader::new(&bytes);
//! reader.read_start_object(None).unwrap();
//! assert_eq!(reader.read_string(Some("name")).unwrap(), "Alice");
//! assert_eq!(reader.read_int32(Some("age")).unwrap(), 30);
//! reader.read_type().unwrap();
//! reader.read_end_object().unwrap();
//! ```
//!
//! ### Dynamic Values with dson! Macro
//!
//! ```rust
//! use dson::{dson, from_slice, to_vec, DsonValue};
//!
//! let value = dson!({
//!     "name": "Alice",
//!     "tags": ["rust", "binary"]
//! });
//!
//! let bytes = to_vec(&[value.clone()]).unwrap();
//! let values: Vec<DsonValue> = from_slice(&bytes).unwrap();
//! assert_eq!(values, vec![value]);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Truncated or malformed input yields an [`Error`], never a panic
//! - Nesting depth is bounded by [`DsonOptions::recursion_limit`] on both
//!   encode and decode

pub mod binary_reader;
pub mod binary_writer;
pub mod context;
pub mod error;
pub mod io;
pub mod key;
pub mod macros;
pub mod map;
pub mod options;
pub mod pool;
pub mod reader;
pub mod tree_reader;
pub mod tree_writer;
pub mod types;
pub mod value;
pub mod wire;
pub mod writer;

mod sealed {
    pub trait Sealed {}
}

pub use binary_reader::{BinarySource, DsonBinaryReader, DsonLiteBinaryReader};
pub use binary_writer::{BinarySink, DsonBinaryWriter, DsonLiteBinaryWriter};
pub use context::{Context, ContextPool, ContextType, DsonState};
pub use error::{Error, Result};
pub use key::FieldKey;
pub use map::DsonMap;
pub use options::DsonOptions;
pub use pool::{FramePool, Poolable};
pub use reader::{read_top_level_values, read_value, DsonReader, ReadSource, Reader};
pub use tree_reader::{DsonLiteTreeReader, DsonTreeReader, TreeSource};
pub use tree_writer::{DsonLiteTreeWriter, DsonTreeWriter, TreeSink};
pub use types::{DsonType, FieldNumber, WireType};
pub use value::{
    DsonArray, DsonHeader, DsonObject, DsonValue, ExtDateTime, ObjectLitePtr, ObjectPtr,
    Timestamp,
};
pub use writer::{write_top_level_values, write_value, DsonWriter, Scalar, WriteSink, Writer};

use std::io::Read;

/// Encode top-level containers to bytes.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, to_vec};
///
/// let bytes = to_vec(&[dson!([true])]).unwrap();
/// assert_eq!(bytes, [0xF0, 0x01, 0, 0, 0, 0x29]);
/// ```
///
/// # Errors
///
/// Returns an error if a value is not a container, if nesting exceeds the
/// recursion limit, or if a header does not fit its length prefix.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<K: FieldKey>(values: &[DsonValue<K>]) -> Result<Vec<u8>> {
    to_vec_with_options(values, DsonOptions::default())
}

/// Encode top-level containers to bytes with custom options.
///
/// # Errors
///
/// Returns an error if encoding fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<K: FieldKey>(values: &[DsonValue<K>], options: DsonOptions) -> Result<Vec<u8>> {
    let buffer = Vec::with_capacity(options.buffer_capacity);
    let mut writer = Writer::<K, BinarySink<Vec<u8>>>::with_options(buffer, options);
    write_top_level_values(&mut writer, values)?;
    writer.into_inner()
}

/// Encode top-level containers to an I/O sink.
///
/// Each value reaches the sink in a single `write_all` once it is complete.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, to_writer};
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &[dson!({})]).unwrap();
/// assert_eq!(buffer.len(), 5);
/// ```
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<K, W>(sink: W, values: &[DsonValue<K>]) -> Result<()>
where
    K: FieldKey,
    W: std::io::Write,
{
    let mut writer = Writer::<K, BinarySink<W>>::new(sink);
    write_top_level_values(&mut writer, values)?;
    writer.into_inner().map(drop)
}

/// Decode every top-level value from bytes.
///
/// # Examples
///
/// ```rust
/// use dson::{from_slice, DsonValue};
///
/// let values: Vec<DsonValue> = from_slice(&[0xF0, 0x01, 0, 0, 0, 0x29]).unwrap();
/// assert_eq!(values[0].as_array().map(|a| a.len()), Some(1));
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are truncated, malformed, nest too deeply
/// or hold a top-level value that is not a container.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<K: FieldKey>(bytes: &[u8]) -> Result<Vec<DsonValue<K>>> {
    from_slice_with_options(bytes, DsonOptions::default())
}

/// Decode every top-level value from bytes with custom options.
///
/// # Errors
///
/// Returns an error if decoding fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options<K: FieldKey>(bytes: &[u8], options: DsonOptions) -> Result<Vec<DsonValue<K>>> {
    let mut reader = Reader::<K, BinarySource<'_>>::with_options(bytes, options);
    read_top_level_values(&mut reader)
}

/// Decode every top-level value from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use dson::{from_reader, DsonValue};
/// use std::io::Cursor;
///
/// let cursor = Cursor::new(vec![0xF8, 0x00, 0x00, 0x00, 0x00]);
/// let values: Vec<DsonValue> = from_reader(cursor).unwrap();
/// assert!(values[0].is_object());
/// ```
///
/// # Errors
///
/// Returns an error if reading from the source fails or decoding fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<K, R>(mut source: R) -> Result<Vec<DsonValue<K>>>
where
    K: FieldKey,
    R: Read,
{
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    from_slice(&bytes)
}
