//! Type tags of the Dson format.
//!
//! - [`DsonType`]: the kind of a value, stored in the high 5 bits of every tag byte
//! - [`WireType`]: the integer encoding scheme stored in the low 3 bits of INT32/INT64 tags
//! - [`FieldNumber`]: the packed field identity used by the lite (numbered-field) variant

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The kind of a Dson value.
///
/// Discriminants are the fixed ordinals written into the tag byte.
///
/// # Examples
///
/// ```rust
/// use dson::DsonType;
///
/// assert_eq!(DsonType::Object.number(), 31);
/// assert_eq!(DsonType::from_number(30).unwrap(), DsonType::Array);
/// assert!(DsonType::from_number(9).is_err());
/// ```
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DsonType {
    /// Sentinel returned at the end of a container; never stored.
    EndOfObject = 0,
    Int32 = 1,
    Int64 = 2,
    Float = 3,
    Double = 4,
    Bool = 5,
    String = 6,
    Null = 7,
    Binary = 8,
    Pointer = 11,
    LitePointer = 12,
    DateTime = 13,
    Timestamp = 14,
    Header = 29,
    Array = 30,
    Object = 31,
}

impl DsonType {
    /// Returns the ordinal written into the tag byte.
    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Maps a tag ordinal back to its type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Custom`] for ordinals the format does not define; the
    /// binary reader reports them as [`Error::InvalidFormat`] with a position.
    pub fn from_number(number: u8) -> Result<Self> {
        let dson_type = match number {
            0 => DsonType::EndOfObject,
            1 => DsonType::Int32,
            2 => DsonType::Int64,
            3 => DsonType::Float,
            4 => DsonType::Double,
            5 => DsonType::Bool,
            6 => DsonType::String,
            7 => DsonType::Null,
            8 => DsonType::Binary,
            11 => DsonType::Pointer,
            12 => DsonType::LitePointer,
            13 => DsonType::DateTime,
            14 => DsonType::Timestamp,
            29 => DsonType::Header,
            30 => DsonType::Array,
            31 => DsonType::Object,
            other => {
                return Err(Error::Custom(format!(
                    "unknown DsonType ordinal {}",
                    other
                )))
            }
        };
        Ok(dson_type)
    }

    /// Returns `true` for INT32, INT64, FLOAT and DOUBLE.
    #[inline]
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(
            self,
            DsonType::Int32 | DsonType::Int64 | DsonType::Float | DsonType::Double
        )
    }

    /// Returns `true` for OBJECT and ARRAY.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, DsonType::Array | DsonType::Object)
    }

    /// Returns `true` for OBJECT, ARRAY and HEADER.
    #[inline]
    #[must_use]
    pub const fn is_container_or_header(self) -> bool {
        matches!(self, DsonType::Array | DsonType::Object | DsonType::Header)
    }

    /// Returns `true` if the low 3 tag bits carry meaning for this type.
    #[inline]
    #[must_use]
    pub const fn has_wire_bits(self) -> bool {
        matches!(
            self,
            DsonType::Int32
                | DsonType::Int64
                | DsonType::Float
                | DsonType::Double
                | DsonType::Bool
                | DsonType::Pointer
                | DsonType::LitePointer
                | DsonType::DateTime
        )
    }
}

impl fmt::Display for DsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Integer encoding scheme chosen per INT32/INT64 write.
///
/// Readers never guess the scheme: it is always taken from the tag byte.
///
/// # Examples
///
/// ```rust
/// use dson::WireType;
///
/// assert_eq!(WireType::Sint.bits(), 2);
/// assert_eq!(WireType::from_bits(3).unwrap(), WireType::Fixed);
/// ```
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WireType {
    /// Two's complement varint; negative values take the full 10 bytes.
    #[default]
    Varint = 0,
    /// Unsigned varint of the value's bit pattern.
    Uint = 1,
    /// Zigzag varint; small negative values stay small.
    Sint = 2,
    /// Fixed 4 or 8 little-endian bytes.
    Fixed = 3,
}

impl WireType {
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes the low tag bits of an integer tag.
    ///
    /// # Errors
    ///
    /// Returns an error for bit patterns above 3.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Uint),
            2 => Ok(WireType::Sint),
            3 => Ok(WireType::Fixed),
            other => Err(Error::Custom(format!("unknown integer wire type {}", other))),
        }
    }
}

/// Packed identity of a field in the lite format: `(local_index << 3) | depth`.
///
/// `depth` is the inheritance depth of the declaring type (0..=7), which lets a
/// decoder skip fields it does not know and survive type-hierarchy changes.
///
/// # Examples
///
/// ```rust
/// use dson::FieldNumber;
///
/// let number = FieldNumber::new(5, 1).unwrap();
/// assert_eq!(number.full(), (5 << 3) | 1);
/// assert_eq!(number.local_index(), 5);
/// assert_eq!(number.depth(), 1);
/// assert!(FieldNumber::new(5, 8).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldNumber(u32);

impl FieldNumber {
    /// Highest inheritance depth that fits in the packed number.
    pub const MAX_DEPTH: u8 = 7;
    /// Highest local index that fits in the packed number.
    pub const MAX_LOCAL_INDEX: u32 = u32::MAX >> 3;

    /// Packs a local index and an inheritance depth.
    ///
    /// # Errors
    ///
    /// Returns an error when `depth > 7` or `local_index` does not fit in 29 bits.
    pub fn new(local_index: u32, depth: u8) -> Result<Self> {
        if depth > Self::MAX_DEPTH {
            return Err(Error::Custom(format!(
                "field depth {} exceeds {}",
                depth,
                Self::MAX_DEPTH
            )));
        }
        if local_index > Self::MAX_LOCAL_INDEX {
            return Err(Error::Custom(format!(
                "field index {} exceeds {}",
                local_index,
                Self::MAX_LOCAL_INDEX
            )));
        }
        Ok(FieldNumber((local_index << 3) | u32::from(depth)))
    }

    /// Wraps an already packed number as read from the wire.
    #[inline]
    #[must_use]
    pub const fn from_full(full: u32) -> Self {
        FieldNumber(full)
    }

    #[inline]
    #[must_use]
    pub const fn full(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn local_index(self) -> u32 {
        self.0 >> 3
    }

    #[inline]
    #[must_use]
    pub const fn depth(self) -> u8 {
        (self.0 & 0x07) as u8
    }
}

impl fmt::Display for FieldNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_index(), self.depth())
    }
}

impl Serialize for FieldNumber {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for FieldNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(FieldNumber)
    }
}
