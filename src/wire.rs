//! Wire-level encoding helpers.
//!
//! Pure functions that compute and interpret tag bytes and the type-specific
//! compaction rules. They touch no buffers; [`crate::io`] does the byte work.
//!
//! ## Tag byte
//!
//! ```text
//! +-------+-----+
//! | TTTTT | WWW |
//! +-------+-----+
//! ```
//!
//! `TTTTT` is the [`DsonType`] ordinal, `WWW` the wire bits whose meaning
//! depends on the type:
//!
//! | Type | Wire bits |
//! |------|-----------|
//! | INT32, INT64 | [`WireType`] scheme |
//! | FLOAT, DOUBLE | number of dropped all-zero low bytes |
//! | BOOL | the value itself |
//! | POINTER, LITE_POINTER | presence mask (namespace, type, policy) |
//! | DATETIME | opaque "enabled components" mask |
//!
//! Fixed-width fields are little endian.

use crate::types::{DsonType, WireType};

/// Pointer wire bit: namespace string present.
pub const POINTER_NAMESPACE: u8 = 0x01;
/// Pointer wire bit: type byte present.
pub const POINTER_TYPE: u8 = 0x02;
/// Pointer wire bit: policy byte present.
pub const POINTER_POLICY: u8 = 0x04;

/// Float payloads always keep their two highest bytes.
pub const FLOAT_MAX_TRIM: u8 = 2;
/// Double payloads always keep their two highest bytes.
pub const DOUBLE_MAX_TRIM: u8 = 6;

/// Body length limit of a HEADER container (16-bit prefix).
pub const HEADER_MAX_BODY: usize = u16::MAX as usize;
/// Length prefix size of a HEADER container.
pub const HEADER_PREFIX_SIZE: usize = 2;
/// Length prefix size of an OBJECT or ARRAY container.
pub const CONTAINER_PREFIX_SIZE: usize = 4;

/// Builds a tag byte.
///
/// # Examples
///
/// ```rust
/// use dson::wire::make_tag;
/// use dson::DsonType;
///
/// assert_eq!(make_tag(DsonType::Float, 2), 0x1A);
/// assert_eq!(make_tag(DsonType::Object, 0), 0xF8);
/// ```
#[inline]
#[must_use]
pub const fn make_tag(dson_type: DsonType, wire_bits: u8) -> u8 {
    (dson_type.number() << 3) | (wire_bits & 0x07)
}

/// Splits a tag byte into the type ordinal and the wire bits.
#[inline]
#[must_use]
pub const fn split_tag(tag: u8) -> (u8, u8) {
    (tag >> 3, tag & 0x07)
}

/// Returns the length prefix size of a container type.
#[inline]
#[must_use]
pub const fn prefix_size(dson_type: DsonType) -> usize {
    match dson_type {
        DsonType::Header => HEADER_PREFIX_SIZE,
        _ => CONTAINER_PREFIX_SIZE,
    }
}

#[inline]
#[must_use]
pub const fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
#[must_use]
pub const fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline]
#[must_use]
pub const fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
#[must_use]
pub const fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encoded size of an unsigned varint.
///
/// # Examples
///
/// ```rust
/// use dson::wire::varint_size;
///
/// assert_eq!(varint_size(0), 1);
/// assert_eq!(varint_size(127), 1);
/// assert_eq!(varint_size(128), 2);
/// assert_eq!(varint_size(u64::MAX), 10);
/// ```
#[must_use]
pub const fn varint_size(mut value: u64) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

/// Encoded size of an INT32 value under the given scheme.
#[must_use]
pub const fn int32_size(value: i32, wire_type: WireType) -> usize {
    match wire_type {
        WireType::Varint => varint_size(value as i64 as u64),
        WireType::Uint => varint_size(value as u32 as u64),
        WireType::Sint => varint_size(zigzag_encode32(value) as u64),
        WireType::Fixed => 4,
    }
}

/// Encoded size of an INT64 value under the given scheme.
#[must_use]
pub const fn int64_size(value: i64, wire_type: WireType) -> usize {
    match wire_type {
        WireType::Varint | WireType::Uint => varint_size(value as u64),
        WireType::Sint => varint_size(zigzag_encode64(value)),
        WireType::Fixed => 8,
    }
}

/// Number of low-order zero bytes a float payload drops.
///
/// # Examples
///
/// ```rust
/// use dson::wire::float_wire_bits;
///
/// // 1.0f32 is 0x3F800000: two zero low bytes.
/// assert_eq!(float_wire_bits(1.0), 2);
/// assert_eq!(float_wire_bits(0.1), 0);
/// ```
#[inline]
#[must_use]
pub fn float_wire_bits(value: f32) -> u8 {
    trailing_zero_bytes(u64::from(value.to_bits()), 32).min(FLOAT_MAX_TRIM)
}

/// Number of low-order zero bytes a double payload drops.
///
/// # Examples
///
/// ```rust
/// use dson::wire::double_wire_bits;
///
/// assert_eq!(double_wire_bits(2.5), 6);
/// assert_eq!(double_wire_bits(0.0), 6);
/// assert_eq!(double_wire_bits(0.1), 0);
/// ```
#[inline]
#[must_use]
pub fn double_wire_bits(value: f64) -> u8 {
    trailing_zero_bytes(value.to_bits(), 64).min(DOUBLE_MAX_TRIM)
}

fn trailing_zero_bytes(bits: u64, width: u32) -> u8 {
    let zeros = if bits == 0 {
        width
    } else {
        bits.trailing_zeros()
    };
    (zeros / 8) as u8
}

/// Computes the presence mask of a pointer's optional parts.
#[inline]
#[must_use]
pub fn pointer_wire_bits(has_namespace: bool, ptr_type: u8, policy: u8) -> u8 {
    let mut bits = 0;
    if has_namespace {
        bits |= POINTER_NAMESPACE;
    }
    if ptr_type != 0 {
        bits |= POINTER_TYPE;
    }
    if policy != 0 {
        bits |= POINTER_POLICY;
    }
    bits
}

/// Checks that the wire bits are legal for the type carrying them.
#[must_use]
pub fn wire_bits_valid(dson_type: DsonType, bits: u8) -> bool {
    match dson_type {
        DsonType::Int32 | DsonType::Int64 => bits <= WireType::Fixed.bits(),
        DsonType::Float => bits <= FLOAT_MAX_TRIM,
        DsonType::Double => bits <= DOUBLE_MAX_TRIM,
        DsonType::Bool => bits <= 1,
        DsonType::Pointer | DsonType::LitePointer | DsonType::DateTime => true,
        _ => bits == 0,
    }
}
