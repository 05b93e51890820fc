//! In-memory value tree for Dson data.
//!
//! This module provides the [`DsonValue`] enum, which represents any value a
//! Dson stream can carry. The buffered reader replays trees of it, the tree
//! writer produces them, and [`write_value`](crate::write_value) /
//! [`read_value`](crate::read_value) move them through any writer or reader.
//!
//! ## Core Types
//!
//! - [`DsonValue`]: tagged union over scalars and containers
//! - [`DsonObject`], [`DsonArray`]: containers, each with an optional [`DsonHeader`]
//! - [`DsonHeader`]: anonymous metadata map; never contains another header
//! - [`ObjectPtr`], [`ObjectLitePtr`]: object references
//! - [`ExtDateTime`], [`Timestamp`]: date and time values
//!
//! Every container type is generic over its field key: `String` for the
//! document format (the default) and [`FieldNumber`](crate::FieldNumber) for
//! the lite format.
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use dson::{dson, DsonValue};
//!
//! let number = DsonValue::<String>::from(42);
//! let text = DsonValue::<String>::from("hello");
//!
//! let obj: DsonValue = dson!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(obj.is_object());
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use dson::DsonValue;
//! use std::convert::TryFrom;
//!
//! let value: DsonValue = DsonValue::from(42i64);
//! let num = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::map::DsonMap;
use crate::types::DsonType;
use crate::wire;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::Hash;

/// Map key under which container headers appear in serde output.
pub const SERDE_HEADER_KEY: &str = "@header";
/// Map key under which array elements appear when the array has a header.
pub const SERDE_ITEMS_KEY: &str = "@items";

/// A dynamically-typed Dson value.
///
/// # Examples
///
/// ```rust
/// use dson::{DsonType, DsonValue};
///
/// let null: DsonValue = DsonValue::Null;
/// let num: DsonValue = DsonValue::Int32(42);
/// let text: DsonValue = DsonValue::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert_eq!(num.dson_type(), DsonType::Int32);
/// assert_eq!(text.as_str(), Some("hello"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum DsonValue<K = String> {
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Null,
    Binary(Vec<u8>),
    Pointer(ObjectPtr),
    LitePointer(ObjectLitePtr),
    DateTime(ExtDateTime),
    Timestamp(Timestamp),
    Header(DsonHeader<K>),
    Array(DsonArray<K>),
    Object(DsonObject<K>),
}

/// Anonymous metadata attached to an object or array.
///
/// A header maps names to values like an object does, except that it may
/// never contain another header.
///
/// # Examples
///
/// ```rust
/// use dson::{DsonHeader, DsonValue};
///
/// let mut header = DsonHeader::new();
/// header.insert("type".to_string(), DsonValue::from("Point")).unwrap();
///
/// let nested = DsonValue::Header(DsonHeader::new());
/// assert!(header.insert("inner".to_string(), nested).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DsonHeader<K = String> {
    fields: DsonMap<K>,
}

/// An ordered sequence of values plus a header.
#[derive(Clone, Debug, PartialEq)]
pub struct DsonArray<K = String> {
    pub header: DsonHeader<K>,
    pub values: Vec<DsonValue<K>>,
}

/// An ordered name-to-value mapping plus a header.
///
/// Field values must not be headers; writers reject them.
#[derive(Clone, Debug, PartialEq)]
pub struct DsonObject<K = String> {
    pub header: DsonHeader<K>,
    pub fields: DsonMap<K>,
}

impl<K> Default for DsonValue<K> {
    fn default() -> Self {
        DsonValue::Null
    }
}

impl<K> Default for DsonHeader<K> {
    fn default() -> Self {
        DsonHeader {
            fields: DsonMap::new(),
        }
    }
}

impl<K> Default for DsonArray<K> {
    fn default() -> Self {
        DsonArray {
            header: DsonHeader::default(),
            values: Vec::new(),
        }
    }
}

impl<K> Default for DsonObject<K> {
    fn default() -> Self {
        DsonObject {
            header: DsonHeader::default(),
            fields: DsonMap::new(),
        }
    }
}

impl<K> DsonHeader<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, DsonValue<K>> {
        self.fields.iter()
    }

    /// Read access to the underlying map.
    #[must_use]
    pub fn fields(&self) -> &DsonMap<K> {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> DsonMap<K> {
        self.fields
    }
}

impl<K: Hash + Eq> DsonHeader<K> {
    /// Inserts a header field.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is itself a header.
    pub fn insert(&mut self, key: K, value: DsonValue<K>) -> Result<Option<DsonValue<K>>> {
        if value.is_header() {
            return Err(Error::custom("a header may not contain another header"));
        }
        Ok(self.fields.insert(key, value))
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&DsonValue<K>>
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.fields.get(key)
    }

    /// Builds a header from a map, validating every value.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is a header.
    pub fn from_map(map: DsonMap<K>) -> Result<Self> {
        let mut header = DsonHeader::new();
        for (key, value) in map {
            header.insert(key, value)?;
        }
        Ok(header)
    }
}

impl<K> DsonArray<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an array holding `values` and an empty header.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonArray, DsonValue};
    ///
    /// let array: DsonArray = DsonArray::with_values(vec![DsonValue::from(1), DsonValue::Null]);
    /// assert_eq!(array.len(), 2);
    /// assert!(array.header.is_empty());
    /// ```
    #[must_use]
    pub fn with_values(values: Vec<DsonValue<K>>) -> Self {
        DsonArray {
            header: DsonHeader::default(),
            values,
        }
    }

    pub fn push(&mut self, value: DsonValue<K>) {
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DsonValue<K>> {
        self.values.iter()
    }
}

impl<K> DsonObject<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, DsonValue<K>> {
        self.fields.iter()
    }
}

impl<K: Hash + Eq> DsonObject<K> {
    /// Inserts a field, returning the value it replaced.
    ///
    /// A replaced field keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonObject, DsonValue};
    ///
    /// let mut object = DsonObject::new();
    /// object.insert("a".to_string(), DsonValue::from(1));
    /// object.insert("b".to_string(), DsonValue::from(2));
    /// assert_eq!(object.insert("a".to_string(), DsonValue::from(3)), Some(DsonValue::Int32(1)));
    ///
    /// let keys: Vec<_> = object.iter().map(|(k, _)| k.as_str()).collect();
    /// assert_eq!(keys, vec!["a", "b"]);
    /// ```
    pub fn insert(&mut self, key: K, value: DsonValue<K>) -> Option<DsonValue<K>> {
        self.fields.insert(key, value)
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&DsonValue<K>>
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.fields.get(key)
    }
}

impl<K> From<DsonMap<K>> for DsonObject<K> {
    fn from(fields: DsonMap<K>) -> Self {
        DsonObject {
            header: DsonHeader::default(),
            fields,
        }
    }
}

/// Reference to an object by string id.
///
/// Optional parts are written only when set: a non-empty `namespace`, and
/// non-zero `ptr_type` and `policy` bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectPtr {
    pub local_id: String,
    pub namespace: String,
    pub ptr_type: u8,
    pub policy: u8,
}

impl ObjectPtr {
    /// Creates a pointer with only a local id set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::ObjectPtr;
    ///
    /// let ptr = ObjectPtr::new("order-17").with_namespace("shop").with_policy(1);
    /// assert_eq!(ptr.local_id, "order-17");
    /// assert_eq!(ptr.namespace, "shop");
    /// assert_eq!(ptr.ptr_type, 0);
    /// ```
    #[must_use]
    pub fn new(local_id: impl Into<String>) -> Self {
        ObjectPtr {
            local_id: local_id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, ptr_type: u8) -> Self {
        self.ptr_type = ptr_type;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: u8) -> Self {
        self.policy = policy;
        self
    }

    /// Presence mask written into the tag byte.
    #[must_use]
    pub fn wire_bits(&self) -> u8 {
        wire::pointer_wire_bits(!self.namespace.is_empty(), self.ptr_type, self.policy)
    }
}

/// Reference to an object by numeric id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectLitePtr {
    pub local_id: u64,
    pub namespace: String,
    pub ptr_type: u8,
    pub policy: u8,
}

impl ObjectLitePtr {
    /// Creates a pointer with only a numeric local id set.
    #[must_use]
    pub fn new(local_id: u64) -> Self {
        ObjectLitePtr {
            local_id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, ptr_type: u8) -> Self {
        self.ptr_type = ptr_type;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: u8) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn wire_bits(&self) -> u8 {
        wire::pointer_wire_bits(!self.namespace.is_empty(), self.ptr_type, self.policy)
    }
}

/// A date-time with an explicit UTC offset.
///
/// `seconds` counts local wall-clock seconds since the epoch, so the UTC
/// instant is `seconds - offset`. `enables` records which components
/// (`MASK_DATE`, `MASK_TIME`, `MASK_OFFSET`) are meaningful; all three fields
/// are always encoded regardless.
///
/// # Examples
///
/// ```rust
/// use chrono::{DateTime, FixedOffset};
/// use dson::ExtDateTime;
///
/// let dt = DateTime::parse_from_rfc3339("2024-05-01T12:30:00+02:00").unwrap();
/// let ext = ExtDateTime::from(dt);
/// assert_eq!(ext.offset, 7200);
/// assert_eq!(ext.enables, ExtDateTime::MASK_ALL);
/// assert_eq!(ext.to_datetime(), Some(dt));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtDateTime {
    pub seconds: i64,
    pub nanos: u32,
    pub offset: i32,
    pub enables: u8,
}

impl ExtDateTime {
    pub const MASK_DATE: u8 = 0x01;
    pub const MASK_TIME: u8 = 0x02;
    pub const MASK_OFFSET: u8 = 0x04;
    pub const MASK_ALL: u8 = Self::MASK_DATE | Self::MASK_TIME | Self::MASK_OFFSET;

    #[must_use]
    pub const fn new(seconds: i64, nanos: u32, offset: i32, enables: u8) -> Self {
        ExtDateTime {
            seconds,
            nanos,
            offset,
            enables,
        }
    }

    /// Converts to a chrono date-time, `None` if out of range.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset)?;
        let utc = DateTime::from_timestamp(self.seconds - i64::from(self.offset), self.nanos)?;
        Some(utc.with_timezone(&offset))
    }
}

impl From<DateTime<FixedOffset>> for ExtDateTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        let offset = dt.offset().local_minus_utc();
        ExtDateTime {
            seconds: dt.timestamp() + i64::from(offset),
            nanos: dt.timestamp_subsec_nanos(),
            offset,
            enables: Self::MASK_ALL,
        }
    }
}

/// A UTC instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    #[must_use]
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Timestamp { seconds, nanos }
    }

    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl<K> DsonValue<K> {
    /// Returns the tag type this value is written with.
    #[must_use]
    pub const fn dson_type(&self) -> DsonType {
        match self {
            DsonValue::Int32(_) => DsonType::Int32,
            DsonValue::Int64(_) => DsonType::Int64,
            DsonValue::Float(_) => DsonType::Float,
            DsonValue::Double(_) => DsonType::Double,
            DsonValue::Bool(_) => DsonType::Bool,
            DsonValue::String(_) => DsonType::String,
            DsonValue::Null => DsonType::Null,
            DsonValue::Binary(_) => DsonType::Binary,
            DsonValue::Pointer(_) => DsonType::Pointer,
            DsonValue::LitePointer(_) => DsonType::LitePointer,
            DsonValue::DateTime(_) => DsonType::DateTime,
            DsonValue::Timestamp(_) => DsonType::Timestamp,
            DsonValue::Header(_) => DsonType::Header,
            DsonValue::Array(_) => DsonType::Array,
            DsonValue::Object(_) => DsonType::Object,
        }
    }

    /// Wire bits this value is written with.
    ///
    /// Integers report the default [`WireType::Varint`](crate::WireType) scheme.
    #[must_use]
    pub fn wire_bits(&self) -> u8 {
        match self {
            DsonValue::Float(v) => wire::float_wire_bits(*v),
            DsonValue::Double(v) => wire::double_wire_bits(*v),
            DsonValue::Bool(b) => u8::from(*b),
            DsonValue::Pointer(ptr) => ptr.wire_bits(),
            DsonValue::LitePointer(ptr) => ptr.wire_bits(),
            DsonValue::DateTime(dt) => dt.enables & 0x07,
            _ => 0,
        }
    }

    /// Returns `true` if the value is NULL.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonValue;
    ///
    /// assert!(DsonValue::<String>::Null.is_null());
    /// assert!(!DsonValue::<String>::from(0).is_null());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, DsonValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, DsonValue::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, DsonValue::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_header(&self) -> bool {
        matches!(self, DsonValue::Header(_))
    }

    /// Returns `true` for OBJECT, ARRAY and HEADER values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{dson, DsonHeader, DsonValue};
    ///
    /// let array: DsonValue = dson!([1, 2]);
    /// assert!(array.is_container());
    /// assert!(DsonValue::<String>::Header(DsonHeader::new()).is_container());
    /// assert!(!DsonValue::<String>::from("text").is_container());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.dson_type().is_container_or_header()
    }

    /// If the value is an INT32, returns it. Otherwise returns `None`.
    ///
    /// An INT64 is not narrowed, even when it would fit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonValue;
    ///
    /// assert_eq!(DsonValue::<String>::Int32(7).as_i32(), Some(7));
    /// assert_eq!(DsonValue::<String>::Int64(7).as_i32(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            DsonValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is an INT64, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DsonValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            DsonValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is a DOUBLE, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonValue;
    ///
    /// assert_eq!(DsonValue::<String>::from(2.5).as_f64(), Some(2.5));
    /// assert_eq!(DsonValue::<String>::Float(2.5).as_f64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DsonValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonValue;
    ///
    /// assert_eq!(DsonValue::<String>::Bool(true).as_bool(), Some(true));
    /// assert_eq!(DsonValue::<String>::Int32(1).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a STRING, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonValue;
    ///
    /// assert_eq!(DsonValue::<String>::from("hello").as_str(), Some("hello"));
    /// assert_eq!(DsonValue::<String>::Null.as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            DsonValue::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_pointer(&self) -> Option<&ObjectPtr> {
        match self {
            DsonValue::Pointer(ptr) => Some(ptr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> Option<&ExtDateTime> {
        match self {
            DsonValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            DsonValue::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_header(&self) -> Option<&DsonHeader<K>> {
        match self {
            DsonValue::Header(header) => Some(header),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&DsonArray<K>> {
        match self {
            DsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// If the value is an OBJECT, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{dson, DsonValue};
    ///
    /// let value: DsonValue = dson!({ "id": 1 });
    /// let object = value.as_object().unwrap();
    /// assert_eq!(object.get("id"), Some(&DsonValue::Int32(1)));
    /// ```
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&DsonObject<K>> {
        match self {
            DsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutable counterpart of [`as_object`](Self::as_object).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{dson, DsonValue};
    ///
    /// let mut value: DsonValue = dson!({ "id": 1 });
    /// if let Some(object) = value.as_object_mut() {
    ///     object.insert("name".to_string(), DsonValue::from("Alice"));
    /// }
    /// assert_eq!(value, dson!({ "id": 1, "name": "Alice" }));
    /// ```
    pub fn as_object_mut(&mut self) -> Option<&mut DsonObject<K>> {
        match self {
            DsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutable counterpart of [`as_array`](Self::as_array).
    pub fn as_array_mut(&mut self) -> Option<&mut DsonArray<K>> {
        match self {
            DsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

fn serialize_datetime<S: Serializer>(dt: &ExtDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match dt.to_datetime() {
        Some(chrono_dt) => serializer.serialize_str(&chrono_dt.to_rfc3339()),
        None => dt.serialize(serializer),
    }
}

struct HeaderEntries<'a, K>(&'a DsonHeader<K>);

impl<K: Serialize> Serialize for HeaderEntries<'_, K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Serialize> Serialize for DsonValue<K> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};
        match self {
            DsonValue::Int32(v) => serializer.serialize_i32(*v),
            DsonValue::Int64(v) => serializer.serialize_i64(*v),
            DsonValue::Float(v) => serializer.serialize_f32(*v),
            DsonValue::Double(v) => serializer.serialize_f64(*v),
            DsonValue::Bool(b) => serializer.serialize_bool(*b),
            DsonValue::String(s) => serializer.serialize_str(s),
            DsonValue::Null => serializer.serialize_unit(),
            DsonValue::Binary(bytes) => serializer.serialize_bytes(bytes),
            DsonValue::Pointer(ptr) => ptr.serialize(serializer),
            DsonValue::LitePointer(ptr) => ptr.serialize(serializer),
            DsonValue::DateTime(dt) => serialize_datetime(dt, serializer),
            DsonValue::Timestamp(ts) => match ts.to_datetime() {
                Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
                None => ts.serialize(serializer),
            },
            DsonValue::Header(header) => HeaderEntries(header).serialize(serializer),
            DsonValue::Array(arr) if arr.header.is_empty() => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr.iter() {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            DsonValue::Array(arr) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(SERDE_HEADER_KEY, &HeaderEntries(&arr.header))?;
                map.serialize_entry(SERDE_ITEMS_KEY, &arr.values)?;
                map.end()
            }
            DsonValue::Object(obj) => {
                let extra = usize::from(!obj.header.is_empty());
                let mut map = serializer.serialize_map(Some(obj.len() + extra))?;
                if extra == 1 {
                    map.serialize_entry(SERDE_HEADER_KEY, &HeaderEntries(&obj.header))?;
                }
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DsonValue<String> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct DsonValueVisitor;

        impl<'de> Visitor<'de> for DsonValueVisitor {
            type Value = DsonValue<String>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid Dson value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(match i32::try_from(value) {
                    Ok(small) => DsonValue::Int32(small),
                    Err(_) => DsonValue::Int64(value),
                })
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E> {
                if let Ok(small) = i32::try_from(value) {
                    Ok(DsonValue::Int32(small))
                } else if let Ok(wide) = i64::try_from(value) {
                    Ok(DsonValue::Int64(wide))
                } else {
                    Ok(DsonValue::Double(value as f64))
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Double(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Binary(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Binary(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(DsonValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    values.push(elem);
                }
                Ok(DsonValue::Array(DsonArray::with_values(values)))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut fields = DsonMap::new();
                while let Some((key, value)) = map.next_entry::<String, DsonValue<String>>()? {
                    fields.insert(key, value);
                }
                let header = match fields.remove(SERDE_HEADER_KEY) {
                    Some(DsonValue::Object(obj)) => {
                        DsonHeader::from_map(obj.fields).map_err(de::Error::custom)?
                    }
                    Some(other) => {
                        return Err(de::Error::custom(format!(
                            "{} must be a map, found {}",
                            SERDE_HEADER_KEY,
                            other.dson_type()
                        )))
                    }
                    None => DsonHeader::new(),
                };
                if !header.is_empty() && fields.len() == 1 {
                    if let Some(DsonValue::Array(_)) = fields.get(SERDE_ITEMS_KEY) {
                        if let Some(DsonValue::Array(arr)) = fields.remove(SERDE_ITEMS_KEY) {
                            return Ok(DsonValue::Array(DsonArray {
                                header,
                                values: arr.values,
                            }));
                        }
                    }
                }
                Ok(DsonValue::Object(DsonObject { header, fields }))
            }
        }

        deserializer.deserialize_any(DsonValueVisitor)
    }
}

impl<K> TryFrom<DsonValue<K>> for i32 {
    type Error = Error;

    fn try_from(value: DsonValue<K>) -> Result<Self> {
        match value {
            DsonValue::Int32(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Int32, other.dson_type())),
        }
    }
}

impl<K> TryFrom<DsonValue<K>> for i64 {
    type Error = Error;

    fn try_from(value: DsonValue<K>) -> Result<Self> {
        match value {
            DsonValue::Int64(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Int64, other.dson_type())),
        }
    }
}

impl<K> TryFrom<DsonValue<K>> for f64 {
    type Error = Error;

    fn try_from(value: DsonValue<K>) -> Result<Self> {
        match value {
            DsonValue::Double(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Double, other.dson_type())),
        }
    }
}

impl<K> TryFrom<DsonValue<K>> for bool {
    type Error = Error;

    fn try_from(value: DsonValue<K>) -> Result<Self> {
        match value {
            DsonValue::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch(DsonType::Bool, other.dson_type())),
        }
    }
}

impl<K> TryFrom<DsonValue<K>> for String {
    type Error = Error;

    fn try_from(value: DsonValue<K>) -> Result<Self> {
        match value {
            DsonValue::String(s) => Ok(s),
            other => Err(Error::type_mismatch(DsonType::String, other.dson_type())),
        }
    }
}

impl<K> From<bool> for DsonValue<K> {
    fn from(value: bool) -> Self {
        DsonValue::Bool(value)
    }
}

impl<K> From<i8> for DsonValue<K> {
    fn from(value: i8) -> Self {
        DsonValue::Int32(i32::from(value))
    }
}

impl<K> From<i16> for DsonValue<K> {
    fn from(value: i16) -> Self {
        DsonValue::Int32(i32::from(value))
    }
}

impl<K> From<i32> for DsonValue<K> {
    fn from(value: i32) -> Self {
        DsonValue::Int32(value)
    }
}

impl<K> From<i64> for DsonValue<K> {
    fn from(value: i64) -> Self {
        DsonValue::Int64(value)
    }
}

impl<K> From<u8> for DsonValue<K> {
    fn from(value: u8) -> Self {
        DsonValue::Int32(i32::from(value))
    }
}

impl<K> From<u16> for DsonValue<K> {
    fn from(value: u16) -> Self {
        DsonValue::Int32(i32::from(value))
    }
}

impl<K> From<u32> for DsonValue<K> {
    fn from(value: u32) -> Self {
        DsonValue::Int64(i64::from(value))
    }
}

impl<K> From<f32> for DsonValue<K> {
    fn from(value: f32) -> Self {
        DsonValue::Float(value)
    }
}

impl<K> From<f64> for DsonValue<K> {
    fn from(value: f64) -> Self {
        DsonValue::Double(value)
    }
}

impl<K> From<String> for DsonValue<K> {
    fn from(value: String) -> Self {
        DsonValue::String(value)
    }
}

impl<K> From<&str> for DsonValue<K> {
    fn from(value: &str) -> Self {
        DsonValue::String(value.to_string())
    }
}

impl<K> From<&[u8]> for DsonValue<K> {
    fn from(value: &[u8]) -> Self {
        DsonValue::Binary(value.to_vec())
    }
}

impl<K> From<ObjectPtr> for DsonValue<K> {
    fn from(value: ObjectPtr) -> Self {
        DsonValue::Pointer(value)
    }
}

impl<K> From<ObjectLitePtr> for DsonValue<K> {
    fn from(value: ObjectLitePtr) -> Self {
        DsonValue::LitePointer(value)
    }
}

impl<K> From<ExtDateTime> for DsonValue<K> {
    fn from(value: ExtDateTime) -> Self {
        DsonValue::DateTime(value)
    }
}

impl<K> From<Timestamp> for DsonValue<K> {
    fn from(value: Timestamp) -> Self {
        DsonValue::Timestamp(value)
    }
}

impl<K> From<Vec<DsonValue<K>>> for DsonValue<K> {
    fn from(value: Vec<DsonValue<K>>) -> Self {
        DsonValue::Array(DsonArray::with_values(value))
    }
}

impl<K> From<DsonArray<K>> for DsonValue<K> {
    fn from(value: DsonArray<K>) -> Self {
        DsonValue::Array(value)
    }
}

impl<K> From<DsonObject<K>> for DsonValue<K> {
    fn from(value: DsonObject<K>) -> Self {
        DsonValue::Object(value)
    }
}

impl<K> From<DsonMap<K>> for DsonValue<K> {
    fn from(value: DsonMap<K>) -> Self {
        DsonValue::Object(DsonObject::from(value))
    }
}

impl<K> From<DsonHeader<K>> for DsonValue<K> {
    fn from(value: DsonHeader<K>) -> Self {
        DsonValue::Header(value)
    }
}
