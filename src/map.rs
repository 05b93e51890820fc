//! Ordered map type for Dson objects and headers.
//!
//! This module provides [`DsonMap`], a wrapper around [`IndexMap`] that keeps
//! fields in insertion order. Field order is part of a Dson value: it is the
//! order fields are written on the wire and the declaration order a buffered
//! reader replays.
//!
//! Equality is order-sensitive, so two maps with the same entries in a
//! different order are different values.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{DsonMap, DsonValue};
//!
//! let mut map = DsonMap::new();
//! map.insert("name".to_string(), DsonValue::from("Alice"));
//! map.insert("age".to_string(), DsonValue::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::value::DsonValue;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// An insertion-ordered map of field names to Dson values.
///
/// # Examples
///
/// ```rust
/// use dson::{DsonMap, DsonValue};
///
/// let mut map = DsonMap::new();
/// map.insert("first".to_string(), DsonValue::from(1));
/// map.insert("second".to_string(), DsonValue::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone)]
pub struct DsonMap<K = String>(IndexMap<K, DsonValue<K>>);

impl<K> DsonMap<K> {
    /// Creates an empty `DsonMap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonMap;
    ///
    /// let map: DsonMap = DsonMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        DsonMap(IndexMap::new())
    }

    /// Creates an empty `DsonMap` with room for `capacity` fields.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonMap;
    ///
    /// let map: DsonMap = DsonMap::with_capacity(10);
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        DsonMap(IndexMap::with_capacity(capacity))
    }

    /// Returns the number of fields in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonMap, DsonValue};
    ///
    /// let mut map = DsonMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert("key".to_string(), DsonValue::from(42));
    /// assert_eq!(map.len(), 1);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, DsonValue<K>> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, K, DsonValue<K>> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, DsonValue<K>> {
        self.0.iter()
    }
}

impl<K: Hash + Eq> DsonMap<K> {
    /// Inserts a field.
    ///
    /// Replacing an existing key keeps its original position and returns the
    /// old value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonMap, DsonValue};
    ///
    /// let mut map = DsonMap::new();
    /// assert!(map.insert("key".to_string(), DsonValue::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), DsonValue::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: K, value: DsonValue<K>) -> Option<DsonValue<K>> {
        self.0.insert(key, value)
    }

    /// Returns the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonMap, DsonValue};
    ///
    /// let mut map = DsonMap::new();
    /// map.insert("key".to_string(), DsonValue::from(42));
    /// assert_eq!(map.get("key").and_then(|v| v.as_i32()), Some(42));
    /// assert!(map.get("missing").is_none());
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonMap, DsonValue};
    ///
    /// let mut map = DsonMap::new();
    /// map.insert("count".to_string(), DsonValue::from(1));
    /// if let Some(value) = map.get_mut("count") {
    ///     *value = DsonValue::from(2);
    /// }
    /// assert_eq!(map.get("count"), Some(&DsonValue::Int32(2)));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.get_mut(key)
    }

    /// Returns `true` if the map has a field named `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.contains_key(key)
    }

    /// Removes a field, shifting later fields down to keep their order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonMap, DsonValue};
    ///
    /// let mut map = DsonMap::new();
    /// map.insert("a".to_string(), DsonValue::Null);
    /// map.insert("b".to_string(), DsonValue::from(true));
    /// map.insert("c".to_string(), DsonValue::Null);
    ///
    /// assert_eq!(map.remove("b"), Some(DsonValue::Bool(true)));
    /// let keys: Vec<_> = map.keys().cloned().collect();
    /// assert_eq!(keys, vec!["a", "c"]);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.shift_remove(key)
    }
}

impl<K> Default for DsonMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq> PartialEq for DsonMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K> IntoIterator for DsonMap<K> {
    type Item = (K, DsonValue<K>);
    type IntoIter = indexmap::map::IntoIter<K, DsonValue<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a DsonMap<K> {
    type Item = (&'a K, &'a DsonValue<K>);
    type IntoIter = indexmap::map::Iter<'a, K, DsonValue<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Hash + Eq> FromIterator<(K, DsonValue<K>)> for DsonMap<K> {
    fn from_iter<T: IntoIterator<Item = (K, DsonValue<K>)>>(iter: T) -> Self {
        DsonMap(IndexMap::from_iter(iter))
    }
}
