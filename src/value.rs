//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist value tree.
//!
//! The bplist format version 00 supports the following object kinds:
//!
//! 1. Boolean.
//! 2. Integers, up to 64 bits long.
//! 3. Real, single- and double-precision (always re-emitted as double).
//! 4. Data.
//! 5. Date.
//! 6. String (ASCII or UTF-16, chosen automatically on generation).
//! 7. Uid.
//! 8. Array.
//! 9. Dictionary.
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c

use ordered_float::OrderedFloat;

use std::collections::BTreeMap;

/// The difference, in seconds, between the Core Data epoch (2001-01-01 UTC)
/// and the UNIX epoch (1970-01-01 UTC).
pub const UNIX_TO_CORE_DATA_EPOCH_DELTA: f64 = 978307200.0;

/// A bplist date, stored as whole-program Unix-epoch seconds.
///
/// On the wire, dates are `CFAbsoluteTime` values: an IEEE double counting
/// seconds since the Core Data epoch (2001-01-01 UTC). This type always
/// exposes and accepts Unix-epoch seconds; the epoch shift happens at the
/// parse/generate boundary (see [`Date::from_wire`] and [`Date::to_wire`]).
#[derive(Copy, Clone, Debug)]
pub struct Date {
    unix_seconds: OrderedFloat<f64>,
}

impl Date {
    /// Constructs a date from a Unix-epoch second count.
    pub fn from_unix_seconds(unix_seconds: f64) -> Self {
        Date { unix_seconds: OrderedFloat(unix_seconds) }
    }

    /// Returns the Unix-epoch second count.
    pub fn unix_seconds(&self) -> f64 {
        self.unix_seconds.into_inner()
    }

    /// Constructs a date from a raw `CFAbsoluteTime` (Core Data epoch) value.
    pub(crate) fn from_wire(core_data_seconds: f64) -> Self {
        Date::from_unix_seconds(core_data_seconds + UNIX_TO_CORE_DATA_EPOCH_DELTA)
    }

    /// Returns the raw `CFAbsoluteTime` (Core Data epoch) value for this date.
    pub(crate) fn to_wire(&self) -> f64 {
        self.unix_seconds() - UNIX_TO_CORE_DATA_EPOCH_DELTA
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        self.unix_seconds == other.unix_seconds
    }
}
impl Eq for Date {}

impl PartialOrd for Date {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Date {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.unix_seconds.cmp(&other.unix_seconds)
    }
}

impl std::hash::Hash for Date {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.unix_seconds.hash(state)
    }
}

/// A bplist UID, used by keyed archivers to designate object identities.
///
/// Semantically distinct from [`Value::Integer`] even though both are
/// unsigned numbers on the wire: a `Uid` is never mistaken for an integer
/// during generator dispatch (see `ser::generate_object`).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Uid {
    value: u64,
}

impl Uid {
    /// Constructs a UID from its numeric value.
    pub fn new(value: u64) -> Self {
        Uid { value }
    }

    /// Returns the numeric value of the UID.
    pub fn get(&self) -> u64 {
        self.value
    }
}

/// An ordered array of bplist values.
pub type Array = Vec<Value>;

/// An ordered mapping of bplist values to bplist values.
///
/// Backed by a `BTreeMap` so that dictionary keys have a total order
/// (required for `Value` itself to implement `Ord`/`Eq`); encoding preserves
/// insertion order is not meaningful here since the map itself has none — a
/// dictionary parsed from a document and then regenerated is not guaranteed
/// to reproduce the original key order.
pub type Dictionary = BTreeMap<Value, Value>;

/// Any value which can be encoded in or decoded from a binary property list.
///
/// This is a closed, tagged union: every variant below is a worked-out
/// logical kind from the format specification. There is deliberately no
/// catch-all variant; a value that cannot be expressed here cannot be
/// represented in a bplist00 document at all (`null`, `url`, `uuid`, and
/// `set` are not observed in the wild and are not modeled).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Value {
    /// A boolean value.
    Boolean(bool),
    /// An integer value of up to 64 bits.
    Integer(i64),
    /// A double-precision floating point value.
    Real(OrderedFloat<f64>),
    /// A date, stored and exposed as Unix-epoch seconds.
    Date(Date),
    /// A UID used by keyed archivers; distinct from a plain integer.
    Uid(Uid),
    /// An opaque byte string.
    Data(Vec<u8>),
    /// A text string. Encoded as ASCII or UTF-16BE depending on content.
    String(String),
    /// An ordered array of values.
    Array(Array),
    /// A mapping of values to values.
    Dictionary(Dictionary),
}

impl Value {
    /// Returns the value as a `bool`, if it is one.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an `i64`, if it is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as an `f64`, if it is a real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(n) => Some(n.into_inner()),
            _ => None,
        }
    }

    /// Returns the value as a [`Date`], if it is one.
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the value as a [`Uid`], if it is one.
    pub fn as_uid(&self) -> Option<&Uid> {
        match self {
            Value::Uid(u) => Some(u),
            _ => None,
        }
    }

    /// Returns the value as a byte slice, if it is data.
    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Value::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array slice, if it is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the value as a dictionary, if it is one.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(OrderedFloat(v))
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Value::Date(v)
    }
}

impl From<Uid> for Value {
    fn from(v: Uid) -> Self {
        Value::Uid(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Data(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &'a str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<Dictionary> for Value {
    fn from(v: Dictionary) -> Self {
        Value::Dictionary(v)
    }
}
