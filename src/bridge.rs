//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The `serde` bridge.
//!
//! Serde has no built-in notion of a Date or a UID, so both are carried
//! across the serde boundary as single-field pseudo-structs with a magic
//! name and field, the same trick used by formats like TOML for its own
//! `Date` type. `Value` itself bridges via [`ValueDeserializer`] (source)
//! and [`ValueSerializer`] (sink), so any `Deserialize`/`Serialize` type
//! can be carried through a bplist document without going through an
//! intermediate object model of its own.

use serde::de::{self, Deserialize, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize};

use std::convert::TryFrom;
use std::fmt;
use std::vec;

use crate::error::Error;
use crate::value::{Date, Uid, Value};

pub const DATE_STRUCT_NAME: &str = "$__bplist_private_Date";
pub const DATE_STRUCT_FIELD: &str = "$__bplist_private_Date_unix_seconds";
pub const UID_STRUCT_NAME: &str = "$__bplist_private_Uid";
pub const UID_STRUCT_FIELD: &str = "$__bplist_private_Uid_value";

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct(DATE_STRUCT_NAME, 1)?;
        state.serialize_field(DATE_STRUCT_FIELD, &self.unix_seconds())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct DateVisitor;

        impl<'de> Visitor<'de> for DateVisitor {
            type Value = Date;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a date")
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Date, V::Error>
            where
                V: MapAccess<'de>,
            {
                let key: String = visitor.next_key()?.ok_or_else(|| {
                    de::Error::custom("date key not found")
                })?;
                if key != DATE_STRUCT_FIELD {
                    return Err(de::Error::custom("expected the bplist date field"));
                }
                let unix_seconds: f64 = visitor.next_value()?;
                Ok(Date::from_unix_seconds(unix_seconds))
            }
        }

        deserializer.deserialize_struct(DATE_STRUCT_NAME, &[DATE_STRUCT_FIELD], DateVisitor)
    }
}

impl Serialize for Uid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct(UID_STRUCT_NAME, 1)?;
        state.serialize_field(UID_STRUCT_FIELD, &self.get())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D>(deserializer: D) -> Result<Uid, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct UidVisitor;

        impl<'de> Visitor<'de> for UidVisitor {
            type Value = Uid;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a uid")
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Uid, V::Error>
            where
                V: MapAccess<'de>,
            {
                let key: String = visitor.next_key()?.ok_or_else(|| {
                    de::Error::custom("uid key not found")
                })?;
                if key != UID_STRUCT_FIELD {
                    return Err(de::Error::custom("expected the bplist uid field"));
                }
                let value: u64 = visitor.next_value()?;
                Ok(Uid::new(value))
            }
        }

        deserializer.deserialize_struct(UID_STRUCT_NAME, &[UID_STRUCT_FIELD], UidVisitor)
    }
}

/// Deserializes any `T: Deserialize` from an owned [`Value`] tree.
pub fn from_value<T>(value: Value) -> Result<T, Error>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(ValueDeserializer { value })
}

/// Serializes any `T: Serialize` into an owned [`Value`] tree.
pub fn to_value<T>(value: &T) -> Result<Value, Error>
where
    T: Serialize,
{
    value.serialize(ValueSerializer)
}

/// A `serde::Deserializer` which walks an owned [`Value`] tree.
struct ValueDeserializer {
    value: Value,
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(n) => visitor.visit_i64(n),
            Value::Real(f) => visitor.visit_f64(f.into_inner()),
            Value::Data(bytes) => visitor.visit_byte_buf(bytes),
            Value::String(s) => visitor.visit_string(s),
            Value::Date(date) => visitor.visit_map(MagicFieldAccess::date(date)),
            Value::Uid(uid) => visitor.visit_map(MagicFieldAccess::uid(uid)),
            Value::Array(values) => visitor.visit_seq(ArrayAccess { iter: values.into_iter() }),
            Value::Dictionary(map) => visitor.visit_map(DictionaryAccess {
                iter: map.into_iter(),
                pending_value: None,
            }),
        }
    }

    serde::forward_to_deserialize_any! {
        bool
        u8 u16 u32 u64 u128
        i8 i16 i32 i64 i128
        f32 f64
        char str string
        seq map
        bytes byte_buf
        enum
        struct
        unit unit_struct
        tuple tuple_struct
        newtype_struct
        ignored_any
        option
        identifier
    }
}

/// Yields a single `(magic field name, scalar)` entry, the same trick used by
/// [`Date`] and [`Uid`]'s own `Deserialize` implementations, generalized so the
/// tree-walking deserializer above can reach those impls without re-parsing bytes.
enum MagicFieldAccess {
    Date { field: &'static str, value: f64, done: bool },
    Uid { field: &'static str, value: u64, done: bool },
}

impl MagicFieldAccess {
    fn date(date: Date) -> Self {
        MagicFieldAccess::Date {
            field: DATE_STRUCT_FIELD,
            value: date.unix_seconds(),
            done: false,
        }
    }

    fn uid(uid: Uid) -> Self {
        MagicFieldAccess::Uid {
            field: UID_STRUCT_FIELD,
            value: uid.get(),
            done: false,
        }
    }
}

impl<'de> MapAccess<'de> for MagicFieldAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        let (done, field) = match self {
            MagicFieldAccess::Date { done, field, .. } => (done, *field),
            MagicFieldAccess::Uid { done, field, .. } => (done, *field),
        };
        if *done {
            return Ok(None);
        }
        *done = true;
        seed.deserialize(field.into_deserializer()).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self {
            MagicFieldAccess::Date { value, .. } => seed.deserialize((*value).into_deserializer()),
            MagicFieldAccess::Uid { value, .. } => seed.deserialize((*value).into_deserializer()),
        }
    }
}

struct ArrayAccess {
    iter: vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer { value }).map(Some),
            None => Ok(None),
        }
    }
}

struct DictionaryAccess {
    iter: std::collections::btree_map::IntoIter<Value, Value>,
    pending_value: Option<Value>,
}

impl<'de> MapAccess<'de> for DictionaryAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending_value = Some(value);
                seed.deserialize(ValueDeserializer { value: key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self.pending_value.take().expect("next_value_seed called before next_key_seed");
        seed.deserialize(ValueDeserializer { value })
    }
}

/// A `serde::Serializer` which builds an owned [`Value`] tree.
///
/// Struct serialization is intercepted for the magic [`Date`]/[`Uid`] names so
/// that those types round-trip through their dedicated `Value` variants rather
/// than becoming one-field dictionaries.
struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMapState;
    type SerializeStruct = SerializeStructState;
    type SerializeStructVariant = SerializeStructState;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> { Ok(Value::Boolean(v)) }
    fn serialize_i8(self, v: i8) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_i16(self, v: i16) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_i32(self, v: i32) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_i64(self, v: i64) -> Result<Value, Error> { Ok(Value::Integer(v)) }
    fn serialize_u8(self, v: u8) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_u16(self, v: u16) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_u32(self, v: u32) -> Result<Value, Error> { Ok(Value::Integer(v as i64)) }
    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::Unsupported("u64 (value exceeds i64::MAX)"))
    }
    fn serialize_f32(self, v: f32) -> Result<Value, Error> { Ok(Value::from(v as f64)) }
    fn serialize_f64(self, v: f64) -> Result<Value, Error> { Ok(Value::from(v)) }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::Data(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Err(Error::Unsupported("Option::None"))
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<Value, Error>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Err(Error::Unsupported("()"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Err(Error::Unsupported("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        let mut map = crate::value::Dictionary::new();
        map.insert(Value::String(variant.to_owned()), value.serialize(self)?);
        Ok(Value::Dictionary(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec, Error> {
        Ok(SerializeVec { values: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeVec, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMapState, Error> {
        Ok(SerializeMapState {
            map: crate::value::Dictionary::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<SerializeStructState, Error> {
        Ok(SerializeStructState {
            name,
            map: crate::value::Dictionary::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructState, Error> {
        Ok(SerializeStructState {
            name: "",
            map: crate::value::Dictionary::new(),
        })
    }
}

struct SerializeVec {
    values: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.values.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.values))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

struct SerializeMapState {
    map: crate::value::Dictionary,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for SerializeMapState {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.pending_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        let key = self.pending_key.take().expect("serialize_value called before serialize_key");
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Dictionary(self.map))
    }
}

struct SerializeStructState {
    name: &'static str,
    map: crate::value::Dictionary,
}

impl ser::SerializeStruct for SerializeStructState {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.map.insert(Value::String(key.to_owned()), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        if self.name == DATE_STRUCT_NAME {
            let unix_seconds = self.map
                .get(&Value::String(DATE_STRUCT_FIELD.to_owned()))
                .and_then(Value::as_real)
                .ok_or(Error::Unsupported("malformed date pseudo-struct"))?;
            Ok(Value::Date(Date::from_unix_seconds(unix_seconds)))
        } else if self.name == UID_STRUCT_NAME {
            let value = self.map
                .get(&Value::String(UID_STRUCT_FIELD.to_owned()))
                .and_then(Value::as_integer)
                .ok_or(Error::Unsupported("malformed uid pseudo-struct"))?;
            Ok(Value::Uid(Uid::new(value as u64)))
        } else {
            Ok(Value::Dictionary(self.map))
        }
    }
}

impl ser::SerializeStructVariant for SerializeStructState {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeStruct::end(self)
    }
}
