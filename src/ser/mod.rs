//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist generator.
//!
//! Generation happens in two passes over the [`Value`] tree:
//!
//! 1. [`plan_value`] walks the tree in the same pre-order a reader would
//!    encounter it, assigning every object an index before visiting its
//!    children (a container reserves its own index, then its children take
//!    the indices that follow). The result is a flat `Vec<ObjectPlan>`.
//! 2. Once the plan is complete, `num_objects` and the final object-region
//!    byte length are both known, so `ref_size` and `offset_size` are each
//!    chosen once, up front, as the narrowest width that can index every
//!    object or byte respectively. Encoding the plan into bytes is then a
//!    single straight-line pass with no placeholders to patch back in.

use ascii::AsciiStr;

use crate::document::{
    HEADER_BPLIST00,
    HEADER_SIZE,
    MAX_RECURSION_DEPTH,
    TRAILER_SIZE,
    MARKER_FALSE,
    MARKER_TRUE,
    MARKER_INT8,
    MARKER_INT16,
    MARKER_INT32,
    MARKER_INT64,
    MARKER_FLOAT64,
    MARKER_DATE,
    TAG_DATA,
    TAG_ASCII_STRING,
    TAG_UTF16_STRING,
    TAG_UID,
    TAG_ARRAY,
    TAG_DICTIONARY,
};
use crate::error::{Error, Result};
use crate::value::Value;

/// A single object's encoding, deferred until `ref_size` is known for the
/// container variants.
enum ObjectPlan {
    /// Fully-encoded bytes for a scalar object; independent of `ref_size`.
    Leaf(Vec<u8>),
    /// An array; each entry is the index of a child object.
    Array(Vec<usize>),
    /// A dictionary; each pair is `(key index, value index)`.
    Dictionary(Vec<(usize, usize)>),
}

/// Assigns `value` the next object index, recording its plan in `objects`,
/// and returns that index. Containers reserve their index before visiting
/// children, so indices increase in the same pre-order a reader would walk.
fn plan_value(value: &Value, depth: usize, objects: &mut Vec<ObjectPlan>) -> Result<usize> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::DepthExceeded);
    }

    match value {
        Value::Array(items) => {
            let index = objects.len();
            objects.push(ObjectPlan::Leaf(Vec::new()));
            let mut children = Vec::with_capacity(items.len());
            for item in items {
                children.push(plan_value(item, depth + 1, objects)?);
            }
            objects[index] = ObjectPlan::Array(children);
            Ok(index)
        }
        Value::Dictionary(map) => {
            let index = objects.len();
            objects.push(ObjectPlan::Leaf(Vec::new()));
            let mut pairs = Vec::with_capacity(map.len());
            for (key, value) in map {
                let key_index = plan_value(key, depth + 1, objects)?;
                let value_index = plan_value(value, depth + 1, objects)?;
                pairs.push((key_index, value_index));
            }
            objects[index] = ObjectPlan::Dictionary(pairs);
            Ok(index)
        }
        scalar => {
            let index = objects.len();
            objects.push(ObjectPlan::Leaf(encode_scalar(scalar)));
            Ok(index)
        }
    }
}

/// Returns the width class (1, 2, or 4 bytes) needed to hold `max_value`,
/// the same minimal-size-class rule used for both `offset_size` and
/// `ref_size`. 8-byte widths are accepted on read but are never chosen here;
/// a document needing one is larger than this generator supports.
fn minimal_width(max_value: u64, overflow: Error) -> Result<usize> {
    if max_value <= 0xFF {
        Ok(1)
    } else if max_value <= 0xFFFF {
        Ok(2)
    } else if max_value <= 0xFFFF_FFFF {
        Ok(4)
    } else {
        Err(overflow)
    }
}

/// Appends the big-endian encoding of `value` in exactly `width` bytes.
fn encode_width(buf: &mut Vec<u8>, width: usize, value: u64) {
    let bytes = value.to_be_bytes();
    buf.extend_from_slice(&bytes[8 - width..]);
}

/// Appends a type-and-length marker: embedded if `length < 0xF`, otherwise an
/// extended marker followed by `length` encoded as its own integer object.
fn encode_type_and_length(buf: &mut Vec<u8>, tag: u8, length: usize) {
    if length < 0x0F {
        buf.push(tag | length as u8);
    } else {
        buf.push(tag | 0x0F);
        encode_int(buf, length as i64);
    }
}

/// Chooses the narrowest integer width that can hold `value`'s two's
/// complement bit pattern and appends the marker and payload.
///
/// Negative values always take the full 8 bytes: the sign bit guarantees no
/// narrower width could represent them, which matches how Cocoa's own
/// generator treats signed integers.
fn encode_int(buf: &mut Vec<u8>, value: i64) {
    let bits = value as u64;
    let width = match bits.leading_zeros() {
        0..=31 => 8,
        32..=47 => 4,
        48..=55 => 2,
        _ => 1,
    };
    buf.push(match width {
        8 => MARKER_INT64,
        4 => MARKER_INT32,
        2 => MARKER_INT16,
        _ => MARKER_INT8,
    });
    encode_width(buf, width, bits);
}

/// Chooses the narrowest width that can hold `value` and appends the UID
/// marker (low nibble `width - 1`) and payload.
fn encode_uid(buf: &mut Vec<u8>, value: u64) {
    let width = match value.leading_zeros() {
        0..=31 => 8,
        32..=47 => 4,
        48..=55 => 2,
        _ => 1,
    };
    buf.push(TAG_UID | (width as u8 - 1));
    encode_width(buf, width, value);
}

/// Encodes a string as 7-bit ASCII when possible, falling back to UTF-16BE.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    if let Ok(ascii) = AsciiStr::from_ascii(s.as_bytes()) {
        encode_type_and_length(buf, TAG_ASCII_STRING, ascii.len());
        buf.extend_from_slice(ascii.as_bytes());
    } else {
        let units: Vec<u16> = s.encode_utf16().collect();
        encode_type_and_length(buf, TAG_UTF16_STRING, units.len());
        for unit in units {
            buf.extend_from_slice(&unit.to_be_bytes());
        }
    }
}

/// Encodes any non-container value into a standalone object byte sequence.
fn encode_scalar(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    match value {
        Value::Boolean(b) => buf.push(if *b { MARKER_TRUE } else { MARKER_FALSE }),
        Value::Integer(n) => encode_int(&mut buf, *n),
        Value::Real(f) => {
            buf.push(MARKER_FLOAT64);
            buf.extend_from_slice(&f.into_inner().to_bits().to_be_bytes());
        }
        Value::Date(date) => {
            buf.push(MARKER_DATE);
            buf.extend_from_slice(&date.to_wire().to_bits().to_be_bytes());
        }
        Value::Uid(uid) => encode_uid(&mut buf, uid.get()),
        Value::Data(bytes) => {
            encode_type_and_length(&mut buf, TAG_DATA, bytes.len());
            buf.extend_from_slice(bytes);
        }
        Value::String(s) => encode_string(&mut buf, s),
        Value::Array(_) | Value::Dictionary(_) =>
            unreachable!("containers are planned by plan_value, not encoded as scalars"),
    }
    buf
}

/// Encodes every planned object in index order, returning the concatenated
/// object region and the absolute file offset (header included) at which
/// each object begins.
fn encode_objects(objects: &[ObjectPlan], ref_size: usize) -> (Vec<u8>, Vec<usize>) {
    let mut buf = Vec::new();
    let mut offsets = Vec::with_capacity(objects.len());
    for plan in objects {
        offsets.push(HEADER_SIZE + buf.len());
        match plan {
            ObjectPlan::Leaf(bytes) => buf.extend_from_slice(bytes),
            ObjectPlan::Array(children) => {
                encode_type_and_length(&mut buf, TAG_ARRAY, children.len());
                for &child in children {
                    encode_width(&mut buf, ref_size, child as u64);
                }
            }
            ObjectPlan::Dictionary(pairs) => {
                encode_type_and_length(&mut buf, TAG_DICTIONARY, pairs.len());
                for &(key, _) in pairs {
                    encode_width(&mut buf, ref_size, key as u64);
                }
                for &(_, value) in pairs {
                    encode_width(&mut buf, ref_size, value as u64);
                }
            }
        }
    }
    (buf, offsets)
}

/// Generates a complete `bplist00` document for `value`.
pub fn generate(value: &Value) -> Result<Vec<u8>> {
    let mut objects = Vec::new();
    let top_object = plan_value(value, 0, &mut objects)?;

    let max_index = objects.len().saturating_sub(1);
    let ref_size = minimal_width(max_index as u64, Error::TooManyObjects)?;

    let (object_bytes, offsets) = encode_objects(&objects, ref_size);
    let offset_table_offset = HEADER_SIZE + object_bytes.len();
    let offset_size = minimal_width(offset_table_offset as u64, Error::TooLarge)?;

    let mut out = Vec::with_capacity(
        HEADER_BPLIST00.len() + object_bytes.len() + offsets.len() * offset_size + TRAILER_SIZE
    );
    out.extend_from_slice(HEADER_BPLIST00);
    out.extend_from_slice(&object_bytes);
    for &offset in &offsets {
        encode_width(&mut out, offset_size, offset as u64);
    }

    out.extend_from_slice(&[0u8; 6]);
    out.push(offset_size as u8);
    out.push(ref_size as u8);
    out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    out.extend_from_slice(&(top_object as u64).to_be_bytes());
    out.extend_from_slice(&(offset_table_offset as u64).to_be_bytes());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Date, Uid};

    #[test]
    fn test_generate_true() {
        let bytes = generate(&Value::Boolean(true)).unwrap();
        assert_eq!(&bytes[0..8], HEADER_BPLIST00);
        assert_eq!(bytes[8], MARKER_TRUE);
    }

    #[test]
    fn test_generate_small_array_roundtrips() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        let bytes = generate(&value).unwrap();
        let parsed = crate::de::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_generate_dictionary_roundtrips() {
        let mut map = crate::value::Dictionary::new();
        map.insert(Value::String("name".into()), Value::String("bplist00".into()));
        map.insert(Value::String("count".into()), Value::Integer(42));
        let value = Value::Dictionary(map);
        let bytes = generate(&value).unwrap();
        let parsed = crate::de::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_generate_date_and_uid_roundtrip() {
        let value = Value::Array(vec![
            Value::Date(Date::from_unix_seconds(1_700_000_000.0)),
            Value::Uid(Uid::new(0xDEAD_BEEF)),
        ]);
        let bytes = generate(&value).unwrap();
        let parsed = crate::de::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_generate_utf16_string_roundtrip() {
        let value = Value::String("héllo wörld 🦀".to_owned());
        let bytes = generate(&value).unwrap();
        let parsed = crate::de::parse(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_generate_negative_integer_uses_eight_bytes() {
        let bytes = generate(&Value::Integer(-1)).unwrap();
        assert_eq!(bytes[8], MARKER_INT64);
    }

    #[test]
    fn test_generate_rejects_excessive_depth() {
        let mut value = Value::Array(vec![]);
        for _ in 0..(MAX_RECURSION_DEPTH + 2) {
            value = Value::Array(vec![value]);
        }
        assert_eq!(generate(&value).unwrap_err(), Error::DepthExceeded);
    }
}
