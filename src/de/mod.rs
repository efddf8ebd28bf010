//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

mod parser;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::document::{
    HEADER_VERSION_00,
    MINIMUM_DOCUMENT_SIZE,
    MAX_RECURSION_DEPTH,
    HEADER_SIZE,
    TRAILER_SIZE,
    OffsetTable,
    ObjectFormat,
};
use crate::error::{Error, Result};
use crate::value::{Date, Uid, Value};

#[derive(Clone, Eq, PartialEq, Debug)]
struct Metadata {
    /// The table of offsets from the start of the input to the location of a given object.
    offset_table: OffsetTable,
    /// The byte length of an object reference within a container.
    ref_size: usize,
    /// The index of the top-level object to decode.
    top_object: usize,
    /// The range of bytes of the input where objects may reside. Every object's data,
    /// including the payload of a variable-length object, must fall entirely within
    /// this range.
    object_table_range: std::ops::Range<usize>,
}

impl Metadata {
    /// Utilizes the offset table to compute the offset of the given object.
    fn offset_of(&self, object: usize) -> Result<usize> {
        self.offset_table
            .get(object)
            .copied()
            .ok_or(Error::OutOfBounds)
    }
}

/// Provides bounds-checked access to objects within the object table.
#[derive(Debug)]
struct ObjectTable<'a> {
    input: &'a [u8],
    metadata: Metadata,
}

/// Defines a basic parser with bounds-aware error handling.
macro_rules! define_parser {
    ($name:ident, $parser:expr, $type:ty) => {
        fn $name(&self, object: usize) -> Result<$type> {
            let data = self.data_for(object)?;
            $parser(data)
                .map(|(_, value)| value)
                .map_err(|_| Error::Truncated)
        }
    };
}

impl<'a> ObjectTable<'a> {
    /// Returns the slice of the input corresponding to the object, bounded to the
    /// object table region so that a malicious length prefix cannot read into the
    /// offset table or trailer.
    fn data_for(&self, object: usize) -> Result<&'a [u8]> {
        let offset = self.metadata.offset_of(object)?;

        if !self.metadata.object_table_range.contains(&offset) {
            return Err(Error::OutOfBounds);
        }

        Ok(&self.input[offset..self.metadata.object_table_range.end])
    }

    /// Parses the marker byte for the specified object and returns the format.
    fn kind_of(&self, object: usize) -> Result<ObjectFormat> {
        let data = self.data_for(object)?;
        parser::object::any_marker(data)
            .map(|(_, (format, _))| format)
            .map_err(|_| Error::UnknownTag)
    }

    define_parser!(parse_boolean, parser::object::boolean, bool);
    define_parser!(parse_uint8, parser::object::uint8, u8);
    define_parser!(parse_uint16, parser::object::uint16, u16);
    define_parser!(parse_uint32, parser::object::uint32, u32);
    define_parser!(parse_sint64, parser::object::sint64, i64);
    define_parser!(parse_float32, parser::object::float32, f32);
    define_parser!(parse_float64, parser::object::float64, f64);
    define_parser!(parse_date, parser::object::date, f64);
    define_parser!(parse_data, parser::object::data, &[u8]);
    define_parser!(parse_ascii_string, parser::object::ascii_string, &str);
    define_parser!(parse_utf16_string, parser::object::utf16_string, String);
    define_parser!(parse_uid, parser::object::uid, &[u8]);

    /// Parses the object references contained in an array.
    fn parse_array(&self, object: usize) -> Result<Vec<usize>> {
        let data = self.data_for(object)?;
        parser::object::array(self.metadata.ref_size)(data)
            .map(|(_, objects)| objects)
            .map_err(|_| Error::Truncated)
    }

    /// Parses the key/value object reference pairs contained in a dictionary.
    fn parse_dictionary(&self, object: usize) -> Result<Vec<(usize, usize)>> {
        let data = self.data_for(object)?;
        parser::object::dictionary(self.metadata.ref_size)(data)
            .map(|(_, pairs)| pairs)
            .map_err(|_| Error::Truncated)
    }
}

/// Parses the metadata necessary to interpret the contents of a document: the
/// header, trailer, and offset table.
///
/// The smallest possible document consists of:
///   1. A fixed-sized header.
///   2. An object table with a single one-byte entry such as a zero-length array.
///   3. An offset table with a single one-byte entry for the top-level object.
///   4. A fixed-sized trailer.
fn parse_metadata(input: &[u8]) -> Result<Metadata> {
    if input.len() < MINIMUM_DOCUMENT_SIZE {
        return Err(Error::Truncated);
    }

    let header_slice = &input[0..HEADER_SIZE];
    let (_, header) = parser::document::header(header_slice)
        .map_err(|_| Error::InvalidHeader)?;
    if header.version != HEADER_VERSION_00 {
        return Err(Error::InvalidHeader);
    }

    let trailer_slice = &input[input.len() - TRAILER_SIZE..];
    let (_, trailer) = parser::document::trailer(trailer_slice)
        .map_err(|_| Error::MalformedTrailer)?;

    if !matches!(trailer.offset_size, 1 | 2 | 4 | 8) || !matches!(trailer.ref_size, 1 | 2 | 4 | 8) {
        return Err(Error::MalformedTrailer);
    }
    if trailer.top_object >= trailer.num_objects {
        return Err(Error::MalformedTrailer);
    }

    let offset_table_start = trailer.offset_table_offset;
    let offset_table_length = trailer.num_objects.checked_mul(trailer.offset_size)
        .ok_or(Error::MalformedTrailer)?;

    if offset_table_start < HEADER_SIZE {
        return Err(Error::MalformedTrailer);
    }
    let offset_table_end = offset_table_start.checked_add(offset_table_length)
        .ok_or(Error::MalformedTrailer)?;
    if offset_table_end > input.len() - TRAILER_SIZE {
        return Err(Error::MalformedTrailer);
    }

    let offset_table_slice = &input[offset_table_start..offset_table_end];
    let (_, offset_table) = parser::document::offset_table(
        trailer.num_objects,
        trailer.offset_size,
    )(offset_table_slice).map_err(|_| Error::MalformedTrailer)?;

    Ok(Metadata {
        offset_table,
        ref_size: trailer.ref_size,
        top_object: trailer.top_object,
        object_table_range: HEADER_SIZE..offset_table_start,
    })
}

/// Recursively builds a [`Value`] tree rooted at `object`, enforcing a maximum
/// nesting depth and rejecting cyclic container references.
fn build_value(
    object_table: &ObjectTable,
    object: usize,
    depth: usize,
    in_progress: &mut BTreeSet<usize>,
) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::DepthExceeded);
    }

    let format = object_table.kind_of(object)?;
    match format {
        ObjectFormat::Boolean =>
            Ok(Value::Boolean(object_table.parse_boolean(object)?)),
        ObjectFormat::UInt8 =>
            Ok(Value::Integer(object_table.parse_uint8(object)? as i64)),
        ObjectFormat::UInt16 =>
            Ok(Value::Integer(object_table.parse_uint16(object)? as i64)),
        ObjectFormat::UInt32 =>
            Ok(Value::Integer(object_table.parse_uint32(object)? as i64)),
        ObjectFormat::SInt64 =>
            Ok(Value::Integer(object_table.parse_sint64(object)?)),
        ObjectFormat::Float32 =>
            Ok(Value::from(object_table.parse_float32(object)? as f64)),
        ObjectFormat::Float64 =>
            Ok(Value::from(object_table.parse_float64(object)?)),
        ObjectFormat::Date =>
            Ok(Value::Date(Date::from_wire(object_table.parse_date(object)?))),
        ObjectFormat::Data =>
            Ok(Value::Data(object_table.parse_data(object)?.to_vec())),
        ObjectFormat::AsciiString =>
            Ok(Value::String(object_table.parse_ascii_string(object)?.to_owned())),
        ObjectFormat::Utf16String =>
            Ok(Value::String(object_table.parse_utf16_string(object)?)),
        ObjectFormat::Uid => {
            let bytes = object_table.parse_uid(object)?;
            let mut buf = [0u8; 8];
            buf[8 - bytes.len()..].copy_from_slice(bytes);
            Ok(Value::Uid(Uid::new(u64::from_be_bytes(buf))))
        }
        ObjectFormat::Array => {
            if !in_progress.insert(object) {
                return Err(Error::DepthExceeded);
            }
            let objects = object_table.parse_array(object)?;
            let mut values = Vec::with_capacity(objects.len());
            for child in objects {
                values.push(build_value(object_table, child, depth + 1, in_progress)?);
            }
            in_progress.remove(&object);
            Ok(Value::Array(values))
        }
        ObjectFormat::Dictionary => {
            if !in_progress.insert(object) {
                return Err(Error::DepthExceeded);
            }
            let pairs = object_table.parse_dictionary(object)?;
            let mut map = BTreeMap::new();
            for (key, value) in pairs {
                let key = build_value(object_table, key, depth + 1, in_progress)?;
                let value = build_value(object_table, value, depth + 1, in_progress)?;
                map.insert(key, value);
            }
            in_progress.remove(&object);
            Ok(Value::Dictionary(map))
        }
    }
}

/// Parses a complete binary property list document into a [`Value`] tree.
pub fn parse(input: &[u8]) -> Result<Value> {
    let metadata = parse_metadata(input)?;
    let object_table = ObjectTable { input, metadata };
    let top_object = object_table.metadata.top_object;
    let mut in_progress = BTreeSet::new();
    build_value(&object_table, top_object, 0, &mut in_progress)
}
